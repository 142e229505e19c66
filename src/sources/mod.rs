use crate::model::ScriptEntry;

pub trait Source {
    fn scan(&self) -> Vec<ScriptEntry>;
}

pub mod collate;
pub mod scripts;
pub mod shebang;
