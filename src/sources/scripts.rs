use crate::config::{IconMode, MenuConfig};
use crate::model::ScriptEntry;
use crate::sources::collate::NameOrder;
use crate::sources::{shebang, Source};
use std::path::{Path, PathBuf};
use log::{info, debug};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub icon_mode: IconMode,
    pub default_icon: String,
    pub strip_extensions: bool,
}

impl From<&MenuConfig> for ScanOptions {
    fn from(menu: &MenuConfig) -> Self {
        Self {
            icon_mode: menu.icon_mode,
            default_icon: menu.default_icon.clone(),
            strip_extensions: menu.strip_extensions,
        }
    }
}

pub struct ScriptsSource {
    pub directory: PathBuf,
    pub options: ScanOptions,
}

impl Source for ScriptsSource {
    fn scan(&self) -> Vec<ScriptEntry> {
        scan(&self.directory, &self.options)
    }
}

/// Regular files directly inside `directory`, sorted by name. A missing or
/// non-directory path yields nothing.
pub fn scan(directory: &Path, options: &ScanOptions) -> Vec<ScriptEntry> {
    if !directory.is_dir() {
        debug!("Scripts directory {:?} does not exist, skipping", directory);
        return vec![];
    }
    let directory = std::path::absolute(directory).unwrap_or_else(|_| directory.to_path_buf());

    debug!("Scanning scripts in {:?}", directory);
    let mut entries = Vec::new();
    // follow_links makes file_type() describe the link target
    let walker = WalkDir::new(&directory).min_depth(1).max_depth(1).follow_links(true);
    for entry in walker.into_iter().flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        // lossy only for presentation, the path keeps the raw bytes
        let name = entry.file_name().to_string_lossy().into_owned();
        let icon = icon_hint(entry.path(), options);
        entries.push(ScriptEntry::new(
            entry.path().to_path_buf(),
            name,
            Some(icon),
            options.strip_extensions,
        ));
    }

    let order = NameOrder::from_env();
    entries.sort_by(|a, b| order.compare(&a.name, &b.name));
    info!("ScriptsSource: found {} entries", entries.len());
    entries
}

fn icon_hint(path: &Path, options: &ScanOptions) -> String {
    match options.icon_mode {
        IconMode::Fixed => options.default_icon.clone(),
        IconMode::Shebang => match shebang::interpreter(path) {
            Some(interp) => shebang::icon_for_interpreter(&interp).to_string(),
            None => options.default_icon.clone(),
        },
    }
}
