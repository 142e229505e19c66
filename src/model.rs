use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptEntry {
    pub name: String,          // File name on disk
    pub path: PathBuf,         // Exact path on disk, even when `name` is lossy
    pub icon_hint: Option<String>,
    pub display_name: String,  // Presentation only, never used to launch
}

impl ScriptEntry {
    pub fn new(
        path: PathBuf,
        name: String,
        icon_hint: Option<String>,
        strip_extension: bool,
    ) -> Self {
        let display_name = display_name(&name, strip_extension);
        Self {
            path,
            name,
            icon_hint,
            display_name,
        }
    }
}

/// `backup.sh` becomes `backup` when stripping; dotfiles keep their name.
pub fn display_name(name: &str, strip_extension: bool) -> String {
    if !strip_extension {
        return name.to_string();
    }
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_extension() {
        assert_eq!(display_name("backup.sh", true), "backup");
        assert_eq!(display_name("run", true), "run");
        assert_eq!(display_name("archive.tar.gz", true), "archive.tar");
        assert_eq!(display_name(".hidden", true), ".hidden");
    }

    #[test]
    fn keeps_name_when_disabled() {
        assert_eq!(display_name("backup.sh", false), "backup.sh");
        assert_eq!(display_name("run", false), "run");
    }

    #[test]
    fn path_keeps_extension() {
        let path = PathBuf::from("/srv/scripts/backup.sh");
        let entry = ScriptEntry::new(path, "backup.sh".into(), None, true);
        assert_eq!(entry.display_name, "backup");
        assert_eq!(entry.path, PathBuf::from("/srv/scripts/backup.sh"));
    }
}
