use serde::Deserialize;
use std::path::{Path, PathBuf};
use directories::{BaseDirs, ProjectDirs};
use anyhow::{Context, Result};
use std::fs;

pub const APP_NAME: &str = "scriptmenu";

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub menu: MenuConfig,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum NotifyMode {
    Off,
    #[default]
    ExitCodeOnly,
    FullOutput,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IconMode {
    #[default]
    Shebang,
    Fixed,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GeneralConfig {
    /// Directory holding the scripts. Nothing is listed while unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default)]
    pub notify: NotifyMode,
    #[serde(default)]
    pub logging: bool,
    /// Overrides the default `~/.scriptmenu.log`.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            directory: None,
            notify: NotifyMode::default(),
            logging: false,
            log_file: None,
        }
    }
}

impl GeneralConfig {
    pub fn log_path(&self) -> PathBuf {
        if let Some(path) = &self.log_file {
            return path.clone();
        }
        let file_name = format!(".{}.log", APP_NAME);
        match BaseDirs::new() {
            Some(dirs) => dirs.home_dir().join(file_name),
            None => PathBuf::from(file_name),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct MenuConfig {
    #[serde(default)]
    pub icon_mode: IconMode,
    #[serde(default = "default_icon")]
    pub default_icon: String,
    #[serde(default)]
    pub strip_extensions: bool,
}

pub fn default_icon() -> String { "utilities-terminal-symbolic".to_string() }

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            icon_mode: IconMode::default(),
            default_icon: default_icon(),
            strip_extensions: false,
        }
    }
}

pub fn config_path() -> PathBuf {
    match ProjectDirs::from("org", APP_NAME, APP_NAME) {
        Some(dirs) => dirs.config_dir().join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => config_path(),
    };

    if !config_path.exists() {
        log::debug!("No config at {:?}, using defaults", config_path);
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    parse_config(&content).with_context(|| format!("parsing {}", config_path.display()))
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    Ok(config)
}
