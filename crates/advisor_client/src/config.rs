//! Client config load/save for `~/.advisor/config.yaml`.

use std::path::{Path, PathBuf};

use crate::client::Endpoints;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_CHAT_PATH: &str = "/chat";
pub const DEFAULT_ANALYZE_PATH: &str = "/analyze";
pub const DEFAULT_UPLOAD_FIELD: &str = "file";

/// Server section (base_url, endpoint paths, multipart field name).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ServerSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyze_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_field: Option<String>,
}

/// Full config file.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSection,
}

impl Config {
    /// Config with every field filled in with its default.
    pub fn with_defaults() -> Self {
        Config {
            server: ServerSection {
                base_url: Some(DEFAULT_BASE_URL.into()),
                chat_path: Some(DEFAULT_CHAT_PATH.into()),
                analyze_path: Some(DEFAULT_ANALYZE_PATH.into()),
                upload_field: Some(DEFAULT_UPLOAD_FIELD.into()),
            },
        }
    }

    /// Resolve the endpoints, falling back to defaults for unset fields.
    pub fn endpoints(&self) -> Endpoints {
        let s = &self.server;
        Endpoints {
            base_url: s
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            chat_path: s
                .chat_path
                .clone()
                .unwrap_or_else(|| DEFAULT_CHAT_PATH.into()),
            analyze_path: s
                .analyze_path
                .clone()
                .unwrap_or_else(|| DEFAULT_ANALYZE_PATH.into()),
            upload_field: s
                .upload_field
                .clone()
                .unwrap_or_else(|| DEFAULT_UPLOAD_FIELD.into()),
        }
    }
}

/// Returns the default config file path: `~/.advisor/config.yaml` (platform-specific).
pub fn default_config_path() -> Option<PathBuf> {
    let home = home_dir()?;
    Some(home.join(".advisor").join("config.yaml"))
}

#[cfg(unix)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(windows)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE").map(PathBuf::from)
}

#[cfg(not(any(unix, windows)))]
fn home_dir() -> Option<PathBuf> {
    None
}

/// Load config from a YAML file.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&contents)?)
}

/// Load config from `path`, or the defaults when the file does not exist.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    load(path)
}

/// Save config to a YAML file. Creates parent directory if missing.
pub fn save(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Config load/save error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
