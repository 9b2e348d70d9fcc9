//! Configuration loading and data folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// TOML configuration file contents
///
/// All fields are optional; missing values fall back to compiled defaults so
/// a missing or empty config file is always valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the SQLite database
    pub data_folder: Option<String>,
    /// HTTP listen port for the lyrics service
    pub port: Option<u16>,
    /// Recording registry (MusicBrainz-compatible) base URL
    pub recording_registry_url: Option<String>,
    /// Per-provider base URL overrides
    #[serde(default)]
    pub providers: ProviderConfig,
}

/// Provider endpoint configuration
///
/// Base URLs only; paths are fixed per provider protocol.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub netease_url: Option<String>,
    pub qq_url: Option<String>,
    pub lrclib_url: Option<String>,
}

/// Load the TOML config from an explicit path, or the default location
///
/// A missing file yields the default (empty) configuration; a malformed file
/// is a configuration error.
pub fn load_toml_config(override_path: Option<&Path>) -> Result<TomlConfig> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => return Ok(TomlConfig::default()),
        },
    };

    if !path.exists() {
        return Ok(TomlConfig::default());
    }

    let raw = std::fs::read_to_string(&path)?;
    toml::from_str(&raw).map_err(|e| Error::Config(format!("parse {}: {}", path.display(), e)))
}

/// Default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("loreley").join("config.toml"))
}

/// Data folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable `LORELEY_DATA_FOLDER`
/// 3. TOML config file `data_folder`
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_folder(cli_arg: Option<&str>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var("LORELEY_DATA_FOLDER") {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.data_folder {
        return PathBuf::from(path);
    }

    default_data_folder()
}

/// OS-dependent default data folder
fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("loreley"))
        .unwrap_or_else(|| PathBuf::from("./loreley_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_file_yields_default() {
        let config =
            load_toml_config(Some(Path::new("/nonexistent/loreley/config.toml"))).unwrap();
        assert!(config.data_folder.is_none());
        assert!(config.providers.netease_url.is_none());
    }

    #[test]
    fn test_cli_arg_wins_over_toml() {
        let config = TomlConfig {
            data_folder: Some("/from/toml".to_string()),
            ..Default::default()
        };
        let resolved = resolve_data_folder(Some("/from/cli"), &config);
        assert_eq!(resolved, PathBuf::from("/from/cli"));
    }

    #[test]
    fn test_toml_data_folder_used_when_no_cli() {
        let config = TomlConfig {
            data_folder: Some("/from/toml".to_string()),
            ..Default::default()
        };
        // Note: assumes LORELEY_DATA_FOLDER is unset in the test environment.
        if std::env::var("LORELEY_DATA_FOLDER").is_err() {
            let resolved = resolve_data_folder(None, &config);
            assert_eq!(resolved, PathBuf::from("/from/toml"));
        }
    }

    #[test]
    fn test_parse_full_config() {
        let raw = r#"
data_folder = "/var/lib/loreley"
port = 5733

[providers]
netease_url = "http://localhost:3000"
lrclib_url = "https://lrclib.net/api"
"#;
        let config: TomlConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.port, Some(5733));
        assert_eq!(
            config.providers.netease_url.as_deref(),
            Some("http://localhost:3000")
        );
        assert!(config.providers.qq_url.is_none());
    }
}
