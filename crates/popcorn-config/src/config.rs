use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable that overrides `omdb.api_key`
pub const API_KEY_ENV: &str = "POPCORN_OMDB_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub omdb: OmdbConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OmdbConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Window title restored whenever no movie is open
    #[serde(default = "default_title")]
    pub default_title: String,
    #[serde(default)]
    pub log_to_file: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("OMDb API key is not configured (set omdb.api_key or POPCORN_OMDB_API_KEY)")]
    MissingApiKey,
    #[error("Invalid OMDb base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("request_timeout_secs must be greater than zero")]
    InvalidTimeout,
}

fn default_base_url() -> String {
    "https://www.omdbapi.com/".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_title() -> String {
    "usePopcorn".to_string()
}

impl Default for OmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_title: default_title(),
            log_to_file: false,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file if it exists, fall back to defaults otherwise,
    /// then apply environment overrides.
    pub fn load_or_default(path: &PathBuf) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.omdb.api_key = key.trim().to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.omdb.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        let url = self.omdb.base_url.trim();
        let has_scheme = url.starts_with("https://") || url.starts_with("http://");
        let has_host = url
            .split("://")
            .nth(1)
            .map(|rest| !rest.trim_start_matches('/').is_empty())
            .unwrap_or(false);
        if !has_scheme || !has_host {
            return Err(ConfigError::InvalidBaseUrl(self.omdb.base_url.clone()));
        }

        if self.omdb.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(())
    }

    pub fn is_api_key_configured(&self) -> bool {
        !self.omdb.api_key.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn configured() -> Config {
        Config {
            omdb: OmdbConfig {
                api_key: "febc5740".to_string(),
                ..OmdbConfig::default()
            },
            ui: UiConfig::default(),
        }
    }

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let mut config = configured();
        config.omdb.request_timeout_secs = 3;
        config.ui.default_title = "Popcorn".to_string();

        let path = file.path().to_path_buf();
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.omdb.api_key, "febc5740");
        assert_eq!(loaded.omdb.request_timeout_secs, 3);
        assert_eq!(loaded.ui.default_title, "Popcorn");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[omdb]\napi_key = \"abc\"\n").unwrap();

        let loaded = Config::load_from_file(&file.path().to_path_buf()).unwrap();
        assert_eq!(loaded.omdb.api_key, "abc");
        assert_eq!(loaded.omdb.base_url, "https://www.omdbapi.com/");
        assert_eq!(loaded.omdb.request_timeout_secs, 10);
        assert_eq!(loaded.ui.default_title, "usePopcorn");
        assert!(!loaded.ui.log_to_file);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let loaded = Config::load_or_default(&path).unwrap();
        assert_eq!(loaded.omdb.base_url, "https://www.omdbapi.com/");
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::default();
        assert_eq!(config.validate(), Err(ConfigError::MissingApiKey));
        assert!(!config.is_api_key_configured());

        config = configured();
        assert!(config.validate().is_ok());
        assert!(config.is_api_key_configured());

        config.omdb.base_url = "ftp://omdb".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBaseUrl(_))));

        config.omdb.base_url = "https://".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBaseUrl(_))));

        config.omdb.base_url = "http://localhost:8080/".to_string();
        config.omdb.request_timeout_secs = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimeout));
    }
}
