pub mod config;
pub mod paths;

pub use config::{Config, ConfigError, OmdbConfig, UiConfig, API_KEY_ENV};
pub use paths::{base_path_override, PathManager};
