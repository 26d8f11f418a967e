pub mod config;
pub mod interactive;
pub mod prompts;
pub mod render;
pub mod search;
pub mod show;
pub mod title;
pub mod watched;

use color_eyre::Result;
use popcorn_config::{Config, ConfigError, PathManager};
use popcorn_core::WatchedFile;
use popcorn_sources::{CatalogSource, OmdbClient};
use std::sync::Arc;

/// Paths plus the loaded configuration, shared by every command
pub struct AppContext {
    pub paths: PathManager,
    pub config: Config,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let paths = PathManager::default();
        paths
            .ensure_directories()
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create popcorn directories: {}", e))?;
        let config_file = paths.config_file();
        let config = Config::load_or_default(&config_file).map_err(|e| {
            color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e)
        })?;
        Ok(Self { paths, config })
    }

    /// OMDb client for the configured key. Fails early on a bad config.
    pub fn catalog(&self) -> Result<Arc<dyn CatalogSource>> {
        self.config.validate().map_err(|e| match e {
            ConfigError::MissingApiKey => color_eyre::eyre::eyre!(
                "{}. Run 'popcorn config api-key' to set one.",
                e
            ),
            other => color_eyre::eyre::eyre!("Invalid configuration: {}", other),
        })?;
        let client = OmdbClient::from_config(&self.config.omdb)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create OMDb client: {}", e))?;
        Ok(Arc::new(client))
    }

    pub fn watched_file(&self) -> WatchedFile {
        WatchedFile::new(self.paths.watched_file())
    }

    pub fn default_title(&self) -> &str {
        &self.config.ui.default_title
    }
}
