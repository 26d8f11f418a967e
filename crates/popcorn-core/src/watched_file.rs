use anyhow::{Context, Result};
use popcorn_models::WatchedEntry;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::watched::WatchedListStore;

/// JSON file backing the watched list between runs
pub struct WatchedFile {
    path: PathBuf,
}

impl WatchedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the list. A missing file is an empty list; an unreadable one is
    /// moved aside to `.json.bak` and an empty list is returned.
    pub fn load(&self) -> Result<WatchedListStore> {
        if !self.path.exists() {
            debug!(operation = "watched_load", path = %self.path.display(), "No watched file yet");
            return Ok(WatchedListStore::new());
        }

        let data = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read watched list from {}", self.path.display()))?;

        let entries: Vec<WatchedEntry> = match serde_json::from_str(&data) {
            Ok(entries) => entries,
            Err(e) => {
                let backup_path = self.path.with_extension("json.bak");
                if let Err(backup_err) = std::fs::copy(&self.path, &backup_path) {
                    warn!(
                        operation = "watched_load",
                        error = %backup_err,
                        "Failed to back up unreadable watched file. Starting with an empty list."
                    );
                } else {
                    warn!(
                        operation = "watched_load",
                        error = %e,
                        backup = %backup_path.display(),
                        "Watched file unreadable, backed it up and starting with an empty list"
                    );
                }
                return Ok(WatchedListStore::new());
            }
        };

        let store = WatchedListStore::from_entries(entries);
        debug!(operation = "watched_load", count = store.len(), "Loaded watched list");
        Ok(store)
    }

    pub fn save(&self, store: &WatchedListStore) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(store.entries())?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write watched list to {}", self.path.display()))?;

        info!(operation = "watched_save", count = store.len(), path = %self.path.display(), "Saved watched list");
        Ok(())
    }
}
