//! Application configuration: an optional JSON file, then CLI overrides.

use anyhow::{Context, Result};
use exambank_storage::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    /// Where `export` writes snapshots unless told otherwise.
    pub backup_dir: PathBuf,
    /// Program and arguments run after a restore. `None` only logs that a
    /// restart is needed.
    pub restart_command: Option<Vec<String>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::at_path("exambank", "exambank.db"),
            backup_dir: PathBuf::from("backups"),
            restart_command: None,
        }
    }
}

impl AppConfig {
    /// Loads `path`, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.store.validate()?;
        Ok(config)
    }

    /// Applies `--db` / `--in-memory`. The in-memory flag wins.
    pub fn apply_overrides(&mut self, db: Option<PathBuf>, in_memory: bool) {
        if let Some(db) = db {
            self.store.path = Some(db);
        }
        if in_memory {
            self.store.path = None;
        }
    }
}
