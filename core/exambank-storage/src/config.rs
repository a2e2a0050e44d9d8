//! Store configuration.

use crate::error::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Current schema version. Bumping it runs the upgrade callback once.
pub const SCHEMA_VERSION: u32 = 1;

/// Where and how to open a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store identifier, used in snapshot file names.
    pub name: String,
    /// Database file. `None` opens a private in-memory database.
    pub path: Option<PathBuf>,
    /// Schema version the caller expects.
    pub version: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "exambank".to_string(),
            path: None,
            version: SCHEMA_VERSION,
        }
    }
}

impl StoreConfig {
    /// In-memory store (for testing and dry runs).
    pub fn in_memory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// File-backed store.
    pub fn at_path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: Some(path.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Rejects configurations [`crate::Store::open`] cannot honor.
    pub fn validate(&self) -> StorageResult<()> {
        if self.name.trim().is_empty() {
            return Err(StorageError::Config("store name must not be empty".into()));
        }
        if self
            .name
            .chars()
            .any(|c| std::path::is_separator(c) || c.is_control())
        {
            return Err(StorageError::Config(format!(
                "store name `{}` cannot be used in file names",
                self.name
            )));
        }
        if self.version == 0 {
            return Err(StorageError::Config("schema version starts at 1".into()));
        }
        Ok(())
    }
}
