use crate::error::{BackupError, BackupResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A whole-store snapshot: collection name to its records, as JSON.
///
/// Binary values appear as envelope strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotDocument {
    collections: IndexMap<String, Vec<serde_json::Value>>,
}

impl SnapshotDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses snapshot text. Any structural problem is fatal.
    pub fn parse(text: &str) -> BackupResult<Self> {
        serde_json::from_str(text).map_err(BackupError::SnapshotParse)
    }

    pub fn to_string_pretty(&self) -> BackupResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| BackupError::Io(e.into()))
    }

    /// Adds or replaces a collection.
    pub fn insert(&mut self, collection: impl Into<String>, records: Vec<serde_json::Value>) {
        self.collections.insert(collection.into(), records);
    }

    pub fn get(&self, collection: &str) -> Option<&[serde_json::Value]> {
        self.collections.get(collection).map(Vec::as_slice)
    }

    pub fn contains(&self, collection: &str) -> bool {
        self.collections.contains_key(collection)
    }

    /// Collection names in document order.
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Number of collections.
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Total records across every collection.
    pub fn record_count(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }
}
