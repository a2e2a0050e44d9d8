//! Error types for the storage layer.

use exambank_model::ValidationError;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The database aborted the operation. Not retried.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A record failed its schema before being written.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A key or unique-index constraint would be broken.
    #[error("constraint violation in `{collection}`: {detail}")]
    ConstraintViolation { collection: String, detail: String },

    /// The collection does not exist.
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// The index does not exist on the collection.
    #[error("unknown index `{index}` on `{collection}`")]
    UnknownIndex { collection: String, index: String },

    /// The collection was not named when the transaction was opened.
    #[error("collection `{0}` is outside the transaction scope")]
    OutOfScope(String),

    /// A write was attempted in a read-only transaction.
    #[error("write attempted in a read-only transaction")]
    ReadOnly,

    /// The database was written by a newer schema version.
    #[error("database version {found} is newer than requested version {requested}")]
    VersionDowngrade { found: u32, requested: u32 },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record not found.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Invalid data.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking store task was cancelled before it finished.
    #[error("store task failed: {0}")]
    Task(String),

    /// The store configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StorageError {
    pub(crate) fn constraint(collection: &str, detail: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            collection: collection.to_string(),
            detail: detail.into(),
        }
    }
}

impl From<exambank_types::Error> for StorageError {
    fn from(err: exambank_types::Error) -> Self {
        Self::InvalidData(err.to_string())
    }
}
