//! Error types for backup and restore.

use crate::codec::CodecError;
use exambank_storage::StorageError;
use thiserror::Error;

/// Result type for backup operations.
pub type BackupResult<T> = Result<T, BackupError>;

/// Errors that abort a backup or restore.
///
/// Problems with individual records during restore are not errors; they
/// are reported as [`crate::SkipReason`]s.
#[derive(Debug, Error)]
pub enum BackupError {
    /// The snapshot is not a JSON object of record arrays. Nothing was touched.
    #[error("snapshot parse error: {0}")]
    SnapshotParse(#[source] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}
