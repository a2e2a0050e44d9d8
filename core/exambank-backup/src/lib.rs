//! Whole-store backup and restore for Exambank.
//!
//! A backup is a single JSON document mapping every collection name to its
//! records. Binary values travel as `data:<media-type>;base64,<payload>`
//! envelopes and are turned back into bytes on restore.
//!
//! Restore replaces one collection at a time: clear and refill happen in one
//! transaction, so a collection is either fully restored or untouched.
//! Collections missing from the snapshot are never cleared.

pub mod codec;
mod error;
mod export;
mod import;
mod restart;
mod snapshot;

pub use codec::{CodecError, Decoded};
pub use error::{BackupError, BackupResult};
pub use export::{snapshot_file_name, Exporter};
pub use import::{
    decode_blob_fields, CollectionReport, CollectionStatus, Importer, RecordOutcome,
    RestoreReport, SkipReason,
};
pub use restart::RestartHook;
pub use snapshot::SnapshotDocument;
