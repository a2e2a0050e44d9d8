//! Core type definitions for Exambank.
//!
//! This crate defines the small, schema-agnostic types shared by every
//! layer of the store:
//! - Record keys (store-assigned sequence numbers or caller-supplied strings)
//! - Millisecond wall-clock timestamps used by default factories
//!
//! Entity shapes and validation rules live in `exambank-model`, not here.

mod ids;
mod timestamp;

pub use ids::RecordKey;
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
