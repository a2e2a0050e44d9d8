//! Object store gateway for Exambank.
//!
//! Wraps an embedded SQLite database in the small object-store contract the
//! rest of the application relies on: named collections of documents, scoped
//! atomic transactions, sequential key assignment and unique indexes.
//!
//! # Architecture
//!
//! - [`Store`] owns one writer connection; read-only transactions open their
//!   own reader connection so they never wait on each other. Database work
//!   runs on tokio's blocking pool
//! - [`Transaction`] is the only way to touch documents and is committed when
//!   its closure returns `Ok`
//! - [`Upgrade`] creates collections and indexes when the schema version is
//!   bumped; [`install_registry`] does this for every [`EntityKind`]
//! - [`Records`] layers the schema registry on top: every document is
//!   normalized before it is written or returned
//!
//! [`EntityKind`]: exambank_model::EntityKind

mod config;
mod error;
mod gateway;
mod records;
mod transaction;
mod upgrade;

pub use config::{StoreConfig, SCHEMA_VERSION};
pub use error::{StorageError, StorageResult};
pub use gateway::Store;
pub use records::{Records, UpsertOutcome};
pub use transaction::{Transaction, TxMode};
pub use upgrade::{install_registry, CollectionOptions, IndexOptions, Upgrade};
