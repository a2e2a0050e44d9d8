//! Core entity model for Exambank.
//!
//! Defines the types every other crate agrees on:
//! - [`Value`] / [`Document`]: the dynamic record representation, including
//!   binary payloads ([`BinaryPayload`])
//! - [`Schema`] / [`FieldSpec`]: declarative field specifications with
//!   defaults, validators and nested item schemas
//! - [`EntityKind`]: the closed registry of entity kinds, each mapped to a
//!   collection, key strategy, indexes and schema
//! - [`normalize`]: the pure validation/defaulting engine
//!
//! Storage never persists raw caller input: every document goes through
//! [`normalize`] first.

mod normalize;
mod record;
mod registry;
mod schema;
pub mod validators;
mod value;

pub use normalize::{normalize, normalize_record, ValidationError};
pub use record::Record;
pub use registry::{EntityKind, IndexDef};
pub use schema::{DefaultValue, FieldKind, FieldSpec, Schema, Validator};
pub use value::{BinaryPayload, Document, Value};
