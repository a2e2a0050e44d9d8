use crate::registry::EntityKind;
use crate::value::{Document, Value};
use exambank_types::RecordKey;

/// A normalized record tagged with its entity kind.
///
/// Only produced by [`crate::normalize_record`] or by storage after
/// normalizing what it read, never from raw input.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    kind: EntityKind,
    fields: Document,
}

impl Record {
    pub(crate) fn new(kind: EntityKind, fields: Document) -> Self {
        Self { kind, fields }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn fields(&self) -> &Document {
        &self.fields
    }

    pub fn into_fields(self) -> Document {
        self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// The record's primary key, if one has been assigned.
    pub fn key(&self) -> Option<RecordKey> {
        match self.fields.get(self.kind.key_path())? {
            Value::Int(n) => Some(RecordKey::Int(*n)),
            Value::String(s) => Some(RecordKey::Str(s.clone())),
            _ => None,
        }
    }

    /// Returns true if the kind has an archival flag and it is set.
    pub fn is_archived(&self) -> bool {
        self.kind
            .archive_flag()
            .and_then(|flag| self.fields.get(flag))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}
