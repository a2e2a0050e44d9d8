//! The validation/defaulting engine.
//!
//! Pure and synchronous: no I/O, input never mutated.

use crate::record::Record;
use crate::registry::EntityKind;
use crate::schema::{DefaultValue, FieldKind, FieldSpec, Schema};
use crate::value::{Document, Value};
use thiserror::Error;

/// A record failed its schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field was absent.
    #[error("missing required field `{field}`")]
    MissingRequired { field: String },

    /// A present or defaulted value failed its validator or enum options.
    #[error("invalid value for `{field}`: {value}")]
    Invalid { field: String, value: Value },
}

impl ValidationError {
    /// Path of the offending field (e.g. `options[2].text`).
    pub fn field(&self) -> &str {
        match self {
            Self::MissingRequired { field } | Self::Invalid { field, .. } => field,
        }
    }
}

/// Normalizes `raw` against `schema`.
///
/// The output has exactly the schema's fields in schema order. Absent
/// fields take their default; explicit `null` is kept. Unknown fields are
/// dropped.
pub fn normalize(schema: &Schema, raw: &Document) -> Result<Document, ValidationError> {
    normalize_at(schema, raw, "")
}

/// Normalizes `raw` against the registered schema for `kind`.
pub fn normalize_record(kind: EntityKind, raw: &Document) -> Result<Record, ValidationError> {
    let fields = normalize(kind.schema(), raw)?;
    Ok(Record::new(kind, fields))
}

fn normalize_at(schema: &Schema, raw: &Document, prefix: &str) -> Result<Document, ValidationError> {
    let mut out = Document::with_capacity(schema.len());
    for spec in schema.fields() {
        let path = if prefix.is_empty() {
            spec.name.to_string()
        } else {
            format!("{prefix}.{}", spec.name)
        };

        let resolved = match raw.get(spec.name) {
            Some(value) => value.clone(),
            None => match &spec.default {
                DefaultValue::Required => {
                    return Err(ValidationError::MissingRequired { field: path });
                }
                DefaultValue::Literal(value) => value.clone(),
                DefaultValue::Factory(factory) => factory(),
            },
        };

        let resolved = normalize_nested(spec, resolved, &path)?;
        check(spec, &resolved, &path)?;
        out.insert(spec.name.to_string(), resolved);
    }
    Ok(out)
}

fn normalize_nested(spec: &FieldSpec, value: Value, path: &str) -> Result<Value, ValidationError> {
    let Some(items) = &spec.item_spec else {
        return Ok(value);
    };
    match (spec.kind, value) {
        (FieldKind::Array, Value::Array(elements)) => elements
            .into_iter()
            .enumerate()
            .map(|(i, element)| match element {
                Value::Object(doc) => {
                    normalize_at(items, &doc, &format!("{path}[{i}]")).map(Value::Object)
                }
                other => Ok(other),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        (FieldKind::Object, Value::Object(doc)) => normalize_at(items, &doc, path).map(Value::Object),
        (_, other) => Ok(other),
    }
}

fn check(spec: &FieldSpec, value: &Value, path: &str) -> Result<(), ValidationError> {
    let kind_ok = match spec.kind {
        FieldKind::Enum(options) => match value {
            Value::Null => true,
            Value::String(s) => options.contains(&s.as_str()),
            _ => false,
        },
        FieldKind::Blob => matches!(value, Value::Null | Value::Blob(_)),
        _ => true,
    };
    let validator_ok = spec.validator.is_none_or(|validate| validate(value));
    if kind_ok && validator_ok {
        Ok(())
    } else {
        Err(ValidationError::Invalid {
            field: path.to_string(),
            value: value.clone(),
        })
    }
}
