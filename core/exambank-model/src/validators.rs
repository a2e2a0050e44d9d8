//! Reusable field validators.
//!
//! Each returns `false` to reject a value. Validators run against the
//! resolved value (after defaults), so they must accept their field's own
//! default.

use crate::value::Value;

pub fn is_bool(value: &Value) -> bool {
    matches!(value, Value::Bool(_))
}

pub fn non_empty_string(value: &Value) -> bool {
    value.as_str().is_some_and(|s| !s.trim().is_empty())
}

pub fn non_negative_number(value: &Value) -> bool {
    value.as_f64().is_some_and(|n| n.is_finite() && n >= 0.0)
}

pub fn non_negative_int(value: &Value) -> bool {
    value.as_i64().is_some_and(|n| n >= 0)
}

/// A non-empty string or a positive integer (employee numbers come in both).
pub fn identifier(value: &Value) -> bool {
    non_empty_string(value) || value.as_i64().is_some_and(|n| n > 0)
}

/// Empty, or something shaped like `local@domain`.
pub fn email_or_empty(value: &Value) -> bool {
    match value.as_str() {
        Some("") => true,
        Some(s) => s
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.')),
        None => false,
    }
}

/// `null` or an integer rating from 1 to 5.
pub fn rating_or_null(value: &Value) -> bool {
    value.is_null() || value.as_i64().is_some_and(|n| (1..=5).contains(&n))
}

pub fn is_array(value: &Value) -> bool {
    matches!(value, Value::Array(_))
}

pub fn is_object(value: &Value) -> bool {
    matches!(value, Value::Object(_))
}
