use exambank_types::RecordKey;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::str::FromStr;

// ── Construction & accessors ─────────────────────────────────────

#[test]
fn int_key_accessors() {
    let key = RecordKey::from(42);
    assert_eq!(key.as_int(), Some(42));
    assert_eq!(key.as_str(), None);
}

#[test]
fn str_key_accessors() {
    let key = RecordKey::from("theme");
    assert_eq!(key.as_int(), None);
    assert_eq!(key.as_str(), Some("theme"));
}

#[test]
fn display_is_bare_value() {
    assert_eq!(RecordKey::Int(7).to_string(), "7");
    assert_eq!(RecordKey::from("locale").to_string(), "locale");
}

#[test]
fn from_str_prefers_integers() {
    assert_eq!(RecordKey::from_str("12").unwrap(), RecordKey::Int(12));
    assert_eq!(RecordKey::from_str("-3").unwrap(), RecordKey::Int(-3));
    assert_eq!(RecordKey::from_str("abc").unwrap(), RecordKey::from("abc"));
}

// ── Storage encoding ─────────────────────────────────────────────

#[test]
fn encoding_distinguishes_int_and_numeric_string() {
    let int = RecordKey::Int(7);
    let text = RecordKey::from("7");
    assert_ne!(int.encode(), text.encode());
    assert_eq!(int.encode(), "i:7");
    assert_eq!(text.encode(), "s:7");
}

#[test]
fn string_key_may_contain_prefix_like_text() {
    let key = RecordKey::from("i:5");
    assert_ne!(key.encode(), RecordKey::Int(5).encode());
}

// ── Ordering ─────────────────────────────────────────────────────

#[test]
fn ints_sort_before_strings() {
    let keys: BTreeSet<RecordKey> = [
        RecordKey::from("b"),
        RecordKey::Int(10),
        RecordKey::from("a"),
        RecordKey::Int(2),
    ]
    .into_iter()
    .collect();
    let ordered: Vec<RecordKey> = keys.into_iter().collect();
    assert_eq!(
        ordered,
        vec![
            RecordKey::Int(2),
            RecordKey::Int(10),
            RecordKey::from("a"),
            RecordKey::from("b"),
        ]
    );
}

// ── Serde ────────────────────────────────────────────────────────

#[test]
fn serde_is_untagged() {
    assert_eq!(serde_json::to_string(&RecordKey::Int(5)).unwrap(), "5");
    assert_eq!(serde_json::to_string(&RecordKey::from("k")).unwrap(), "\"k\"");

    let parsed: RecordKey = serde_json::from_str("5").unwrap();
    assert_eq!(parsed, RecordKey::Int(5));
    let parsed: RecordKey = serde_json::from_str("\"k\"").unwrap();
    assert_eq!(parsed, RecordKey::from("k"));
}

proptest! {
    #[test]
    fn int_encoding_is_injective(a in any::<i64>(), b in any::<i64>()) {
        prop_assert_eq!(RecordKey::Int(a).encode() == RecordKey::Int(b).encode(), a == b);
    }

    #[test]
    fn ints_and_strings_never_collide(n in any::<i64>(), s in ".*") {
        prop_assert_ne!(RecordKey::Int(n).encode(), RecordKey::Str(s).encode());
    }
}
