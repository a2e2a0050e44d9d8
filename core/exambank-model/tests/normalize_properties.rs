use exambank_model::{normalize, validators, Document, FieldKind, FieldSpec, Schema, Value};
use proptest::prelude::*;

fn schema() -> Schema {
    Schema::new(vec![
        FieldSpec::nullable("a"),
        FieldSpec::text("b", "bee"),
        FieldSpec::with_default("c", FieldKind::Primitive, 3),
        FieldSpec::flag("d", true),
        FieldSpec::nullable("rating").validated(validators::rating_or_null),
        FieldSpec::list("items").items(Schema::new(vec![FieldSpec::text("label", "")])),
    ])
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::Int),
        "[a-z]{0,8}".prop_map(Value::String),
    ]
}

/// Partial records over the schema's fields plus a few unknown ones.
fn partial_record() -> impl Strategy<Value = Document> {
    (
        prop::option::of(leaf()),
        prop::option::of(leaf()),
        prop::option::of(leaf()),
        prop::option::of(prop_oneof![Just(Value::Null), any::<bool>().prop_map(Value::Bool)]),
        prop::option::of(prop_oneof![Just(Value::Null), (1i64..=5).prop_map(Value::Int)]),
        prop::option::of(prop::collection::vec(leaf(), 0..4)),
        prop::option::of(leaf()),
    )
        .prop_map(|(a, b, c, d, rating, items, extra)| {
            let mut doc = Document::new();
            let mut put = |name: &str, v: Option<Value>| {
                if let Some(v) = v {
                    doc.insert(name.to_string(), v);
                }
            };
            put("a", a);
            put("b", b);
            put("c", c);
            put("d", d.filter(|v| !v.is_null()));
            put("rating", rating);
            put("items", items.map(Value::Array));
            put("zzz_unknown", extra);
            doc
        })
}

proptest! {
    /// Output has exactly the schema's fields, in order.
    #[test]
    fn output_has_exactly_schema_fields(raw in partial_record()) {
        let schema = schema();
        let out = normalize(&schema, &raw).unwrap();
        let keys: Vec<&str> = out.keys().map(String::as_str).collect();
        prop_assert_eq!(keys, schema.field_names());
    }

    /// Explicit nulls survive normalization.
    #[test]
    fn explicit_nulls_are_kept(raw in partial_record()) {
        let out = normalize(&schema(), &raw).unwrap();
        for (name, value) in &raw {
            if value.is_null() && out.contains_key(name) {
                prop_assert_eq!(out.get(name), Some(&Value::Null));
            }
        }
    }

    /// Normalizing twice changes nothing (no time-varying factories here).
    #[test]
    fn normalize_is_idempotent(raw in partial_record()) {
        let schema = schema();
        let once = normalize(&schema, &raw).unwrap();
        let twice = normalize(&schema, &once).unwrap();
        prop_assert_eq!(once, twice);
    }
}
