use exambank_model::{BinaryPayload, Value};
use pretty_assertions::assert_eq;

#[test]
fn from_json_keeps_integers() {
    let v = Value::from_json(serde_json::json!({"a": 1, "b": 1.5, "c": [true, null, "s"]}));
    let obj = v.as_object().unwrap();
    assert_eq!(obj.get("a"), Some(&Value::Int(1)));
    assert_eq!(obj.get("b"), Some(&Value::Float(1.5)));
    assert_eq!(
        obj.get("c"),
        Some(&Value::Array(vec![Value::Bool(true), Value::Null, Value::from("s")]))
    );
}

#[test]
fn to_json_renders_blobs_through_callback() {
    let v = Value::Array(vec![Value::Blob(BinaryPayload::new("image/png", vec![1, 2]))]);
    let json = v.to_json_with(&mut |b: &BinaryPayload| serde_json::Value::from(b.len()));
    assert_eq!(json, serde_json::json!([2]));
}

#[test]
fn non_finite_float_becomes_null() {
    let json = Value::Float(f64::INFINITY).to_json_with(&mut |_: &BinaryPayload| serde_json::Value::Null);
    assert_eq!(json, serde_json::Value::Null);
}

#[test]
fn storage_encoding_roundtrips_blobs() {
    let mut doc = exambank_model::Document::new();
    doc.insert("photo".into(), Value::Blob(BinaryPayload::new("image/jpeg", vec![0, 255, 7])));
    doc.insert("n".into(), Value::Int(3));
    let value = Value::Object(doc);
    let encoded = serde_json::to_string(&value).unwrap();
    let decoded: Value = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn display_summarizes_blobs() {
    let v = Value::Blob(BinaryPayload::new("image/png", vec![0; 10]));
    assert!(v.to_string().contains("10 bytes"));
}

#[test]
fn accessors() {
    assert_eq!(Value::Int(4).as_f64(), Some(4.0));
    assert_eq!(Value::from("x").as_str(), Some("x"));
    assert_eq!(Value::Bool(true).as_bool(), Some(true));
    assert!(Value::Null.is_null());
    assert_eq!(Value::Null.type_name(), "null");
    assert_eq!(Value::from(exambank_types::RecordKey::Int(9)), Value::Int(9));
}
