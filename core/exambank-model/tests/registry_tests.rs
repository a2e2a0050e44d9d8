use exambank_model::{normalize, Document, EntityKind, FieldKind, Value};
use std::collections::HashSet;

#[test]
fn collection_names_are_unique() {
    let names: HashSet<&str> = EntityKind::ALL.iter().map(|k| k.collection_name()).collect();
    assert_eq!(names.len(), EntityKind::ALL.len());
}

#[test]
fn from_collection_roundtrip() {
    for kind in EntityKind::ALL {
        assert_eq!(EntityKind::from_collection(kind.collection_name()), Some(kind));
    }
    assert_eq!(EntityKind::from_collection("nope"), None);
}

#[test]
fn key_path_is_declared_in_schema() {
    for kind in EntityKind::ALL {
        assert!(
            kind.schema().field(kind.key_path()).is_some(),
            "{kind} schema lacks its key path"
        );
    }
}

#[test]
fn index_paths_are_declared_in_schema() {
    for kind in EntityKind::ALL {
        for index in kind.indexes() {
            assert!(kind.schema().field(index.key_path).is_some(), "{kind}.{}", index.name);
        }
    }
}

#[test]
fn archive_and_updated_fields_exist() {
    for kind in EntityKind::ALL {
        if let Some(flag) = kind.archive_flag() {
            assert!(kind.schema().field(flag).is_some());
        }
        if let Some(field) = kind.updated_at_field() {
            assert!(kind.schema().field(field).is_some());
        }
    }
}

#[test]
fn only_settings_use_caller_keys() {
    for kind in EntityKind::ALL {
        assert_eq!(kind.auto_increment(), kind != EntityKind::Setting);
    }
}

#[test]
fn blob_fields_are_schema_metadata() {
    assert!(EntityKind::Question.schema().has_blobs());
    assert!(EntityKind::Examiner.schema().has_blobs());
    assert!(EntityKind::Feedback.schema().has_blobs());
    assert!(!EntityKind::Setting.schema().has_blobs());
    assert_eq!(
        EntityKind::Feedback.schema().field("screenshot").map(|f| f.kind),
        Some(FieldKind::Blob)
    );
}

#[test]
fn every_default_passes_its_validator() {
    // Supplying only the required fields must always normalize.
    for kind in EntityKind::ALL {
        let mut raw = Document::new();
        for field in kind.schema().fields().iter().filter(|f| f.is_required()) {
            raw.insert(field.name.to_string(), Value::from("x"));
        }
        let out = normalize(kind.schema(), &raw);
        assert!(out.is_ok(), "{kind}: {:?}", out.err());
    }
}

#[test]
fn display_is_collection_name() {
    assert_eq!(EntityKind::ExaminerAssignment.to_string(), "examiner_assignments");
}
