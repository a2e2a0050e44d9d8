use exambank_model::{Document, EntityKind, Value};
use exambank_storage::{Records, StorageError, StoreConfig, TxMode, UpsertOutcome};
use exambank_types::{RecordKey, Timestamp};
use pretty_assertions::assert_eq;
use serde_json::json;

fn doc(json: serde_json::Value) -> Document {
    Value::document_from_json(json).unwrap()
}

fn records() -> Records {
    Records::open(&StoreConfig::in_memory("records")).unwrap()
}

fn examiner(employee_id: i64, name: &str) -> Document {
    doc(json!({"employee_id": employee_id, "name": name, "email": "x@example.org"}))
}

// ── Registry install ────────────────────────────────────────────

#[tokio::test]
async fn open_installs_every_registered_collection() {
    let records = records();
    let mut expected: Vec<&str> = EntityKind::ALL.iter().map(|k| k.collection_name()).collect();
    expected.sort_unstable();
    assert_eq!(records.store().list_collection_names().await.unwrap(), expected);
}

// ── CRUD ────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_normalizes_before_writing() {
    let records = records();
    let key = records
        .insert(
            EntityKind::Question,
            &doc(json!({"question_text": "2 + 2?", "bogus": 1})),
        )
        .await
        .unwrap();
    assert_eq!(key, RecordKey::Int(1));

    let raw = records
        .store()
        .transaction(&["questions"], TxMode::ReadOnly, move |tx| tx.get("questions", &key))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(raw["id"], Value::Int(1));
    assert_eq!(raw["difficulty"], Value::from("medium"));
    assert!(!raw.contains_key("bogus"));
    assert_eq!(
        raw.keys().map(String::as_str).collect::<Vec<_>>(),
        EntityKind::Question.schema().field_names()
    );
}

#[tokio::test]
async fn insert_rejects_invalid_records() {
    let records = records();
    let err = records
        .insert(EntityKind::Question, &doc(json!({"question_text": ""})))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Validation(_)));

    let err = records
        .insert(EntityKind::Setting, &doc(json!({"value": 1})))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Validation(e) if e.field() == "key"));
}

#[tokio::test]
async fn settings_use_caller_supplied_keys() {
    let records = records();
    let key = records
        .put(EntityKind::Setting, &doc(json!({"key": "theme", "value": "dark"})))
        .await
        .unwrap();
    assert_eq!(key, RecordKey::from("theme"));

    let setting = records.get(EntityKind::Setting, &key).await.unwrap().unwrap();
    assert_eq!(setting.get("value"), Some(&Value::from("dark")));
    assert_eq!(setting.key(), Some(key));
}

#[tokio::test]
async fn update_merges_and_revalidates() {
    let records = records();
    let key = records
        .insert(EntityKind::Question, &doc(json!({"question_text": "Q", "marks": 2})))
        .await
        .unwrap();

    let updated = records
        .update(EntityKind::Question, &key, &doc(json!({"marks": 5, "id": 99})))
        .await
        .unwrap();
    assert_eq!(updated.get("marks"), Some(&Value::Int(5)));
    assert_eq!(updated.get("question_text"), Some(&Value::from("Q")));
    assert_eq!(updated.key(), Some(key.clone()));

    let err = records
        .update(EntityKind::Question, &key, &doc(json!({"difficulty": "impossible"})))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Validation(e) if e.field() == "difficulty"));

    let stored = records.get(EntityKind::Question, &key).await.unwrap().unwrap();
    assert_eq!(stored.get("difficulty"), Some(&Value::from("medium")));
}

#[tokio::test]
async fn update_missing_record_is_not_found() {
    let records = records();
    let err = records
        .update(EntityKind::Question, &RecordKey::Int(5), &Document::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn list_and_find_by_index() {
    let records = records();
    for (section, text) in [(1, "a"), (2, "b"), (1, "c")] {
        records
            .insert(
                EntityKind::Question,
                &doc(json!({"question_text": text, "section_id": section})),
            )
            .await
            .unwrap();
    }

    assert_eq!(records.list(EntityKind::Question).await.unwrap().len(), 3);
    let texts: Vec<Value> = records
        .find_by_index(EntityKind::Question, "section_id", &Value::Int(1))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.fields()["question_text"].clone())
        .collect();
    assert_eq!(texts, vec![Value::from("a"), Value::from("c")]);
}

#[tokio::test]
async fn archive_sets_flag_and_delete_removes() {
    let records = records();
    let key = records
        .insert(EntityKind::Question, &doc(json!({"question_text": "Q"})))
        .await
        .unwrap();
    let archived = records.archive(EntityKind::Question, &key).await.unwrap();
    assert!(archived.is_archived());

    let err = records
        .archive(EntityKind::Feedback, &RecordKey::Int(1))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidData(_)));

    assert!(records.delete(EntityKind::Question, &key).await.unwrap());
    assert!(records.get(EntityKind::Question, &key).await.unwrap().is_none());
}

// ── Uniqueness-checked upsert ───────────────────────────────────

#[tokio::test]
async fn upsert_adds_when_unique_value_is_free() {
    let records = records();
    let outcome = records
        .add_with_unique_key(EntityKind::Examiner, "employee_id", &examiner(42, "Ada"))
        .await
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Added(RecordKey::Int(1)));
}

#[tokio::test]
async fn upsert_reclaims_archived_holder() {
    let records = records();
    let key = records
        .insert(EntityKind::Examiner, &examiner(42, "Ada"))
        .await
        .unwrap();
    records.archive(EntityKind::Examiner, &key).await.unwrap();

    let outcome = records
        .add_with_unique_key(EntityKind::Examiner, "employee_id", &examiner(42, "Ada Lovelace"))
        .await
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::UnarchivedAndUpdated(key.clone()));

    let all = records.list(EntityKind::Examiner).await.unwrap();
    assert_eq!(all.len(), 1);
    let reclaimed = &all[0];
    assert!(!reclaimed.is_archived());
    assert_eq!(reclaimed.key(), Some(key));
    assert_eq!(reclaimed.get("name"), Some(&Value::from("Ada Lovelace")));
}

#[tokio::test]
async fn upsert_reclaim_stamps_updated_at() {
    let records = records();
    let key = records
        .insert(EntityKind::Examiner, &examiner(42, "Ada"))
        .await
        .unwrap();
    let mut archived = records
        .archive(EntityKind::Examiner, &key)
        .await
        .unwrap()
        .into_fields();
    archived.insert("updated_at".into(), Value::Int(1_000));
    records.put(EntityKind::Examiner, &archived).await.unwrap();

    let before = Timestamp::now().as_millis();
    records
        .add_with_unique_key(EntityKind::Examiner, "employee_id", &examiner(42, "Ada L."))
        .await
        .unwrap();

    let reclaimed = records.get(EntityKind::Examiner, &key).await.unwrap().unwrap();
    let Some(Value::Int(stamped)) = reclaimed.get("updated_at") else {
        panic!("updated_at missing: {reclaimed:?}");
    };
    assert!(*stamped > 1_000);
    assert!(*stamped >= before);
    assert_eq!(reclaimed.get("created_at"), archived.get("created_at"));
}

#[tokio::test]
async fn upsert_rejects_live_duplicate_without_writing() {
    let records = records();
    let key = records
        .insert(EntityKind::Examiner, &examiner(42, "Ada"))
        .await
        .unwrap();
    let before = records.list(EntityKind::Examiner).await.unwrap();

    let outcome = records
        .add_with_unique_key(EntityKind::Examiner, "employee_id", &examiner(42, "Impostor"))
        .await
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::RejectedDuplicate { existing: Some(key) });
    assert_eq!(records.list(EntityKind::Examiner).await.unwrap(), before);
}

#[tokio::test]
async fn upsert_keeps_existing_key_even_if_incoming_names_another() {
    let records = records();
    let key = records
        .insert(EntityKind::Examiner, &examiner(7, "Grace"))
        .await
        .unwrap();
    records.archive(EntityKind::Examiner, &key).await.unwrap();

    let mut incoming = examiner(7, "Grace Hopper");
    incoming.insert("id".into(), Value::Int(500));
    let outcome = records
        .add_with_unique_key(EntityKind::Examiner, "employee_id", &incoming)
        .await
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::UnarchivedAndUpdated(key));
    assert!(records.get(EntityKind::Examiner, &RecordKey::Int(500)).await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_on_field_without_unique_index_fails() {
    let records = records();
    let err = records
        .add_with_unique_key(EntityKind::Examiner, "name", &examiner(1, "Ada"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::UnknownIndex { .. }));

    let err = records
        .add_with_unique_key(EntityKind::Question, "section_id", &Document::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::UnknownIndex { .. }));
}

#[tokio::test]
async fn upsert_validates_incoming_record() {
    let records = records();
    let err = records
        .add_with_unique_key(
            EntityKind::Examiner,
            "employee_id",
            &doc(json!({"employee_id": 3, "name": "Bad", "email": "not-an-email"})),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Validation(e) if e.field() == "email"));
    assert!(records.list(EntityKind::Examiner).await.unwrap().is_empty());
}

#[tokio::test]
async fn upsert_on_syllabus_code() {
    let records = records();
    let first = records
        .add_with_unique_key(
            EntityKind::SyllabusSection,
            "code",
            &doc(json!({"code": "MATH-1", "title": "Algebra"})),
        )
        .await
        .unwrap();
    let second = records
        .add_with_unique_key(
            EntityKind::SyllabusSection,
            "code",
            &doc(json!({"code": "MATH-1", "title": "Algebra again"})),
        )
        .await
        .unwrap();
    assert_eq!(first, UpsertOutcome::Added(RecordKey::Int(1)));
    assert_eq!(second, UpsertOutcome::RejectedDuplicate { existing: Some(RecordKey::Int(1)) });
}
