//! Schema-aware record repository on top of the gateway.

use crate::config::StoreConfig;
use crate::error::{StorageError, StorageResult};
use crate::gateway::Store;
use crate::transaction::TxMode;
use crate::upgrade::install_registry;
use exambank_model::{normalize_record, Document, EntityKind, Record, Value};
use exambank_types::{RecordKey, Timestamp};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of [`Records::add_with_unique_key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No record held the unique value; a new one was added.
    Added(RecordKey),
    /// An archived record held the value; it was reclaimed and updated.
    UnarchivedAndUpdated(RecordKey),
    /// A live record holds the value. Nothing was written.
    RejectedDuplicate { existing: Option<RecordKey> },
}

/// Typed access to registered collections.
///
/// Every document is normalized against its [`EntityKind`] schema before it
/// is written and again when it is read back.
#[derive(Debug, Clone)]
pub struct Records {
    store: Arc<Store>,
}

impl Records {
    /// Opens the store and installs every registered collection.
    pub fn open(config: &StoreConfig) -> StorageResult<Self> {
        let store = Store::open(config, install_registry)?;
        Ok(Self::new(Arc::new(store)))
    }

    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Normalizes and adds a new record. Fails if its key is taken.
    pub async fn insert(&self, kind: EntityKind, raw: &Document) -> StorageResult<RecordKey> {
        let record = normalize_record(kind, raw)?;
        let collection = kind.collection_name();
        let key = self
            .store
            .transaction(&[collection], TxMode::ReadWrite, move |tx| {
                tx.add(collection, record.into_fields())
            })
            .await?;
        debug!(collection, %key, "record inserted");
        Ok(key)
    }

    /// Normalizes and writes a record, replacing any record with its key.
    pub async fn put(&self, kind: EntityKind, raw: &Document) -> StorageResult<RecordKey> {
        let record = normalize_record(kind, raw)?;
        let collection = kind.collection_name();
        self.store
            .transaction(&[collection], TxMode::ReadWrite, move |tx| {
                tx.put(collection, record.into_fields())
            })
            .await
    }

    /// Merges `patch` onto the stored record and writes the result.
    ///
    /// The key field cannot be patched. Every validator is re-checked
    /// against the merged record, not only the patched fields.
    pub async fn update(
        &self,
        kind: EntityKind,
        key: &RecordKey,
        patch: &Document,
    ) -> StorageResult<Record> {
        let collection = kind.collection_name();
        let key = key.clone();
        let patch = patch.clone();
        self.store
            .transaction(&[collection], TxMode::ReadWrite, move |tx| {
                let Some(mut doc) = tx.get(collection, &key)? else {
                    return Err(StorageError::NotFound(format!("{collection}/{key}")));
                };
                merge(kind, &mut doc, &patch);
                let record = normalize_record(kind, &doc)?;
                tx.put(collection, record.fields().clone())?;
                Ok(record)
            })
            .await
    }

    pub async fn get(&self, kind: EntityKind, key: &RecordKey) -> StorageResult<Option<Record>> {
        let collection = kind.collection_name();
        let key = key.clone();
        let doc = self
            .store
            .transaction(&[collection], TxMode::ReadOnly, move |tx| tx.get(collection, &key))
            .await?;
        doc.map(|d| normalize_record(kind, &d).map_err(Into::into))
            .transpose()
    }

    /// Every record of `kind`, in key order.
    pub async fn list(&self, kind: EntityKind) -> StorageResult<Vec<Record>> {
        let collection = kind.collection_name();
        let docs = self
            .store
            .transaction(&[collection], TxMode::ReadOnly, move |tx| tx.get_all(collection))
            .await?;
        docs.iter()
            .map(|d| normalize_record(kind, d).map_err(Into::into))
            .collect()
    }

    /// Records whose `index` equals `value`.
    pub async fn find_by_index(
        &self,
        kind: EntityKind,
        index: &str,
        value: &Value,
    ) -> StorageResult<Vec<Record>> {
        let collection = kind.collection_name();
        let index = index.to_string();
        let value = value.clone();
        let docs = self
            .store
            .transaction(&[collection], TxMode::ReadOnly, move |tx| {
                tx.index_get_all(collection, &index, &value)
            })
            .await?;
        docs.iter()
            .map(|d| normalize_record(kind, d).map_err(Into::into))
            .collect()
    }

    pub async fn delete(&self, kind: EntityKind, key: &RecordKey) -> StorageResult<bool> {
        let collection = kind.collection_name();
        let key = key.clone();
        self.store
            .transaction(&[collection], TxMode::ReadWrite, move |tx| tx.delete(collection, &key))
            .await
    }

    /// Sets the archival flag instead of deleting.
    pub async fn archive(&self, kind: EntityKind, key: &RecordKey) -> StorageResult<Record> {
        let Some(flag) = kind.archive_flag() else {
            return Err(StorageError::InvalidData(format!("{kind} records cannot be archived")));
        };
        let mut patch = Document::new();
        patch.insert(flag.to_string(), Value::Bool(true));
        self.update(kind, key, &patch).await
    }

    /// Adds a record unless a live record already holds its `unique_field`.
    ///
    /// An archived holder is reclaimed instead: the incoming fields are
    /// merged onto it, it keeps its key, and it is unarchived. Lookup and
    /// write share one transaction.
    pub async fn add_with_unique_key(
        &self,
        kind: EntityKind,
        unique_field: &str,
        raw: &Document,
    ) -> StorageResult<UpsertOutcome> {
        let collection = kind.collection_name();
        let Some(index) = kind
            .indexes()
            .iter()
            .find(|i| i.unique && i.key_path == unique_field)
        else {
            return Err(StorageError::UnknownIndex {
                collection: collection.to_string(),
                index: unique_field.to_string(),
            });
        };

        let raw = raw.clone();
        let outcome = self
            .store
            .transaction(&[collection], TxMode::ReadWrite, move |tx| {
                let existing = match raw.get(index.key_path) {
                    Some(value) => tx.index_get(collection, index.name, value)?,
                    None => None,
                };

                let Some(existing) = existing else {
                    let record = normalize_record(kind, &raw)?;
                    let key = tx.add(collection, record.into_fields())?;
                    return Ok(UpsertOutcome::Added(key));
                };

                let existing = normalize_record(kind, &existing)?;
                let (true, Some(flag)) = (existing.is_archived(), kind.archive_flag()) else {
                    return Ok(UpsertOutcome::RejectedDuplicate {
                        existing: existing.key(),
                    });
                };

                let mut merged = existing.into_fields();
                merge(kind, &mut merged, &raw);
                merged.insert(flag.to_string(), Value::Bool(false));
                let record = normalize_record(kind, &merged)?;
                let key = tx.put(collection, record.into_fields())?;
                Ok::<_, StorageError>(UpsertOutcome::UnarchivedAndUpdated(key))
            })
            .await?;

        match &outcome {
            UpsertOutcome::Added(key) => debug!(collection, %key, "record added"),
            UpsertOutcome::UnarchivedAndUpdated(key) => {
                info!(collection, %key, field = unique_field, "archived record reclaimed")
            }
            UpsertOutcome::RejectedDuplicate { existing } => {
                debug!(collection, ?existing, field = unique_field, "duplicate rejected")
            }
        }
        Ok(outcome)
    }
}

/// Copies `patch` onto `doc`, keeping its key and stamping its update time.
fn merge(kind: EntityKind, doc: &mut Document, patch: &Document) {
    for (field, value) in patch {
        if field != kind.key_path() {
            doc.insert(field.clone(), value.clone());
        }
    }
    if let Some(stamp) = kind.updated_at_field() {
        doc.insert(stamp.to_string(), Value::Int(Timestamp::now().as_millis()));
    }
}
