//! Whole-store restore.
//!
//! Each collection is restored in its own read-write transaction: cleared,
//! then refilled record by record. A bad record is skipped and reported; a
//! collection whose transaction fails is left exactly as it was.

use crate::codec::{self, CodecError};
use crate::error::BackupResult;
use crate::restart::RestartHook;
use crate::snapshot::SnapshotDocument;
use exambank_model::{
    normalize_record, Document, EntityKind, FieldKind, Record, Schema, ValidationError, Value,
};
use exambank_storage::{StorageError, Store, TxMode};
use exambank_types::RecordKey;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a snapshot record was not restored.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("record is not a JSON object")]
    NotAnObject,

    /// A binary field carried an envelope whose payload does not decode.
    #[error("malformed binary envelope in `{field}`: {source}")]
    MalformedEnvelope { field: String, source: CodecError },

    #[error("{0}")]
    Invalid(ValidationError),

    /// The store refused the write.
    #[error("rejected by store: {0}")]
    Rejected(String),
}

/// Outcome of one snapshot record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    /// Position in the snapshot array.
    pub index: usize,
    /// The record as it appeared in the snapshot.
    pub record: serde_json::Value,
    pub result: Result<RecordKey, SkipReason>,
}

impl RecordOutcome {
    pub fn is_restored(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CollectionStatus {
    /// Cleared and refilled; `records` were written.
    Restored { records: usize },
    /// The transaction failed; the collection is unchanged.
    Failed(String),
    /// The snapshot has no entry for this collection; it is unchanged.
    NotInSnapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionReport {
    pub name: String,
    pub status: CollectionStatus,
    /// Per-record outcomes. Empty unless the collection was restored.
    pub records: Vec<RecordOutcome>,
}

impl CollectionReport {
    pub fn skipped(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.records.iter().filter(|r| !r.is_restored())
    }
}

/// What a restore did, collection by collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoreReport {
    /// Live collections, in store order.
    pub collections: Vec<CollectionReport>,
    /// Snapshot collections the store does not have.
    pub ignored: Vec<String>,
}

impl RestoreReport {
    pub fn collection(&self, name: &str) -> Option<&CollectionReport> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Records written across every collection.
    pub fn restored_count(&self) -> usize {
        self.collections
            .iter()
            .map(|c| match c.status {
                CollectionStatus::Restored { records } => records,
                _ => 0,
            })
            .sum()
    }

    pub fn skipped_count(&self) -> usize {
        self.collections.iter().map(|c| c.skipped().count()).sum()
    }

    pub fn failed(&self) -> impl Iterator<Item = &CollectionReport> {
        self.collections
            .iter()
            .filter(|c| matches!(c.status, CollectionStatus::Failed(_)))
    }

    /// True if nothing was skipped and no collection failed.
    pub fn is_clean(&self) -> bool {
        self.skipped_count() == 0 && self.failed().next().is_none()
    }
}

/// Restores snapshots into a store.
#[derive(Debug, Clone)]
pub struct Importer {
    store: Arc<Store>,
}

impl Importer {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Parses and restores snapshot text.
    pub async fn import_str(&self, text: &str) -> BackupResult<RestoreReport> {
        let snapshot = SnapshotDocument::parse(text)?;
        self.import_all(&snapshot).await
    }

    /// Reads, parses and restores a snapshot file.
    pub async fn import_file(&self, path: &Path) -> BackupResult<RestoreReport> {
        let text = tokio::fs::read_to_string(path).await?;
        info!(path = %path.display(), bytes = text.len(), "snapshot read");
        self.import_str(&text).await
    }

    /// Restores every live collection present in `snapshot`.
    pub async fn import_all(&self, snapshot: &SnapshotDocument) -> BackupResult<RestoreReport> {
        let live = self.store.list_collection_names().await?;
        let mut report = RestoreReport {
            ignored: snapshot
                .collection_names()
                .filter(|name| !live.iter().any(|l| l == name))
                .map(str::to_string)
                .collect(),
            ..RestoreReport::default()
        };
        for name in &report.ignored {
            warn!(collection = %name, "snapshot collection not in store, ignored");
        }

        for name in live {
            let Some(entries) = snapshot.get(&name) else {
                debug!(collection = %name, "not in snapshot, left untouched");
                report.collections.push(CollectionReport {
                    name,
                    status: CollectionStatus::NotInSnapshot,
                    records: Vec::new(),
                });
                continue;
            };
            report.collections.push(self.restore_collection(name, entries).await);
        }

        info!(
            restored = report.restored_count(),
            skipped = report.skipped_count(),
            failed = report.failed().count(),
            "import complete"
        );
        Ok(report)
    }

    /// Imports, then restarts the application regardless of skips.
    pub async fn restore_and_restart(
        &self,
        snapshot: &SnapshotDocument,
        hook: &dyn RestartHook,
    ) -> BackupResult<RestoreReport> {
        let report = self.import_all(snapshot).await?;
        info!("restore finished, restarting");
        hook.restart();
        Ok(report)
    }

    async fn restore_collection(&self, name: String, entries: &[serde_json::Value]) -> CollectionReport {
        let kind = EntityKind::from_collection(&name);
        let prepared: Vec<_> = entries
            .iter()
            .map(|entry| (entry.clone(), prepare(kind, entry)))
            .collect();

        let collection = name.clone();
        let result = self
            .store
            .transaction(&[name.as_str()], TxMode::ReadWrite, move |tx| {
                let cleared = tx.clear(&collection)?;
                debug!(%collection, cleared, "collection cleared for restore");

                let mut outcomes = Vec::with_capacity(prepared.len());
                for (index, (record, doc)) in prepared.into_iter().enumerate() {
                    let result = doc.and_then(|doc| {
                        tx.add(&collection, doc)
                            .map_err(|e| SkipReason::Rejected(e.to_string()))
                    });
                    outcomes.push(RecordOutcome {
                        index,
                        record,
                        result,
                    });
                }
                Ok::<_, StorageError>(outcomes)
            })
            .await;

        match result {
            Ok(records) => {
                for outcome in &records {
                    if let Err(reason) = &outcome.result {
                        warn!(collection = %name, index = outcome.index, %reason, "record skipped");
                    }
                }
                let restored = records.iter().filter(|r| r.is_restored()).count();
                info!(collection = %name, restored, total = records.len(), "collection restored");
                CollectionReport {
                    name,
                    status: CollectionStatus::Restored { records: restored },
                    records,
                }
            }
            Err(err) => {
                warn!(collection = %name, error = %err, "collection restore failed");
                CollectionReport {
                    name,
                    status: CollectionStatus::Failed(err.to_string()),
                    records: Vec::new(),
                }
            }
        }
    }
}

/// Turns a snapshot entry into a document ready to add.
fn prepare(kind: Option<EntityKind>, entry: &serde_json::Value) -> Result<Document, SkipReason> {
    let mut doc = Value::document_from_json(entry.clone()).ok_or(SkipReason::NotAnObject)?;
    match kind {
        Some(kind) => {
            decode_blob_fields(kind.schema(), &mut doc)?;
            normalize_record(kind, &doc)
                .map(Record::into_fields)
                .map_err(SkipReason::Invalid)
        }
        None => {
            for (field, value) in doc.iter_mut() {
                if let Value::String(text) = value
                    && codec::is_envelope(text)
                {
                    let decoded = decode_field(text, field)?;
                    *value = decoded;
                }
            }
            Ok(doc)
        }
    }
}

/// Decodes every envelope in a field `schema` declares binary, at any depth.
///
/// Strings without the envelope tag are left as they are; normalization
/// rejects them afterwards.
pub fn decode_blob_fields(schema: &Schema, doc: &mut Document) -> Result<(), SkipReason> {
    decode_blob_fields_at(schema, doc, "")
}

fn decode_blob_fields_at(schema: &Schema, doc: &mut Document, prefix: &str) -> Result<(), SkipReason> {
    for spec in schema.fields() {
        let Some(value) = doc.get_mut(spec.name) else {
            continue;
        };
        let path = if prefix.is_empty() {
            spec.name.to_string()
        } else {
            format!("{prefix}.{}", spec.name)
        };

        match (spec.kind, &spec.item_spec) {
            (FieldKind::Blob, _) => {
                if let Value::String(text) = value {
                    let decoded = decode_field(text, &path)?;
                    *value = decoded;
                }
            }
            (FieldKind::Array, Some(items)) => {
                if let Value::Array(elements) = value {
                    for (i, element) in elements.iter_mut().enumerate() {
                        if let Value::Object(nested) = element {
                            decode_blob_fields_at(items, nested, &format!("{path}[{i}]"))?;
                        }
                    }
                }
            }
            (FieldKind::Object, Some(items)) => {
                if let Value::Object(nested) = value {
                    decode_blob_fields_at(items, nested, &path)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn decode_field(text: &str, field: &str) -> Result<Value, SkipReason> {
    codec::decode(text)
        .map(Value::from)
        .map_err(|source| SkipReason::MalformedEnvelope {
            field: field.to_string(),
            source,
        })
}
