//! Whole-store export.

use crate::codec;
use crate::error::BackupResult;
use crate::snapshot::SnapshotDocument;
use chrono::{DateTime, Utc};
use exambank_model::{BinaryPayload, Document, Value};
use exambank_storage::{Store, TxMode};
use futures::future::{BoxFuture, FutureExt};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

/// Builds snapshots of every collection in a store.
#[derive(Debug, Clone)]
pub struct Exporter {
    store: Arc<Store>,
}

impl Exporter {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Snapshots every collection, one read-only transaction each.
    ///
    /// Collections appear in name order; empty ones export as `[]`.
    pub async fn export_all(&self) -> BackupResult<SnapshotDocument> {
        let mut snapshot = SnapshotDocument::new();
        for name in self.store.list_collection_names().await? {
            let collection = name.clone();
            let docs = self
                .store
                .transaction(&[name.as_str()], TxMode::ReadOnly, move |tx| {
                    tx.get_all(&collection)
                })
                .await?;

            let mut records = Vec::with_capacity(docs.len());
            for doc in &docs {
                records.push(document_to_json(doc).await?);
            }
            debug!(collection = %name, records = records.len(), "collection exported");
            snapshot.insert(name, records);
        }
        info!(
            store = self.store.name(),
            collections = snapshot.len(),
            records = snapshot.record_count(),
            "export complete"
        );
        Ok(snapshot)
    }

    /// Exports and writes the snapshot into `dir`. Returns the file path.
    pub async fn export_to_dir(&self, dir: &Path) -> BackupResult<PathBuf> {
        let snapshot = self.export_all().await?;
        let text = snapshot.to_string_pretty()?;

        fs::create_dir_all(dir).await?;
        let path = dir.join(snapshot_file_name(self.store.name(), Utc::now()));
        fs::write(&path, text).await?;
        info!(path = %path.display(), "snapshot written");
        Ok(path)
    }
}

/// `<store>-backup-<YYYYMMDD-HHMMSS>.json`, in UTC.
pub fn snapshot_file_name(store_name: &str, at: DateTime<Utc>) -> String {
    format!("{store_name}-backup-{}.json", at.format("%Y%m%d-%H%M%S"))
}

async fn document_to_json(doc: &Document) -> io::Result<serde_json::Value> {
    let mut object = serde_json::Map::with_capacity(doc.len());
    for (field, value) in doc {
        object.insert(field.clone(), value_to_json(value).await?);
    }
    Ok(serde_json::Value::Object(object))
}

fn value_to_json(value: &Value) -> BoxFuture<'_, io::Result<serde_json::Value>> {
    async move {
        let json = match value {
            Value::Blob(payload) => serde_json::Value::String(
                codec::encode(&payload.media_type, payload.bytes.as_slice()).await?,
            ),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(value_to_json(item).await?);
                }
                serde_json::Value::Array(out)
            }
            Value::Object(doc) => document_to_json(doc).await?,
            scalar => scalar.to_json_with(&mut |_: &BinaryPayload| serde_json::Value::Null),
        };
        Ok(json)
    }
    .boxed()
}
