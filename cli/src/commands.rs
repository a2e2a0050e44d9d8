//! Command implementations. Each writes its human-readable output to `out`.

use anyhow::{anyhow, bail, Context, Result};
use exambank_backup::{
    codec, decode_blob_fields, CollectionStatus, Exporter, Importer, RestartHook, RestoreReport,
    SnapshotDocument,
};
use exambank_model::{BinaryPayload, EntityKind, Value};
use exambank_storage::{Records, StorageError, TxMode, UpsertOutcome};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Prints every collection with its record count.
pub async fn collections(records: &Records, out: &mut impl Write) -> Result<()> {
    let store = records.store();
    for name in store.list_collection_names().await? {
        let collection = name.clone();
        let count = store
            .transaction(&[name.as_str()], TxMode::ReadOnly, move |tx| tx.count(&collection))
            .await?;
        writeln!(out, "{name}\t{count}")?;
    }
    Ok(())
}

/// Prints a collection as a JSON array, binaries as envelopes.
pub async fn list(records: &Records, collection: &str, out: &mut impl Write) -> Result<()> {
    let name = collection.to_string();
    let docs = records
        .store()
        .transaction(&[collection], TxMode::ReadOnly, move |tx| tx.get_all(&name))
        .await?;
    let json: Vec<serde_json::Value> = docs
        .into_iter()
        .map(|doc| {
            Value::Object(doc).to_json_with(&mut |payload: &BinaryPayload| {
                serde_json::Value::String(codec::encode_payload(payload))
            })
        })
        .collect();
    writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?;
    Ok(())
}

/// Adds one record from JSON text.
///
/// Binary fields take `data:<media-type>;base64,<payload>` envelopes.
/// Kinds with an archival flag and a unique index go through the
/// uniqueness-checked upsert, so re-adding an archived examiner reclaims it.
pub async fn add(records: &Records, collection: &str, json: &str, out: &mut impl Write) -> Result<()> {
    let Some(kind) = EntityKind::from_collection(collection) else {
        bail!("unknown collection `{collection}`");
    };
    let raw = serde_json::from_str(json).context("record is not valid JSON")?;
    let Some(mut raw) = Value::document_from_json(raw) else {
        bail!("record must be a JSON object");
    };
    decode_blob_fields(kind.schema(), &mut raw)
        .map_err(|e| anyhow!("invalid {kind} record: {e}"))?;

    let unique = kind.indexes().iter().find(|i| i.unique);
    match (unique, kind.archive_flag()) {
        (Some(index), Some(_)) => {
            match records.add_with_unique_key(kind, index.key_path, &raw).await? {
                UpsertOutcome::Added(key) => writeln!(out, "added {collection}/{key}")?,
                UpsertOutcome::UnarchivedAndUpdated(key) => {
                    writeln!(out, "restored archived {collection}/{key}")?
                }
                UpsertOutcome::RejectedDuplicate { existing } => {
                    let holder = existing.map(|k| k.to_string()).unwrap_or_default();
                    bail!("{collection}/{holder} already uses this `{}`", index.key_path);
                }
            }
        }
        _ => {
            let key = if kind.auto_increment() {
                records.insert(kind, &raw).await
            } else {
                records.put(kind, &raw).await
            };
            match key {
                Ok(key) => writeln!(out, "added {collection}/{key}")?,
                Err(StorageError::Validation(e)) => bail!("invalid {kind} record: {e}"),
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(())
}

/// Writes a snapshot into `dir` and prints its path.
pub async fn export(records: &Records, dir: &Path, out: &mut impl Write) -> Result<PathBuf> {
    let path = Exporter::new(records.store().clone())
        .export_to_dir(dir)
        .await
        .with_context(|| format!("export to {} failed", dir.display()))?;
    writeln!(out, "{}", path.display())?;
    Ok(path)
}

/// Restores a snapshot file, runs `hook` if given, then prints a summary.
pub async fn import(
    records: &Records,
    file: &Path,
    hook: Option<&dyn RestartHook>,
    out: &mut impl Write,
) -> Result<RestoreReport> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let snapshot = SnapshotDocument::parse(&text)
        .with_context(|| format!("{} is not a valid snapshot", file.display()))?;

    let importer = Importer::new(records.store().clone());
    let report = match hook {
        Some(hook) => importer.restore_and_restart(&snapshot, hook).await?,
        None => importer.import_all(&snapshot).await?,
    };
    print_report(&report, out)?;
    Ok(report)
}

pub fn print_report(report: &RestoreReport, out: &mut impl Write) -> Result<()> {
    for collection in &report.collections {
        match &collection.status {
            CollectionStatus::Restored { records } => {
                writeln!(out, "{}: {records} restored", collection.name)?;
                for skipped in collection.skipped() {
                    if let Err(reason) = &skipped.result {
                        writeln!(out, "  #{} skipped: {reason}", skipped.index)?;
                    }
                }
            }
            CollectionStatus::Failed(reason) => {
                writeln!(out, "{}: FAILED ({reason})", collection.name)?
            }
            CollectionStatus::NotInSnapshot => {
                writeln!(out, "{}: not in snapshot, unchanged", collection.name)?
            }
        }
    }
    for name in &report.ignored {
        writeln!(out, "{name}: not in store, ignored")?;
    }
    writeln!(
        out,
        "{} restored, {} skipped",
        report.restored_count(),
        report.skipped_count()
    )?;
    Ok(())
}
