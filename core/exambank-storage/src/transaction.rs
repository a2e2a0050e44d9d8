//! Scoped transactions over named collections.

use crate::error::{StorageError, StorageResult};
use exambank_model::{Document, Value};
use exambank_types::RecordKey;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

/// Access mode of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone)]
pub(crate) struct IndexMeta {
    pub name: String,
    pub key_path: String,
    pub unique: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct CollectionMeta {
    pub name: String,
    pub key_path: String,
    pub auto_increment: bool,
    pub next_key: i64,
    pub indexes: Vec<IndexMeta>,
}

/// A transaction over a fixed set of collections.
///
/// Obtained from [`crate::Store::transaction`]; committed when the closure
/// returns `Ok`, rolled back otherwise. Every write is individually atomic,
/// so a failed write leaves no trace and the transaction stays usable.
pub struct Transaction<'c> {
    tx: rusqlite::Transaction<'c>,
    scope: Vec<String>,
    mode: TxMode,
}

impl<'c> Transaction<'c> {
    pub(crate) fn new(tx: rusqlite::Transaction<'c>, scope: Vec<String>, mode: TxMode) -> Self {
        Self { tx, scope, mode }
    }

    pub(crate) fn commit(self) -> StorageResult<()> {
        self.tx.commit().map_err(Into::into)
    }

    pub fn mode(&self) -> TxMode {
        self.mode
    }

    /// Fetches one document by key.
    pub fn get(&self, collection: &str, key: &RecordKey) -> StorageResult<Option<Document>> {
        self.ensure(collection, false)?;
        let data: Option<String> = self
            .tx
            .query_row(
                "SELECT data FROM eb_records WHERE collection = ?1 AND key = ?2",
                params![collection, key.encode()],
                |row| row.get(0),
            )
            .optional()?;
        data.map(|d| decode_document(&d)).transpose()
    }

    /// Every document in key order (integer keys first).
    pub fn get_all(&self, collection: &str) -> StorageResult<Vec<Document>> {
        self.ensure(collection, false)?;
        let mut stmt = self.tx.prepare(
            "SELECT data FROM eb_records WHERE collection = ?1
             ORDER BY int_key IS NULL, int_key, key",
        )?;
        let rows = stmt
            .query_map(params![collection], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        rows.iter().map(|d| decode_document(d)).collect()
    }

    pub fn count(&self, collection: &str) -> StorageResult<usize> {
        self.ensure(collection, false)?;
        let n: i64 = self.tx.query_row(
            "SELECT COUNT(*) FROM eb_records WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    /// Inserts a new document. Fails if the key is already taken.
    ///
    /// Auto-increment collections assign the next key when the key field is
    /// missing or `null`.
    pub fn add(&mut self, collection: &str, doc: Document) -> StorageResult<RecordKey> {
        self.write(collection, doc, false)
    }

    /// Inserts or replaces a document.
    pub fn put(&mut self, collection: &str, doc: Document) -> StorageResult<RecordKey> {
        self.write(collection, doc, true)
    }

    /// Deletes by key. Returns whether a document was removed.
    pub fn delete(&mut self, collection: &str, key: &RecordKey) -> StorageResult<bool> {
        self.ensure(collection, true)?;
        let sp = self.tx.savepoint()?;
        let encoded = key.encode();
        sp.execute(
            "DELETE FROM eb_index_entries WHERE collection = ?1 AND key = ?2",
            params![collection, encoded],
        )?;
        let removed = sp.execute(
            "DELETE FROM eb_records WHERE collection = ?1 AND key = ?2",
            params![collection, encoded],
        )?;
        sp.commit()?;
        Ok(removed > 0)
    }

    /// Removes every document. Returns how many were removed.
    pub fn clear(&mut self, collection: &str) -> StorageResult<usize> {
        self.ensure(collection, true)?;
        let sp = self.tx.savepoint()?;
        sp.execute(
            "DELETE FROM eb_index_entries WHERE collection = ?1",
            params![collection],
        )?;
        let removed = sp.execute(
            "DELETE FROM eb_records WHERE collection = ?1",
            params![collection],
        )?;
        sp.commit()?;
        debug!(collection, removed, "collection cleared");
        Ok(removed)
    }

    /// First document (in key order) whose indexed field equals `value`.
    pub fn index_get(
        &self,
        collection: &str,
        index: &str,
        value: &Value,
    ) -> StorageResult<Option<Document>> {
        Ok(self.index_get_all(collection, index, value)?.into_iter().next())
    }

    /// Every document whose indexed field equals `value`, in key order.
    pub fn index_get_all(
        &self,
        collection: &str,
        index: &str,
        value: &Value,
    ) -> StorageResult<Vec<Document>> {
        let meta = self.ensure(collection, false)?;
        if !meta.indexes.iter().any(|i| i.name == index) {
            return Err(StorageError::UnknownIndex {
                collection: collection.to_string(),
                index: index.to_string(),
            });
        }
        let Some(encoded) = index_value(value) else {
            return Ok(Vec::new());
        };
        let mut stmt = self.tx.prepare(
            "SELECT r.data FROM eb_index_entries e
             JOIN eb_records r ON r.collection = e.collection AND r.key = e.key
             WHERE e.collection = ?1 AND e.index_name = ?2 AND e.value = ?3
             ORDER BY r.int_key IS NULL, r.int_key, r.key",
        )?;
        let rows = stmt
            .query_map(params![collection, index, encoded], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        rows.iter().map(|d| decode_document(d)).collect()
    }

    fn ensure(&self, collection: &str, write: bool) -> StorageResult<CollectionMeta> {
        if !self.scope.iter().any(|c| c == collection) {
            return Err(StorageError::OutOfScope(collection.to_string()));
        }
        if write && self.mode == TxMode::ReadOnly {
            return Err(StorageError::ReadOnly);
        }
        load_meta(&self.tx, collection)?
            .ok_or_else(|| StorageError::UnknownCollection(collection.to_string()))
    }

    fn write(&mut self, collection: &str, mut doc: Document, overwrite: bool) -> StorageResult<RecordKey> {
        let meta = self.ensure(collection, true)?;
        let sp = self.tx.savepoint()?;

        let key = match doc.get(&meta.key_path).cloned() {
            Some(Value::Int(n)) => RecordKey::Int(n),
            Some(Value::String(s)) => RecordKey::Str(s),
            None | Some(Value::Null) if meta.auto_increment => {
                let key = RecordKey::Int(meta.next_key);
                doc.insert(meta.key_path.clone(), Value::Int(meta.next_key));
                key
            }
            None | Some(Value::Null) => {
                return Err(StorageError::InvalidData(format!(
                    "`{collection}` requires a `{}` key",
                    meta.key_path
                )));
            }
            Some(other) => {
                return Err(StorageError::InvalidData(format!(
                    "`{}` cannot be a {} key",
                    meta.key_path,
                    other.type_name()
                )));
            }
        };
        let encoded_key = key.encode();

        if let (true, Some(n)) = (meta.auto_increment, key.as_int()) {
            if n >= meta.next_key {
                sp.execute(
                    "UPDATE eb_collections SET next_key = ?1 WHERE name = ?2",
                    params![n.saturating_add(1), collection],
                )?;
            }
        }

        if !overwrite {
            let exists: bool = sp.query_row(
                "SELECT EXISTS(SELECT 1 FROM eb_records WHERE collection = ?1 AND key = ?2)",
                params![collection, encoded_key],
                |row| row.get(0),
            )?;
            if exists {
                return Err(StorageError::constraint(
                    collection,
                    format!("key {key} already exists"),
                ));
            }
        }

        let mut entries = Vec::new();
        for index in &meta.indexes {
            let Some(value) = doc.get(&index.key_path).and_then(index_value) else {
                continue;
            };
            if index.unique {
                let taken: bool = sp.query_row(
                    "SELECT EXISTS(SELECT 1 FROM eb_index_entries
                     WHERE collection = ?1 AND index_name = ?2 AND value = ?3 AND key != ?4)",
                    params![collection, index.name, value, encoded_key],
                    |row| row.get(0),
                )?;
                if taken {
                    return Err(StorageError::constraint(
                        collection,
                        format!("unique index `{}` already has {value}", index.name),
                    ));
                }
            }
            entries.push((index.name.as_str(), value));
        }

        let data = serde_json::to_string(&doc)?;
        sp.execute(
            "INSERT OR REPLACE INTO eb_records (collection, key, int_key, data) VALUES (?1, ?2, ?3, ?4)",
            params![collection, encoded_key, key.as_int(), data],
        )?;
        sp.execute(
            "DELETE FROM eb_index_entries WHERE collection = ?1 AND key = ?2",
            params![collection, encoded_key],
        )?;
        for (index_name, value) in entries {
            sp.execute(
                "INSERT OR IGNORE INTO eb_index_entries (collection, index_name, value, key)
                 VALUES (?1, ?2, ?3, ?4)",
                params![collection, index_name, value, encoded_key],
            )?;
        }
        sp.commit()?;
        Ok(key)
    }
}

pub(crate) fn load_meta(conn: &Connection, collection: &str) -> StorageResult<Option<CollectionMeta>> {
    let row = conn
        .query_row(
            "SELECT name, key_path, auto_increment, next_key FROM eb_collections WHERE name = ?1",
            params![collection],
            |row| {
                Ok(CollectionMeta {
                    name: row.get(0)?,
                    key_path: row.get(1)?,
                    auto_increment: row.get(2)?,
                    next_key: row.get(3)?,
                    indexes: Vec::new(),
                })
            },
        )
        .optional()?;
    let Some(mut meta) = row else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT name, key_path, is_unique FROM eb_indexes WHERE collection = ?1 ORDER BY name",
    )?;
    meta.indexes = stmt
        .query_map(params![meta.name], |row| {
            Ok(IndexMeta {
                name: row.get(0)?,
                key_path: row.get(1)?,
                unique: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(meta))
}

/// Canonical index encoding. `None` for values that are not indexable.
///
/// Whole floats share the integer encoding so `42` and `42.0` match.
pub(crate) fn index_value(value: &Value) -> Option<String> {
    match value {
        Value::Int(n) => Some(format!("n:{n}")),
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
            Some(format!("n:{}", *f as i64))
        }
        Value::Float(f) if f.is_finite() => Some(format!("f:{f}")),
        Value::String(s) => Some(format!("s:{s}")),
        Value::Bool(b) => Some(format!("b:{b}")),
        _ => None,
    }
}

pub(crate) fn decode_document(data: &str) -> StorageResult<Document> {
    Ok(serde_json::from_str(data)?)
}
