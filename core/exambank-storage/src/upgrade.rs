//! Upgrade-time collection and index creation.

use crate::error::{StorageError, StorageResult};
use crate::transaction::{decode_document, index_value, load_meta};
use exambank_model::EntityKind;
use rusqlite::{params, Connection};
use tracing::info;

/// How a collection assigns keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionOptions {
    /// Field holding the key inside each document.
    pub key_path: String,
    /// Assign sequential integer keys when the key field is missing.
    pub auto_increment: bool,
}

impl CollectionOptions {
    pub fn auto(key_path: &str) -> Self {
        Self {
            key_path: key_path.to_string(),
            auto_increment: true,
        }
    }

    pub fn keyed(key_path: &str) -> Self {
        Self {
            key_path: key_path.to_string(),
            auto_increment: false,
        }
    }
}

/// An index on one top-level field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOptions {
    pub name: String,
    pub key_path: String,
    pub unique: bool,
}

/// Handle passed to the upgrade callback of [`crate::Store::open`].
pub struct Upgrade<'a> {
    conn: &'a Connection,
}

impl<'a> Upgrade<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn collection_exists(&self, name: &str) -> StorageResult<bool> {
        Ok(load_meta(self.conn, name)?.is_some())
    }

    /// Creates a collection. Returns `false` if it already existed.
    pub fn create_collection(&self, name: &str, options: &CollectionOptions) -> StorageResult<bool> {
        let created = self.conn.execute(
            "INSERT OR IGNORE INTO eb_collections (name, key_path, auto_increment, next_key)
             VALUES (?1, ?2, ?3, 1)",
            params![name, options.key_path, options.auto_increment],
        )?;
        if created > 0 {
            info!(collection = name, "collection created");
        }
        Ok(created > 0)
    }

    /// Creates an index and backfills it from existing documents.
    ///
    /// Returns `false` if an index with that name already existed.
    pub fn create_index(&self, collection: &str, options: &IndexOptions) -> StorageResult<bool> {
        if !self.collection_exists(collection)? {
            return Err(StorageError::UnknownCollection(collection.to_string()));
        }
        let created = self.conn.execute(
            "INSERT OR IGNORE INTO eb_indexes (collection, name, key_path, is_unique)
             VALUES (?1, ?2, ?3, ?4)",
            params![collection, options.name, options.key_path, options.unique],
        )?;
        if created == 0 {
            return Ok(false);
        }

        let mut stmt = self
            .conn
            .prepare("SELECT key, data FROM eb_records WHERE collection = ?1")?;
        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        for (key, data) in rows {
            let doc = decode_document(&data)?;
            let Some(value) = doc.get(&options.key_path).and_then(index_value) else {
                continue;
            };
            if options.unique {
                let taken: bool = self.conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM eb_index_entries
                     WHERE collection = ?1 AND index_name = ?2 AND value = ?3)",
                    params![collection, options.name, value],
                    |row| row.get(0),
                )?;
                if taken {
                    return Err(StorageError::ConstraintViolation {
                        collection: collection.to_string(),
                        detail: format!("existing documents repeat {value} under `{}`", options.name),
                    });
                }
            }
            self.conn.execute(
                "INSERT OR IGNORE INTO eb_index_entries (collection, index_name, value, key)
                 VALUES (?1, ?2, ?3, ?4)",
                params![collection, options.name, value, key],
            )?;
        }
        info!(collection, index = %options.name, "index created");
        Ok(true)
    }
}

/// Upgrade callback creating every registered collection and its indexes.
pub fn install_registry(upgrade: &Upgrade<'_>, old_version: u32, new_version: u32) -> StorageResult<()> {
    info!(old_version, new_version, "installing entity registry");
    for kind in EntityKind::ALL {
        let options = if kind.auto_increment() {
            CollectionOptions::auto(kind.key_path())
        } else {
            CollectionOptions::keyed(kind.key_path())
        };
        upgrade.create_collection(kind.collection_name(), &options)?;
        for index in kind.indexes() {
            upgrade.create_index(
                kind.collection_name(),
                &IndexOptions {
                    name: index.name.to_string(),
                    key_path: index.key_path.to_string(),
                    unique: index.unique,
                },
            )?;
        }
    }
    Ok(())
}
