//! The process-scoped store handle.

use crate::config::StoreConfig;
use crate::error::{StorageError, StorageResult};
use crate::transaction::{Transaction, TxMode};
use crate::upgrade::Upgrade;
use rusqlite::{Connection, OpenFlags, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const INFRA_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS eb_collections (
        name TEXT PRIMARY KEY,
        key_path TEXT NOT NULL,
        auto_increment INTEGER NOT NULL,
        next_key INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS eb_indexes (
        collection TEXT NOT NULL,
        name TEXT NOT NULL,
        key_path TEXT NOT NULL,
        is_unique INTEGER NOT NULL,
        PRIMARY KEY (collection, name)
    );

    CREATE TABLE IF NOT EXISTS eb_records (
        collection TEXT NOT NULL,
        key TEXT NOT NULL,
        int_key INTEGER,
        data TEXT NOT NULL,
        PRIMARY KEY (collection, key)
    );

    CREATE TABLE IF NOT EXISTS eb_index_entries (
        collection TEXT NOT NULL,
        index_name TEXT NOT NULL,
        value TEXT NOT NULL,
        key TEXT NOT NULL,
        PRIMARY KEY (collection, index_name, value, key)
    );
";

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    /// Shared-cache URI; kept alive by the writer connection.
    Memory(String),
}

/// Handle to an open store.
///
/// Create one at startup, share it as `Arc<Store>`, and drop it at teardown.
pub struct Store {
    name: String,
    location: Location,
    writer: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Opens (or creates) the store described by `config`.
    ///
    /// When the stored schema version is below `config.version`, `upgrade`
    /// runs once inside a write transaction with `(old, new)` versions.
    pub fn open<F>(config: &StoreConfig, upgrade: F) -> StorageResult<Self>
    where
        F: FnOnce(&Upgrade<'_>, u32, u32) -> StorageResult<()>,
    {
        config.validate()?;
        let location = match &config.path {
            Some(path) => Location::File(path.clone()),
            None => Location::Memory(format!(
                "file:exambank-{}?mode=memory&cache=shared",
                uuid::Uuid::new_v4().simple()
            )),
        };

        let mut conn = match &location {
            Location::File(path) => {
                let conn = open_file(path)?;
                let mode: String =
                    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
                debug!(journal_mode = %mode, "file store journal mode");
                conn
            }
            Location::Memory(uri) => Connection::open_with_flags(
                uri,
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?,
        };
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(INFRA_SCHEMA)?;

        let found: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if found > config.version {
            return Err(StorageError::VersionDowngrade {
                found,
                requested: config.version,
            });
        }
        if found < config.version {
            info!(store = %config.name, from = found, to = config.version, "upgrading store");
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            upgrade(&Upgrade::new(&tx), found, config.version)?;
            tx.pragma_update(None, "user_version", config.version)?;
            tx.commit()?;
        }

        debug!(store = %config.name, location = ?location, "store opened");
        Ok(Self {
            name: config.name.clone(),
            location,
            writer: Arc::new(Mutex::new(conn)),
        })
    }

    /// Store identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Database file, if the store is file-backed.
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory(_) => None,
        }
    }

    /// Runs `f` in a transaction scoped to `collections`.
    ///
    /// `Ok` commits every effect of `f` together; `Err` rolls all of them
    /// back. Read-write transactions are serialized; read-only ones are not.
    /// `f` runs on the blocking pool, never on a runtime worker.
    pub async fn transaction<T, E, F>(
        &self,
        collections: &[&str],
        mode: TxMode,
        f: F,
    ) -> Result<T, E>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StorageError> + Send + 'static,
    {
        let scope: Vec<String> = collections.iter().map(|c| (*c).to_string()).collect();
        let task = match mode {
            TxMode::ReadWrite => {
                let mut conn = Arc::clone(&self.writer).lock_owned().await;
                tokio::task::spawn_blocking(move || {
                    let tx = conn
                        .transaction_with_behavior(TransactionBehavior::Immediate)
                        .map_err(StorageError::from)?;
                    run_scoped(tx, scope, mode, f)
                })
            }
            TxMode::ReadOnly => {
                let location = self.location.clone();
                tokio::task::spawn_blocking(move || {
                    let mut conn = open_reader(&location)?;
                    let tx = conn
                        .transaction_with_behavior(TransactionBehavior::Deferred)
                        .map_err(StorageError::from)?;
                    run_scoped(tx, scope, mode, f)
                })
            }
        };
        join(task).await?
    }

    /// Names of every collection, sorted.
    pub async fn list_collection_names(&self) -> StorageResult<Vec<String>> {
        let location = self.location.clone();
        join(tokio::task::spawn_blocking(move || -> StorageResult<Vec<String>> {
            let conn = open_reader(&location)?;
            let mut stmt = conn.prepare("SELECT name FROM eb_collections ORDER BY name")?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(names)
        }))
        .await?
    }
}

fn run_scoped<T, E, F>(
    tx: rusqlite::Transaction<'_>,
    scope: Vec<String>,
    mode: TxMode,
    f: F,
) -> Result<T, E>
where
    F: FnOnce(&mut Transaction<'_>) -> Result<T, E>,
    E: From<StorageError>,
{
    let mut scoped = Transaction::new(tx, scope, mode);
    let out = f(&mut scoped)?;
    scoped.commit()?;
    Ok(out)
}

/// Waits for a blocking store task. A panic inside it is resumed here.
async fn join<T>(task: JoinHandle<T>) -> StorageResult<T> {
    match task.await {
        Ok(out) => Ok(out),
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(StorageError::Task(e.to_string())),
    }
}

fn open_reader(location: &Location) -> StorageResult<Connection> {
    let conn = match location {
        Location::File(path) => Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?,
        // Shared-cache memory databases are attached read-write and
        // locked down with `query_only` instead.
        Location::Memory(uri) => {
            let conn = Connection::open_with_flags(
                uri,
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            conn.pragma_update(None, "query_only", true)?;
            conn
        }
    };
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(conn)
}

/// Opens a SQLite database file.
///
/// A leftover `<db>-wal` holds committed transactions that were never
/// checkpointed. SQLite replays it on open, so it is never removed here; a
/// failed open is reported as is.
fn open_file(path: &Path) -> StorageResult<Connection> {
    Connection::open(path).map_err(|err| {
        let mut wal = path.as_os_str().to_owned();
        wal.push("-wal");
        warn!(
            path = %path.display(),
            wal_present = Path::new(&wal).exists(),
            error = %err,
            "SQLite open failed"
        );
        err.into()
    })
}
