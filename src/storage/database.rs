/// SQLite connection handling for the page store.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::Connection;

use super::schema::{latest_version, MIGRATIONS};
use crate::errors::StorageError;
use crate::logger::{self, LogTag};

/// Shared SQLite connection with the schema migrated to the latest version
#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

/// Configure connection for concurrent readers and short lock waits
fn configure_connection(connection: &Connection, on_disk: bool) -> Result<(), rusqlite::Error> {
    if on_disk {
        connection.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        connection.pragma_update(None, "synchronous", "NORMAL")?;
    }
    connection.pragma_update(None, "temp_store", "memory")?;
    connection.pragma_update(None, "cache_size", 10000)?;
    connection.busy_timeout(Duration::from_millis(5_000))?;
    Ok(())
}

impl Database {
    /// Open (or create) the database file and bring its schema up to date
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StorageError::Unavailable {
                    reason: format!("cannot create {}: {}", parent.display(), e),
                })?;
            }
        }

        let connection = Connection::open(path).map_err(|e| StorageError::Unavailable {
            reason: format!("cannot open {}: {}", path.display(), e),
        })?;
        configure_connection(&connection, true)
            .map_err(|e| StorageError::from_sqlite("configure", e))?;

        let database = Self {
            connection: Arc::new(Mutex::new(connection)),
            path: Some(path.to_path_buf()),
        };
        database.migrate()?;

        logger::debug(
            LogTag::Store,
            &format!("Opened page store at {}", path.display()),
        );
        Ok(database)
    }

    /// Private in-memory database (tests and `--no-store` runs)
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let connection = Connection::open_in_memory().map_err(|e| StorageError::Unavailable {
            reason: format!("cannot open in-memory database: {}", e),
        })?;
        configure_connection(&connection, false)
            .map_err(|e| StorageError::from_sqlite("configure", e))?;

        let database = Self {
            connection: Arc::new(Mutex::new(connection)),
            path: None,
        };
        database.migrate()?;
        Ok(database)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` with exclusive access to the connection.
    ///
    /// Never call this across an await point; the closure is synchronous.
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut connection = self.connection.lock();
        f(&mut connection)
    }

    /// Run `f` on the blocking pool so SQLite work never stalls a runtime worker
    pub async fn run<T, F>(&self, operation: &'static str, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || db.with_connection(f))
            .await
            .map_err(|e| StorageError::query(operation, format!("task join error: {}", e)))?
    }

    pub fn schema_version(&self) -> Result<u32, StorageError> {
        self.with_connection(|conn| read_user_version(conn))
    }

    /// Apply every migration newer than the stored user_version
    pub fn migrate(&self) -> Result<(), StorageError> {
        self.with_connection(|conn| {
            let current = read_user_version(conn)?;
            if current >= latest_version() {
                return Ok(());
            }

            for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
                let fail = |e: rusqlite::Error| StorageError::Migration {
                    version: migration.version,
                    reason: e.to_string(),
                };

                let tx = conn.transaction().map_err(fail)?;
                for statement in migration.statements {
                    tx.execute_batch(statement).map_err(fail)?;
                }
                tx.pragma_update(None, "user_version", migration.version)
                    .map_err(fail)?;
                tx.commit().map_err(fail)?;

                logger::info(
                    LogTag::Store,
                    &format!("Migrated page store schema to v{}", migration.version),
                );
            }
            Ok(())
        })
    }
}

fn read_user_version(conn: &Connection) -> Result<u32, StorageError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get::<_, u32>(0))
        .map_err(|e| StorageError::from_sqlite("read schema version", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_database_is_migrated() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.schema_version().unwrap(), latest_version());
        assert!(db.path().is_none());
    }

    #[test]
    fn test_reopen_keeps_schema_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("listing.db");

        {
            let db = Database::open(&path).unwrap();
            db.with_connection(|conn| {
                conn.execute(
                    "INSERT INTO meta (key, value, timestamp) VALUES ('k', '1', 5)",
                    [],
                )
                .map_err(|e| StorageError::query("insert", e))
            })
            .unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.schema_version().unwrap(), latest_version());
        let count: i64 = db
            .with_connection(|conn| {
                conn.query_row("SELECT COUNT(*) FROM meta", [], |row| row.get(0))
                    .map_err(|e| StorageError::query("count", e))
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_migration_from_v1_adds_page_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.db");
        {
            let conn = Connection::open(&path).unwrap();
            for statement in MIGRATIONS[0].statements {
                conn.execute_batch(statement).unwrap();
            }
            conn.pragma_update(None, "user_version", 1).unwrap();
            conn.execute(
                "INSERT INTO records (id, cmc_rank, name, symbol, data, timestamp) VALUES (1, 1, 'Bitcoin', 'BTC', '{}', 10)",
                [],
            )
            .unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.schema_version().unwrap(), 2);
        let records: i64 = db
            .with_connection(|conn| {
                conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
                    .map_err(|e| StorageError::query("count", e))
            })
            .unwrap();
        assert_eq!(records, 1);
    }
}
