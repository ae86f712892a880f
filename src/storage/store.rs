/// SQLite page store and the always-failing fallback used when no database opens
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;

use super::database::Database;
use super::operations;
use super::{PersistentStore, StorageResult};
use crate::errors::StorageError;
use crate::logger::{self, LogTag};
use crate::types::{CryptoRecord, PageKey, Snapshot};

// =============================================================================
// SQLITE STORE
// =============================================================================

/// SQLite-backed page store
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn open(path: &Path) -> StorageResult<Self> {
        Ok(Self {
            db: Database::open(path)?,
        })
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self {
            db: Database::open_in_memory()?,
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[async_trait]
impl PersistentStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn put_page(
        &self,
        page: PageKey,
        records: &[CryptoRecord],
        total_count: Option<u64>,
    ) -> StorageResult<()> {
        let records = records.to_vec();
        let stored = records.len();
        let now = now_ms();
        self.db
            .run("put_page", move |conn| {
                operations::save_page(conn, page, &records, total_count, now)
            })
            .await?;

        logger::debug(
            LogTag::Store,
            &format!("Stored {} records for {}", stored, page),
        );
        Ok(())
    }

    async fn get_page(&self, page: PageKey) -> StorageResult<Vec<CryptoRecord>> {
        self.db
            .run("get_page", move |conn| operations::load_page(conn, page))
            .await
    }

    async fn put_snapshot(&self, items: &[CryptoRecord]) -> StorageResult<()> {
        let items = items.to_vec();
        let now = now_ms();
        self.db
            .run("put_snapshot", move |conn| {
                operations::save_snapshot(conn, &items, now)
            })
            .await
    }

    async fn get_snapshot(&self) -> StorageResult<Option<Snapshot>> {
        self.db
            .run("get_snapshot", |conn| operations::load_snapshot(conn))
            .await
    }

    async fn get_total_count(&self) -> StorageResult<Option<u64>> {
        self.db
            .run("get_total_count", |conn| operations::load_total_count(conn))
            .await
    }

    async fn get_last_updated(&self) -> StorageResult<Option<i64>> {
        self.db
            .run("get_last_updated", |conn| operations::max_timestamp(conn))
            .await
    }

    async fn count(&self) -> StorageResult<u64> {
        self.db
            .run("count", |conn| operations::record_count(conn))
            .await
    }

    async fn evict_pages_except(&self, page_size: u32) -> StorageResult<usize> {
        let removed = self
            .db
            .run("evict_pages_except", move |conn| {
                operations::evict_other_page_sizes(conn, page_size)
            })
            .await?;
        if removed > 0 {
            logger::info(
                LogTag::Store,
                &format!(
                    "Evicted {} page rows stored under page sizes other than {}",
                    removed, page_size
                ),
            );
        }
        Ok(removed)
    }
}

// =============================================================================
// UNAVAILABLE STORE
// =============================================================================

/// Stand-in when no database could be opened; every call fails
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> StorageError {
        StorageError::Unavailable {
            reason: self.reason.clone(),
        }
    }
}

#[async_trait]
impl PersistentStore for UnavailableStore {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn put_page(
        &self,
        _page: PageKey,
        _records: &[CryptoRecord],
        _total_count: Option<u64>,
    ) -> StorageResult<()> {
        Err(self.error())
    }

    async fn get_page(&self, _page: PageKey) -> StorageResult<Vec<CryptoRecord>> {
        Err(self.error())
    }

    async fn put_snapshot(&self, _items: &[CryptoRecord]) -> StorageResult<()> {
        Err(self.error())
    }

    async fn get_snapshot(&self) -> StorageResult<Option<Snapshot>> {
        Err(self.error())
    }

    async fn get_total_count(&self) -> StorageResult<Option<u64>> {
        Err(self.error())
    }

    async fn get_last_updated(&self) -> StorageResult<Option<i64>> {
        Err(self.error())
    }

    async fn count(&self) -> StorageResult<u64> {
        Err(self.error())
    }

    async fn evict_pages_except(&self, _page_size: u32) -> StorageResult<usize> {
        Err(self.error())
    }
}
