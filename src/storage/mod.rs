/// Persistent page store
///
/// Durable storage of listing pages keyed by `(page index, page size)`, plus the
/// named metadata records (top-of-list snapshot, total count). Backed by SQLite;
/// an always-failing implementation lets callers degrade to remote-only mode.
mod database;
mod operations;
mod schema;
mod store;

use async_trait::async_trait;

use crate::errors::StorageError;
use crate::types::{CryptoRecord, PageKey, Snapshot};

pub use database::Database;
pub use schema::{latest_version, META_SNAPSHOT_KEY, META_TOTAL_COUNT_KEY};
pub use store::{SqliteStore, UnavailableStore};

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait PersistentStore: Send + Sync {
    /// Short name for log lines
    fn name(&self) -> &'static str;

    /// Upsert the records of `page` (stamped now) and, if given, the total count
    async fn put_page(
        &self,
        page: PageKey,
        records: &[CryptoRecord],
        total_count: Option<u64>,
    ) -> StorageResult<()>;

    /// Records of `page` in remote order; empty when the page was never stored
    async fn get_page(&self, page: PageKey) -> StorageResult<Vec<CryptoRecord>>;

    async fn put_snapshot(&self, items: &[CryptoRecord]) -> StorageResult<()>;

    async fn get_snapshot(&self) -> StorageResult<Option<Snapshot>>;

    async fn get_total_count(&self) -> StorageResult<Option<u64>>;

    /// Max write timestamp across stored records, epoch milliseconds
    async fn get_last_updated(&self) -> StorageResult<Option<i64>>;

    /// Number of stored records
    async fn count(&self) -> StorageResult<u64>;

    /// Remove pages stored under any other page size; returns removed page rows
    async fn evict_pages_except(&self, page_size: u32) -> StorageResult<usize>;
}
