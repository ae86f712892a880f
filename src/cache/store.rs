/// Read-through cache in front of any PersistentStore.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::config::CacheConfig;
use super::key::{CacheKey, CacheKind};
use super::read_cache::ReadCache;
use crate::logger::{self, LogTag};
use crate::storage::{PersistentStore, SqliteStore, StorageResult, UnavailableStore};
use crate::types::{CryptoRecord, PageKey, Snapshot};

/// Families each write makes stale
const PUT_PAGE_INVALIDATES: &[CacheKind] = &[
    CacheKind::Page,
    CacheKind::TotalCount,
    CacheKind::LastUpdated,
    CacheKind::RecordCount,
];
const PUT_SNAPSHOT_INVALIDATES: &[CacheKind] = &[CacheKind::Snapshot];
const EVICT_INVALIDATES: &[CacheKind] = &[
    CacheKind::Page,
    CacheKind::LastUpdated,
    CacheKind::RecordCount,
];

/// Memoizes reads of the inner store; every write invalidates the families it
/// touches, whether or not the write succeeded.
pub struct CachedStore<S> {
    inner: S,
    cache: ReadCache,
}

impl<S: PersistentStore> CachedStore<S> {
    pub fn new(inner: S, config: CacheConfig) -> Self {
        Self {
            inner,
            cache: ReadCache::new(config),
        }
    }

    pub fn cache(&self) -> &ReadCache {
        &self.cache
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: PersistentStore> PersistentStore for CachedStore<S> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn put_page(
        &self,
        page: PageKey,
        records: &[CryptoRecord],
        total_count: Option<u64>,
    ) -> StorageResult<()> {
        let result = self.inner.put_page(page, records, total_count).await;
        self.cache.invalidate_all(PUT_PAGE_INVALIDATES);
        result
    }

    async fn get_page(&self, page: PageKey) -> StorageResult<Vec<CryptoRecord>> {
        self.cache
            .memoize(CacheKey::Page(page), || self.inner.get_page(page))
            .await
    }

    async fn put_snapshot(&self, items: &[CryptoRecord]) -> StorageResult<()> {
        let result = self.inner.put_snapshot(items).await;
        self.cache.invalidate_all(PUT_SNAPSHOT_INVALIDATES);
        result
    }

    async fn get_snapshot(&self) -> StorageResult<Option<Snapshot>> {
        self.cache
            .memoize(CacheKey::Snapshot, || self.inner.get_snapshot())
            .await
    }

    async fn get_total_count(&self) -> StorageResult<Option<u64>> {
        self.cache
            .memoize(CacheKey::TotalCount, || self.inner.get_total_count())
            .await
    }

    async fn get_last_updated(&self) -> StorageResult<Option<i64>> {
        self.cache
            .memoize(CacheKey::LastUpdated, || self.inner.get_last_updated())
            .await
    }

    async fn count(&self) -> StorageResult<u64> {
        self.cache
            .memoize(CacheKey::RecordCount, || self.inner.count())
            .await
    }

    async fn evict_pages_except(&self, page_size: u32) -> StorageResult<usize> {
        let result = self.inner.evict_pages_except(page_size).await;
        self.cache.invalidate_all(EVICT_INVALIDATES);
        result
    }
}

/// Store stack handed to the engine; `cached` is kept for metrics and is `None`
/// when no database could be opened
pub struct OpenedStore {
    pub store: Arc<dyn PersistentStore>,
    pub cached: Option<Arc<CachedStore<SqliteStore>>>,
}

/// Open the SQLite store at `path` behind a read cache, or fall back to an
/// unavailable store so the engine serves remote data only
pub fn open_cached_store(path: &Path, config: CacheConfig) -> OpenedStore {
    match SqliteStore::open(path) {
        Ok(sqlite) => {
            let cached = Arc::new(CachedStore::new(sqlite, config));
            OpenedStore {
                store: cached.clone(),
                cached: Some(cached),
            }
        }
        Err(e) => {
            logger::warning(
                LogTag::Store,
                &format!(
                    "Page store at {} disabled, serving remote data only: {}",
                    path.display(),
                    e
                ),
            );
            OpenedStore {
                store: Arc::new(UnavailableStore::new(e.to_string())),
                cached: None,
            }
        }
    }
}
