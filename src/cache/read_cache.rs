/// Memoization of store reads, keyed by operation and invalidated per family.

use std::future::Future;

use parking_lot::Mutex;

use super::config::CacheConfig;
use super::key::{CacheKey, CacheKind};
use super::manager::{CacheManager, CacheMetrics};
use crate::logger::{self, LogTag};
use crate::types::{CryptoRecord, Snapshot};

/// Stored form of every memoizable read result
#[derive(Debug, Clone)]
pub enum CachedValue {
    Page(Vec<CryptoRecord>),
    Snapshot(Option<Snapshot>),
    TotalCount(Option<u64>),
    LastUpdated(Option<i64>),
    RecordCount(u64),
}

/// Conversion between a read result and its cached form
pub trait Cacheable: Sized + Clone {
    fn into_cached(self) -> CachedValue;
    fn from_cached(value: CachedValue) -> Option<Self>;
}

impl Cacheable for Vec<CryptoRecord> {
    fn into_cached(self) -> CachedValue {
        CachedValue::Page(self)
    }
    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Page(records) => Some(records),
            _ => None,
        }
    }
}

impl Cacheable for Option<Snapshot> {
    fn into_cached(self) -> CachedValue {
        CachedValue::Snapshot(self)
    }
    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Snapshot(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

impl Cacheable for Option<u64> {
    fn into_cached(self) -> CachedValue {
        CachedValue::TotalCount(self)
    }
    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::TotalCount(count) => Some(count),
            _ => None,
        }
    }
}

impl Cacheable for Option<i64> {
    fn into_cached(self) -> CachedValue {
        CachedValue::LastUpdated(self)
    }
    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::LastUpdated(ts) => Some(ts),
            _ => None,
        }
    }
}

impl Cacheable for u64 {
    fn into_cached(self) -> CachedValue {
        CachedValue::RecordCount(self)
    }
    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::RecordCount(count) => Some(count),
            _ => None,
        }
    }
}

/// TTL+LRU read cache with per-family invalidation.
///
/// Each family carries a generation counter. A loader records the generation
/// before it runs and its result is only inserted if no invalidation of that
/// family happened meanwhile, so a read racing a write cannot re-insert
/// pre-write data.
pub struct ReadCache {
    entries: CacheManager<CacheKey, CachedValue>,
    generations: Mutex<[u64; CacheKind::COUNT]>,
}

impl ReadCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: CacheManager::new(config),
            generations: Mutex::new([0; CacheKind::COUNT]),
        }
    }

    pub fn get<T: Cacheable>(&self, key: &CacheKey) -> Option<T> {
        self.entries.get(key).and_then(T::from_cached)
    }

    /// Serve `key` from memory or run `loader` and remember its result.
    ///
    /// Loader errors are returned as-is and never cached.
    pub async fn memoize<T, E, F, Fut>(&self, key: CacheKey, loader: F) -> Result<T, E>
    where
        T: Cacheable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get::<T>(&key) {
            return Ok(value);
        }

        let kind = key.kind();
        let started_at = self.generation(kind);
        let value = loader().await?;

        let admitted = self.entries.insert_if(key, value.clone().into_cached(), || {
            self.generations.lock()[kind.index()] == started_at
        });
        if !admitted {
            logger::verbose(
                LogTag::Cache,
                &format!("Dropped result of {} (invalidated while loading)", key),
            );
        }

        Ok(value)
    }

    /// Drop every entry of one operation family.
    ///
    /// The generation is bumped and released before the entries lock is taken;
    /// `memoize` takes them in the opposite order (generation check under the
    /// entries lock). A load admitted between the bump and the removal is
    /// rejected by the bump, one admitted before it is removed.
    pub fn invalidate(&self, kind: CacheKind) {
        self.generations.lock()[kind.index()] += 1;
        let removed = self.entries.remove_where(|key| key.kind() == kind);

        if removed > 0 {
            logger::debug(
                LogTag::Cache,
                &format!("Invalidated {} {} entries", removed, kind.as_str()),
            );
        }
    }

    pub fn invalidate_all(&self, kinds: &[CacheKind]) {
        for kind in kinds {
            self.invalidate(*kind);
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.entries.metrics()
    }

    fn generation(&self, kind: CacheKind) -> u64 {
        self.generations.lock()[kind.index()]
    }
}

impl Default for ReadCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageKey;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_memoize_calls_loader_once_within_ttl() {
        let cache = ReadCache::default();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..3 {
            let value: Result<u64, String> = cache
                .memoize(CacheKey::RecordCount, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await;
            assert_eq!(value, Ok(42));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.metrics().hits, 2);
    }

    #[tokio::test]
    async fn test_expired_entry_reloads() {
        let cache = ReadCache::new(CacheConfig::custom(Duration::from_millis(10), 16));
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let load = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(Some(7u64))
        };

        cache.memoize(CacheKey::TotalCount, load).await.unwrap();
        std::thread::sleep(Duration::from_millis(25));
        cache.memoize(CacheKey::TotalCount, load).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = ReadCache::default();
        let first: Result<u64, String> = cache
            .memoize(CacheKey::RecordCount, || async { Err("boom".to_string()) })
            .await;
        assert!(first.is_err());
        assert!(cache.is_empty());

        let second: Result<u64, String> =
            cache.memoize(CacheKey::RecordCount, || async { Ok(3) }).await;
        assert_eq!(second, Ok(3));
    }

    #[tokio::test]
    async fn test_invalidate_drops_only_that_family() {
        let cache = ReadCache::default();
        let page_a = CacheKey::Page(PageKey::new(0, 10));
        let page_b = CacheKey::Page(PageKey::new(1, 10));

        cache
            .memoize(page_a, || async { Ok::<_, String>(Vec::<CryptoRecord>::new()) })
            .await
            .unwrap();
        cache
            .memoize(page_b, || async { Ok::<_, String>(Vec::<CryptoRecord>::new()) })
            .await
            .unwrap();
        cache
            .memoize(CacheKey::Snapshot, || async { Ok::<_, String>(None::<Snapshot>) })
            .await
            .unwrap();
        assert_eq!(cache.len(), 3);

        cache.invalidate(CacheKind::Page);
        assert_eq!(cache.len(), 1);
        assert!(cache.get::<Option<Snapshot>>(&CacheKey::Snapshot).is_some());
        assert!(cache.get::<Vec<CryptoRecord>>(&page_a).is_none());
    }

    #[tokio::test]
    async fn test_loader_racing_invalidation_is_not_inserted() {
        let cache = ReadCache::default();
        let writer = &cache;

        let value: Result<u64, String> = cache
            .memoize(CacheKey::RecordCount, move || async move {
                // a write lands while this read is in flight
                writer.invalidate(CacheKind::RecordCount);
                Ok(1)
            })
            .await;

        assert_eq!(value, Ok(1));
        assert!(cache.get::<u64>(&CacheKey::RecordCount).is_none());
    }

    #[test]
    fn test_concurrent_memoize_and_invalidate_make_progress() {
        use std::sync::{mpsc, Arc};

        const ROUNDS: u32 = 2_000;
        let cache = Arc::new(ReadCache::new(CacheConfig::custom(Duration::from_secs(30), 64)));
        let (done_tx, done_rx) = mpsc::channel();

        for worker in 0..4u32 {
            let cache = cache.clone();
            let done = done_tx.clone();
            std::thread::spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .unwrap();
                runtime.block_on(async {
                    for round in 0..ROUNDS {
                        let key = CacheKey::Page(PageKey::new(worker * ROUNDS + round, 10));
                        cache
                            .memoize(key, || async { Ok::<_, String>(Vec::<CryptoRecord>::new()) })
                            .await
                            .unwrap();
                    }
                });
                done.send(()).unwrap();
            });
        }
        for _ in 0..4 {
            let cache = cache.clone();
            let done = done_tx.clone();
            std::thread::spawn(move || {
                for _ in 0..ROUNDS {
                    cache.invalidate(CacheKind::Page);
                }
                done.send(()).unwrap();
            });
        }
        drop(done_tx);

        for _ in 0..8 {
            done_rx
                .recv_timeout(Duration::from_secs(20))
                .expect("cache workers stalled");
        }
    }
}
