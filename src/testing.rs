/// Test doubles shared by the unit tests of several modules.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::apis::{ListingRequest, ListingSource};
use crate::errors::{CoinListError, RemoteFetchError, StorageError};
use crate::storage::{PersistentStore, StorageResult};
use crate::types::{CryptoRecord, ListingData, ListingResponse, PageKey, Quote, Snapshot};

/// Record with a USD quote; ids 1..=3 carry real names for search tests
pub fn make_record(id: u64, rank: u32) -> CryptoRecord {
    let (name, symbol) = match id {
        1 => ("Bitcoin".to_string(), "BTC".to_string()),
        2 => ("Ethereum".to_string(), "ETH".to_string()),
        3 => ("Wrapped Bitcoin".to_string(), "WBTC".to_string()),
        _ => (format!("Coin {:04}", id), format!("C{}", id)),
    };
    CryptoRecord {
        id,
        slug: name.to_lowercase().replace(' ', "-"),
        name,
        symbol,
        cmc_rank: rank,
        is_active: 1,
        quotes: vec![Quote {
            name: "USD".to_string(),
            price: 1000.0 / id as f64,
            market_cap: 1.0e9 / id as f64,
            ..Default::default()
        }],
        ..Default::default()
    }
}

// =============================================================================
// LISTING SOURCE
// =============================================================================

/// In-memory listing with `total` records ranked by id
pub struct MockListingSource {
    total: u64,
    total_count_override: Mutex<Option<String>>,
    fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(u32, u32)>>,
}

impl MockListingSource {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            total_count_override: Mutex::new(None),
            fail: AtomicBool::new(false),
            delay: Mutex::new(None),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Report this raw total count instead of the real one
    pub fn set_total_count(&self, raw: &str) {
        *self.total_count_override.lock() = Some(raw.to_string());
    }

    /// Sleep (tokio time) before answering
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(page, page_size)` of every request, in order
    pub fn requests(&self) -> Vec<(u32, u32)> {
        self.requests.lock().clone()
    }

    pub fn reset_calls(&self) {
        self.calls.store(0, Ordering::SeqCst);
        self.requests.lock().clear();
    }

    /// Canonical ordering the mock serves
    pub fn expected(&self, range: std::ops::Range<u64>) -> Vec<u64> {
        range.map(|i| i + 1).filter(|id| *id <= self.total).collect()
    }
}

#[async_trait]
impl ListingSource for MockListingSource {
    async fn fetch_page(&self, request: &ListingRequest) -> Result<ListingResponse, CoinListError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push((request.page, request.page_size));

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(RemoteFetchError::network("mock listing offline").into());
        }

        let first = request.start();
        let last = (first + request.page_size as u64 - 1).min(self.total);
        let records = (first..=last).map(|id| make_record(id, id as u32)).collect();
        let total_count = self
            .total_count_override
            .lock()
            .clone()
            .unwrap_or_else(|| self.total.to_string());

        Ok(ListingResponse {
            data: ListingData {
                crypto_currency_list: records,
                total_count,
            },
            status: Default::default(),
        })
    }
}

// =============================================================================
// STORE WRAPPER
// =============================================================================

/// Counts reads and writes of the wrapped store and can inject failures
pub struct CountingStore<S> {
    inner: S,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl<S> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn read(&self, operation: &'static str) -> StorageResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::query(operation, "injected read failure"));
        }
        Ok(())
    }

    fn write(&self, operation: &'static str) -> StorageResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::query(operation, "injected write failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: PersistentStore> PersistentStore for CountingStore<S> {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn put_page(
        &self,
        page: PageKey,
        records: &[CryptoRecord],
        total_count: Option<u64>,
    ) -> StorageResult<()> {
        self.write("put_page")?;
        self.inner.put_page(page, records, total_count).await
    }

    async fn get_page(&self, page: PageKey) -> StorageResult<Vec<CryptoRecord>> {
        self.read("get_page")?;
        self.inner.get_page(page).await
    }

    async fn put_snapshot(&self, items: &[CryptoRecord]) -> StorageResult<()> {
        self.write("put_snapshot")?;
        self.inner.put_snapshot(items).await
    }

    async fn get_snapshot(&self) -> StorageResult<Option<Snapshot>> {
        self.read("get_snapshot")?;
        self.inner.get_snapshot().await
    }

    async fn get_total_count(&self) -> StorageResult<Option<u64>> {
        self.read("get_total_count")?;
        self.inner.get_total_count().await
    }

    async fn get_last_updated(&self) -> StorageResult<Option<i64>> {
        self.read("get_last_updated")?;
        self.inner.get_last_updated().await
    }

    async fn count(&self) -> StorageResult<u64> {
        self.read("count")?;
        self.inner.count().await
    }

    async fn evict_pages_except(&self, page_size: u32) -> StorageResult<usize> {
        self.write("evict_pages_except")?;
        self.inner.evict_pages_except(page_size).await
    }
}
