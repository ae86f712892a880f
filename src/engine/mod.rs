/// Paging/window engine
///
/// Reconciles the persistent page store, the remote listing source and the
/// UI-facing window of records:
///
/// - `fetch_initial_data`: paint cached data instantly, then fetch fresh
/// - `go_to_page` / `set_page_size` / `show_more`: move or grow the window,
///   reading stored pages first and fetching only what is missing
/// - `set_search_term`: synchronous local filter over the loaded records
/// - `refresh_data` / auto-refresh timer: re-fetch the window in the background
///
/// No action returns an error; failures are recorded in [`EngineState::error`].
/// State lives behind a `parking_lot::RwLock` that is never held across an await.
mod refresh;
pub mod search;
mod state;
mod window;


use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};

use crate::apis::{ListingDefaults, ListingSource};
use crate::config::{Config, EngineConfig};
use crate::errors::StorageError;
use crate::logger::{self, LogTag};
use crate::storage::PersistentStore;
use crate::types::{CryptoRecord, PageKey};

pub use refresh::RefreshTimer;
pub use state::{EngineState, Phase};
pub use window::{covering_pages, LoadMode, LoadedWindow};

/// Everything the engine takes from configuration
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub engine: EngineConfig,
    pub evict_on_page_size_change: bool,
    pub listing: ListingDefaults,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            engine: config.engine.clone(),
            evict_on_page_size_change: config.storage.evict_on_page_size_change,
            listing: ListingDefaults::from_config(&config.api),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct Engine {
    store: Arc<dyn PersistentStore>,
    source: Arc<dyn ListingSource>,
    config: EngineConfig,
    evict_on_page_size_change: bool,
    listing: ListingDefaults,
    state: RwLock<EngineState>,
    /// Bumped by every navigation; stale results are not applied
    view_epoch: AtomicU64,
    refreshes_in_flight: AtomicUsize,
    timer: Mutex<Option<RefreshTimer>>,
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

impl Engine {
    pub fn new(
        store: Arc<dyn PersistentStore>,
        source: Arc<dyn ListingSource>,
        settings: EngineSettings,
    ) -> Arc<Self> {
        let config = settings.engine;
        let page_size = config.clamp_page_size(config.page_size);
        let displayed_count = config.clamp_displayed_count(config.displayed_count);

        Arc::new(Self {
            store,
            source,
            evict_on_page_size_change: settings.evict_on_page_size_change,
            listing: settings.listing,
            state: RwLock::new(EngineState::new(page_size, displayed_count)),
            config,
            view_epoch: AtomicU64::new(0),
            refreshes_in_flight: AtomicUsize::new(0),
            timer: Mutex::new(None),
        })
    }

    // =========================================================================
    // READ SURFACE
    // =========================================================================

    /// Consistent copy of the whole state
    pub fn state(&self) -> EngineState {
        self.state.read().clone()
    }

    pub fn phase(&self) -> Phase {
        self.state.read().phase
    }

    pub fn filtered_cryptos(&self) -> Vec<CryptoRecord> {
        self.state.read().filtered_cryptos.clone()
    }

    pub fn total_pages(&self) -> u32 {
        self.state.read().total_pages()
    }

    pub fn visible_page_range(&self, max_visible: u32) -> std::ops::RangeInclusive<u32> {
        self.state.read().visible_page_range(max_visible)
    }

    pub fn showing_count(&self) -> usize {
        self.state.read().showing_count()
    }

    pub fn has_more(&self) -> bool {
        self.state.read().has_more(self.config.max_displayed_count)
    }

    pub fn is_stale(&self, max_age: std::time::Duration) -> bool {
        self.state.read().is_stale(now_ms(), max_age)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    fn begin_navigation(&self) -> u64 {
        self.view_epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn current_epoch(&self) -> u64 {
        self.view_epoch.load(Ordering::SeqCst)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.current_epoch() == epoch
    }

    fn top_of(&self, records: &[CryptoRecord]) -> Vec<CryptoRecord> {
        records.iter().take(self.config.snapshot_size).cloned().collect()
    }

    /// Show cached data immediately, then replace it with a fresh first window
    pub async fn fetch_initial_data(&self) {
        let epoch = self.begin_navigation();
        let (page_size, displayed_count) = {
            let mut state = self.state.write();
            state.has_fresh_data = false;
            state.error = None;
            state.loading = true;
            state.initial_loading = true;
            (state.page_size, state.displayed_count)
        };

        self.show_cached_first_page(epoch, page_size).await;

        let fresh = self
            .load_window(0, displayed_count, page_size, LoadMode::Remote)
            .await;

        match fresh {
            Ok(window) => {
                let top = self.top_of(&window.records);
                let mut write_error = window.write_error;
                if !top.is_empty() {
                    if let Err(e) = self.store.put_snapshot(&top).await {
                        self.note_write_failure(&mut write_error, e);
                    }
                }

                let mut state = self.state.write();
                if !self.is_current(epoch) {
                    return;
                }
                state.cryptocurrencies = window.records;
                state.loaded_start_index = window.loaded_start;
                state.window_start = 0;
                state.current_page = 1;
                state.initial_top10 = top;
                state.recompute_view();
                if let Some(total) = window.total_count {
                    state.total_items = total;
                }
                state.last_updated = Some(now_ms());
                state.has_fresh_data = true;
                state.loading = false;
                state.initial_loading = false;
                state.error = write_error.map(Into::into);
                state.phase = Phase::Ready;
                logger::info(
                    LogTag::Engine,
                    &format!(
                        "Initial data ready: {} records loaded, {} total",
                        state.cryptocurrencies.len(),
                        state.total_items
                    ),
                );
            }
            Err(e) => {
                logger::error(LogTag::Engine, &format!("Initial fetch failed: {}", e));
                let mut state = self.state.write();
                if !self.is_current(epoch) {
                    return;
                }
                state.error = Some(e);
                state.loading = false;
                state.initial_loading = false;
                state.phase = Phase::Error;
            }
        }
    }

    /// Paint the stored snapshot (or stored first page) while fresh data loads
    async fn show_cached_first_page(&self, epoch: u64, page_size: u32) {
        let snapshot = match self.store.get_snapshot().await {
            Ok(snapshot) => snapshot.filter(|s| !s.items.is_empty()),
            Err(e) => {
                logger::warning(LogTag::Engine, &format!("Snapshot read failed: {}", e));
                None
            }
        };
        let first_page = self
            .read_stored_page(PageKey::new(0, page_size))
            .await
            .unwrap_or_default();
        let total = self.store.get_total_count().await.unwrap_or_else(|e| {
            logger::warning(LogTag::Engine, &format!("Total count read failed: {}", e));
            None
        });

        let mut state = self.state.write();
        if !self.is_current(epoch) {
            return;
        }
        state.window_start = 0;
        state.current_page = 1;
        state.loaded_start_index = 0;
        state.cryptocurrencies = first_page;
        if let Some(total) = total {
            state.total_items = total;
        }

        match snapshot {
            Some(snapshot) => {
                state.initial_top10 = snapshot.items;
                if state.is_searching() {
                    state.recompute_view();
                } else {
                    state.filtered_cryptos = state
                        .initial_top10
                        .iter()
                        .take(state.displayed_count)
                        .cloned()
                        .collect();
                }
                state.last_updated = Some(snapshot.timestamp);
                state.phase = Phase::ShowingCache;
                logger::debug(LogTag::Engine, "Showing cached snapshot");
            }
            None if !state.cryptocurrencies.is_empty() => {
                state.initial_top10 = self.top_of(&state.cryptocurrencies);
                state.recompute_view();
                state.last_updated = state.cryptocurrencies.iter().filter_map(|r| r.timestamp).max();
                state.phase = Phase::ShowingCache;
                logger::debug(LogTag::Engine, "Showing cached first page");
            }
            None => {
                state.filtered_cryptos.clear();
                state.phase = Phase::FetchingFresh;
            }
        }
    }

    /// Move to 1-based logical page `page` (0 is treated as 1)
    pub async fn go_to_page(&self, page: u32) {
        let page = page.max(1);
        let epoch = self.begin_navigation();
        let (page_size, displayed_count) = {
            let mut state = self.state.write();
            state.loading = true;
            state.error = None;
            (state.page_size, state.displayed_count)
        };

        let start = (page as usize - 1) * displayed_count;
        let loaded = self
            .load_window(start, displayed_count, page_size, LoadMode::PreferStore)
            .await;

        let mut state = self.state.write();
        if !self.is_current(epoch) {
            return;
        }
        match loaded {
            Ok(window) => {
                state.cryptocurrencies = window.records;
                state.loaded_start_index = window.loaded_start;
                state.window_start = start;
                state.current_page = page;
                state.recompute_view();
                if let Some(total) = window.total_count {
                    state.total_items = total;
                }
                if window.fetched_remote {
                    state.has_fresh_data = true;
                    state.last_updated = Some(now_ms());
                }
                state.error = window.write_error.map(Into::into);
                state.phase = Phase::Ready;
                logger::debug(
                    LogTag::Engine,
                    &format!("Page {} ready ({} visible)", page, state.filtered_cryptos.len()),
                );
            }
            Err(e) => {
                logger::error(LogTag::Engine, &format!("Failed to change page: {}", e));
                state.error = Some(e);
            }
        }
        state.loading = false;
    }

    /// Change the physical page size (clamped) and return to the first page
    pub async fn set_page_size(&self, size: u32) {
        let size = self.config.clamp_page_size(size);
        let previous = {
            let mut state = self.state.write();
            std::mem::replace(&mut state.page_size, size)
        };

        let mut evict_error: Option<StorageError> = None;
        if self.evict_on_page_size_change && previous != size {
            if let Err(e) = self.store.evict_pages_except(size).await {
                self.note_write_failure(&mut evict_error, e);
            }
        }

        self.go_to_page(1).await;

        if let Some(e) = evict_error {
            let mut state = self.state.write();
            if state.error.is_none() {
                state.error = Some(e.into());
            }
        }
    }

    /// Grow the window by one step, loading further pages if needed
    pub async fn show_more(&self) {
        let epoch = self.begin_navigation();
        let (window_start, old_count, new_count, page_size, in_memory) = {
            let state = self.state.read();
            let new_count = self
                .config
                .clamp_displayed_count(state.displayed_count + self.config.show_more_step);
            (
                state.window_start,
                state.displayed_count,
                new_count,
                state.page_size,
                state.available_from_window() >= new_count,
            )
        };
        if new_count <= old_count {
            return;
        }

        if in_memory {
            let mut state = self.state.write();
            if self.is_current(epoch) {
                state.displayed_count = new_count;
                state.recompute_view();
            }
            return;
        }

        self.state.write().loading = true;
        let loaded = self
            .load_window(window_start, new_count, page_size, LoadMode::PreferStore)
            .await;

        let mut state = self.state.write();
        if !self.is_current(epoch) {
            return;
        }
        match loaded {
            Ok(window) => {
                state.cryptocurrencies = window.records;
                state.loaded_start_index = window.loaded_start;
                let available = state.available_from_window();
                state.displayed_count = new_count.min(available).max(old_count);
                state.recompute_view();
                if let Some(total) = window.total_count {
                    state.total_items = total;
                }
                if window.fetched_remote {
                    state.has_fresh_data = true;
                    state.last_updated = Some(now_ms());
                }
                if let Some(e) = window.write_error {
                    state.error = Some(e.into());
                }
            }
            Err(e) => {
                logger::error(LogTag::Engine, &format!("Show more failed: {}", e));
                state.error = Some(e);
            }
        }
        state.loading = false;
    }

    /// Filter the loaded records locally; an empty term restores the window
    pub fn set_search_term(&self, term: &str) {
        let mut state = self.state.write();
        state.search_term = term.trim().to_string();
        state.recompute_view();
    }
}
