/// UI-facing engine state and the pure view computations over it.

use std::time::Duration;

use super::search;
use crate::errors::CoinListError;
use crate::types::CryptoRecord;

/// Position in the load lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    /// Cached records are on screen, fresh data is being fetched
    ShowingCache,
    /// Nothing cached; waiting for the first remote page
    FetchingFresh,
    Ready,
    Error,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Uninitialized => "uninitialized",
            Phase::ShowingCache => "showing-cache",
            Phase::FetchingFresh => "fetching-fresh",
            Phase::Ready => "ready",
            Phase::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    /// Loaded physical pages, contiguous from `loaded_start_index`
    pub cryptocurrencies: Vec<CryptoRecord>,
    pub initial_top10: Vec<CryptoRecord>,
    /// Visible window (or search result), never longer than `displayed_count`
    pub filtered_cryptos: Vec<CryptoRecord>,
    /// 1-based logical page over `displayed_count`-sized windows
    pub current_page: u32,
    pub page_size: u32,
    pub displayed_count: usize,
    pub total_items: u64,
    pub search_term: String,
    pub loading: bool,
    pub initial_loading: bool,
    pub has_fresh_data: bool,
    /// Epoch milliseconds
    pub last_updated: Option<i64>,
    pub error: Option<CoinListError>,
    pub phase: Phase,
    /// Absolute index of `cryptocurrencies[0]` in the remote ordering
    pub loaded_start_index: usize,
    /// Absolute index of the first visible record
    pub window_start: usize,
    /// Interval of the active auto-refresh timer
    pub refresh_interval: Option<Duration>,
}

impl EngineState {
    pub fn new(page_size: u32, displayed_count: usize) -> Self {
        Self {
            cryptocurrencies: Vec::new(),
            initial_top10: Vec::new(),
            filtered_cryptos: Vec::new(),
            current_page: 1,
            page_size,
            displayed_count,
            total_items: 0,
            search_term: String::new(),
            loading: false,
            initial_loading: false,
            has_fresh_data: false,
            last_updated: None,
            error: None,
            phase: Phase::Uninitialized,
            loaded_start_index: 0,
            window_start: 0,
            refresh_interval: None,
        }
    }

    pub fn is_searching(&self) -> bool {
        search::is_active(&self.search_term)
    }

    /// `[window_start, +displayed_count)` over the loaded records
    pub fn window(&self) -> Vec<CryptoRecord> {
        let offset = self.window_start.saturating_sub(self.loaded_start_index);
        if offset >= self.cryptocurrencies.len() {
            return Vec::new();
        }
        let end = (offset + self.displayed_count).min(self.cryptocurrencies.len());
        self.cryptocurrencies[offset..end].to_vec()
    }

    /// Rebuild `filtered_cryptos` from the loaded records and the search term
    pub fn recompute_view(&mut self) {
        self.filtered_cryptos = if self.is_searching() {
            search::filter_records(&self.cryptocurrencies, &self.search_term, self.displayed_count)
        } else {
            self.window()
        };
    }

    /// Records reachable without another remote call, counted from the window start
    pub fn available_from_window(&self) -> usize {
        let loaded_end = self.loaded_start_index + self.cryptocurrencies.len();
        loaded_end.saturating_sub(self.window_start)
    }

    pub fn total_pages(&self) -> u32 {
        let per_page = self.displayed_count.max(1) as u64;
        let pages = (self.total_items + per_page - 1) / per_page;
        pages.clamp(1, u32::MAX as u64) as u32
    }

    /// Page buttons to show: at most `max_visible`, centred on the current page
    pub fn visible_page_range(&self, max_visible: u32) -> std::ops::RangeInclusive<u32> {
        let max_visible = max_visible.max(1);
        let total = self.total_pages();
        let current = self.current_page.clamp(1, total);

        let mut start = current.saturating_sub(max_visible / 2).max(1);
        let end = total.min(start + max_visible - 1);
        if end - start + 1 < max_visible {
            start = (end + 1).saturating_sub(max_visible).max(1);
        }
        start..=end
    }

    pub fn showing_count(&self) -> usize {
        self.filtered_cryptos.len()
    }

    /// Whether another "show more" could grow the window
    pub fn has_more(&self, max_displayed: usize) -> bool {
        if self.displayed_count >= max_displayed {
            return false;
        }
        let known_total =
            (self.total_items as usize).max(self.loaded_start_index + self.cryptocurrencies.len());
        self.window_start + self.displayed_count < known_total
    }

    pub fn is_stale(&self, now_ms: i64, max_age: Duration) -> bool {
        match self.last_updated {
            Some(ts) => now_ms.saturating_sub(ts) > max_age.as_millis() as i64,
            None => true,
        }
    }
}
