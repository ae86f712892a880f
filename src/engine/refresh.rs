/// Background refresh: one-shot refresh of the current window and the repeating timer.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::window::LoadMode;
use super::{now_ms, Engine, Phase};
use crate::logger::{self, LogTag};

/// Handle of the running auto-refresh task
pub struct RefreshTimer {
    handle: JoinHandle<()>,
    shutdown: Arc<Notify>,
    interval: Duration,
}

impl RefreshTimer {
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Prevent future ticks; a refresh already running completes
    fn stop(self) {
        self.shutdown.notify_one();
        drop(self.handle);
    }
}

/// Decrements the in-flight counter when a refresh finishes or is cancelled
struct InFlight<'a>(&'a Engine);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.refreshes_in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Engine {
    pub fn is_refreshing(&self) -> bool {
        self.refreshes_in_flight.load(Ordering::SeqCst) > 0
    }

    /// Re-fetch the pages covering the current window from the remote source.
    ///
    /// Data is always persisted and `total_items`/`last_updated` always updated;
    /// the window is only replaced if no navigation happened meanwhile.
    /// Failures set `error` and leave the visible records untouched.
    pub async fn refresh_data(&self) {
        self.refreshes_in_flight.fetch_add(1, Ordering::SeqCst);
        let _in_flight = InFlight(self);

        let epoch = self.current_epoch();
        let (window_start, displayed_count, page_size, searching) = {
            let state = self.state.read();
            (
                state.window_start,
                state.displayed_count,
                state.page_size,
                state.is_searching(),
            )
        };

        let loaded = self
            .load_window(window_start, displayed_count, page_size, LoadMode::Remote)
            .await;

        let window = match loaded {
            Ok(window) => window,
            Err(e) => {
                logger::warning(LogTag::Refresh, &format!("Refresh failed: {}", e));
                self.state.write().error = Some(e);
                return;
            }
        };

        let mut write_error = window.write_error;
        let snapshot = if window_start == 0 && !searching && window.loaded_start == 0 {
            let top = self.top_of(&window.records);
            if !top.is_empty() {
                if let Err(e) = self.store.put_snapshot(&top).await {
                    self.note_write_failure(&mut write_error, e);
                }
            }
            Some(top)
        } else {
            None
        };

        let mut state = self.state.write();
        if let Some(total) = window.total_count {
            state.total_items = total;
        }
        state.last_updated = Some(now_ms());
        state.has_fresh_data = true;

        if self.is_current(epoch) {
            state.cryptocurrencies = window.records;
            state.loaded_start_index = window.loaded_start;
            if let Some(top) = snapshot.filter(|top| !top.is_empty()) {
                state.initial_top10 = top;
            }
            state.recompute_view();
            state.phase = Phase::Ready;
            state.error = write_error.map(Into::into);
            logger::debug(
                LogTag::Refresh,
                &format!("Refreshed window ({} visible)", state.filtered_cryptos.len()),
            );
        } else {
            logger::debug(
                LogTag::Refresh,
                "View changed during refresh, keeping the newer window",
            );
        }
    }

    /// Start the repeating refresh, replacing an active timer
    pub fn start_auto_refresh(self: &Arc<Self>, interval: Duration) {
        let interval = interval.max(Duration::from_millis(1));
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                logger::error(
                    LogTag::Refresh,
                    &format!("Cannot start auto-refresh outside a runtime: {}", e),
                );
                return;
            }
        };

        let shutdown = Arc::new(Notify::new());
        let handle = runtime.spawn(run_timer(Arc::downgrade(self), interval, shutdown.clone()));
        let timer = RefreshTimer {
            handle,
            shutdown,
            interval,
        };

        if let Some(previous) = self.timer.lock().replace(timer) {
            previous.stop();
        }
        self.state.write().refresh_interval = Some(interval);
        logger::info(
            LogTag::Refresh,
            &format!("Auto-refresh every {}s", interval.as_secs_f64()),
        );
    }

    /// Stop the repeating refresh; no-op when none is active
    pub fn stop_auto_refresh(&self) {
        let Some(timer) = self.timer.lock().take() else {
            return;
        };
        timer.stop();
        self.state.write().refresh_interval = None;
        logger::info(LogTag::Refresh, "Auto-refresh stopped");
    }

    pub fn is_auto_refresh_active(&self) -> bool {
        self.timer.lock().is_some()
    }
}

async fn run_timer(engine: Weak<Engine>, interval: Duration, shutdown: Arc<Notify>) {
    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            _ = tokio::time::sleep(interval) => {
                let Some(engine) = engine.upgrade() else {
                    break;
                };
                if engine.is_refreshing() {
                    logger::debug(LogTag::Refresh, "Tick dropped, refresh still in flight");
                    continue;
                }
                engine.refresh_data().await;
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get_mut().take() {
            timer.stop();
        }
    }
}
