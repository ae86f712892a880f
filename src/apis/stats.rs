/// Per-client request statistics
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_time_ms: f64,
    pub last_request_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl ApiStats {
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.successful_requests as f64 / self.total_requests as f64 * 100.0
        }
    }
}

/// Accumulates request outcomes for one API client
#[derive(Default)]
pub struct ApiStatsTracker {
    stats: RwLock<ApiStats>,
}

impl ApiStatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_request(&self, success: bool, elapsed_ms: f64) {
        let mut stats = self.stats.write().await;
        let previous = stats.total_requests as f64;
        stats.total_requests += 1;
        if success {
            stats.successful_requests += 1;
        } else {
            stats.failed_requests += 1;
        }
        stats.average_response_time_ms =
            (stats.average_response_time_ms * previous + elapsed_ms) / stats.total_requests as f64;
        stats.last_request_at = Some(Utc::now());
    }

    pub async fn record_error(&self, endpoint: &str, message: impl Into<String>) {
        let mut stats = self.stats.write().await;
        stats.last_error = Some(format!("{}: {}", endpoint, message.into()));
    }

    pub async fn get_stats(&self) -> ApiStats {
        self.stats.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_running_average_and_counts() {
        let tracker = ApiStatsTracker::new();
        tracker.record_request(true, 100.0).await;
        tracker.record_request(false, 300.0).await;
        tracker.record_error("listing", "HTTP 500").await;

        let stats = tracker.get_stats().await;
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.successful_requests, 1);
        assert_eq!(stats.failed_requests, 1);
        assert_eq!(stats.average_response_time_ms, 200.0);
        assert_eq!(stats.success_rate(), 50.0);
        assert_eq!(stats.last_error.as_deref(), Some("listing: HTTP 500"));
        assert!(stats.last_request_at.is_some());
    }
}
