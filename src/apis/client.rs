/// Base HTTP client with rate limiting
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

use crate::errors::RemoteFetchError;

/// Rate limiter for API clients: one request at a time, spaced evenly
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
    max_per_minute: usize,
}

impl RateLimiter {
    /// `max_per_minute == 0` disables spacing
    pub fn new(max_per_minute: usize) -> Self {
        let min_interval = if max_per_minute > 0 {
            Duration::from_secs_f64(60.0 / max_per_minute as f64)
        } else {
            Duration::ZERO
        };

        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            last_request: Mutex::new(None),
            min_interval,
            max_per_minute,
        }
    }

    /// Wait until a request may be sent
    pub async fn acquire(&self) -> Result<RateLimitGuard, RemoteFetchError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| RemoteFetchError::RateLimiter(e.to_string()))?;

        if !self.min_interval.is_zero() {
            let mut last = self.last_request.lock().await;
            if let Some(last_time) = *last {
                let elapsed = last_time.elapsed();
                if elapsed < self.min_interval {
                    tokio::time::sleep(self.min_interval - elapsed).await;
                }
            }
            *last = Some(Instant::now());
        }

        Ok(RateLimitGuard { _permit: permit })
    }

    pub fn max_per_minute(&self) -> usize {
        self.max_per_minute
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// RAII guard returned by [`RateLimiter::acquire`]
pub struct RateLimitGuard {
    _permit: OwnedSemaphorePermit,
}

/// HTTP client wrapper with a fixed per-request timeout
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout_secs: u64) -> Result<Self, RemoteFetchError> {
        let timeout = Duration::from_secs(timeout_secs.max(1));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("coinlist/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteFetchError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Classify a transport failure
    pub fn map_send_error(&self, endpoint: &str, err: reqwest::Error) -> RemoteFetchError {
        if err.is_timeout() {
            RemoteFetchError::Timeout {
                endpoint: endpoint.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            RemoteFetchError::network(format!("Request to {} failed: {}", endpoint, err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_interval() {
        assert_eq!(RateLimiter::new(30).min_interval(), Duration::from_secs(2));
        assert!(RateLimiter::new(0).min_interval().is_zero());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_spaces_requests() {
        let limiter = RateLimiter::new(60);
        let started = tokio::time::Instant::now();

        drop(limiter.acquire().await.unwrap());
        drop(limiter.acquire().await.unwrap());

        assert!(started.elapsed() >= Duration::from_millis(990));
    }
}
