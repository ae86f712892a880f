/// Read cache sizing
///
/// The TTL bounds how stale a memoized store read may be even when no write
/// invalidates it; the capacity bounds memory (LRU eviction when exceeded).
use std::time::Duration;

use crate::config::ReadCacheConfig;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live for cached entries
    pub ttl: Duration,

    /// Maximum number of entries (LRU eviction when exceeded)
    pub capacity: usize,
}

impl CacheConfig {
    /// Store read-through cache: 30s, enough for a few hundred pages
    pub fn read_through() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            capacity: 512,
        }
    }

    pub fn from_settings(settings: &ReadCacheConfig) -> Self {
        Self {
            ttl: Duration::from_millis(settings.ttl_ms),
            capacity: settings.capacity.max(1),
        }
    }

    pub fn custom(ttl: Duration, capacity: usize) -> Self {
        Self { ttl, capacity }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::read_through()
    }
}
