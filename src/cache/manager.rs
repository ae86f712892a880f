/// Generic in-memory cache with TTL and LRU eviction
///
/// Thread-safe, generic over key/value types.
/// Tracks metrics for monitoring.
use super::config::CacheConfig;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Cache entry with TTL tracking
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() >= ttl
    }
}

/// Cache metrics for monitoring
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub inserts: u64,
    pub invalidations: u64,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Entries and their LRU order live under one lock so they never disagree
struct Slots<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    access_order: VecDeque<K>,
}

impl<K, V> Slots<K, V>
where
    K: Clone + Eq + Hash,
{
    fn touch(&mut self, key: &K) {
        self.access_order.retain(|k| k != key);
        self.access_order.push_back(key.clone());
    }

    fn forget(&mut self, key: &K) {
        self.entries.remove(key);
        self.access_order.retain(|k| k != key);
    }
}

/// Generic cache manager
pub struct CacheManager<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    config: CacheConfig,
    slots: Mutex<Slots<K, V>>,
    metrics: RwLock<CacheMetrics>,
}

impl<K, V> CacheManager<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            slots: Mutex::new(Slots {
                entries: HashMap::new(),
                access_order: VecDeque::new(),
            }),
            metrics: RwLock::new(CacheMetrics::default()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get value from cache (returns None if expired or missing)
    pub fn get(&self, key: &K) -> Option<V> {
        let mut slots = self.slots.lock();

        let expired = match slots.entries.get(key) {
            None => {
                self.metrics.write().misses += 1;
                return None;
            }
            Some(entry) => entry.is_expired(self.config.ttl),
        };

        if expired {
            slots.forget(key);
            let mut metrics = self.metrics.write();
            metrics.misses += 1;
            metrics.expirations += 1;
            return None;
        }

        slots.touch(key);
        self.metrics.write().hits += 1;
        slots.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Insert value into cache (evicts LRU if at capacity)
    pub fn insert(&self, key: K, value: V) {
        let mut slots = self.slots.lock();
        self.insert_locked(&mut slots, key, value);
    }

    /// Insert only if `admit` still holds, evaluated under the cache lock
    pub fn insert_if(&self, key: K, value: V, admit: impl FnOnce() -> bool) -> bool {
        let mut slots = self.slots.lock();
        if !admit() {
            return false;
        }
        self.insert_locked(&mut slots, key, value);
        true
    }

    fn insert_locked(&self, slots: &mut Slots<K, V>, key: K, value: V) {
        if slots.entries.len() >= self.config.capacity && !slots.entries.contains_key(&key) {
            if let Some(lru_key) = slots.access_order.pop_front() {
                slots.entries.remove(&lru_key);
                self.metrics.write().evictions += 1;
            }
        }

        slots.entries.insert(key.clone(), CacheEntry::new(value));
        slots.touch(&key);
        self.metrics.write().inserts += 1;
    }

    pub fn remove(&self, key: &K) {
        self.slots.lock().forget(key);
    }

    /// Remove every entry whose key matches; returns how many were dropped
    pub fn remove_where(&self, mut matches: impl FnMut(&K) -> bool) -> usize {
        let mut slots = self.slots.lock();
        let before = slots.entries.len();
        slots.entries.retain(|k, _| !matches(k));
        let removed = before - slots.entries.len();
        if removed > 0 {
            let Slots {
                entries,
                access_order,
            } = &mut *slots;
            access_order.retain(|k| entries.contains_key(k));
            self.metrics.write().invalidations += removed as u64;
        }
        removed
    }

    pub fn clear(&self) {
        let mut slots = self.slots.lock();
        slots.entries.clear();
        slots.access_order.clear();
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.metrics.read().clone()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_basic_operations() {
        let cache = CacheManager::new(CacheConfig::custom(Duration::from_secs(60), 100));

        cache.insert("key1".to_string(), "value1".to_string());
        assert_eq!(cache.get(&"key1".to_string()), Some("value1".to_string()));
        assert_eq!(cache.get(&"nonexistent".to_string()), None);

        let metrics = cache.metrics();
        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.misses, 1);
        assert_eq!(metrics.hit_rate(), 0.5);
    }

    #[test]
    fn test_ttl_expiration() {
        let cache = CacheManager::new(CacheConfig::custom(Duration::from_millis(20), 100));

        cache.insert("key".to_string(), "value".to_string());
        assert_eq!(cache.get(&"key".to_string()), Some("value".to_string()));

        thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get(&"key".to_string()), None);
        assert_eq!(cache.metrics().expirations, 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_eviction() {
        let cache = CacheManager::new(CacheConfig::custom(Duration::from_secs(60), 2));

        cache.insert("key1".to_string(), "value1".to_string());
        cache.insert("key2".to_string(), "value2".to_string());
        // touching key1 makes key2 the eviction candidate
        assert!(cache.get(&"key1".to_string()).is_some());
        cache.insert("key3".to_string(), "value3".to_string());

        assert_eq!(cache.get(&"key2".to_string()), None);
        assert_eq!(cache.get(&"key1".to_string()), Some("value1".to_string()));
        assert_eq!(cache.get(&"key3".to_string()), Some("value3".to_string()));
        assert_eq!(cache.metrics().evictions, 1);
    }

    #[test]
    fn test_remove_where() {
        let cache = CacheManager::new(CacheConfig::custom(Duration::from_secs(60), 10));
        cache.insert(1u32, "a");
        cache.insert(2u32, "b");
        cache.insert(3u32, "c");

        assert_eq!(cache.remove_where(|k| k % 2 == 1), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&2), Some("b"));
        assert_eq!(cache.metrics().invalidations, 2);
    }

    #[test]
    fn test_insert_if_rejected() {
        let cache = CacheManager::new(CacheConfig::custom(Duration::from_secs(60), 10));
        assert!(!cache.insert_if(1u32, "a", || false));
        assert!(cache.insert_if(2u32, "b", || true));
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some("b"));
    }
}
