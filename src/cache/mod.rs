/// In-memory read cache for the page store
///
/// - `manager`: generic TTL + LRU cache with metrics
/// - `read_cache`: operation-keyed memoization with per-family invalidation
/// - `store`: `CachedStore`, a `PersistentStore` wrapper wiring the two together
pub mod config;
pub mod key;
pub mod manager;
pub mod read_cache;
pub mod store;

pub use config::CacheConfig;
pub use key::{CacheKey, CacheKind};
pub use manager::{CacheManager, CacheMetrics};
pub use read_cache::{CachedValue, Cacheable, ReadCache};
pub use store::{open_cached_store, CachedStore, OpenedStore};
