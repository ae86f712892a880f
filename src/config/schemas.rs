use crate::config_struct;

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    /// Root configuration structure containing all sub-configurations
    pub struct Config {
        /// Listing API client
        api: ApiConfig = ApiConfig::default(),

        /// Persistent page store
        storage: StorageConfig = StorageConfig::default(),

        /// In-memory read cache in front of the store
        cache: ReadCacheConfig = ReadCacheConfig::default(),

        /// Paging/window engine
        engine: EngineConfig = EngineConfig::default(),

        /// Background refresh timer
        refresh: RefreshConfig = RefreshConfig::default(),
    }
}

// ============================================================================
// API
// ============================================================================

config_struct! {
    /// Listing endpoint and request defaults
    pub struct ApiConfig {
        base_url: String =
            "https://api.coinmarketcap.com/data-api/v3/cryptocurrency/listing".to_string(),
        timeout_seconds: u64 = 10,
        /// 0 disables client-side throttling
        rate_limit_per_minute: u32 = 30,
        sort_by: String = "rank".to_string(),
        sort_direction: String = "desc".to_string(),
        convert: Vec<String> = vec!["USD".to_string(), "BTC".to_string(), "ETH".to_string()],
        crypto_type: String = "all".to_string(),
        tag_type: String = "all".to_string(),
        audited: bool = false,
        aux: Vec<String> = [
            "ath",
            "atl",
            "high24h",
            "low24h",
            "num_market_pairs",
            "cmc_rank",
            "date_added",
            "max_supply",
            "circulating_supply",
            "total_supply",
            "volume_7d",
            "volume_30d",
            "self_reported_circulating_supply",
            "self_reported_market_cap",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    }
}

// ============================================================================
// STORAGE
// ============================================================================

config_struct! {
    pub struct StorageConfig {
        /// Empty means the platform data directory (see `paths`)
        database_path: String = String::new(),
        /// Drop pages stored under other page sizes when the page size changes
        evict_on_page_size_change: bool = true,
    }
}

config_struct! {
    pub struct ReadCacheConfig {
        ttl_ms: u64 = 30_000,
        capacity: usize = 512,
    }
}

// ============================================================================
// ENGINE
// ============================================================================

config_struct! {
    /// Paging and window sizing
    pub struct EngineConfig {
        /// Records per physical (server) page
        page_size: u32 = 200,
        max_page_size: u32 = 200,
        /// Visible window size at session start
        displayed_count: usize = 10,
        min_displayed_count: usize = 10,
        max_displayed_count: usize = 200,
        /// Growth per "show more"
        show_more_step: usize = 50,
        /// Records kept in the top-of-list snapshot
        snapshot_size: usize = 10,
    }
}

impl EngineConfig {
    pub fn clamp_displayed_count(&self, count: usize) -> usize {
        count.clamp(self.min_displayed_count, self.max_displayed_count)
    }

    pub fn clamp_page_size(&self, size: u32) -> u32 {
        size.clamp(1, self.max_page_size.max(1))
    }
}

config_struct! {
    pub struct RefreshConfig {
        enabled: bool = true,
        interval_seconds: u64 = 60,
    }
}
