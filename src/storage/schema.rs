//! Page store schema: versioned, additive migrations tracked with PRAGMA user_version.

/// Meta key of the top-of-list snapshot
pub const META_SNAPSHOT_KEY: &str = "snapshot-top10";

/// Meta key of the last known remote total count
pub const META_TOTAL_COUNT_KEY: &str = "total-count";

/// One schema step; statements run in a single transaction
pub struct Migration {
    pub version: u32,
    pub statements: &'static [&'static str],
}

/// Ordered migrations. Never edit a released step, append a new one.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        statements: &[
            // One row per asset, canonical JSON plus the columns we sort/filter on
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY,
                cmc_rank INTEGER NOT NULL,
                name TEXT NOT NULL,
                symbol TEXT NOT NULL,
                data TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_records_rank ON records(cmc_rank)
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_records_timestamp ON records(timestamp)
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )
            "#,
        ],
    },
    Migration {
        version: 2,
        statements: &[
            // Which records make up a physical page, in remote order
            r#"
            CREATE TABLE IF NOT EXISTS page_entries (
                page_size INTEGER NOT NULL,
                page_index INTEGER NOT NULL,
                position INTEGER NOT NULL,
                record_id INTEGER NOT NULL,
                PRIMARY KEY (page_size, page_index, position)
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_page_entries_record ON page_entries(record_id)
            "#,
        ],
    },
];

pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}
