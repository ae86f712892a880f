//! Centralized path resolution
//!
//! All file and directory paths are resolved through this module so the CLI,
//! the config loader and the page store agree on locations.
//!
//! - **macOS**: `~/Library/Application Support/CoinList/`
//! - **Windows**: `%LOCALAPPDATA%\CoinList\`
//! - **Linux**: `$XDG_DATA_HOME/CoinList/` (fallback `~/.local/share/CoinList/`)
//!
//! ```text
//! CoinList/
//! ├── data/
//! │   ├── config.toml
//! │   └── listing_cache.db
//! └── logs/
//!     └── coinlist.log
//! ```

use once_cell::sync::Lazy;
use std::path::PathBuf;

const APP_DIR: &str = "CoinList";

/// Lazy-initialized base directory (thread-safe)
static BASE_DIRECTORY: Lazy<PathBuf> = Lazy::new(resolve_base_directory);

fn resolve_base_directory() -> PathBuf {
    if let Some(dir) = dirs::data_local_dir() {
        return dir.join(APP_DIR);
    }

    if let Some(dir) = dirs::data_dir() {
        return dir.join(APP_DIR);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(APP_DIR);
    }

    PathBuf::from(APP_DIR)
}

pub fn get_base_directory() -> PathBuf {
    BASE_DIRECTORY.clone()
}

pub fn get_data_directory() -> PathBuf {
    get_base_directory().join("data")
}

pub fn get_logs_directory() -> PathBuf {
    get_base_directory().join("logs")
}

pub fn get_config_path() -> PathBuf {
    get_data_directory().join("config.toml")
}

/// Default location of the SQLite page store
pub fn get_listing_db_path() -> PathBuf {
    get_data_directory().join("listing_cache.db")
}

pub fn get_log_file_path() -> PathBuf {
    get_logs_directory().join("coinlist.log")
}

/// Resolve the configured database path, falling back to the data directory
pub fn resolve_database_path(configured: &str) -> PathBuf {
    if configured.trim().is_empty() {
        get_listing_db_path()
    } else {
        PathBuf::from(configured)
    }
}

/// Create the data and logs directories if missing
pub fn ensure_all_directories() -> Result<(), String> {
    for dir in [get_data_directory(), get_logs_directory()] {
        std::fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create directory {}: {}", dir.display(), e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_directory_is_subdir() {
        assert!(get_data_directory().starts_with(get_base_directory()));
        assert!(get_listing_db_path().starts_with(get_data_directory()));
    }

    #[test]
    fn test_configured_database_path_wins() {
        assert_eq!(
            resolve_database_path("/tmp/custom.db"),
            PathBuf::from("/tmp/custom.db")
        );
        assert_eq!(resolve_database_path("  "), get_listing_db_path());
    }
}
