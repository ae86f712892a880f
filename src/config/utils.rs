use super::schemas::Config;
/// Configuration utilities - loading and access helpers
///
/// - Loading configuration from disk (defaults when the file is missing)
/// - Thread-safe access helpers
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::path::Path;

use crate::logger::{self, LogTag};

/// Global configuration instance
///
/// Loaded once by the binary; library code receives sections explicitly.
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Parse a TOML file into a [`Config`], using defaults if it does not exist
fn read_config_file(path: &str) -> Result<Config, String> {
    if !Path::new(path).exists() {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path),
        );
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;

    toml::from_str::<Config>(&contents)
        .map_err(|e| format!("Failed to parse config file '{}': {}", path, e))
}

/// Load configuration from a specific file path
pub fn load_config_from_path(path: &str) -> Result<(), String> {
    let config = read_config_file(path)?;

    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| "Config already initialized".to_string())?;

    logger::debug(LogTag::Config, &format!("Configuration loaded from {}", path));
    Ok(())
}

/// Execute a function with read access to the configuration
///
/// Falls back to defaults when nothing was loaded, so library callers (and tests)
/// never have to initialize the global first.
///
/// ```
/// use coinlist::config::with_config;
///
/// let page_size = with_config(|cfg| cfg.engine.page_size);
/// assert!(page_size > 0);
/// ```
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    match CONFIG.get() {
        Some(lock) => f(&lock.read()),
        None => f(&Config::default()),
    }
}

/// Get a clone of the entire configuration (for use across await points)
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine.page_size, 200);
        assert_eq!(config.engine.displayed_count, 10);
        assert_eq!(config.engine.show_more_step, 50);
        assert_eq!(config.cache.ttl_ms, 30_000);
        assert_eq!(config.api.convert, vec!["USD", "BTC", "ETH"]);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[engine]"));
        assert!(toml_str.contains("[refresh]"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine]\npage_size = 50\n\n[refresh]\nenabled = false\n").unwrap();

        let config = read_config_file(&path.to_string_lossy()).unwrap();
        assert_eq!(config.engine.page_size, 50);
        assert_eq!(config.engine.max_displayed_count, 200);
        assert!(!config.refresh.enabled);
        assert_eq!(config.api.sort_by, "rank");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = read_config_file("/nonexistent/coinlist/config.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine]\npage_size = \"many\"\n").unwrap();

        let err = read_config_file(&path.to_string_lossy()).unwrap_err();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_engine_clamps() {
        let engine = Config::default().engine;
        assert_eq!(engine.clamp_displayed_count(3), 10);
        assert_eq!(engine.clamp_displayed_count(500), 200);
        assert_eq!(engine.clamp_page_size(0), 1);
        assert_eq!(engine.clamp_page_size(1000), 200);
    }
}
