/// Runtime logger configuration: minimum level, per-tag debug switches, output file
use super::levels::LogLevel;
use super::tags::LogTag;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    /// Tags with DEBUG output enabled (debug keys, lowercase)
    pub debug_tags: HashSet<String>,
    /// Tags with VERBOSE output enabled without global --verbose
    pub verbose_tags: HashSet<String>,
    /// Empty = all tags enabled
    pub enabled_tags: HashSet<String>,
    /// Plain-text copy of every line
    pub file_path: Option<PathBuf>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            verbose_tags: HashSet::new(),
            enabled_tags: HashSet::new(),
            file_path: None,
        }
    }
}

impl LoggerConfig {
    /// Build from CLI switches: `--debug <tag>` (or `all`), `--verbose`, `--quiet`
    pub fn from_flags(debug: &[String], verbose: bool, quiet: bool) -> Self {
        let mut config = LoggerConfig::default();

        for key in debug {
            if key.eq_ignore_ascii_case("all") {
                config
                    .debug_tags
                    .extend(LogTag::ALL.iter().map(|t| t.to_debug_key()));
            } else if let Some(tag) = LogTag::from_debug_key(key) {
                config.debug_tags.insert(tag.to_debug_key());
            }
        }

        if !config.debug_tags.is_empty() {
            config.min_level = LogLevel::Debug;
        }
        if verbose {
            config.min_level = LogLevel::Verbose;
        }
        if quiet {
            config.min_level = LogLevel::Error;
        }
        config
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}
