/// Core logging implementation with automatic filtering
use super::config::{get_logger_config, LoggerConfig};
use super::levels::LogLevel;
use super::tags::LogTag;

/// Check if a log message should be displayed
///
/// Filtering rules:
/// 1. Errors are always shown
/// 2. Verbose requires --verbose OR a per-tag verbose switch
/// 3. Debug requires a per-tag debug switch (or global --verbose)
/// 4. Everything else is checked against the minimum level threshold
/// 5. If enabled_tags is non-empty, tag must be in the set
pub fn should_log_with(config: &LoggerConfig, tag: &LogTag, level: LogLevel) -> bool {
    if level == LogLevel::Error {
        return true;
    }

    let tag_name = tag.to_debug_key();
    if !config.enabled_tags.is_empty() && !config.enabled_tags.contains(&tag_name) {
        return false;
    }

    match level {
        LogLevel::Verbose => {
            config.min_level == LogLevel::Verbose || config.verbose_tags.contains(&tag_name)
        }
        LogLevel::Debug => {
            config.min_level == LogLevel::Verbose || config.debug_tags.contains(&tag_name)
        }
        _ => level <= config.min_level,
    }
}

pub fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    should_log_with(&get_logger_config(), tag, level)
}

/// Filter, then hand the message to the `log` facade
pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }

    log::log!(target: tag.target(), level.to_log_level(), "{}", message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_always_pass() {
        let config = LoggerConfig {
            min_level: LogLevel::Error,
            ..Default::default()
        };
        assert!(should_log_with(&config, &LogTag::Store, LogLevel::Error));
        assert!(!should_log_with(&config, &LogTag::Store, LogLevel::Warning));
    }

    #[test]
    fn test_debug_is_per_tag() {
        let config = LoggerConfig::from_flags(&["cache".to_string()], false, false);
        assert!(should_log_with(&config, &LogTag::Cache, LogLevel::Debug));
        assert!(!should_log_with(&config, &LogTag::Engine, LogLevel::Debug));
        assert!(should_log_with(&config, &LogTag::Engine, LogLevel::Info));
    }

    #[test]
    fn test_verbose_requires_flag() {
        let quiet = LoggerConfig::default();
        assert!(!should_log_with(&quiet, &LogTag::Api, LogLevel::Verbose));

        let verbose = LoggerConfig::from_flags(&[], true, false);
        assert!(should_log_with(&verbose, &LogTag::Api, LogLevel::Verbose));
        assert!(should_log_with(&verbose, &LogTag::Api, LogLevel::Debug));
    }

    #[test]
    fn test_enabled_tags_restrict_output() {
        let mut config = LoggerConfig::default();
        config.enabled_tags.insert("engine".to_string());
        assert!(should_log_with(&config, &LogTag::Engine, LogLevel::Info));
        assert!(!should_log_with(&config, &LogTag::Store, LogLevel::Info));
    }

    #[test]
    fn test_debug_all_enables_every_tag() {
        let config = LoggerConfig::from_flags(&["all".to_string()], false, false);
        for tag in LogTag::ALL {
            assert!(should_log_with(&config, &tag, LogLevel::Debug));
        }
    }
}
