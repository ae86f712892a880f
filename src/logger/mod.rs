//! Structured, tag-based logging
//!
//! ```rust
//! use coinlist::logger::{self, LogTag};
//!
//! logger::error(LogTag::Store, "Failed to open page store");
//! logger::warning(LogTag::Api, "Rate limit approaching");
//! logger::info(LogTag::Engine, "Initial page loaded");
//! logger::debug(LogTag::Cache, "Read cache hit"); // Only with --debug cache
//! logger::verbose(LogTag::Api, "Raw response ..."); // Only with --verbose
//! ```
//!
//! Filtering happens here (per tag and level); formatting and output happen in
//! the `fern` dispatcher installed by [`init`]. Without the `logging` feature the
//! messages still reach the `log` facade for whatever logger the host installs.

mod config;
mod core;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Install the logger. Call once at startup, before any logging occurs.
pub fn init(config: LoggerConfig) -> Result<(), String> {
    let file_path = config.file_path.clone();
    config::set_logger_config(config);
    install_dispatch(file_path)
}

#[cfg(feature = "logging")]
fn install_dispatch(file_path: Option<std::path::PathBuf>) -> Result<(), String> {
    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format::format_console_line(
                    chrono::Local::now(),
                    record.target(),
                    record.level(),
                    &message.to_string()
                )
            ))
        })
        .chain(std::io::stdout());

    let mut dispatch = fern::Dispatch::new()
        .level(log::LevelFilter::Trace)
        .chain(console);

    if let Some(path) = file_path {
        let file = fern::log_file(&path)
            .map_err(|e| format!("Failed to open log file {}: {}", path.display(), e))?;
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "{}",
                        format::format_file_line(
                            chrono::Local::now(),
                            record.target(),
                            record.level(),
                            &message.to_string()
                        )
                    ))
                })
                .chain(file),
        );
    }

    dispatch
        .apply()
        .map_err(|e| format!("Failed to install logger: {}", e))
}

#[cfg(not(feature = "logging"))]
fn install_dispatch(_file_path: Option<std::path::PathBuf>) -> Result<(), String> {
    Ok(())
}

/// Log at ERROR level (always shown, critical issues)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (important issues)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level. Only shown when debug is enabled for `tag`.
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (very detailed tracing)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}
