//! Log line formatting with ANSI colors
//!
//! Console lines are colored and aligned; file lines are plain text with a full
//! timestamp. Both are produced from the `log::Record` fern hands us.

use super::levels::LogLevel;
use super::tags::LogTag;
use chrono::{DateTime, Local};
use colored::*;

/// Log format widths for alignment
const TAG_WIDTH: usize = 8;
const LEVEL_WIDTH: usize = 7;

/// Format a tag with appropriate color
fn format_tag(tag: Option<LogTag>, target: &str) -> ColoredString {
    let Some(tag) = tag else {
        return format!("{:<width$}", target, width = TAG_WIDTH).white();
    };
    let label = format!("{:<width$}", tag.to_plain_string(), width = TAG_WIDTH);
    match tag {
        LogTag::System => label.bright_yellow().bold(),
        LogTag::Config => label.bright_white().bold(),
        LogTag::Store => label.bright_blue().bold(),
        LogTag::Cache => label.bright_cyan().bold(),
        LogTag::Api => label.bright_purple().bold(),
        LogTag::Engine => label.bright_green().bold(),
        LogTag::Refresh => label.bright_magenta().bold(),
    }
}

fn format_level(level: LogLevel) -> ColoredString {
    let label = format!("{:<width$}", level.as_str(), width = LEVEL_WIDTH);
    match level {
        LogLevel::Error => label.bright_red().bold(),
        LogLevel::Warning => label.bright_yellow(),
        LogLevel::Info => label.normal(),
        LogLevel::Debug => label.bright_black(),
        LogLevel::Verbose => label.dimmed(),
    }
}

fn tag_label(tag: Option<LogTag>, target: &str) -> String {
    tag.map(|t| t.to_plain_string())
        .unwrap_or_else(|| target.to_string())
}

/// `12:30:01 [ENGINE  ] [INFO   ] message`
pub fn format_console_line(
    now: DateTime<Local>,
    target: &str,
    level: log::Level,
    message: &str,
) -> String {
    let tag = LogTag::from_target(target);
    format!(
        "{} [{}] [{}] {}",
        now.format("%H:%M:%S").to_string().dimmed(),
        format_tag(tag, target),
        format_level(LogLevel::from_log_level(level)),
        message
    )
}

/// `2024-05-01 12:30:01 [ENGINE] [INFO] message`
pub fn format_file_line(
    now: DateTime<Local>,
    target: &str,
    level: log::Level,
    message: &str,
) -> String {
    let tag = LogTag::from_target(target);
    format!(
        "{} [{}] [{}] {}",
        now.format("%Y-%m-%d %H:%M:%S"),
        tag_label(tag, target),
        LogLevel::from_log_level(level).as_str(),
        message
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_line_is_plain() {
        let now = Local::now();
        let line = format_file_line(now, LogTag::Store.target(), log::Level::Warn, "slow write");
        assert!(line.ends_with("[STORE] [WARNING] slow write"));
        assert!(!line.contains('\u{1b}'));
    }

    #[test]
    fn test_unknown_target_is_kept() {
        let now = Local::now();
        let line = format_file_line(now, "hyper::client", log::Level::Info, "connected");
        assert!(line.contains("[hyper::client]"));
    }
}
