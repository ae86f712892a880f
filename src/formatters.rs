/// Display formatting for prices, volumes and percentages.

use chrono::{Local, TimeZone};

/// Round half away from zero to two decimals
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Scale to K/M/B with two decimals; `None` below one thousand
fn scaled(value: f64) -> Option<String> {
    let magnitude = value.abs();
    let (divisor, suffix) = if magnitude >= 1e9 {
        (1e9, "B")
    } else if magnitude >= 1e6 {
        (1e6, "M")
    } else if magnitude >= 1e3 {
        (1e3, "K")
    } else {
        return None;
    };
    Some(format!("{:.2}{}", round2(value / divisor), suffix))
}

/// `$500.50`, `$1.50K`, `$25.00M`, `$1.50B`
pub fn format_currency(value: f64) -> String {
    match scaled(value) {
        Some(s) => format!("${}", s),
        None => format!("${:.2}", round2(value)),
    }
}

/// `12.35%`
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", round2(value))
}

/// Like [`format_currency`] without the sign; small values drop trailing zeros
pub fn format_number(value: f64) -> String {
    if let Some(s) = scaled(value) {
        return s;
    }
    let fixed = format!("{:.2}", round2(value));
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Local wall-clock time of an epoch-ms timestamp, or `-` when unknown
pub fn format_last_updated(timestamp_ms: Option<i64>) -> String {
    timestamp_ms
        .and_then(|ms| Local.timestamp_millis_opt(ms).single())
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}
