//! Display helpers for the CLI tables.

use chrono::{DateTime, Utc};

/// "3 days ago", "1 hour ago", "5 minutes ago" or "Just now". Each unit is
/// used only once the age strictly exceeds one of it.
pub fn relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    const MINUTE: i64 = 60 * 1000;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;

    let diff = (now - ts).num_milliseconds();
    let (n, unit) = if diff > DAY {
        (diff / DAY, "day")
    } else if diff > HOUR {
        (diff / HOUR, "hour")
    } else if diff > MINUTE {
        (diff / MINUTE, "minute")
    } else {
        return "Just now".to_string();
    };
    format!("{} {}{} ago", n, unit, if n > 1 { "s" } else { "" })
}

/// Cut to `max` characters, appending "..." when anything was dropped.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

pub fn opt(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}
