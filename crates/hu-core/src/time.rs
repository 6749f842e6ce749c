//! Wall-clock helpers for console timestamps

use std::time::{SystemTime, UNIX_EPOCH};

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Current Unix timestamp in seconds
///
/// A clock set before 1970 reads as the epoch.
pub fn current_time_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Format a Unix timestamp as `HH:MM:SS` (UTC)
pub fn clock_time(unix_secs: u64) -> String {
    let of_day = unix_secs % SECS_PER_DAY;
    format!(
        "{:02}:{:02}:{:02}",
        of_day / 3600,
        (of_day % 3600) / 60,
        of_day % 60
    )
}

/// `[HH:MM:SS]` prefix for a console line written now
pub fn console_stamp() -> String {
    format!("[{}]", clock_time(current_time_secs()))
}
