//! Interval strings from config files.

use std::time::Duration;

/// Parse a duration string like "30s", "5m" or "45" into seconds.
///
/// Returns `None` when the numeric part does not parse or the result does
/// not fit in a `u64`.
pub fn parse_duration_secs(s: &str) -> Option<u64> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        secs.trim().parse::<u64>().ok()
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim().parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        s.parse::<u64>().ok()
    }
}

/// Like [`parse_duration_secs`] but falls back to `default` on bad input.
pub fn parse_duration_or(s: &str, default: Duration) -> Duration {
    parse_duration_secs(s)
        .map(Duration::from_secs)
        .unwrap_or(default)
}
