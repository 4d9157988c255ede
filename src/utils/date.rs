use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// `MM/DD/YYYY HH:MM:SS`, matched anywhere in the text
static START_TIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2})/(\d{2})/(\d{4}) (\d{2}):(\d{2}):(\d{2})")
        .expect("start time pattern is a valid regex")
});

const CANONICAL_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Parse a backup start time as UTC.
///
/// Returns `None` when the text does not contain the pattern or names an
/// impossible date; such rows count as unparseable for filtering and sort as
/// the earliest possible time.
pub fn parse_start_time(text: &str) -> Option<DateTime<Utc>> {
    let caps = START_TIME_PATTERN.captures(text)?;
    let iso = format!(
        "{}-{}-{}T{}:{}:{}Z",
        &caps[3], &caps[1], &caps[2], &caps[4], &caps[5], &caps[6]
    );
    DateTime::parse_from_rfc3339(&iso)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Render a timestamp in the canonical row format
pub fn format_start_time(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(CANONICAL_FORMAT).to_string()
}

/// Convert a vendor RFC 3339 timestamp to the canonical row format.
/// Anything else is kept verbatim; a missing value becomes empty.
pub fn reformat_vendor_time(raw: Option<&str>) -> String {
    match raw {
        None => String::new(),
        Some(text) => match DateTime::parse_from_rfc3339(text.trim()) {
            Ok(dt) => format_start_time(&dt.with_timezone(&Utc)),
            Err(_) => text.to_string(),
        },
    }
}
