//! Date text normalization to the day-first display format.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DISPLAY_FMT: &str = "%d/%m/%Y";

/// Normalize heterogeneous date text to `DD/MM/YYYY`.
///
/// Missing/empty input passes through unchanged. Any time component is
/// dropped; this is display-only and intentionally lossy. Text that no
/// format recognizes comes back verbatim: an unreadable date still renders.
pub fn format_date(value: Option<&str>) -> Option<String> {
    let text = value?;
    if text.is_empty() {
        return Some(String::new());
    }
    if let Some(date) = parse_known(text) {
        return Some(date.format(DISPLAY_FMT).to_string());
    }
    Some(text.to_string())
}

// Known source formats, tried in order: year-first ISO date, ISO
// date-time, day-first date, day-first date-time.
fn parse_known(text: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%d/%m/%Y") {
        return Some(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%d/%m/%Y %H:%M") {
        return Some(dt.date());
    }
    // Generic ISO fallback: offset-carrying timestamps and fractional
    // seconds, as written by machine clocks into the local store.
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.date());
    }
    None
}
