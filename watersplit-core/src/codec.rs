//! Comma-decimal number parsing and rendering.
//!
//! Every textual boundary in this system speaks the same wire format:
//! `<digits>[,<fractional digits>]<optional unit marker>` where the marker is
//! the euro sign, `m3` (either glyph variant) or a percent sign.

use regex::Regex;

/// Unit markers stripped before any numeric interpretation. `EUR` must come
/// before `€` so exports that spelled the currency out are handled too.
const UNIT_MARKERS: [&str; 5] = ["EUR", "€", "m3", "m³", "%"];

fn strip_markers(text: &str) -> String {
    let mut cleaned = text.trim().to_string();
    for marker in UNIT_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }
    cleaned.replace(' ', "")
}

/// Parse comma-decimal text into a number.
///
/// Missing or unparseable input yields `None`, never an error: the absence
/// of a value is the signal, and callers decide whether the field was
/// required. In particular `None` is not zero.
pub fn parse_number(value: Option<&str>) -> Option<f64> {
    let text = value?.trim();
    if text.is_empty() {
        return None;
    }
    strip_markers(text).replace(',', ".").parse::<f64>().ok()
}

/// Strict text-level decimal check, independent of [`parse_number`].
///
/// After stripping the same unit markers: rejects missing/empty input, more
/// than one comma, and anything but ASCII digits in either part. The
/// fractional part may have at most `max_decimals` digits; an integer-only
/// string is always valid. Validated fields must pass this *and* parse.
pub fn validate_decimal_places(value: Option<&str>, max_decimals: usize) -> bool {
    let Some(text) = value else {
        return false;
    };
    let text = strip_markers(text);
    if text.is_empty() {
        return false;
    }
    let Ok(wire) = Regex::new(r"^[0-9]*(?:,(?P<frac>[0-9]+))?$") else {
        return false;
    };
    let Some(caps) = wire.captures(&text) else {
        return false;
    };
    match caps.name("frac") {
        Some(frac) => frac.as_str().len() <= max_decimals,
        None => true,
    }
}

/// Fixed-point rendering with comma as the decimal separator. No thousands
/// grouping.
pub fn format_number(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}").replace('.', ",")
}

/// Render a monetary amount: two decimals plus the euro sign.
pub fn format_eur(value: f64) -> String {
    format!("{}€", format_number(value, 2))
}

/// Render a volume: three decimals plus a literal ASCII `m3` suffix.
///
/// The sign is handled explicitly, and the suffix stays ASCII because the
/// cubic-meter glyph does not survive plain-text exports.
pub fn format_m3(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}m3", sign, format_number(value.abs(), 3))
}
