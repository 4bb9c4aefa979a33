//! Lenient parsers for raw session attributes
//!
//! Neither parser fails: malformed input degrades to a default value and the
//! request continues.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a visit date, returning `None` when no supported layout matches
///
/// Timestamps are accepted and truncated to their calendar date. RFC 3339
/// values keep the date as written, without converting between offsets.
/// Slash dates are read month first.
pub fn parse_visit_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        return parse_compact_date(raw);
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// `YYYYMMDD`
fn parse_compact_date(raw: &str) -> Option<NaiveDate> {
    let dashed = format!("{}-{}-{}", &raw[..4], &raw[4..6], &raw[6..]);
    NaiveDate::parse_from_str(&dashed, "%Y-%m-%d").ok()
}

/// Parse a `<width>x<height>` screen resolution
///
/// Without an `'x'` both sides are 0. Otherwise each side is parsed on its own
/// and only when it is made of ASCII digits; anything else yields 0 for that
/// side. Pieces after a second `'x'` are ignored.
pub fn parse_screen_resolution(raw: &str) -> (u32, u32) {
    if !raw.contains('x') {
        return (0, 0);
    }

    let mut parts = raw.split('x');
    let width = parts.next().map_or(0, parse_dimension);
    let height = parts.next().map_or(0, parse_dimension);
    (width, height)
}

fn parse_dimension(part: &str) -> u32 {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    part.parse().unwrap_or(0)
}
