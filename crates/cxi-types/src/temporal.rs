use chrono::{DateTime, NaiveDateTime};

/// Date layouts found in exports, most common first.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// Parse a date as written by the export (`2012-03-14 10:27:31.000`), or an
/// RFC 3339 timestamp normalized to UTC.
///
/// Returns `None` when no known layout matches.
pub fn parse_export_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}
