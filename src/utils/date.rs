//! Date parsing for field values.
//!
//! Field values carry dates as strings (`2024-01-15`, RFC 3339 with or
//! without fractional seconds and offsets) or as epoch milliseconds. All
//! of them normalize to UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Calendar parts of a UTC date, zero-padded for use in paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParts {
    pub year: String,
    pub month: String,
    pub day: String,
}

/// Parse a date string into UTC.
///
/// Accepts:
/// - `YYYY-MM-DD`
/// - RFC 3339 (`2018-09-04T23:20:33.918Z`, `2018-09-04T23:20:33+02:00`)
/// - naive date-times (`2018-09-04T23:20:33`, `2018-09-04 23:20:33`), read as UTC
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse a field value (string or epoch milliseconds) into UTC.
pub fn parse_date_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_date(s),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Split a UTC date into zero-padded `YYYY`, `MM`, `DD` parts.
pub fn date_parts(date: &DateTime<Utc>) -> DateParts {
    DateParts {
        year: date.format("%Y").to_string(),
        month: date.format("%m").to_string(),
        day: date.format("%d").to_string(),
    }
}

/// Whether two dates fall on the same UTC calendar day.
pub fn same_day(a: &DateTime<Utc>, b: &DateTime<Utc>) -> bool {
    a.date_naive() == b.date_naive()
}
