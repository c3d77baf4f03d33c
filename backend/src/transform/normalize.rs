//! Normalize record formats.
//!
//! - `timestamp` is parsed from any supported date format and re-serialized
//!   as ISO-8601 UTC with millisecond precision (`2024-01-15T10:30:00.000Z`).
//! - `value` strings that parse fully as a finite number become numbers.
//!
//! An unparseable timestamp rejects the whole batch with
//! [`TransformError::MalformedTimestamp`]. Value coercion never fails.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};

use crate::error::TransformError;
use crate::models::{Record, RecordValue};

/// Naive date-time layouts, read as UTC.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d-%b-%Y %H:%M:%S",
    "%d-%b-%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y%m%dT%H%M%S%.fZ",
    "%Y%m%dT%H%M%S%.f",
    "%Y%m%dT%H%M",
];

/// Date-only layouts, read as midnight UTC.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%m/%d/%Y",
    "%Y%m%d",
];

/// Normalize every record. Fails on the first malformed timestamp.
pub fn transform(records: Vec<Record>) -> Result<Vec<Record>, TransformError> {
    records.into_iter().map(transform_record).collect()
}

/// Normalize a single record.
pub fn transform_record(mut record: Record) -> Result<Record, TransformError> {
    if let Some(raw) = record.timestamp.take() {
        match normalize_timestamp(&raw) {
            Some(iso) => record.timestamp = Some(iso),
            None => {
                return Err(TransformError::MalformedTimestamp {
                    record_id: record.id,
                    value: raw,
                })
            }
        }
    }
    record.value = record.value.map(coerce_value);
    Ok(record)
}

/// Canonical ISO-8601 form of a date string, if it parses.
pub fn normalize_timestamp(raw: &str) -> Option<String> {
    parse_timestamp(raw).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Parse a date string in any supported format.
///
/// Digit-only input is a year when it has four digits and a basic ISO-8601
/// date (`YYYYMMDD`) when it has eight. Other digit strings are rejected;
/// epoch milliseconds are only accepted as JSON numbers, see
/// [`crate::models::epoch_millis_to_iso`].
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        match trimmed.len() {
            4 => {
                let year: i32 = trimmed.parse().ok()?;
                return NaiveDate::from_ymd_opt(year, 1, 1)
                    .map(|d| d.and_time(NaiveTime::MIN).and_utc());
            }
            // basic ISO-8601 date, handled by the date table
            8 => {}
            _ => return None,
        }
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .map(|naive| naive.and_utc())
}

/// Turn numeric strings into numbers; leave everything else alone.
pub fn coerce_value(value: RecordValue) -> RecordValue {
    match value {
        RecordValue::Text(text) => match parse_number(&text) {
            Some(n) => RecordValue::Number(n),
            None => RecordValue::Text(text),
        },
        number => number,
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}
