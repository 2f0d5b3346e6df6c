//! Time Features - hour / weekday from the alert timestamp
//!
//! Timestamps keep the wall clock of their own offset; unparseable → None.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::logic::alert::{AlertRecord, FieldValue};

/// Offset-aware formats tried after RFC 3339
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Parse a timestamp string; None if no known format matches
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.naive_local());
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// (hour, weekday) with Monday = 0; (0, 0) when missing or unparseable
pub fn time_features(record: &AlertRecord, field: &str) -> (u32, u32) {
    let parsed = match record.get(field) {
        Some(FieldValue::Text(raw)) => parse_timestamp(raw),
        _ => None,
    };

    parsed
        .map(|dt| (dt.hour(), dt.weekday().num_days_from_monday()))
        .unwrap_or((0, 0))
}
