//! Time utility functions
//!
//! Values are stored as microseconds since the Unix epoch (UTC). Ingestion
//! timestamps carry no zone and are read as UTC.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

/// Timestamp layout accepted in ingestion payloads and used for pivot keys
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Convert microseconds since Unix epoch to DateTime<Utc>
pub fn micros_to_datetime(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_else(|| {
        tracing::warn!(micros, "Invalid timestamp, using epoch");
        DateTime::UNIX_EPOCH
    })
}

/// Convert DateTime<Utc> to microseconds since Unix epoch
pub fn datetime_to_micros(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_micros()
}

/// Parse a zone-less `YYYY-MM-DDTHH:MM:SS` timestamp as UTC
pub fn parse_naive_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Format with whole-second resolution as `YYYY-MM-DDTHH:MM:SS`
pub fn format_seconds(dt: DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Drop sub-second precision
pub fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.trunc_subsecs(0)
}
