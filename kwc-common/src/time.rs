//! Timestamp utilities

use chrono::{DateTime, SecondsFormat, Utc};

/// Format used to stamp output workbook names (`YYYYMMDD_HHMMSS`)
pub const OUTPUT_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Stamp appended to output file names
pub fn output_stamp(at: DateTime<Utc>) -> String {
    at.format(OUTPUT_STAMP_FORMAT).to_string()
}

/// RFC 3339 rendering written into the `_processed_at` column
pub fn processed_at(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}
