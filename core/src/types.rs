//! Shared primitive types and wire formats used across the pipeline.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Stable integer identifier of a synthetic customer.
pub type CustomerId = u64;

/// Timestamp columns: `YYYY-MM-DD HH:MM:SS`.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date columns: `YYYY-MM-DD`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Month bucket columns are always rendered on the first day.
pub const MONTH_FORMAT: &str = "%Y-%m-01";

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Truncate a timestamp to its calendar date.
pub fn to_date(ts: NaiveDateTime) -> NaiveDate {
    ts.date()
}
