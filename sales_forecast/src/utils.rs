//! Utility functions for the sales_forecast crate

use chrono::{NaiveDate, NaiveTime};

/// Date formats tried in order when parsing the `Date` column
pub const DEFAULT_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d"];

/// Time formats tried in order when parsing the `Time` column
pub const DEFAULT_TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M:%S %p"];

/// Create `horizon` consecutive calendar dates following `last_date`
pub fn future_dates(last_date: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    last_date.iter_days().skip(1).take(horizon).collect()
}

/// Parse a date using the first matching format
pub fn parse_date<S: AsRef<str>>(value: &str, formats: &[S]) -> Option<NaiveDate> {
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value.trim(), format.as_ref()).ok())
}

/// Parse a wall-clock time using the first matching format
pub fn parse_time<S: AsRef<str>>(value: &str, formats: &[S]) -> Option<NaiveTime> {
    formats
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value.trim(), format.as_ref()).ok())
}

/// Normalize a header: trim, lower-case, spaces to underscores
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}
