//! Date and time helpers shared by the repositories, statistics and export.
//!
//! Persisted timestamps are epoch milliseconds (UTC). Calendar arithmetic
//! (day windows, week and month buckets) happens in local time, so a task due
//! "today at 23:30" lands in today's bucket wherever the device is.
//!
//! ## Format Specifications
//!
//! - Day window: `[00:00:00.000, 23:59:59.999]` local time, both ends inclusive
//! - Export timestamps: `YYYY-MM-DD HH:MM:SS` local time
//! - Rates: one decimal place with a percent sign (`"66.7%"`)
//!
//! ```rust
//! use chrono::NaiveDate;
//! use detter::libs::formatter::{day_bounds, format_rate};
//!
//! let (start, end) = day_bounds(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
//! assert!(end > start);
//! assert_eq!(format_rate(2.0 / 3.0), "66.7%");
//! ```

use chrono::{DateTime, Datelike, Days, Duration, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

pub const EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

/// Drops anything below the millisecond precision the store keeps.
pub fn truncate_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    from_millis(to_millis(ts)).unwrap_or(ts)
}

pub fn now() -> DateTime<Utc> {
    truncate_millis(Utc::now())
}

/// Epoch milliseconds of a local wall-clock time.
///
/// Wall-clock times skipped by a DST jump resolve to the first instant after
/// the gap.
pub fn local_to_millis(naive: NaiveDateTime) -> i64 {
    match Local.from_local_datetime(&naive).earliest() {
        Some(ts) => ts.timestamp_millis(),
        None => match Local.from_local_datetime(&(naive + Duration::hours(1))).earliest() {
            Some(ts) => ts.timestamp_millis(),
            None => Utc.from_utc_datetime(&naive).timestamp_millis(),
        },
    }
}

pub fn start_of_day(date: NaiveDate) -> i64 {
    local_to_millis(date.and_time(NaiveTime::MIN))
}

pub fn end_of_day(date: NaiveDate) -> i64 {
    let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    local_to_millis(date.and_time(last))
}

/// Inclusive `(start, end)` millisecond bounds of a local calendar day.
pub fn day_bounds(date: NaiveDate) -> (i64, i64) {
    (start_of_day(date), end_of_day(date))
}

/// Local calendar day a UTC instant falls on.
pub fn local_date(ts: DateTime<Utc>) -> NaiveDate {
    ts.with_timezone(&Local).date_naive()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Monday of the week containing `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_monday() as u64;
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

pub fn end_of_week(date: NaiveDate) -> NaiveDate {
    let monday = start_of_week(date);
    monday.checked_add_days(Days::new(6)).unwrap_or(monday)
}

pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let first = start_of_month(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first)
}

/// Local noon of `date`, for building due dates from a bare calendar day.
pub fn local_noon(date: NaiveDate) -> DateTime<Utc> {
    let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN);
    let ms = local_to_millis(date.and_time(noon));
    from_millis(ms).unwrap_or_else(Utc::now)
}

/// Parses a CLI date: `today`, `tomorrow`, `yesterday` or `YYYY-MM-DD`.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let today = today();
    match input.trim().to_lowercase().as_str() {
        "today" => Some(today),
        "tomorrow" => today.succ_opt(),
        "yesterday" => today.pred_opt(),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d").ok(),
    }
}

/// Parses a local `YYYY-MM-DD HH:MM` timestamp.
pub fn parse_local_datetime(input: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(input.trim(), "%Y-%m-%d %H:%M").ok()?;
    from_millis(local_to_millis(naive))
}

pub fn format_local(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format(EXPORT_TIMESTAMP_FORMAT).to_string()
}

pub fn format_rate(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}
