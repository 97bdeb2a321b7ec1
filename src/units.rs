//! Unit and time conversion
//!
//! Fixed-factor conversions from raw physical units to display units, the
//! duration and pace string formats, and calendar-date extraction.
//! Conversions never round; rounding happens only when a string is formatted.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};

pub const METERS_PER_KILOMETER: f64 = 1000.0;
pub const METERS_PER_MILE: f64 = 1609.34;
pub const FEET_PER_METER: f64 = 3.28084;
pub const KMH_PER_MPS: f64 = 3.6;
pub const MPH_PER_MPS: f64 = 2.23694;
pub const SECONDS_PER_HOUR: f64 = 3600.0;

pub fn meters_to_km(meters: f64) -> f64 {
    meters / METERS_PER_KILOMETER
}

pub fn meters_to_miles(meters: f64) -> f64 {
    meters / METERS_PER_MILE
}

pub fn meters_to_feet(meters: f64) -> f64 {
    meters * FEET_PER_METER
}

pub fn mps_to_kmh(mps: f64) -> f64 {
    mps * KMH_PER_MPS
}

pub fn mps_to_mph(mps: f64) -> f64 {
    mps * MPH_PER_MPS
}

pub fn seconds_to_hours(seconds: i64) -> f64 {
    seconds as f64 / SECONDS_PER_HOUR
}

/// Calendar date an activity is attributed to
///
/// The year/month/day written in the wall-clock start time are authoritative.
/// The timezone label is not applied: the upstream "local" timestamp already
/// carries the athlete's day, and projecting it through a zone can move it
/// across midnight.
pub fn to_local_date(start_local: NaiveDateTime, _timezone: Option<&str>) -> NaiveDate {
    start_local.date()
}

/// Strip time of day, keeping the date as seen in the timestamp's own offset
pub fn truncate_to_calendar_date<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> NaiveDate {
    timestamp.date_naive()
}

/// `YYYY-MM-DD` key for grouping and sorting
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format seconds as `1h 1m 1s`, omitting zero components
///
/// Anything under a minute renders as plain seconds, including `0s`.
pub fn format_duration(seconds: i64) -> String {
    if seconds < 60 {
        return format!("{}s", seconds);
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if secs > 0 {
        parts.push(format!("{}s", secs));
    }

    parts.join(" ")
}

/// Format a pace in seconds per unit as `M:SS`, rounded to the nearest second
pub fn format_pace(seconds_per_unit: f64) -> String {
    let total = seconds_per_unit.round() as i64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Pace strings (per mile, per km) from aggregate time and distance
///
/// Returns `None` when either total is not positive, so callers never
/// render a pace from a division by zero.
pub fn pace_strings(moving_time: i64, distance_meters: f64) -> Option<(String, String)> {
    if moving_time <= 0 || !(distance_meters > 0.0) {
        return None;
    }

    let seconds_per_meter = moving_time as f64 / distance_meters;
    Some((
        format_pace(seconds_per_meter * METERS_PER_MILE),
        format_pace(seconds_per_meter * METERS_PER_KILOMETER),
    ))
}

/// Round to one decimal place
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
