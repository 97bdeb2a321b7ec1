//! Core types for the Strava Stats engine
//!
//! This module defines the value structures that flow through each stage of the
//! engine: raw activities, normalized activities, the reporting window, and the
//! analytics outputs (running stats, personal records, histogram, trends).

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::StatsError;
use crate::ingest::lenient;

/// Raw activity as delivered by the upstream source
///
/// Field names follow the upstream JSON so a fetched payload deserializes
/// directly. Timestamps go through the lenient parsers in [`crate::ingest`];
/// an unparseable timestamp becomes `None` instead of failing the whole payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawActivity {
    pub id: i64,
    pub name: String,
    pub sport_type: String,
    /// Absolute start instant (UTC)
    #[serde(deserialize_with = "lenient::utc_instant")]
    pub start_date: Option<DateTime<Utc>>,
    /// Wall-clock start time as seen by the athlete
    #[serde(deserialize_with = "lenient::wall_clock")]
    pub start_date_local: Option<NaiveDateTime>,
    /// IANA timezone label, informational only
    pub timezone: Option<String>,
    /// Moving time (seconds)
    pub moving_time: i64,
    /// Elapsed time (seconds)
    pub elapsed_time: i64,
    /// Distance (meters)
    pub distance: f64,
    /// Elevation gain (meters)
    pub total_elevation_gain: f64,
    /// Average speed (m/s)
    pub average_speed: f64,
    /// Max speed (m/s)
    pub max_speed: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_cadence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_watts: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weighted_average_watts: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kilojoules: Option<f64>,
    pub has_heartrate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_heartrate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_heartrate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elev_high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elev_low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workout_type: Option<i32>,
}

/// Activity with its calendar date resolved and units converted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedActivity {
    #[serde(flatten)]
    pub activity: RawActivity,
    /// Calendar date the activity is attributed to
    pub local_date: NaiveDate,
    /// `local_date` as `YYYY-MM-DD`, used for grouping and sorting
    pub local_date_str: String,
    pub distance_km: f64,
    pub distance_miles: f64,
    pub moving_time_hours: f64,
    pub moving_time_formatted: String,
    pub elevation_gain_meters: f64,
    pub elevation_gain_feet: f64,
    pub average_speed_kmh: f64,
    pub average_speed_mph: f64,
    pub max_speed_kmh: f64,
    pub max_speed_mph: f64,
}

/// Inclusive window of calendar dates an activity must fall in
///
/// An explicit `start_date`/`end_date` pair wins over `days_back`. Either
/// bound alone is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingWindow {
    pub days_back: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl Default for ReportingWindow {
    fn default() -> Self {
        Self::last_days(Self::DEFAULT_DAYS_BACK)
    }
}

impl ReportingWindow {
    pub const DEFAULT_DAYS_BACK: i64 = 7;

    /// Window ending today and reaching `days` back
    pub fn last_days(days: i64) -> Self {
        Self {
            days_back: days,
            start_date: None,
            end_date: None,
        }
    }

    /// Explicit inclusive window
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            days_back: Self::DEFAULT_DAYS_BACK,
            start_date: Some(start),
            end_date: Some(end),
        }
    }

    /// Explicit pair of dates, if both are set
    pub fn explicit_range(&self) -> Option<DateRange> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some(DateRange { start, end }),
            _ => None,
        }
    }

    /// `days_back`, with non-positive values replaced by the default
    pub fn effective_days_back(&self) -> i64 {
        if self.days_back <= 0 {
            Self::DEFAULT_DAYS_BACK
        } else {
            self.days_back
        }
    }

    /// Resolve to concrete bounds, relative to `today` when not explicit
    pub fn resolve(&self, today: NaiveDate) -> DateRange {
        if let Some(range) = self.explicit_range() {
            return range;
        }

        let days = self.effective_days_back() as u64;
        let start = today
            .checked_sub_days(Days::new(days))
            .unwrap_or(NaiveDate::MIN);

        DateRange { start, end: today }
    }

    /// Check the window before handing it to the engine
    ///
    /// The engine never rejects a window; callers that accept windows from
    /// users run this first.
    pub fn validate(&self) -> Result<(), StatsError> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start > end => Err(StatsError::InvalidWindow(format!(
                "start date {} is after end date {}",
                start, end
            ))),
            (Some(_), None) => Err(StatsError::InvalidWindow(
                "start date given without end date".to_string(),
            )),
            (None, Some(_)) => Err(StatsError::InvalidWindow(
                "end date given without start date".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Resolved inclusive date bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Aggregate running statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningStats {
    pub total_runs: u32,
    pub runs_over_10k: u32,
    /// Total distance (meters)
    pub total_distance: f64,
    pub total_distance_miles: f64,
    /// Total moving time (seconds)
    pub total_moving_time: i64,
    /// Weighted average pace, `M:SS` per mile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_pace: Option<String>,
    /// Weighted average pace, `M:SS` per kilometer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_pace_min_per_km: Option<String>,
}

/// Snapshot of a single run, copied out of the activity it describes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: i64,
    pub name: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// Distance (meters)
    pub distance: f64,
    pub distance_miles: f64,
    /// Moving time (seconds)
    pub moving_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pace_min_per_km: Option<String>,
    /// Elevation gain (meters)
    pub elevation_gain: f64,
    pub elevation_gain_feet: f64,
}

/// Personal bests; a category with no qualifying run is absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalRecords {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fastest_mile: Option<RunRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fastest_10k: Option<RunRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longest_run: Option<RunRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_elevation: Option<RunRecord>,
}

/// One distance bucket `[start_meters, end_meters)`; the last bin also holds overflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    /// Label in miles, e.g. `0.0-1.0 mi`
    pub range: String,
    /// Label in kilometers, e.g. `0.0-1.6 km`
    pub range_km: String,
    pub start_meters: f64,
    pub end_meters: f64,
    pub count: u32,
    /// Total distance of the runs in this bin (meters)
    pub distance: f64,
    pub distance_miles: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceHistogram {
    pub bins: Vec<HistogramBin>,
}

/// Grouping granularity for trends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendPeriod {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl TrendPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendPeriod::Daily => "daily",
            TrendPeriod::Weekly => "weekly",
            TrendPeriod::Monthly => "monthly",
        }
    }
}

impl fmt::Display for TrendPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendPeriod {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(TrendPeriod::Daily),
            "weekly" => Ok(TrendPeriod::Weekly),
            "monthly" => Ok(TrendPeriod::Monthly),
            other => Err(StatsError::InvalidPeriod(other.to_string())),
        }
    }
}

/// One bucket of a trend series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendDataPoint {
    /// Bucket key (`YYYY-MM-DD`); the first day of the bucket for weekly/monthly
    pub date: String,
    /// Total distance in the bucket (meters); smoothed for daily series
    pub distance: f64,
    pub distance_miles: f64,
    /// Total moving time in the bucket (seconds)
    pub moving_time: i64,
    /// Pace from the bucket's total time over total distance, `M:SS` per mile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pace_min_per_km: Option<String>,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub period: TrendPeriod,
    pub points: Vec<TrendDataPoint>,
}

/// Overview of the activities inside a reporting window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    /// Display label such as `Nov 1 - Nov 7`, or `No activities`
    pub date_range: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub total_activities: usize,
    /// Total moving time (seconds)
    pub total_moving_time: i64,
    pub total_moving_time_formatted: String,
    pub activities_per_day: BTreeMap<String, u32>,
    pub activities: Vec<NormalizedActivity>,
}

/// Running stats, records and histogram computed together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningReport {
    pub stats: RunningStats,
    pub prs: PersonalRecords,
    pub histogram: DistanceHistogram,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendsReport {
    pub period: TrendPeriod,
    pub running_only: bool,
    pub trends: TrendSeries,
}
