//! Trend aggregation
//!
//! Groups activities into daily, weekly (Monday start) or monthly buckets,
//! totals distance and moving time per bucket, and sorts buckets by date.
//! Daily series get a centered 3-point moving average on distance; pace is
//! left as computed from each bucket's own totals.

use chrono::{Datelike, Days, NaiveDate};
use std::collections::HashMap;

use crate::classifier::is_running_activity;
use crate::types::{NormalizedActivity, TrendDataPoint, TrendPeriod, TrendSeries};
use crate::units;

/// Width of the daily smoothing window (points)
pub const SMOOTHING_WINDOW: usize = 3;

/// Compute a trend series for one period
///
/// With `running_only` the classifier filter runs before grouping.
pub fn compute_trends(
    activities: &[NormalizedActivity],
    period: TrendPeriod,
    running_only: bool,
) -> TrendSeries {
    let mut buckets: HashMap<NaiveDate, Bucket> = HashMap::new();

    for activity in activities {
        if running_only && !is_running_activity(&activity.activity.sport_type) {
            continue;
        }

        let bucket = buckets
            .entry(period_start(activity.local_date, period))
            .or_default();
        bucket.distance += activity.activity.distance;
        bucket.moving_time = bucket.moving_time.saturating_add(activity.activity.moving_time);
        bucket.count += 1;
    }

    let mut keyed: Vec<(NaiveDate, Bucket)> = buckets.into_iter().collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    let mut points: Vec<TrendDataPoint> = keyed
        .into_iter()
        .map(|(start, bucket)| bucket.into_point(start))
        .collect();

    if period == TrendPeriod::Daily && points.len() > 1 {
        smooth_distances(&mut points, SMOOTHING_WINDOW);
    }

    TrendSeries { period, points }
}

/// First day of the bucket containing `date`
pub fn period_start(date: NaiveDate, period: TrendPeriod) -> NaiveDate {
    match period {
        TrendPeriod::Daily => date,
        TrendPeriod::Weekly => {
            // Monday = 1 ... Sunday = 7
            let offset = date.weekday().number_from_monday() - 1;
            date.checked_sub_days(Days::new(u64::from(offset)))
                .unwrap_or(date)
        }
        TrendPeriod::Monthly => date.with_day(1).unwrap_or(date),
    }
}

#[derive(Debug, Default)]
struct Bucket {
    distance: f64,
    moving_time: i64,
    count: u32,
}

impl Bucket {
    fn into_point(self, start: NaiveDate) -> TrendDataPoint {
        let paces = units::pace_strings(self.moving_time, self.distance);

        TrendDataPoint {
            date: units::date_key(start),
            distance: self.distance,
            distance_miles: units::meters_to_miles(self.distance),
            moving_time: self.moving_time,
            pace: paces.as_ref().map(|(per_mile, _)| per_mile.clone()),
            pace_min_per_km: paces.map(|(_, per_km)| per_km),
            count: self.count,
        }
    }
}

/// Centered moving average over distance, clamped at both ends
///
/// Only buckets with nonzero distance count toward the denominator.
/// Reads come from the unsmoothed series so each point sees raw neighbors.
fn smooth_distances(points: &mut [TrendDataPoint], window: usize) {
    let raw: Vec<f64> = points.iter().map(|p| p.distance).collect();
    let half = window / 2;

    for (i, point) in points.iter_mut().enumerate() {
        let lo = i.saturating_sub(half);
        let hi = (i + half + 1).min(raw.len());
        let neighbors = &raw[lo..hi];

        let sum: f64 = neighbors.iter().sum();
        let nonzero = neighbors.iter().filter(|d| **d != 0.0).count();

        if nonzero > 0 {
            let average = sum / nonzero as f64;
            point.distance = average;
            point.distance_miles = units::meters_to_miles(average);
        }
    }
}
