//! Activity normalization
//!
//! This module filters raw activities to a reporting window and converts each
//! survivor into a [`NormalizedActivity`]:
//! - Calendar date taken from the wall-clock start time
//! - Distances in km and miles, elevation in feet, speeds in km/h and mph
//! - Moving time in hours and as a display string

use chrono::{Local, NaiveDate};

use crate::types::{NormalizedActivity, RawActivity, ReportingWindow};
use crate::units;

/// Normalizer for converting raw activities to normalized activities
pub struct Normalizer;

impl Normalizer {
    /// Normalize activities against a window relative to the local calendar date
    pub fn normalize(
        activities: &[RawActivity],
        window: &ReportingWindow,
    ) -> Vec<NormalizedActivity> {
        Self::normalize_as_of(activities, window, Local::now().date_naive())
    }

    /// Normalize activities against a window relative to `today`
    ///
    /// Output keeps the input order. Activities without a usable local start
    /// time are skipped.
    pub fn normalize_as_of(
        activities: &[RawActivity],
        window: &ReportingWindow,
        today: NaiveDate,
    ) -> Vec<NormalizedActivity> {
        let range = window.resolve(today);

        activities
            .iter()
            .filter_map(|activity| {
                let start_local = activity.start_date_local?;
                let local_date = units::to_local_date(start_local, activity.timezone.as_deref());
                range
                    .contains(local_date)
                    .then(|| normalize_activity(activity, local_date))
            })
            .collect()
    }
}

/// Convert one activity; every derived field depends only on its raw field
pub fn normalize_activity(activity: &RawActivity, local_date: NaiveDate) -> NormalizedActivity {
    NormalizedActivity {
        activity: activity.clone(),
        local_date,
        local_date_str: units::date_key(local_date),
        distance_km: units::meters_to_km(activity.distance),
        distance_miles: units::meters_to_miles(activity.distance),
        moving_time_hours: units::seconds_to_hours(activity.moving_time),
        moving_time_formatted: units::format_duration(activity.moving_time),
        elevation_gain_meters: activity.total_elevation_gain,
        elevation_gain_feet: units::meters_to_feet(activity.total_elevation_gain),
        average_speed_kmh: units::mps_to_kmh(activity.average_speed),
        average_speed_mph: units::mps_to_mph(activity.average_speed),
        max_speed_kmh: units::mps_to_kmh(activity.max_speed),
        max_speed_mph: units::mps_to_mph(activity.max_speed),
    }
}
