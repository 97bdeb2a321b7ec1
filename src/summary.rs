//! Activity summary
//!
//! Totals and a display date range for the activities inside a window.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::types::{ActivitySummary, NormalizedActivity, ReportingWindow};
use crate::units;

pub const NO_ACTIVITIES_LABEL: &str = "No activities";

/// Summarize normalized activities
///
/// An explicit window labels the summary with the requested dates; otherwise
/// the earliest and latest activity dates are used.
pub fn summarize(activities: Vec<NormalizedActivity>, window: &ReportingWindow) -> ActivitySummary {
    let total_moving_time = activities
        .iter()
        .fold(0_i64, |total, a| total.saturating_add(a.activity.moving_time));

    let mut activities_per_day: BTreeMap<String, u32> = BTreeMap::new();
    for activity in &activities {
        *activities_per_day
            .entry(activity.local_date_str.clone())
            .or_insert(0) += 1;
    }

    let bounds = match window.explicit_range() {
        Some(range) => Some((range.start, range.end)),
        None => {
            let earliest = activities.iter().map(|a| a.local_date).min();
            let latest = activities.iter().map(|a| a.local_date).max();
            earliest.zip(latest)
        }
    };

    let date_range = match bounds {
        Some((start, end)) => format!("{} - {}", display_date(start), display_date(end)),
        None => NO_ACTIVITIES_LABEL.to_string(),
    };

    ActivitySummary {
        date_range,
        start_date: bounds.map(|(start, _)| units::date_key(start)),
        end_date: bounds.map(|(_, end)| units::date_key(end)),
        total_activities: activities.len(),
        total_moving_time,
        total_moving_time_formatted: units::format_duration(total_moving_time),
        activities_per_day,
        activities,
    }
}

/// `Jan 2` style label
fn display_date(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize_activity;
    use crate::types::RawActivity;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_activity(id: i64, on: NaiveDate, moving_time: i64) -> NormalizedActivity {
        let raw = RawActivity {
            id,
            sport_type: "Run".to_string(),
            moving_time,
            ..Default::default()
        };
        normalize_activity(&raw, on)
    }

    #[test]
    fn test_range_from_activities() {
        let activities = vec![
            make_activity(1, date(2025, 11, 5), 1800),
            make_activity(2, date(2025, 11, 2), 3600),
            make_activity(3, date(2025, 11, 5), 61),
        ];

        let summary = summarize(activities, &ReportingWindow::default());

        assert_eq!(summary.date_range, "Nov 2 - Nov 5");
        assert_eq!(summary.start_date.as_deref(), Some("2025-11-02"));
        assert_eq!(summary.end_date.as_deref(), Some("2025-11-05"));
        assert_eq!(summary.total_activities, 3);
        assert_eq!(summary.total_moving_time, 5461);
        assert_eq!(summary.total_moving_time_formatted, "1h 31m 1s");
        assert_eq!(summary.activities_per_day.get("2025-11-05"), Some(&2));
        assert_eq!(summary.activities_per_day.get("2025-11-02"), Some(&1));
    }

    #[test]
    fn test_range_from_explicit_window() {
        let activities = vec![make_activity(1, date(2025, 10, 10), 600)];
        let window = ReportingWindow::between(date(2025, 10, 1), date(2025, 10, 31));

        let summary = summarize(activities, &window);

        assert_eq!(summary.date_range, "Oct 1 - Oct 31");
        assert_eq!(summary.start_date.as_deref(), Some("2025-10-01"));
        assert_eq!(summary.end_date.as_deref(), Some("2025-10-31"));
    }

    #[test]
    fn test_huge_moving_times_saturate() {
        let activities = vec![
            make_activity(1, date(2025, 11, 2), 9_000_000_000_000_000_000),
            make_activity(2, date(2025, 11, 3), 9_000_000_000_000_000_000),
        ];

        let summary = summarize(activities, &ReportingWindow::default());

        assert_eq!(summary.total_moving_time, i64::MAX);
        assert_eq!(summary.total_activities, 2);
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(Vec::new(), &ReportingWindow::default());

        assert_eq!(summary.date_range, NO_ACTIVITIES_LABEL);
        assert!(summary.start_date.is_none());
        assert!(summary.end_date.is_none());
        assert_eq!(summary.total_activities, 0);
        assert_eq!(summary.total_moving_time_formatted, "0s");
        assert!(summary.activities_per_day.is_empty());
    }
}
