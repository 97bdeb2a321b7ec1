//! Running statistics and personal records
//!
//! Both computations look only at running activities (see
//! [`crate::classifier`]) and make a single pass over their input.
//! Paces are weighted: total moving time over total distance, never the mean
//! of per-run paces.

use crate::classifier::is_running_activity;
use crate::types::{NormalizedActivity, PersonalRecords, RunRecord, RunningStats};
use crate::units::{self, METERS_PER_MILE};

pub const TEN_K_METERS: f64 = 10_000.0;
/// Accepted deviation from a mile for the fastest-mile record (meters)
pub const MILE_TOLERANCE_METERS: f64 = 200.0;
/// Accepted deviation from 10 km for the fastest-10K record (meters)
pub const TEN_K_TOLERANCE_METERS: f64 = 500.0;

/// Aggregate totals and weighted average pace over running activities
pub fn compute_running_stats(activities: &[NormalizedActivity]) -> RunningStats {
    let mut stats = RunningStats::default();

    for run in running(activities) {
        stats.total_runs += 1;
        stats.total_distance += run.activity.distance;
        stats.total_moving_time = stats
            .total_moving_time
            .saturating_add(run.activity.moving_time);

        if run.activity.distance >= TEN_K_METERS {
            stats.runs_over_10k += 1;
        }
    }

    stats.total_distance_miles = units::meters_to_miles(stats.total_distance);

    let paces = units::pace_strings(stats.total_moving_time, stats.total_distance);
    if let Some((per_mile, per_km)) = paces {
        stats.average_pace = Some(per_mile);
        stats.average_pace_min_per_km = Some(per_km);
    }

    stats
}

/// Best-so-far entry for one record category
struct Incumbent {
    value: f64,
    record: RunRecord,
}

/// Replace the incumbent only when `candidate` strictly beats it
///
/// Ties keep the earlier activity, so results are stable for a given order.
fn challenge(
    slot: &mut Option<Incumbent>,
    candidate: f64,
    beats: fn(f64, f64) -> bool,
    activity: &NormalizedActivity,
) {
    let wins = match slot {
        Some(incumbent) => beats(candidate, incumbent.value),
        None => true,
    };

    if wins {
        *slot = Some(Incumbent {
            value: candidate,
            record: create_run_record(activity),
        });
    }
}

fn lower(a: f64, b: f64) -> bool {
    a < b
}

fn higher(a: f64, b: f64) -> bool {
    a > b
}

fn within(distance: f64, target: f64, tolerance: f64) -> bool {
    distance >= target - tolerance && distance <= target + tolerance
}

/// Fastest mile, fastest 10K, longest run and most elevation
pub fn compute_personal_records(activities: &[NormalizedActivity]) -> PersonalRecords {
    let mut fastest_mile = None;
    let mut fastest_10k = None;
    let mut longest_run = None;
    let mut most_elevation = None;

    for run in running(activities) {
        let distance = run.activity.distance;
        let moving_time = run.activity.moving_time as f64;

        if within(distance, METERS_PER_MILE, MILE_TOLERANCE_METERS) {
            challenge(&mut fastest_mile, moving_time, lower, run);
        }

        if within(distance, TEN_K_METERS, TEN_K_TOLERANCE_METERS) {
            challenge(&mut fastest_10k, moving_time, lower, run);
        }

        challenge(&mut longest_run, distance, higher, run);
        challenge(
            &mut most_elevation,
            run.activity.total_elevation_gain,
            higher,
            run,
        );
    }

    PersonalRecords {
        fastest_mile: fastest_mile.map(|i| i.record),
        fastest_10k: fastest_10k.map(|i| i.record),
        longest_run: longest_run.map(|i| i.record),
        most_elevation: most_elevation.map(|i| i.record),
    }
}

/// Copy an activity's identity and metrics into a standalone record
pub fn create_run_record(activity: &NormalizedActivity) -> RunRecord {
    let raw = &activity.activity;
    let paces = units::pace_strings(raw.moving_time, raw.distance);

    RunRecord {
        id: raw.id,
        name: raw.name.clone(),
        date: activity.local_date_str.clone(),
        distance: raw.distance,
        distance_miles: activity.distance_miles,
        moving_time: raw.moving_time,
        pace: paces.as_ref().map(|(per_mile, _)| per_mile.clone()),
        pace_min_per_km: paces.map(|(_, per_km)| per_km),
        elevation_gain: raw.total_elevation_gain,
        elevation_gain_feet: activity.elevation_gain_feet,
    }
}

fn running(activities: &[NormalizedActivity]) -> impl Iterator<Item = &NormalizedActivity> {
    activities
        .iter()
        .filter(|a| is_running_activity(&a.activity.sport_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize_activity;
    use crate::types::RawActivity;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn make_run(id: i64, sport: &str, distance: f64, moving_time: i64, elevation: f64) -> NormalizedActivity {
        let raw = RawActivity {
            id,
            name: format!("run {}", id),
            sport_type: sport.to_string(),
            distance,
            moving_time,
            total_elevation_gain: elevation,
            ..Default::default()
        };
        normalize_activity(&raw, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    fn record_id(record: &Option<RunRecord>) -> Option<i64> {
        record.as_ref().map(|r| r.id)
    }

    #[test]
    fn test_weighted_average_pace() {
        let activities = vec![
            make_run(1, "Run", 5000.0, 1800, 0.0),
            make_run(2, "Run", 10000.0, 3000, 0.0),
        ];

        let stats = compute_running_stats(&activities);

        assert_eq!(stats.total_runs, 2);
        assert_eq!(stats.runs_over_10k, 1);
        assert_eq!(stats.total_distance, 15000.0);
        assert_eq!(stats.total_moving_time, 4800);

        // 4800 / 15000 = 0.32 s/m -> 320 s/km, 514.99 s/mi
        assert_eq!(stats.average_pace_min_per_km.as_deref(), Some("5:20"));
        assert_eq!(stats.average_pace.as_deref(), Some("8:35"));

        // The mean of the two per-km paces (360 s and 300 s) would be 5:30
        assert_ne!(stats.average_pace_min_per_km.as_deref(), Some("5:30"));
    }

    #[test]
    fn test_stats_ignore_non_running() {
        let activities = vec![
            make_run(1, "Ride", 40000.0, 5400, 300.0),
            make_run(2, "TrailRun", 8000.0, 3000, 250.0),
            make_run(3, "Walk", 3000.0, 1800, 10.0),
        ];

        let stats = compute_running_stats(&activities);

        assert_eq!(stats.total_runs, 1);
        assert_eq!(stats.total_distance, 8000.0);
        assert!((stats.total_distance_miles - 8000.0 / 1609.34).abs() < 1e-9);
    }

    #[test]
    fn test_stats_zero_distance_has_no_pace() {
        let activities = vec![make_run(1, "VirtualRun", 0.0, 600, 0.0)];

        let stats = compute_running_stats(&activities);

        assert_eq!(stats.total_runs, 1);
        assert!(stats.average_pace.is_none());
        assert!(stats.average_pace_min_per_km.is_none());
    }

    #[test]
    fn test_mile_tolerance_band() {
        let inside = vec![make_run(1, "Run", 1700.0, 400, 0.0)];
        let prs = compute_personal_records(&inside);
        assert_eq!(record_id(&prs.fastest_mile), Some(1));

        let outside = vec![make_run(2, "Run", 1900.0, 400, 0.0)];
        let prs = compute_personal_records(&outside);
        assert!(prs.fastest_mile.is_none());

        let edges = vec![
            make_run(3, "Run", 1410.0, 500, 0.0),
            make_run(4, "Run", 1809.0, 450, 0.0),
        ];
        let prs = compute_personal_records(&edges);
        assert_eq!(record_id(&prs.fastest_mile), Some(4));
    }

    #[test]
    fn test_fastest_10k_band() {
        let activities = vec![
            make_run(1, "Run", 9400.0, 2400, 0.0),
            make_run(2, "Run", 9600.0, 2900, 0.0),
            make_run(3, "Run", 10400.0, 2800, 0.0),
            make_run(4, "Run", 10600.0, 2500, 0.0),
        ];

        let prs = compute_personal_records(&activities);

        assert_eq!(record_id(&prs.fastest_10k), Some(3));
    }

    #[test]
    fn test_ties_keep_first_seen() {
        let activities = vec![
            make_run(1, "Run", 1609.0, 420, 50.0),
            make_run(2, "Run", 1609.0, 420, 50.0),
            make_run(3, "Run", 1500.0, 430, 20.0),
        ];

        let prs = compute_personal_records(&activities);

        assert_eq!(record_id(&prs.fastest_mile), Some(1));
        assert_eq!(record_id(&prs.longest_run), Some(1));
        assert_eq!(record_id(&prs.most_elevation), Some(1));
    }

    #[test]
    fn test_categories_are_independent() {
        let activities = vec![
            make_run(1, "Run", 21097.0, 6300, 40.0),
            make_run(2, "TrailRun", 12000.0, 5000, 600.0),
            make_run(3, "Ride", 90000.0, 10800, 1200.0),
        ];

        let prs = compute_personal_records(&activities);

        assert!(prs.fastest_mile.is_none());
        assert!(prs.fastest_10k.is_none());
        assert_eq!(record_id(&prs.longest_run), Some(1));
        assert_eq!(record_id(&prs.most_elevation), Some(2));
    }

    #[test]
    fn test_run_record_is_a_copy() {
        let mut activities = vec![make_run(7, "Run", 10000.0, 2700, 85.0)];

        let prs = compute_personal_records(&activities);
        activities[0].activity.name = "renamed".to_string();
        activities[0].activity.moving_time = 1;

        let expected = RunRecord {
            id: 7,
            name: "run 7".to_string(),
            date: "2024-06-01".to_string(),
            distance: 10000.0,
            distance_miles: 10000.0 / 1609.34,
            moving_time: 2700,
            pace: Some("7:15".to_string()),
            pace_min_per_km: Some("4:30".to_string()),
            elevation_gain: 85.0,
            elevation_gain_feet: 85.0 * 3.28084,
        };
        assert_eq!(prs.fastest_10k, Some(expected));
    }

    #[test]
    fn test_huge_moving_times_saturate() {
        let activities = vec![
            make_run(1, "Run", 5000.0, 9_000_000_000_000_000_000, 0.0),
            make_run(2, "Run", 5000.0, 9_000_000_000_000_000_000, 0.0),
        ];

        let stats = compute_running_stats(&activities);

        assert_eq!(stats.total_runs, 2);
        assert_eq!(stats.total_moving_time, i64::MAX);
        assert!(stats.average_pace.is_some());
    }

    #[test]
    fn test_empty_input() {
        let stats = compute_running_stats(&[]);
        assert_eq!(stats, RunningStats::default());

        let prs = compute_personal_records(&[]);
        assert_eq!(prs, PersonalRecords::default());
    }
}
