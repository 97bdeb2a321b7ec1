//! Activity ingestion
//!
//! Parses upstream activity payloads into [`RawActivity`] values. This is the
//! one place where timestamp strings become typed values, so the contract for
//! the "local" start time lives here:
//!
//! - `start_date_local` is read as wall-clock time. The date and time written
//!   in the string are kept and any offset suffix (`Z`, `+02:00`) is dropped,
//!   never applied.
//! - `start_date` is an absolute instant and is converted to UTC.
//! - A missing or malformed timestamp becomes `None`; the activity still
//!   parses and is later excluded by the normalizer.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::StatsError;
use crate::types::RawActivity;

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parse a wall-clock timestamp without applying any offset it carries
pub fn parse_wall_clock(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse an absolute timestamp; offset-less input is taken as UTC
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    parse_wall_clock(raw).map(|naive| naive.and_utc())
}

/// Adapter for upstream activity payloads
pub struct ActivityAdapter;

impl ActivityAdapter {
    /// Parse a JSON array of activities
    pub fn parse_array(raw_json: &str) -> Result<Vec<RawActivity>, StatsError> {
        Ok(serde_json::from_str(raw_json)?)
    }

    /// Parse newline-delimited JSON, one activity per line
    pub fn parse_ndjson(raw: &str) -> Result<Vec<RawActivity>, StatsError> {
        let mut activities = Vec::new();

        for (line_no, line) in raw.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let activity: RawActivity = serde_json::from_str(trimmed).map_err(|e| {
                StatsError::SourceError(format!("line {}: {}", line_no + 1, e))
            })?;
            activities.push(activity);
        }

        Ok(activities)
    }

    /// Concatenate pages in fetch order
    pub fn merge_pages(pages: Vec<Vec<RawActivity>>) -> Vec<RawActivity> {
        pages.into_iter().flatten().collect()
    }
}

/// Serde helpers used by [`RawActivity`]
pub(crate) mod lenient {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Any non-string timestamp (number, object, null) reads as absent
    fn timestamp_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    pub fn wall_clock<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = timestamp_text(deserializer)?;
        Ok(raw.as_deref().and_then(super::parse_wall_clock))
    }

    pub fn utc_instant<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = timestamp_text(deserializer)?;
        Ok(raw.as_deref().and_then(super::parse_instant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn sample_payload() -> &'static str {
        r#"[
            {
                "id": 101,
                "name": "Fartleks",
                "sport_type": "Run",
                "start_date": "2025-11-26T14:04:47Z",
                "start_date_local": "2025-11-26T06:04:47Z",
                "timezone": "(GMT-08:00) America/Los_Angeles",
                "moving_time": 2400,
                "elapsed_time": 2500,
                "distance": 8046.7,
                "total_elevation_gain": 35.2,
                "average_speed": 3.35,
                "max_speed": 5.1,
                "has_heartrate": true,
                "average_heartrate": 152.3,
                "workout_type": 0
            },
            {
                "id": 102,
                "name": "Evening ride",
                "sport_type": "Ride",
                "start_date": "not a date",
                "start_date_local": null,
                "distance": 20000.0
            }
        ]"#
    }

    #[test]
    fn test_wall_clock_drops_offset() {
        let dt = parse_wall_clock("2025-11-26T06:04:47Z").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2025, 11, 26));
        assert_eq!(dt.hour(), 6);

        // An explicit offset is not applied either
        let dt = parse_wall_clock("2025-11-26T23:30:00-08:00").unwrap();
        assert_eq!(dt.day(), 26);
        assert_eq!(dt.hour(), 23);
    }

    #[test]
    fn test_wall_clock_accepts_naive_and_date_only() {
        let dt = parse_wall_clock("2024-01-15T08:30:00").unwrap();
        assert_eq!(dt.hour(), 8);

        let dt = parse_wall_clock("2024-01-15T08:30:00.250").unwrap();
        assert_eq!(dt.minute(), 30);

        let dt = parse_wall_clock("2024-01-15").unwrap();
        assert_eq!((dt.day(), dt.hour()), (15, 0));
    }

    #[test]
    fn test_wall_clock_rejects_garbage() {
        assert!(parse_wall_clock("").is_none());
        assert!(parse_wall_clock("yesterday").is_none());
        assert!(parse_wall_clock("2024-13-45T00:00:00").is_none());
    }

    #[test]
    fn test_instant_converts_to_utc() {
        let dt = parse_instant("2025-11-26T23:30:00-08:00").unwrap();
        assert_eq!((dt.day(), dt.hour()), (27, 7));

        let dt = parse_instant("2025-11-26T10:00:00").unwrap();
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_parse_array_is_fail_soft_on_timestamps() {
        let activities = ActivityAdapter::parse_array(sample_payload()).unwrap();
        assert_eq!(activities.len(), 2);

        let run = &activities[0];
        assert_eq!(run.id, 101);
        assert_eq!(run.sport_type, "Run");
        assert_eq!(run.moving_time, 2400);
        assert_eq!(run.start_date_local.unwrap().day(), 26);
        assert_eq!(run.start_date.unwrap().hour(), 14);
        assert_eq!(run.average_heartrate, Some(152.3));
        assert_eq!(run.workout_type, Some(0));

        let ride = &activities[1];
        assert!(ride.start_date.is_none());
        assert!(ride.start_date_local.is_none());
        assert_eq!(ride.moving_time, 0);
        assert!(!ride.has_heartrate);
    }

    #[test]
    fn test_non_string_timestamps_read_as_absent() {
        let raw = r#"[
            {"id": 1, "sport_type": "Run", "start_date": 1732629887, "start_date_local": 12345},
            {"id": 2, "sport_type": "Run", "start_date_local": {"date": "2025-11-26"}},
            {"id": 3, "sport_type": "Run", "start_date_local": "2025-11-26T06:00:00Z"}
        ]"#;

        let activities = ActivityAdapter::parse_array(raw).unwrap();
        assert_eq!(activities.len(), 3);
        assert!(activities[0].start_date.is_none());
        assert!(activities[0].start_date_local.is_none());
        assert!(activities[1].start_date_local.is_none());
        assert_eq!(activities[2].start_date_local.unwrap().day(), 26);
    }

    #[test]
    fn test_parse_ndjson() {
        let raw = concat!(
            r#"{"id": 1, "sport_type": "Run", "start_date_local": "2024-01-15T07:00:00Z"}"#,
            "\n\n",
            r#"{"id": 2, "sport_type": "Walk", "start_date_local": "2024-01-16T07:00:00Z"}"#,
            "\n"
        );

        let activities = ActivityAdapter::parse_ndjson(raw).unwrap();
        assert_eq!(activities.len(), 2);
        assert_eq!(activities[1].id, 2);
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let raw = "{\"id\": 1}\nnot json\n";
        let err = ActivityAdapter::parse_ndjson(raw).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_invalid_json() {
        assert!(ActivityAdapter::parse_array("not valid json").is_err());
    }

    #[test]
    fn test_serialized_activity_reparses() {
        let activities = ActivityAdapter::parse_array(sample_payload()).unwrap();
        let json = serde_json::to_string(&activities).unwrap();
        let again = ActivityAdapter::parse_array(&json).unwrap();
        assert_eq!(activities, again);
    }

    #[test]
    fn test_merge_pages_keeps_order() {
        let page = |ids: &[i64]| {
            ids.iter()
                .map(|&id| RawActivity {
                    id,
                    ..Default::default()
                })
                .collect::<Vec<_>>()
        };

        let merged = ActivityAdapter::merge_pages(vec![page(&[3, 1]), page(&[]), page(&[2])]);
        let ids: Vec<i64> = merged.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }
}
