//! Activity sources
//!
//! The engine does not fetch anything itself. A source hands it a complete
//! raw collection for a window; the fetch query carries the lower bound a
//! remote fetcher can pass upstream and the key a fetch cache is keyed by.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::StatsError;
use crate::types::{RawActivity, ReportingWindow};

pub const DEFAULT_CACHE_KEY: &str = "default";

/// Parameters for fetching the raw collection behind a window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchQuery {
    /// Unix seconds; only activities starting after this instant are needed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<i64>,
    pub cache_key: String,
}

impl FetchQuery {
    /// Query for a window
    ///
    /// Explicit windows fetch from one day before their start so activities
    /// whose UTC instant precedes their local date are not missed. Relative
    /// windows fetch everything and share the default cache key.
    pub fn for_window(window: &ReportingWindow) -> Self {
        match window.explicit_range() {
            Some(range) => Self {
                after: Some(day_before_timestamp(range.start)),
                cache_key: format!("{}-{}", range.start, range.end),
            },
            None => Self {
                after: None,
                cache_key: DEFAULT_CACHE_KEY.to_string(),
            },
        }
    }
}

fn day_before_timestamp(date: NaiveDate) -> i64 {
    date.checked_sub_days(Days::new(1))
        .unwrap_or(date)
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Supplier of raw activity collections
pub trait ActivitySource {
    fn fetch(&self, query: &FetchQuery) -> Result<Vec<RawActivity>, StatsError>;
}

/// Source over an already-loaded collection
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    activities: Vec<RawActivity>,
}

impl InMemorySource {
    pub fn new(activities: Vec<RawActivity>) -> Self {
        Self { activities }
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

impl ActivitySource for InMemorySource {
    /// Applies `after` to activities with a known start instant; the rest pass
    /// through for the normalizer to judge
    fn fetch(&self, query: &FetchQuery) -> Result<Vec<RawActivity>, StatsError> {
        let activities = match query.after {
            Some(after) => self
                .activities
                .iter()
                .filter(|a| a.start_date.map_or(true, |start| start.timestamp() > after))
                .cloned()
                .collect(),
            None => self.activities.clone(),
        };

        Ok(activities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_query_for_relative_window() {
        let query = FetchQuery::for_window(&ReportingWindow::last_days(30));
        assert_eq!(query.after, None);
        assert_eq!(query.cache_key, "default");
    }

    #[test]
    fn test_query_for_explicit_window() {
        let window = ReportingWindow::between(date(2025, 10, 1), date(2025, 10, 31));
        let query = FetchQuery::for_window(&window);

        let expected = Utc.with_ymd_and_hms(2025, 9, 30, 0, 0, 0).unwrap().timestamp();
        assert_eq!(query.after, Some(expected));
        assert_eq!(query.cache_key, "2025-10-01-2025-10-31");
    }

    #[test]
    fn test_in_memory_source_applies_after() {
        let activity = |id: i64, day: u32| RawActivity {
            id,
            start_date: Some(Utc.with_ymd_and_hms(2025, 10, day, 12, 0, 0).unwrap()),
            ..Default::default()
        };
        let undated = RawActivity {
            id: 99,
            ..Default::default()
        };

        let source = InMemorySource::new(vec![activity(1, 2), activity(2, 20), undated]);
        assert_eq!(source.len(), 3);

        let window = ReportingWindow::between(date(2025, 10, 10), date(2025, 10, 31));
        let fetched = source.fetch(&FetchQuery::for_window(&window)).unwrap();
        let ids: Vec<i64> = fetched.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 99]);

        let all = source.fetch(&FetchQuery::for_window(&ReportingWindow::default())).unwrap();
        assert_eq!(all.len(), 3);
    }
}
