//! Pipeline orchestration
//!
//! This module provides the report-level API. It runs raw activities through
//! normalization and the analytics stages, and is the only place that logs:
//! the stages themselves are pure functions.

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::encoder::ReportEncoder;
use crate::error::StatsError;
use crate::histogram::generate_histogram;
use crate::ingest::ActivityAdapter;
use crate::normalizer::Normalizer;
use crate::running::{compute_personal_records, compute_running_stats};
use crate::source::{ActivitySource, FetchQuery};
use crate::summary::summarize;
use crate::trends::compute_trends;
use crate::types::{
    ActivitySummary, DateRange, NormalizedActivity, RawActivity, ReportingWindow, RunningReport,
    TrendPeriod, TrendsReport,
};

/// Report builder over a configuration and a reference date
///
/// Holds no per-request state; one engine can serve any number of calls.
pub struct StatsEngine {
    config: EngineConfig,
    today: Option<NaiveDate>,
    encoder: ReportEncoder,
}

impl Default for StatsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsEngine {
    /// Create an engine with default settings
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            today: None,
            encoder: ReportEncoder::new(),
        }
    }

    /// Pin "today" instead of reading the local clock
    pub fn as_of(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn encoder(&self) -> &ReportEncoder {
        &self.encoder
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// The caller's window, or the configured default
    pub fn window_or_default(&self, window: Option<ReportingWindow>) -> ReportingWindow {
        window.unwrap_or_else(|| self.config.default_window())
    }

    pub fn resolve(&self, window: &ReportingWindow) -> DateRange {
        window.resolve(self.today())
    }

    /// Normalize raw activities against a window
    pub fn normalize(
        &self,
        activities: &[RawActivity],
        window: &ReportingWindow,
    ) -> Vec<NormalizedActivity> {
        let today = self.today();
        let range = window.resolve(today);
        let normalized = Normalizer::normalize_as_of(activities, window, today);

        let undated = activities
            .iter()
            .filter(|a| a.start_date_local.is_none())
            .count();
        if undated > 0 {
            warn!(undated, "skipped activities without a usable local start time");
        }

        info!(
            fetched = activities.len(),
            normalized = normalized.len(),
            start = %range.start,
            end = %range.end,
            "normalized activities"
        );

        normalized
    }

    /// Fetch from a source, then normalize
    pub fn fetch_and_normalize(
        &self,
        source: &dyn ActivitySource,
        window: &ReportingWindow,
    ) -> Result<Vec<NormalizedActivity>, StatsError> {
        let query = FetchQuery::for_window(window);
        debug!(cache_key = %query.cache_key, after = ?query.after, "fetching activities");

        let activities = source.fetch(&query)?;
        Ok(self.normalize(&activities, window))
    }

    /// Summary of all activities in the window
    pub fn activities_report(
        &self,
        activities: &[RawActivity],
        window: &ReportingWindow,
    ) -> ActivitySummary {
        let summary = summarize(self.normalize(activities, window), window);
        info!(
            total = summary.total_activities,
            date_range = %summary.date_range,
            "activity summary computed"
        );
        summary
    }

    /// Running stats, personal records and distance histogram
    pub fn running_report(
        &self,
        activities: &[RawActivity],
        window: &ReportingWindow,
        use_miles: bool,
    ) -> RunningReport {
        let normalized = self.normalize(activities, window);

        let report = RunningReport {
            stats: compute_running_stats(&normalized),
            prs: compute_personal_records(&normalized),
            histogram: generate_histogram(&normalized, use_miles),
        };

        info!(
            total_runs = report.stats.total_runs,
            bins = report.histogram.bins.len(),
            use_miles,
            "running stats computed"
        );
        report
    }

    /// Trend series for one period
    pub fn trends_report(
        &self,
        activities: &[RawActivity],
        window: &ReportingWindow,
        period: TrendPeriod,
        running_only: bool,
    ) -> TrendsReport {
        let normalized = self.normalize(activities, window);
        let trends = compute_trends(&normalized, period, running_only);

        info!(
            %period,
            running_only,
            points = trends.points.len(),
            "trends computed"
        );

        TrendsReport {
            period,
            running_only,
            trends,
        }
    }
}

/// Parse a window from JSON; an empty string means the default window
///
/// The window is validated, since JSON windows come from outside callers.
pub fn parse_window(window_json: &str) -> Result<Option<ReportingWindow>, StatsError> {
    if window_json.trim().is_empty() {
        return Ok(None);
    }

    let window: ReportingWindow = serde_json::from_str(window_json)?;
    window.validate()?;
    Ok(Some(window))
}

/// Convert raw activities JSON to an activity summary envelope.
///
/// # Arguments
/// * `raw_json` - JSON array of upstream activities
/// * `window_json` - `{"days_back": N}` or `{"start_date": ..., "end_date": ...}`, or empty
///
/// # Example
/// ```ignore
/// let json = activities_report_json(activities, r#"{"days_back": 14}"#.to_string())?;
/// ```
pub fn activities_report_json(raw_json: String, window_json: String) -> Result<String, StatsError> {
    StatsEngine::new().activities_report_json(&raw_json, &window_json)
}

/// Convert raw activities JSON to a running report envelope.
pub fn running_report_json(
    raw_json: String,
    window_json: String,
    use_miles: bool,
) -> Result<String, StatsError> {
    StatsEngine::new().running_report_json(&raw_json, &window_json, use_miles)
}

/// Convert raw activities JSON to a trends report envelope.
///
/// `period` must be `daily`, `weekly` or `monthly`.
pub fn trends_report_json(
    raw_json: String,
    window_json: String,
    period: String,
    running_only: bool,
) -> Result<String, StatsError> {
    let period: TrendPeriod = period.parse()?;
    StatsEngine::new().trends_report_json(&raw_json, &window_json, period, running_only)
}

impl StatsEngine {
    pub fn activities_report_json(
        &self,
        raw_json: &str,
        window_json: &str,
    ) -> Result<String, StatsError> {
        let (activities, window) = self.parse_request(raw_json, window_json)?;
        let report = self.activities_report(&activities, &window);
        self.encoder.encode_to_json(report, self.resolve(&window), false)
    }

    pub fn running_report_json(
        &self,
        raw_json: &str,
        window_json: &str,
        use_miles: bool,
    ) -> Result<String, StatsError> {
        let (activities, window) = self.parse_request(raw_json, window_json)?;
        let report = self.running_report(&activities, &window, use_miles);
        self.encoder.encode_to_json(report, self.resolve(&window), false)
    }

    pub fn trends_report_json(
        &self,
        raw_json: &str,
        window_json: &str,
        period: TrendPeriod,
        running_only: bool,
    ) -> Result<String, StatsError> {
        let (activities, window) = self.parse_request(raw_json, window_json)?;
        let report = self.trends_report(&activities, &window, period, running_only);
        self.encoder.encode_to_json(report, self.resolve(&window), false)
    }

    fn parse_request(
        &self,
        raw_json: &str,
        window_json: &str,
    ) -> Result<(Vec<RawActivity>, ReportingWindow), StatsError> {
        let activities = ActivityAdapter::parse_array(raw_json)?;
        let window = self.window_or_default(parse_window(window_json)?);
        Ok((activities, window))
    }
}
