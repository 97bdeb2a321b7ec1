//! Engine configuration
//!
//! Defaults for the values a report request may leave out. Loaded from JSON;
//! any missing key takes its default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::StatsError;
use crate::types::{ReportingWindow, TrendPeriod};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Look-back used when a request names no window
    pub default_days_back: i64,
    /// Histogram bins in miles rather than kilometers
    pub use_miles: bool,
    pub period: TrendPeriod,
    pub running_only: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_days_back: ReportingWindow::DEFAULT_DAYS_BACK,
            use_miles: true,
            period: TrendPeriod::Daily,
            running_only: false,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, StatsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, StatsError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, StatsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Window used when the caller supplies none
    pub fn default_window(&self) -> ReportingWindow {
        ReportingWindow::last_days(self.default_days_back)
    }
}
