//! Report encoding
//!
//! Wraps report values in an envelope carrying producer metadata, the
//! computation time and the resolved window, and renders it as JSON.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StatsError;
use crate::types::DateRange;
use crate::units;
use crate::{PRODUCER_NAME, STATS_VERSION};

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Resolved window, as `YYYY-MM-DD` strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportWindow {
    pub start_date: String,
    pub end_date: String,
}

impl From<DateRange> for ReportWindow {
    fn from(range: DateRange) -> Self {
        Self {
            start_date: units::date_key(range.start),
            end_date: units::date_key(range.end),
        }
    }
}

/// A report with its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEnvelope<T> {
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub window: ReportWindow,
    pub report: T,
}

/// Encoder for report envelopes
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Wrap a report
    pub fn envelope<T>(&self, report: T, range: DateRange) -> ReportEnvelope<T> {
        ReportEnvelope {
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: STATS_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            window: range.into(),
            report,
        }
    }

    /// Wrap and render a report as JSON
    pub fn encode_to_json<T: Serialize>(
        &self,
        report: T,
        range: DateRange,
        pretty: bool,
    ) -> Result<String, StatsError> {
        let envelope = self.envelope(report, range);
        to_json(&envelope, pretty)
    }
}

/// Render any report value as JSON
pub fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, StatsError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
