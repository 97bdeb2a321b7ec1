//! Error types for Strava Stats

use thiserror::Error;

/// Errors that can occur at the boundaries of the engine
///
/// The computations themselves never fail; these cover parsing input,
/// validating caller-supplied windows and reading from activity sources.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid period: {0} (expected daily, weekly or monthly)")]
    InvalidPeriod(String),

    #[error("Invalid reporting window: {0}")]
    InvalidWindow(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Activity source error: {0}")]
    SourceError(String),
}
