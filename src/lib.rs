//! Strava Stats - Normalization and analytics engine for endurance activities
//!
//! Stats turns a raw collection of upstream activities into report-ready values
//! through a deterministic pipeline: ingestion → window filtering and unit
//! normalization → running statistics, personal records, distance histogram
//! and time-bucketed trends.
//!
//! ## Modules
//!
//! - **Engine**: pure functions over normalized activities ([`running`], [`histogram`], [`trends`])
//! - **Reports**: [`StatsEngine`] composes the engine into activity, running and trend reports
//! - **Boundaries**: JSON ingestion ([`ingest`]), activity sources ([`source`]) and the C ABI ([`ffi`])

pub mod classifier;
pub mod config;
pub mod encoder;
pub mod error;
pub mod histogram;
pub mod ingest;
pub mod normalizer;
pub mod pipeline;
pub mod running;
pub mod source;
pub mod summary;
pub mod trends;
pub mod types;
pub mod units;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use classifier::is_running_activity;
pub use config::EngineConfig;
pub use encoder::{ReportEncoder, ReportEnvelope};
pub use error::StatsError;
pub use histogram::generate_histogram;
pub use ingest::ActivityAdapter;
pub use normalizer::Normalizer;
pub use pipeline::{activities_report_json, running_report_json, trends_report_json, StatsEngine};
pub use running::{compute_personal_records, compute_running_stats};
pub use source::{ActivitySource, FetchQuery, InMemorySource};
pub use summary::summarize;
pub use trends::compute_trends;
pub use types::{
    ActivitySummary, DistanceHistogram, NormalizedActivity, PersonalRecords, RawActivity,
    ReportingWindow, RunRecord, RunningReport, RunningStats, TrendDataPoint, TrendPeriod,
    TrendSeries, TrendsReport,
};

/// Stats version embedded in all report envelopes
pub const STATS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report envelopes
pub const PRODUCER_NAME: &str = "strava-stats";
