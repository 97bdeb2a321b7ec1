//! Strava Stats CLI - Command-line interface for the stats engine
//!
//! Commands:
//! - activities: Summary of the activities in a window
//! - running: Running stats, personal records and distance histogram
//! - trends: Distance and pace trends by day, week or month
//! - report: All of the above in one document

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use strava_stats::encoder;
use strava_stats::{
    ActivityAdapter, ActivitySummary, EngineConfig, RawActivity, ReportingWindow, RunningReport,
    StatsEngine, StatsError, TrendPeriod, TrendsReport, STATS_VERSION,
};

/// Strava Stats - Normalization and analytics for endurance activities
#[derive(Parser)]
#[command(name = "strava-stats")]
#[command(version = STATS_VERSION)]
#[command(about = "Compute running stats and trends from activity exports", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize the activities in a window
    Activities {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Running stats, personal records and distance histogram
    Running {
        #[command(flatten)]
        common: CommonArgs,

        /// Histogram bin unit (defaults to the configured unit)
        #[arg(long)]
        unit: Option<Unit>,
    },

    /// Distance and pace trends
    Trends {
        #[command(flatten)]
        common: CommonArgs,

        /// Bucket size (defaults to the configured period)
        #[arg(long)]
        period: Option<Period>,

        /// Only include running activities
        #[arg(long)]
        running_only: bool,
    },

    /// Activities, running and trends reports in one document
    Report {
        #[command(flatten)]
        common: CommonArgs,

        #[arg(long)]
        unit: Option<Unit>,

        #[arg(long)]
        period: Option<Period>,

        #[arg(long)]
        running_only: bool,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Input file path (use - for stdin)
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Input format
    #[arg(long, default_value = "json")]
    input_format: InputFormat,

    /// Look-back window in days, ending today
    #[arg(long, allow_negative_numbers = true)]
    days_back: Option<i64>,

    /// Window start (YYYY-MM-DD); requires --end-date
    #[arg(long, value_parser = parse_date)]
    start_date: Option<NaiveDate>,

    /// Window end (YYYY-MM-DD); requires --start-date
    #[arg(long, value_parser = parse_date)]
    end_date: Option<NaiveDate>,

    /// Reference date for relative windows (defaults to the local date)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,

    /// Engine configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file path (use - for stdout)
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Output format
    #[arg(long, default_value = "json")]
    output_format: OutputFormat,

    /// Wrap the report with producer and window metadata
    #[arg(long)]
    envelope: bool,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array of activities
    Json,
    /// Newline-delimited JSON (one activity per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum Unit {
    /// Mile-wide histogram bins
    Mi,
    /// Kilometer-wide histogram bins
    Km,
}

#[derive(Clone, Copy, ValueEnum)]
enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl From<Period> for TrendPeriod {
    fn from(period: Period) -> Self {
        match period {
            Period::Daily => TrendPeriod::Daily,
            Period::Weekly => TrendPeriod::Weekly,
            Period::Monthly => TrendPeriod::Monthly,
        }
    }
}

/// Combined output of the `report` command
#[derive(Serialize)]
struct FullReport {
    activities: ActivitySummary,
    running: RunningReport,
    trends: TrendsReport,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("strava_stats={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), StatsCliError> {
    match cli.command {
        Commands::Activities { common } => {
            let request = Request::load(&common)?;
            let report = request
                .engine
                .activities_report(&request.activities, &request.window);
            request.emit(report, &common)
        }
        Commands::Running { common, unit } => {
            let request = Request::load(&common)?;
            let use_miles = request.use_miles(unit);
            let report = request
                .engine
                .running_report(&request.activities, &request.window, use_miles);
            request.emit(report, &common)
        }
        Commands::Trends {
            common,
            period,
            running_only,
        } => {
            let request = Request::load(&common)?;
            let report = request.engine.trends_report(
                &request.activities,
                &request.window,
                request.period(period),
                running_only || request.engine.config().running_only,
            );
            request.emit(report, &common)
        }
        Commands::Report {
            common,
            unit,
            period,
            running_only,
        } => {
            let request = Request::load(&common)?;
            let engine = &request.engine;
            let report = FullReport {
                activities: engine.activities_report(&request.activities, &request.window),
                running: engine.running_report(
                    &request.activities,
                    &request.window,
                    request.use_miles(unit),
                ),
                trends: engine.trends_report(
                    &request.activities,
                    &request.window,
                    request.period(period),
                    running_only || engine.config().running_only,
                ),
            };
            request.emit(report, &common)
        }
    }
}

/// Everything a command needs once its arguments are resolved
struct Request {
    engine: StatsEngine,
    activities: Vec<RawActivity>,
    window: ReportingWindow,
}

impl Request {
    fn load(args: &CommonArgs) -> Result<Self, StatsCliError> {
        let config = match &args.config {
            Some(path) => EngineConfig::from_path(path)?,
            None => EngineConfig::default(),
        };

        let window = build_window(args, &config)?;

        let mut engine = StatsEngine::with_config(config);
        if let Some(today) = args.today {
            engine = engine.as_of(today);
        }

        let input_data = read_input(&args.input)?;
        let activities = match args.input_format {
            InputFormat::Json => ActivityAdapter::parse_array(&input_data)?,
            InputFormat::Ndjson => ActivityAdapter::parse_ndjson(&input_data)?,
        };

        tracing::debug!(count = activities.len(), "activities loaded");

        Ok(Self {
            engine,
            activities,
            window,
        })
    }

    fn use_miles(&self, unit: Option<Unit>) -> bool {
        match unit {
            Some(Unit::Mi) => true,
            Some(Unit::Km) => false,
            None => self.engine.config().use_miles,
        }
    }

    fn period(&self, period: Option<Period>) -> TrendPeriod {
        period
            .map(TrendPeriod::from)
            .unwrap_or(self.engine.config().period)
    }

    fn emit<T: Serialize>(&self, report: T, args: &CommonArgs) -> Result<(), StatsCliError> {
        let pretty = matches!(args.output_format, OutputFormat::JsonPretty);

        let output_data = if args.envelope {
            let range = self.engine.resolve(&self.window);
            self.engine.encoder().encode_to_json(report, range, pretty)?
        } else {
            encoder::to_json(&report, pretty)?
        };

        write_output(&args.output, &output_data)
    }
}

/// Window from the flags, falling back to the configured look-back
fn build_window(args: &CommonArgs, config: &EngineConfig) -> Result<ReportingWindow, StatsError> {
    let window = ReportingWindow {
        days_back: args.days_back.unwrap_or(config.default_days_back),
        start_date: args.start_date,
        end_date: args.end_date,
    };
    window.validate()?;
    Ok(window)
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn read_input(input: &Path) -> Result<String, StatsCliError> {
    if input.as_os_str() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(StatsCliError::InteractiveStdin);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), StatsCliError> {
    if output.as_os_str() == "-" {
        println!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

enum StatsCliError {
    Io(io::Error),
    Stats(StatsError),
    InteractiveStdin,
}

impl From<io::Error> for StatsCliError {
    fn from(e: io::Error) -> Self {
        StatsCliError::Io(e)
    }
}

impl From<StatsError> for StatsCliError {
    fn from(e: StatsError) -> Self {
        StatsCliError::Stats(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<StatsCliError> for CliError {
    fn from(e: StatsCliError) -> Self {
        match e {
            StatsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            StatsCliError::InteractiveStdin => CliError {
                code: "NO_INPUT".to_string(),
                message: "stdin is a terminal and no --input file was given".to_string(),
                hint: Some("Pipe an activity export in or pass --input <file>".to_string()),
            },
            StatsCliError::Stats(e) => {
                let (code, hint) = match &e {
                    StatsError::JsonError(_) => {
                        ("JSON_ERROR", "Input must be a JSON array of activities")
                    }
                    StatsError::SourceError(_) => {
                        ("PARSE_ERROR", "Check --input-format matches the input")
                    }
                    StatsError::InvalidWindow(_) => (
                        "INVALID_WINDOW",
                        "Pass both --start-date and --end-date, start first",
                    ),
                    StatsError::InvalidPeriod(_) => {
                        ("INVALID_PERIOD", "Use daily, weekly or monthly")
                    }
                    StatsError::DateParseError(_) => ("DATE_ERROR", "Dates are YYYY-MM-DD"),
                    StatsError::IoError(_) => ("IO_ERROR", "Check file paths and permissions"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args.iter().copied()).unwrap()
    }

    fn common(cli: &Cli) -> &CommonArgs {
        match &cli.command {
            Commands::Activities { common }
            | Commands::Running { common, .. }
            | Commands::Trends { common, .. }
            | Commands::Report { common, .. } => common,
        }
    }

    #[test]
    fn test_explicit_window_from_flags() {
        let cli = parse(&[
            "strava-stats",
            "running",
            "--start-date",
            "2025-10-01",
            "--end-date",
            "2025-10-31",
        ]);
        let window = build_window(common(&cli), &EngineConfig::default()).unwrap();

        assert_eq!(
            window.explicit_range().map(|r| r.start),
            NaiveDate::from_ymd_opt(2025, 10, 1)
        );
    }

    #[test]
    fn test_window_defaults_to_config() {
        let cli = parse(&["strava-stats", "activities", "-i", "export.json"]);
        let config = EngineConfig {
            default_days_back: 30,
            ..Default::default()
        };

        let window = build_window(common(&cli), &config).unwrap();
        assert_eq!(window, ReportingWindow::last_days(30));
    }

    #[test]
    fn test_negative_days_back_accepted() {
        let cli = parse(&["strava-stats", "trends", "--days-back", "-3"]);
        let window = build_window(common(&cli), &EngineConfig::default()).unwrap();
        assert_eq!(window.effective_days_back(), 7);
    }

    #[test]
    fn test_single_bound_rejected() {
        let cli = parse(&["strava-stats", "running", "--start-date", "2025-10-01"]);
        let err = build_window(common(&cli), &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, StatsError::InvalidWindow(_)));
    }

    #[test]
    fn test_bad_date_rejected_by_parser() {
        assert!(Cli::try_parse_from(["strava-stats", "running", "--today", "26/11/2025"]).is_err());
    }

    #[test]
    fn test_error_codes() {
        let err = CliError::from(StatsCliError::Stats(StatsError::InvalidPeriod(
            "hourly".to_string(),
        )));
        assert_eq!(err.code, "INVALID_PERIOD");

        let err = CliError::from(StatsCliError::InteractiveStdin);
        assert_eq!(err.code, "NO_INPUT");
        assert!(err.hint.is_some());
    }
}
