//! Pulse CLI - Command-line interface for Pulse Analytics
//!
//! Commands:
//! - burnout: Burnout risk report for a manager's scope
//! - distraction: Distraction profile for a manager's scope
//! - validate: Validate activity records
//! - config: Print the default analytics configuration

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use pulse_analytics::aggregator::HOURS_PER_DAY;
use pulse_analytics::types::ActivityRecord;
use pulse_analytics::{
    AnalyticsConfig, AnalyticsEngine, AnalyticsError, InMemoryActivityStore, InMemoryMembership,
    ReportEncoder, PULSE_VERSION,
};

/// Pulse - Manager-facing workforce analytics
#[derive(Parser)]
#[command(name = "pulse")]
#[command(version = PULSE_VERSION)]
#[command(about = "Burnout risk and distraction analytics over tracker activity", long_about = None)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Burnout risk report for a manager's teams
    Burnout(AnalysisArgs),

    /// Distraction profile for a manager's teams
    Distraction(AnalysisArgs),

    /// Validate activity records
    Validate {
        /// Activity records file (use - for stdin)
        #[arg(short, long)]
        activities: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default analytics configuration
    Config,
}

#[derive(clap::Args)]
struct AnalysisArgs {
    /// Memberships file (JSON array)
    #[arg(short, long)]
    memberships: PathBuf,

    /// Activity records file (use - for stdin)
    #[arg(short, long)]
    activities: PathBuf,

    /// Input format of the activity records
    #[arg(long, default_value = "ndjson")]
    input_format: InputFormat,

    /// Requesting manager
    #[arg(long)]
    manager: String,

    /// Narrow the analysis to one team
    #[arg(long)]
    team: Option<String>,

    /// Analytics configuration file (JSON, partial files allowed)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Analysis time (RFC 3339), defaults to now
    #[arg(long)]
    now: Option<String>,

    /// Pretty-print the report (defaults on when stdout is a terminal)
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
}

#[derive(Clone, Copy)]
enum Analysis {
    Burnout,
    Distraction,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "pulse_analytics=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), PulseCliError> {
    match cli.command {
        Commands::Burnout(args) => cmd_analyze(Analysis::Burnout, &args),
        Commands::Distraction(args) => cmd_analyze(Analysis::Distraction, &args),
        Commands::Validate {
            activities,
            input_format,
            json,
        } => cmd_validate(&activities, input_format, json),
        Commands::Config => cmd_config(),
    }
}

fn cmd_analyze(analysis: Analysis, args: &AnalysisArgs) -> Result<(), PulseCliError> {
    let config = match &args.config {
        Some(path) => AnalyticsConfig::from_json(&fs::read_to_string(path)?)?,
        None => AnalyticsConfig::default(),
    };
    let now = match &args.now {
        Some(raw) => parse_now(raw)?,
        None => Utc::now(),
    };

    let membership = InMemoryMembership::from_json(&fs::read_to_string(&args.memberships)?)?;
    let store = load_activities(&args.activities, args.input_format)?;
    tracing::debug!(
        memberships = membership.len(),
        records = store.records().len(),
        "Loaded inputs"
    );

    let engine = AnalyticsEngine::with_config(membership, store, config)?;
    let team = args.team.as_deref();
    let pretty = args.pretty || atty::is(atty::Stream::Stdout);
    let encoder = ReportEncoder::new();

    let output = match analysis {
        Analysis::Burnout => {
            let report = engine.get_burnout_risk_at(&args.manager, team, now)?;
            encoder.encode_to_json(&report, pretty)?
        }
        Analysis::Distraction => {
            let report = engine.get_distraction_profile_at(&args.manager, team, now)?;
            encoder.encode_to_json(&report, pretty)?
        }
    };

    println!("{}", output);
    Ok(())
}

fn cmd_validate(
    activities: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), PulseCliError> {
    let store = load_activities(activities, input_format)?;
    let records = store.records();

    let errors: Vec<ValidationErrorDetail> = records
        .iter()
        .enumerate()
        .flat_map(|(index, record)| {
            record_problems(record)
                .into_iter()
                .map(move |error| ValidationErrorDetail {
                    index,
                    user_id: record.user_id.clone(),
                    error,
                })
        })
        .collect();

    let invalid: std::collections::BTreeSet<usize> = errors.iter().map(|e| e.index).collect();
    let report = ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - invalid.len(),
        invalid_records: invalid.len(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Record {} (user {}): {}", err.index, err.user_id, err.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(PulseCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_config() -> Result<(), PulseCliError> {
    println!("{}", AnalyticsConfig::default().to_json()?);
    Ok(())
}

fn read_input(path: &Path) -> Result<String, PulseCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn load_activities(path: &Path, format: InputFormat) -> Result<InMemoryActivityStore, PulseCliError> {
    let data = read_input(path)?;
    let store = match format {
        InputFormat::Json => InMemoryActivityStore::from_json(&data)?,
        InputFormat::Ndjson => InMemoryActivityStore::from_ndjson(&data)?,
    };
    Ok(store)
}

fn parse_now(raw: &str) -> Result<DateTime<Utc>, PulseCliError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| PulseCliError::ParseError(format!("Invalid --now '{}': {}", raw, e)))
}

fn record_problems(record: &ActivityRecord) -> Vec<String> {
    let mut problems = Vec::new();
    if record.user_id.trim().is_empty() {
        problems.push("user_id is empty".to_string());
    }
    if record.team_id.trim().is_empty() {
        problems.push("team_id is empty".to_string());
    }

    let hours = [
        ("productive_hours", record.productive_hours),
        ("unproductive_hours", record.unproductive_hours),
        ("idle_time", record.idle_time),
    ];
    for (field, value) in hours {
        if !value.is_finite() {
            problems.push(format!("{} is not a finite number", field));
        } else if value < 0.0 {
            problems.push(format!("{} is negative ({})", field, value));
        } else if value > HOURS_PER_DAY {
            problems.push(format!("{} exceeds {} hours ({})", field, HOURS_PER_DAY, value));
        }
    }
    problems
}

// Error types

#[derive(Debug)]
enum PulseCliError {
    Io(io::Error),
    Analytics(AnalyticsError),
    Json(serde_json::Error),
    ValidationFailed(usize),
    ParseError(String),
}

impl From<io::Error> for PulseCliError {
    fn from(e: io::Error) -> Self {
        PulseCliError::Io(e)
    }
}

impl From<AnalyticsError> for PulseCliError {
    fn from(e: AnalyticsError) -> Self {
        PulseCliError::Analytics(e)
    }
}

impl From<serde_json::Error> for PulseCliError {
    fn from(e: serde_json::Error) -> Self {
        PulseCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PulseCliError> for CliError {
    fn from(e: PulseCliError) -> Self {
        match e {
            PulseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PulseCliError::Analytics(e) => {
                let (code, hint) = match &e {
                    AnalyticsError::NotAuthorized(_) => {
                        ("NOT_AUTHORIZED", "The requester must manage at least one team")
                    }
                    AnalyticsError::TeamNotAccessible(_) => {
                        ("TEAM_NOT_ACCESSIBLE", "Pick a team the requester manages")
                    }
                    AnalyticsError::UpstreamFetch(_) => {
                        ("UPSTREAM_FETCH", "Retry once the data source is available")
                    }
                    AnalyticsError::InvalidConfig(_) => {
                        ("INVALID_CONFIG", "Run 'pulse config' to see the defaults")
                    }
                    AnalyticsError::JsonError(_) => ("JSON_ERROR", "Check JSON syntax"),
                    AnalyticsError::ParseError(_) => ("PARSE_ERROR", "Check input format"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            PulseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PulseCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            PulseCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check input format".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    user_id: String,
    error: String,
}
