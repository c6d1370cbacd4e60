//! Insights CLI - Command-line interface for weight-insights
//!
//! Commands:
//! - analyze: Compute trend statistics from weight records
//! - report: Full report with BMI and achievements from records and a profile
//! - validate: Validate weight records
//! - doctor: Diagnose configuration

use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use weight_insights::source::{RawObservation, RecordIssue};
use weight_insights::types::Profile;
use weight_insights::{
    AchievementRules, InsightError, InsightProcessor, LogPresenter, TrendAnalyzer, TrendConfig,
    INSIGHTS_VERSION, PRODUCER_NAME,
};

/// Insights - Weight trend analytics and achievement detection
#[derive(Parser)]
#[command(name = "insights")]
#[command(version = INSIGHTS_VERSION)]
#[command(about = "Analyze weight logs and detect achievements", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute trend statistics from weight records
    Analyze {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        /// Date treated as today for the logging streak (YYYY-MM-DD, default: local date)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Produce a full report with BMI and newly fired achievements
    Report {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Profile JSON file
        #[arg(short, long)]
        profile: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        /// Load achievement rules from file
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Reference time (RFC 3339, default: now)
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },

    /// Validate weight records
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration
    Doctor {
        /// Check achievement rules file
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array of records
    Json,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

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

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), InsightsCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            input_format,
            output_format,
            today,
        } => cmd_analyze(&input, input_format, output_format, today),

        Commands::Report {
            input,
            profile,
            input_format,
            output_format,
            rules,
            now,
        } => cmd_report(
            &input,
            &profile,
            input_format,
            output_format,
            rules.as_deref(),
            now,
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { rules, json } => cmd_doctor(rules.as_deref(), json),
    }
}

fn cmd_analyze(
    input: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    today: Option<NaiveDate>,
) -> Result<(), InsightsCliError> {
    let records = read_records(input, &input_format)?;
    let observations = RawObservation::to_observations(&records)?;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    tracing::debug!(%today, records = observations.len(), "analyzing");

    let summary = TrendAnalyzer::new(TrendConfig::default()).analyze(&observations, today);
    println!("{}", format_output(&summary, &output_format)?);
    Ok(())
}

fn cmd_report(
    input: &Path,
    profile: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    rules: Option<&Path>,
    now: Option<DateTime<Utc>>,
) -> Result<(), InsightsCliError> {
    let records = read_records(input, &input_format)?;
    let observations = RawObservation::to_observations(&records)?;
    let profile: Profile = serde_json::from_str(&fs::read_to_string(profile)?)?;

    let rules = match rules {
        Some(path) => AchievementRules::from_json(&fs::read_to_string(path)?)?,
        None => AchievementRules::default(),
    };

    let mut processor = InsightProcessor::with_config(TrendConfig::default(), rules)
        .with_presenter(Box::new(LogPresenter));
    let report = processor.process(&observations, &profile, now.unwrap_or_else(Utc::now));

    println!("{}", format_output(&report, &output_format)?);
    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), InsightsCliError> {
    let records = read_records(input, &input_format)?;
    let issues = RawObservation::validate_records(&records);

    let report = ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - issues.len(),
        invalid_records: issues.len(),
        errors: issues,
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
                println!("  - Record {} ({}): {}", err.index, err.date, err.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(InsightsCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_doctor(rules: Option<&Path>, json: bool) -> Result<(), InsightsCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("weight-insights version {}", INSIGHTS_VERSION),
    });

    if let Some(rules_path) = rules {
        checks.push(check_rules_file(rules_path));
    }

    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (pass records with --input <file>)"
    } else {
        "stdin is a pipe (--input - ready)"
    };
    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: stdin_message.to_string(),
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: INSIGHTS_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Insights Doctor Report");
        println!("======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(InsightsCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_rules_file(path: &Path) -> DoctorCheck {
    if !path.exists() {
        return DoctorCheck {
            name: "rules".to_string(),
            status: CheckStatus::Warning,
            message: "Rules file does not exist, defaults will be used".to_string(),
        };
    }

    let (status, message) = match fs::read_to_string(path) {
        Ok(content) => match AchievementRules::from_json(&content) {
            Ok(rules) => (
                CheckStatus::Ok,
                format!(
                    "Rules file valid ({} milestones, {} weight-loss thresholds, {}-day streak)",
                    rules.milestone_percents.len(),
                    rules.weight_loss_thresholds.len(),
                    rules.streak_days
                ),
            ),
            Err(e) => (CheckStatus::Error, format!("Invalid rules JSON: {}", e)),
        },
        Err(e) => (CheckStatus::Error, format!("Cannot read rules file: {}", e)),
    };

    DoctorCheck {
        name: "rules".to_string(),
        status,
        message,
    }
}

// Helper functions

fn read_records(
    input: &Path,
    format: &InputFormat,
) -> Result<Vec<RawObservation>, InsightsCliError> {
    let data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let records = match format {
        InputFormat::Json => RawObservation::parse_array(&data)?,
        InputFormat::Ndjson => RawObservation::parse_ndjson(&data)?,
    };
    Ok(records)
}

fn format_output<T: Serialize>(
    value: &T,
    format: &OutputFormat,
) -> Result<String, InsightsCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(value)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
    }
}

// Error types

#[derive(Debug)]
enum InsightsCliError {
    Io(io::Error),
    Insight(InsightError),
    Json(serde_json::Error),
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for InsightsCliError {
    fn from(e: io::Error) -> Self {
        InsightsCliError::Io(e)
    }
}

impl From<InsightError> for InsightsCliError {
    fn from(e: InsightError) -> Self {
        InsightsCliError::Insight(e)
    }
}

impl From<serde_json::Error> for InsightsCliError {
    fn from(e: serde_json::Error) -> Self {
        InsightsCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<InsightsCliError> for CliError {
    fn from(e: InsightsCliError) -> Self {
        match e {
            InsightsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            InsightsCliError::Insight(e) => CliError {
                code: "INPUT_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'insights validate' for details".to_string()),
            },
            InsightsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            InsightsCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            InsightsCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<RecordIssue>,
}

#[derive(Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
