use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;

use crate::app::{App, Backends};
use crate::config::{AppConfig, CounterMode, DEFAULT_CONFIG_FILE};
use crate::error::{ConfigError, RunError, SourceError};
use crate::model::{ExecutionStatus, TestCase};
use crate::report::{ExecutionReport, format_timestamp, now_epoch_secs};
use crate::scoring;
use crate::sources::{JsonReportStore, MockReportStore, ReportStore};

#[derive(Debug, Parser)]
#[command(
    name = "gametester-rust",
    version,
    about = "Multi-agent game testing dashboard"
)]
pub struct Cli {
    /// Config file; defaults to ./gametester.toml when present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rank test cases from a JSON file and mark the top K.
    Score {
        #[arg(long, value_name = "FILE")]
        cases: PathBuf,
        #[arg(long)]
        top: Option<usize>,
    },
    /// Run the phased pipeline without the dashboard.
    Simulate {
        /// Divides every phase duration.
        #[arg(long)]
        speed: Option<f64>,
        #[arg(long, value_enum)]
        counters: Option<CounterMode>,
    },
    /// Summarize stored execution reports.
    Report {
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
        #[arg(long)]
        id: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("failed to read cases file '{path}': {source}")]
    ReadCases {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid cases file '{path}': {source}")]
    ParseCases {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("execution {id} ended as {status}")]
    ExecutionFailed { id: String, status: &'static str },

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl CliError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::Run(RunError::InvalidConfig(_)) => "invalid_config",
            Self::Source(SourceError::ReportNotFound(_))
            | Self::Run(RunError::Source(SourceError::ReportNotFound(_))) => "not_found",
            Self::Source(_) | Self::Run(_) => "source_failed",
            Self::ReadCases { .. } | Self::ParseCases { .. } => "invalid_request",
            Self::ExecutionFailed { .. } => "execution_failed",
            Self::Output(_) => "io_error",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.code() {
            "invalid_request" | "invalid_config" => 10,
            "not_found" => 12,
            "execution_failed" => 14,
            _ => 13,
        }
    }
}

/// Result of one headless command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub summary: String,
    pub text: String,
    pub data: Value,
}

/// `--config` must load; the implicit default file falls back to defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::load_or_default(DEFAULT_CONFIG_FILE)),
    }
}

/// Runs `command` and prints it in `format`. Returns the process exit code.
pub fn run(command: &Command, config_path: Option<&Path>, format: OutputFormat) -> i32 {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = load_config(config_path)
        .map_err(CliError::from)
        .and_then(|config| execute(command, &config, format, &mut out));
    match result {
        Ok(output) => match print_output(&output, format, &mut out) {
            Ok(()) => 0,
            Err(err) => report_error(&CliError::from(err), format, &mut out),
        },
        Err(err) => report_error(&err, format, &mut out),
    }
}

fn execute(
    command: &Command,
    config: &AppConfig,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<CommandOutput, CliError> {
    match command {
        Command::Score { cases, top } => {
            score(cases, top.unwrap_or(config.selection.top_k))
        }
        Command::Simulate { speed, counters } => {
            let mut config = config.clone();
            if let Some(speed) = speed {
                config.simulation.speed = *speed;
            }
            if let Some(counters) = counters {
                config.simulation.counters = *counters;
            }
            match format {
                OutputFormat::Text => simulate(&config, out),
                OutputFormat::Json => simulate(&config, &mut io::sink()),
            }
        }
        Command::Report { dir, id } => {
            let dir = dir
                .clone()
                .or_else(|| config.reports.dir.as_ref().map(PathBuf::from));
            let store: Box<dyn ReportStore> = match dir {
                Some(dir) => Box::new(JsonReportStore::new(dir)),
                None => Box::new(MockReportStore::default()),
            };
            report(store.as_ref(), id.as_deref())
        }
    }
}

fn print_output(output: &CommandOutput, format: OutputFormat, out: &mut dyn Write) -> io::Result<()> {
    match format {
        OutputFormat::Text => {
            writeln!(out, "{}", output.summary)?;
            if !output.text.is_empty() {
                write!(out, "{}", output.text)?;
            }
        }
        OutputFormat::Json => {
            let body = json!({
                "status": "ok",
                "summary": output.summary,
                "data": output.data,
            });
            writeln!(out, "{body}")?;
        }
    }
    out.flush()
}

fn report_error(err: &CliError, format: OutputFormat, out: &mut dyn Write) -> i32 {
    match format {
        OutputFormat::Text => eprintln!("Error: {err}"),
        OutputFormat::Json => {
            let body = json!({
                "status": "err",
                "error": { "code": err.code(), "message": err.to_string() },
            });
            let _ = writeln!(out, "{body}");
        }
    }
    err.exit_code()
}

pub fn read_cases(path: &Path) -> Result<Vec<TestCase>, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::ReadCases {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::ParseCases {
        path: path.to_path_buf(),
        source,
    })
}

/// Every case in the file counts as generated.
pub fn score(path: &Path, top: usize) -> Result<CommandOutput, CliError> {
    if top == 0 {
        return Err(ConfigError::ZeroTopK.into());
    }
    let mut cases = read_cases(path)?;
    for case in &mut cases {
        case.generated = true;
    }
    let order = scoring::rank(&cases);
    let selected = scoring::select_top(&mut cases, top);

    let mut text = String::new();
    let mut rows = Vec::with_capacity(order.len());
    for (rank, idx) in order.iter().enumerate() {
        let case = &cases[*idx];
        let score = scoring::score(case);
        let mark = if case.selected { "*" } else { " " };
        text.push_str(&format!(
            "{mark} {:>2}. {:>5.1}  {:<10} {}\n",
            rank + 1,
            score,
            case.id,
            case.title
        ));
        rows.push(json!({
            "rank": rank + 1,
            "id": case.id,
            "title": case.title,
            "score": score,
            "selected": case.selected,
        }));
    }
    info!(cases = cases.len(), selected = selected.len(), "scored test cases");
    Ok(CommandOutput {
        summary: format!("Ranked {} test cases, selected {}", cases.len(), selected.len()),
        text,
        data: json!({ "selected": selected, "ranking": rows }),
    })
}

/// Drives the pipeline in real time, streaming activity lines to `progress`.
pub fn simulate(config: &AppConfig, progress: &mut dyn Write) -> Result<CommandOutput, CliError> {
    let mut app = App::new(config.clone(), Backends::from_config(config))?;
    let mut printed = app.activity().len();
    app.start_execution(Instant::now(), now_epoch_secs())?;

    loop {
        for line in app.activity().iter().skip(printed) {
            writeln!(progress, "{line}")?;
        }
        printed = app.activity().len();
        if !app.is_executing() {
            break;
        }
        if let Some(deadline) = app.next_deadline() {
            std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
        }
        app.on_tick(Instant::now());
    }

    let execution = app.execution().clone();
    let report = app.last_run_report().cloned();
    if execution.status != ExecutionStatus::Completed {
        return Err(CliError::ExecutionFailed {
            id: execution.id,
            status: execution.status.label(),
        });
    }
    let mut text = format!(
        "Generated {}, executed {}, validated {}\n",
        execution.test_cases_generated,
        execution.test_cases_executed,
        execution.validations_passed
    );
    if let Some(report) = &report {
        text.push_str(&report_summary_line(report));
    }
    Ok(CommandOutput {
        summary: format!(
            "Execution {} completed in {:.1}s",
            execution.id,
            execution.duration_ms.unwrap_or(0) as f64 / 1000.0
        ),
        text,
        data: json!({ "execution": execution, "report": report }),
    })
}

pub fn report(store: &dyn ReportStore, id: Option<&str>) -> Result<CommandOutput, CliError> {
    let Some(id) = id else {
        let reports = store.list()?;
        let text = reports.iter().map(report_summary_line).collect::<String>();
        return Ok(CommandOutput {
            summary: format!("Listed {} reports", reports.len()),
            text,
            data: Value::Array(reports.iter().map(report_stats).collect()),
        });
    };

    let report = store.fetch(id)?;
    let mut text = report_summary_line(&report);
    for result in report.results() {
        text.push_str(&format!(
            "  {:<8} {:<8} {}  ({}s, repeat {}, cross-agent {}, confidence {:.0}%)\n",
            result.status.label(),
            result.id,
            result.name,
            result.duration,
            yes_no(result.validations.repeat_check),
            yes_no(result.validations.cross_agent_check),
            result.validations.confidence * 100.0
        ));
    }
    let artifacts = report.artifact_index();
    if !artifacts.is_empty() {
        text.push_str("Artifacts:\n");
        for entry in &artifacts {
            text.push_str(&format!("  {} ({})\n", entry.artifact, entry.result_id));
        }
    }
    let artifact_rows: Vec<Value> = artifacts
        .iter()
        .map(|entry| {
            json!({
                "artifact": entry.artifact,
                "resultId": entry.result_id,
                "resultName": entry.result_name,
            })
        })
        .collect();
    Ok(CommandOutput {
        summary: format!("Report {}", report.id()),
        text,
        data: json!({
            "report": report,
            "stats": report_stats(&report),
            "artifacts": artifact_rows,
        }),
    })
}

fn report_summary_line(report: &ExecutionReport) -> String {
    let (minutes, seconds) = report.duration_split();
    format!(
        "{} at {}: {} tests, {} passed, {} failed, {} warnings, success {}%, coverage {}%, {}m {}s\n",
        report.id(),
        format_timestamp(report.timestamp_epoch_secs()),
        report.total_tests(),
        report.passed(),
        report.failed(),
        report.warnings(),
        report.success_rate(),
        report.coverage(),
        minutes,
        seconds
    )
}

fn report_stats(report: &ExecutionReport) -> Value {
    json!({
        "id": report.id(),
        "timestampEpochSecs": report.timestamp_epoch_secs(),
        "totalTests": report.total_tests(),
        "passed": report.passed(),
        "failed": report.failed(),
        "warnings": report.warnings(),
        "successRate": report.success_rate(),
        "averageDuration": report.average_duration(),
        "coverage": report.coverage(),
        "fullyValidated": report.fully_validated_count(),
    })
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
