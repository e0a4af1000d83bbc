use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::simulator::PhaseRole;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("target URL must not be empty")]
    EmptyTargetUrl,

    #[error("max test cases must be positive, got {0}")]
    NonPositiveMaxTestCases(i64),

    #[error("top-k must be positive")]
    ZeroTopK,

    #[error("simulation needs at least one phase")]
    NoPhases,

    #[error("phase '{0}' has a zero duration")]
    ZeroPhaseDuration(String),

    #[error("phase agent '{0}' is not a known agent")]
    UnknownPhaseAgent(String),

    #[error("simulation speed must be a positive finite number, got {0}")]
    InvalidSpeed(f64),

    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("test generation failed: {0}")]
    Generation(String),

    #[error("test execution failed: {0}")]
    Execution(String),

    #[error("report '{0}' not found")]
    ReportNotFound(String),

    #[error("report store I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid report file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("inconsistent report file '{path}': {source}")]
    InvalidReport {
        path: PathBuf,
        #[source]
        source: ReportError,
    },
}

/// A stored report whose recorded figures contradict its own results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    #[error("coverage {0}% exceeds 100%")]
    CoverageOutOfRange(u8),

    #[error("{field} is {recorded} but the results give {derived}")]
    CountMismatch {
        field: &'static str,
        recorded: u32,
        derived: u32,
    },

    #[error("result '{id}' has confidence {confidence} outside [0, 1]")]
    ConfidenceOutOfRange { id: String, confidence: f64 },
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("a run is already in progress")]
    AlreadyRunning,

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Raised by a phase's completion work; halts every later phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{role} phase failed: {reason}")]
pub struct PhaseFailure {
    pub role: PhaseRole,
    pub reason: String,
}

impl PhaseFailure {
    pub fn new(role: PhaseRole, reason: impl Into<String>) -> Self {
        Self {
            role,
            reason: reason.into(),
        }
    }
}
