use std::fmt;

use chrono::{Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ReportError;
use crate::model::{ResultStatus, TestResult};

const CLOCK_FORMAT: &str = "%H:%M:%S";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Read-only snapshot of one execution. Fields are private so a report cannot
/// be edited after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    id: String,
    timestamp_epoch_secs: u64,
    total_tests: u32,
    passed: u32,
    failed: u32,
    warnings: u32,
    /// Seconds.
    total_duration: u32,
    coverage: u8,
    results: Vec<TestResult>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactEntry {
    pub artifact: String,
    pub result_id: String,
    pub result_name: String,
}

/// Figures a report must agree with, recomputed from its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DerivedCounts {
    total_tests: u32,
    passed: u32,
    failed: u32,
    warnings: u32,
    total_duration: u32,
}

impl DerivedCounts {
    fn of(results: &[TestResult]) -> Self {
        let count = |status: ResultStatus| {
            saturating_u32(results.iter().filter(|result| result.status == status).count())
        };
        Self {
            total_tests: saturating_u32(results.len()),
            passed: count(ResultStatus::Passed),
            failed: count(ResultStatus::Failed),
            warnings: count(ResultStatus::Warning),
            total_duration: results
                .iter()
                .fold(0u32, |total, result| total.saturating_add(result.duration)),
        }
    }
}

fn saturating_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

impl ExecutionReport {
    /// Builds a report whose counts and total duration are derived from `results`.
    pub fn from_results(
        id: impl Into<String>,
        timestamp_epoch_secs: u64,
        coverage: u8,
        results: Vec<TestResult>,
    ) -> Self {
        let counts = DerivedCounts::of(&results);
        Self {
            id: id.into(),
            timestamp_epoch_secs,
            total_tests: counts.total_tests,
            passed: counts.passed,
            failed: counts.failed,
            warnings: counts.warnings,
            total_duration: counts.total_duration,
            coverage: coverage.min(100),
            results,
        }
    }

    /// Checks a deserialized report against its own results.
    pub fn check(&self) -> Result<(), ReportError> {
        if self.coverage > 100 {
            return Err(ReportError::CoverageOutOfRange(self.coverage));
        }
        let derived = DerivedCounts::of(&self.results);
        let pairs = [
            ("totalTests", self.total_tests, derived.total_tests),
            ("passed", self.passed, derived.passed),
            ("failed", self.failed, derived.failed),
            ("warnings", self.warnings, derived.warnings),
            ("totalDuration", self.total_duration, derived.total_duration),
        ];
        if let Some((field, recorded, derived)) =
            pairs.into_iter().find(|(_, recorded, derived)| recorded != derived)
        {
            return Err(ReportError::CountMismatch {
                field,
                recorded,
                derived,
            });
        }
        if let Some(result) = self
            .results
            .iter()
            .find(|result| !(0.0..=1.0).contains(&result.validations.confidence))
        {
            return Err(ReportError::ConfidenceOutOfRange {
                id: result.id.clone(),
                confidence: result.validations.confidence,
            });
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp_epoch_secs(&self) -> u64 {
        self.timestamp_epoch_secs
    }

    pub fn total_tests(&self) -> u32 {
        self.total_tests
    }

    pub fn passed(&self) -> u32 {
        self.passed
    }

    pub fn failed(&self) -> u32 {
        self.failed
    }

    pub fn warnings(&self) -> u32 {
        self.warnings
    }

    pub fn total_duration(&self) -> u32 {
        self.total_duration
    }

    pub fn coverage(&self) -> u8 {
        self.coverage
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn success_rate(&self) -> u32 {
        if self.total_tests == 0 {
            return 0;
        }
        (f64::from(self.passed) / f64::from(self.total_tests) * 100.0).round() as u32
    }

    pub fn average_duration(&self) -> u32 {
        if self.total_tests == 0 {
            return 0;
        }
        (f64::from(self.total_duration) / f64::from(self.total_tests)).round() as u32
    }

    /// `(minutes, seconds)` of the total duration.
    pub fn duration_split(&self) -> (u32, u32) {
        (self.total_duration / 60, self.total_duration % 60)
    }

    pub fn fully_validated_count(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.validations.fully_validated())
            .count()
    }

    pub fn artifact_index(&self) -> Vec<ArtifactEntry> {
        self.results
            .iter()
            .flat_map(|result| {
                result.artifacts.iter().map(|artifact| ArtifactEntry {
                    artifact: artifact.clone(),
                    result_id: result.id.clone(),
                    result_name: result.name.clone(),
                })
            })
            .collect()
    }
}

pub fn now_epoch_secs() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

/// Local time of day, `HH:MM:SS`.
pub fn format_clock(epoch_secs: u64) -> String {
    format_in(&Local, epoch_secs, CLOCK_FORMAT)
}

/// Local date and time, `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(epoch_secs: u64) -> String {
    format_in(&Local, epoch_secs, TIMESTAMP_FORMAT)
}

fn format_in<Tz>(tz: &Tz, epoch_secs: u64, pattern: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    i64::try_from(epoch_secs)
        .ok()
        .and_then(|secs| tz.timestamp_opt(secs, 0).earliest())
        .map(|time| time.format(pattern).to_string())
        .unwrap_or_else(|| "--".to_string())
}
