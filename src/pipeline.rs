use tracing::{debug, info};

use crate::error::PhaseFailure;
use crate::model::{GenerationConfig, TestCase, TestResult};
use crate::report::ExecutionReport;
use crate::scoring;
use crate::simulator::{PhaseRole, PhaseWork};
use crate::sources::{TestCaseSource, TestExecutor};

/// What a derived run has produced so far.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub cases: Vec<TestCase>,
    pub results: Vec<TestResult>,
}

impl PipelineState {
    pub fn clear(&mut self) {
        self.cases.clear();
        self.results.clear();
    }

    pub fn selected(&self) -> Vec<TestCase> {
        self.cases
            .iter()
            .filter(|case| case.selected)
            .cloned()
            .collect()
    }

    /// Percentage of generated cases that were executed.
    pub fn coverage(&self) -> u8 {
        if self.cases.is_empty() {
            return 0;
        }
        let pct = self.results.len() as f64 / self.cases.len() as f64 * 100.0;
        pct.round().min(100.0) as u8
    }

    pub fn to_report(&self, id: impl Into<String>, timestamp_epoch_secs: u64) -> ExecutionReport {
        ExecutionReport::from_results(id, timestamp_epoch_secs, self.coverage(), self.results.clone())
    }
}

/// Checkpoint counters taken from real work: generated cases, executed results,
/// fully validated results.
pub struct DerivedCheckpoints<'a> {
    pub source: &'a dyn TestCaseSource,
    pub executor: &'a dyn TestExecutor,
    pub config: &'a GenerationConfig,
    pub top_k: usize,
    pub state: &'a mut PipelineState,
}

impl PhaseWork for DerivedCheckpoints<'_> {
    fn complete(&mut self, role: PhaseRole) -> Result<Option<u32>, PhaseFailure> {
        match role {
            PhaseRole::Planner => {
                self.config
                    .validate()
                    .map_err(|err| PhaseFailure::new(role, err.to_string()))?;
                self.state.clear();
                debug!(target_url = %self.config.target_url, "plan accepted");
                Ok(None)
            }
            PhaseRole::Generator => {
                let mut cases = self
                    .source
                    .generate(self.config)
                    .map_err(|err| PhaseFailure::new(role, err.to_string()))?;
                for case in &mut cases {
                    case.generated = true;
                    case.selected = false;
                }
                self.state.cases = cases;
                Ok(Some(count(self.state.cases.len())))
            }
            PhaseRole::Executor => {
                let selected = scoring::select_top(&mut self.state.cases, self.top_k);
                info!(selected = selected.len(), "executing top-ranked cases");
                let results = self
                    .executor
                    .execute(&self.state.selected())
                    .map_err(|err| PhaseFailure::new(role, err.to_string()))?;
                self.state.results = results;
                Ok(Some(count(self.state.results.len())))
            }
            PhaseRole::Validator => {
                let validated = self
                    .state
                    .results
                    .iter()
                    .filter(|result| result.validations.fully_validated())
                    .count();
                Ok(Some(count(validated)))
            }
        }
    }
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
