use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::RunError;
use crate::model::{GenerationConfig, TestCase};
use crate::scoring;
use crate::sources::TestCaseSource;

pub const GENERATION_STEP: u8 = 5;
pub const GENERATION_TICK: Duration = Duration::from_millis(100);
pub const REVEAL_EVERY: u8 = 20;
pub const TAIL_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationEvent {
    Started { candidates: usize },
    Progress(u8),
    Revealed { id: String },
    Finished { total: usize },
    Cancelled { revealed: usize },
}

#[derive(Debug, Clone)]
struct GenerationRun {
    next_progress: u8,
    next_at: Instant,
    tail_pending: bool,
}

/// Progressive test-case generation. Candidates come from a source up front and
/// are revealed as the progress counter advances.
#[derive(Debug, Default)]
pub struct GeneratorSession {
    candidates: Vec<TestCase>,
    revealed: Vec<bool>,
    cases: Vec<TestCase>,
    progress: u8,
    selected_count: usize,
    run: Option<GenerationRun>,
    events: Vec<GenerationEvent>,
}

impl GeneratorSession {
    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn is_generating(&self) -> bool {
        self.run.is_some()
    }

    pub fn selected_count(&self) -> usize {
        self.selected_count
    }

    pub fn selected_cases(&self) -> Vec<TestCase> {
        self.cases
            .iter()
            .filter(|case| case.selected)
            .cloned()
            .collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.run.as_ref().map(|run| run.next_at)
    }

    pub fn start(
        &mut self,
        config: &GenerationConfig,
        source: &dyn TestCaseSource,
        now: Instant,
    ) -> Result<usize, RunError> {
        if self.run.is_some() {
            warn!("rejected generation: already generating");
            return Err(RunError::AlreadyRunning);
        }
        config.validate()?;
        let candidates = source.generate(config)?;

        self.revealed = vec![false; candidates.len()];
        self.candidates = candidates;
        self.cases.clear();
        self.progress = 0;
        self.selected_count = 0;
        self.run = Some(GenerationRun {
            next_progress: 0,
            next_at: now + GENERATION_TICK,
            tail_pending: false,
        });
        info!(
            target_url = %config.target_url,
            candidates = self.candidates.len(),
            "test generation started"
        );
        self.events.push(GenerationEvent::Started {
            candidates: self.candidates.len(),
        });
        Ok(self.candidates.len())
    }

    pub fn poll(&mut self, now: Instant) {
        while let Some(run) = self.run.clone() {
            if now < run.next_at {
                break;
            }
            if run.tail_pending {
                for idx in 0..self.candidates.len() {
                    self.reveal(idx);
                }
                self.run = None;
                info!(total = self.cases.len(), "test generation finished");
                self.events.push(GenerationEvent::Finished {
                    total: self.cases.len(),
                });
                break;
            }

            let progress = run.next_progress;
            self.progress = progress;
            self.events.push(GenerationEvent::Progress(progress));
            if progress > 0 && progress % REVEAL_EVERY == 0 {
                self.reveal(usize::from(progress / REVEAL_EVERY) - 1);
            }
            if let Some(active) = self.run.as_mut() {
                if progress >= 100 {
                    active.tail_pending = true;
                    active.next_at += TAIL_DELAY;
                } else {
                    active.next_progress = progress + GENERATION_STEP;
                    active.next_at += GENERATION_TICK;
                }
            }
        }
    }

    pub fn cancel(&mut self) -> bool {
        if self.run.take().is_none() {
            return false;
        }
        info!(revealed = self.cases.len(), "test generation cancelled");
        self.events.push(GenerationEvent::Cancelled {
            revealed: self.cases.len(),
        });
        true
    }

    /// Selects the best `k` revealed cases. Returns their ids in rank order.
    pub fn select_top(&mut self, k: usize) -> Vec<String> {
        let selected = scoring::select_top(&mut self.cases, k);
        self.selected_count = selected.len();
        info!(k, selected = selected.len(), "top test cases selected");
        selected
    }

    pub fn drain_events(&mut self) -> Vec<GenerationEvent> {
        std::mem::take(&mut self.events)
    }

    fn reveal(&mut self, idx: usize) {
        let (Some(candidate), Some(revealed)) =
            (self.candidates.get(idx), self.revealed.get_mut(idx))
        else {
            return;
        };
        if *revealed {
            return;
        }
        *revealed = true;
        let mut case = candidate.clone();
        case.generated = true;
        case.selected = false;
        debug!(id = %case.id, "test case revealed");
        self.events
            .push(GenerationEvent::Revealed { id: case.id.clone() });
        self.cases.push(case);
    }
}
