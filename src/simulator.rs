use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, PhaseFailure, RunError};
use crate::model::{Agent, AgentStatus, Execution, ExecutionStatus};

pub const PROGRESS_STEP: u8 = 10;
pub const STEPS_PER_PHASE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseRole {
    Planner,
    Generator,
    Executor,
    Validator,
}

impl PhaseRole {
    pub fn label(self) -> &'static str {
        match self {
            Self::Planner => "planner",
            Self::Generator => "generator",
            Self::Executor => "executor",
            Self::Validator => "validator",
        }
    }
}

impl fmt::Display for PhaseRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase {
    pub agent_id: String,
    pub role: PhaseRole,
    pub task: String,
    pub duration: Duration,
}

impl Phase {
    pub fn new(
        agent_id: impl Into<String>,
        role: PhaseRole,
        task: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            role,
            task: task.into(),
            duration,
        }
    }

    pub fn step_delay(&self) -> Duration {
        self.duration / STEPS_PER_PHASE
    }
}

pub fn reference_phases() -> Vec<Phase> {
    vec![
        Phase::new(
            "planner",
            PhaseRole::Planner,
            "Analyzing target game...",
            Duration::from_millis(2000),
        ),
        Phase::new(
            "generator",
            PhaseRole::Generator,
            "Generating test cases...",
            Duration::from_millis(3000),
        ),
        Phase::new(
            "executor",
            PhaseRole::Executor,
            "Executing top 10 tests...",
            Duration::from_millis(5000),
        ),
        Phase::new(
            "validator",
            PhaseRole::Validator,
            "Cross-validating results...",
            Duration::from_millis(2000),
        ),
    ]
}

/// `phase_index * (100 / N) + progress / N`, clamped to `0..=100`.
pub fn overall_progress(phase_index: usize, phase_count: usize, progress: u8) -> f64 {
    if phase_count == 0 {
        return 0.0;
    }
    let n = phase_count as f64;
    (phase_index as f64 * 100.0 / n + f64::from(progress) / n).clamp(0.0, 100.0)
}

/// Work performed at a phase boundary. The returned count becomes the checkpoint
/// counter owned by `role` (generated, executed or validated); `None` leaves the
/// counters alone.
pub trait PhaseWork {
    fn complete(&mut self, role: PhaseRole) -> Result<Option<u32>, PhaseFailure>;
}

/// Constant checkpoint counters: 25 generated, 10 executed, 8 validated.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedCheckpoints;

impl PhaseWork for FixedCheckpoints {
    fn complete(&mut self, role: PhaseRole) -> Result<Option<u32>, PhaseFailure> {
        Ok(match role {
            PhaseRole::Planner => None,
            PhaseRole::Generator => Some(25),
            PhaseRole::Executor => Some(10),
            PhaseRole::Validator => Some(8),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimulationEvent {
    Started,
    PhaseEntered {
        index: usize,
        agent_id: String,
        task: String,
    },
    Step {
        index: usize,
        progress: u8,
        overall: f64,
    },
    PhaseCompleted {
        index: usize,
        role: PhaseRole,
        counter: Option<u32>,
    },
    PhaseFailed {
        index: usize,
        failure: PhaseFailure,
    },
    Finished {
        duration: Duration,
    },
    Cancelled {
        index: usize,
        progress: f64,
    },
}

#[derive(Debug, Clone)]
struct ActiveRun {
    phase_index: usize,
    next_progress: u8,
    next_step_at: Instant,
    started_at: Instant,
}

#[derive(Debug)]
pub struct Simulator {
    phases: Vec<Phase>,
    initial_agents: Vec<Agent>,
    execution: Execution,
    run: Option<ActiveRun>,
    cancelled: bool,
    events: Vec<SimulationEvent>,
}

impl Simulator {
    pub fn new(
        execution_id: impl Into<String>,
        phases: Vec<Phase>,
        agents: Vec<Agent>,
    ) -> Result<Self, ConfigError> {
        if phases.is_empty() {
            return Err(ConfigError::NoPhases);
        }
        for phase in &phases {
            if phase.duration.is_zero() {
                return Err(ConfigError::ZeroPhaseDuration(phase.agent_id.clone()));
            }
            if !agents.iter().any(|agent| agent.id == phase.agent_id) {
                return Err(ConfigError::UnknownPhaseAgent(phase.agent_id.clone()));
            }
        }
        Ok(Self {
            phases,
            execution: Execution::pending(execution_id, agents.clone()),
            initial_agents: agents,
            run: None,
            cancelled: false,
            events: Vec::new(),
        })
    }

    pub fn execution(&self) -> &Execution {
        &self.execution
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn current_phase_index(&self) -> Option<usize> {
        self.run.as_ref().map(|run| run.phase_index)
    }

    /// When the next step is due, if a run is in flight.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.run.as_ref().map(|run| run.next_step_at)
    }

    pub fn start(&mut self, now: Instant, started_at_epoch_secs: u64) -> Result<(), RunError> {
        if self.run.is_some() {
            warn!("rejected start: simulation already running");
            return Err(RunError::AlreadyRunning);
        }
        self.execution.status = ExecutionStatus::Running;
        self.execution.progress = 0.0;
        self.execution.test_cases_generated = 0;
        self.execution.test_cases_executed = 0;
        self.execution.validations_passed = 0;
        self.execution.started_at_epoch_secs = Some(started_at_epoch_secs);
        self.execution.duration_ms = None;
        self.execution.agents = self.initial_agents.clone();
        self.cancelled = false;
        info!(execution = %self.execution.id, phases = self.phases.len(), "simulation started");
        self.events.push(SimulationEvent::Started);
        self.run = Some(ActiveRun {
            phase_index: 0,
            next_progress: 0,
            next_step_at: now,
            started_at: now,
        });
        self.enter_phase(0);
        Ok(())
    }

    /// Applies every step that is due at `now`. Each step is applied whole.
    pub fn poll(&mut self, now: Instant, work: &mut dyn PhaseWork) {
        while let Some(run) = self.run.as_ref() {
            if now < run.next_step_at {
                break;
            }
            self.apply_step(now, work);
        }
    }

    /// Stops the run at the last applied step. Returns false when idle.
    pub fn cancel(&mut self, now: Instant) -> bool {
        let Some(run) = self.run.take() else {
            return false;
        };
        self.cancelled = true;
        self.execution.status = ExecutionStatus::Failed;
        if let Some(phase) = self.phases.get(run.phase_index) {
            if let Some(agent) = self.execution.agent_mut(&phase.agent_id) {
                agent.status = AgentStatus::Idle;
                agent.current_task = None;
            }
        }
        self.execution.duration_ms = Some(elapsed_ms(now, run.started_at));
        info!(
            phase = run.phase_index,
            progress = self.execution.progress,
            "simulation cancelled"
        );
        self.events.push(SimulationEvent::Cancelled {
            index: run.phase_index,
            progress: self.execution.progress,
        });
        true
    }

    pub fn drain_events(&mut self) -> Vec<SimulationEvent> {
        std::mem::take(&mut self.events)
    }

    fn enter_phase(&mut self, index: usize) {
        let phase = &self.phases[index];
        let delay = phase.step_delay();
        if let Some(agent) = self.execution.agent_mut(&phase.agent_id) {
            agent.status = AgentStatus::Executing;
            agent.current_task = Some(phase.task.clone());
        }
        if let Some(run) = self.run.as_mut() {
            run.phase_index = index;
            run.next_progress = 0;
            run.next_step_at += delay;
        }
        info!(phase = index, agent = %phase.agent_id, task = %phase.task, "phase entered");
        self.events.push(SimulationEvent::PhaseEntered {
            index,
            agent_id: phase.agent_id.clone(),
            task: phase.task.clone(),
        });
    }

    fn apply_step(&mut self, now: Instant, work: &mut dyn PhaseWork) {
        let Some(run) = self.run.clone() else {
            return;
        };
        let index = run.phase_index;
        let progress = run.next_progress;
        let phase = self.phases[index].clone();

        if let Some(agent) = self.execution.agent_mut(&phase.agent_id) {
            agent.progress = progress;
        }
        let overall = overall_progress(index, self.phases.len(), progress);
        self.execution.progress = overall;
        debug!(phase = index, progress, overall, "step applied");
        self.events.push(SimulationEvent::Step {
            index,
            progress,
            overall,
        });

        if progress < 100 {
            if let Some(run) = self.run.as_mut() {
                run.next_progress = progress.saturating_add(PROGRESS_STEP).min(100);
                run.next_step_at += phase.step_delay();
            }
            return;
        }

        match work.complete(phase.role) {
            Ok(counter) => {
                self.apply_checkpoint(phase.role, counter);
                if let Some(agent) = self.execution.agent_mut(&phase.agent_id) {
                    agent.status = AgentStatus::Complete;
                    agent.progress = 100;
                }
                info!(phase = index, role = %phase.role, ?counter, "phase completed");
                self.events.push(SimulationEvent::PhaseCompleted {
                    index,
                    role: phase.role,
                    counter,
                });
                if index + 1 < self.phases.len() {
                    self.enter_phase(index + 1);
                } else {
                    self.finish(now, run.started_at);
                }
            }
            Err(failure) => {
                if let Some(agent) = self.execution.agent_mut(&phase.agent_id) {
                    agent.status = AgentStatus::Error;
                }
                self.execution.status = ExecutionStatus::Failed;
                self.execution.duration_ms = Some(elapsed_ms(now, run.started_at));
                self.run = None;
                warn!(phase = index, %failure, "phase failed; halting remaining phases");
                self.events
                    .push(SimulationEvent::PhaseFailed { index, failure });
            }
        }
    }

    fn apply_checkpoint(&mut self, role: PhaseRole, counter: Option<u32>) {
        let Some(count) = counter else {
            return;
        };
        match role {
            PhaseRole::Planner => {}
            PhaseRole::Generator => self.execution.test_cases_generated = count,
            PhaseRole::Executor => self.execution.test_cases_executed = count,
            PhaseRole::Validator => self.execution.validations_passed = count,
        }
    }

    fn finish(&mut self, now: Instant, started_at: Instant) {
        let duration = now.saturating_duration_since(started_at);
        self.execution.status = ExecutionStatus::Completed;
        self.execution.progress = 100.0;
        self.execution.duration_ms = Some(elapsed_ms(now, started_at));
        self.run = None;
        info!(duration_ms = duration.as_millis() as u64, "simulation completed");
        self.events.push(SimulationEvent::Finished { duration });
    }
}

fn elapsed_ms(now: Instant, started_at: Instant) -> u64 {
    u64::try_from(now.saturating_duration_since(started_at).as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "../tests/unit/simulator_tests.rs"]
mod tests;
