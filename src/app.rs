use std::time::Instant;

use tracing::warn;

use crate::config::{AppConfig, CounterMode};
use crate::error::{ConfigError, RunError};
use crate::generator::{GenerationEvent, GeneratorSession};
use crate::model::{Execution, default_agents};
use crate::pipeline::{DerivedCheckpoints, PipelineState};
use crate::report::ExecutionReport;
use crate::simulator::{FixedCheckpoints, SimulationEvent, Simulator};
use crate::sources::{
    JsonReportStore, MockGameBackend, MockReportStore, ReportStore, TestCaseSource, TestExecutor,
};

const MAX_ACTIVITY_LINES: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Dashboard,
    Generator,
    Reports,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Home, Tab::Dashboard, Tab::Generator, Tab::Reports];

    pub fn title(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Dashboard => "Dashboard",
            Self::Generator => "Generator",
            Self::Reports => "Reports",
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Home => Self::Dashboard,
            Self::Dashboard => Self::Generator,
            Self::Generator => Self::Reports,
            Self::Reports => Self::Home,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Home => Self::Reports,
            Self::Dashboard => Self::Home,
            Self::Generator => Self::Dashboard,
            Self::Reports => Self::Generator,
        }
    }
}

/// External collaborators the controller drives.
pub struct Backends {
    pub source: Box<dyn TestCaseSource>,
    pub executor: Box<dyn TestExecutor>,
    pub reports: Box<dyn ReportStore>,
}

impl Backends {
    pub fn mock() -> Self {
        Self {
            source: Box::new(MockGameBackend),
            executor: Box::new(MockGameBackend),
            reports: Box::new(MockReportStore::default()),
        }
    }

    /// Mock game backend; reports from `config.reports.dir` when set.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut backends = Self::mock();
        if let Some(dir) = config.reports.dir.as_deref() {
            backends.reports = Box::new(JsonReportStore::new(dir));
        }
        backends
    }
}

pub struct App {
    pub running: bool,
    pub ticks: u64,
    pub active_tab: Tab,
    scroll: u16,
    config: AppConfig,
    backends: Backends,
    simulator: Simulator,
    pipeline: PipelineState,
    generator: GeneratorSession,
    run_reports: Vec<ExecutionReport>,
    stored_reports: Vec<ExecutionReport>,
    report_index: usize,
    activity: Vec<String>,
}

impl App {
    pub fn new(config: AppConfig, backends: Backends) -> Result<Self, ConfigError> {
        config.validate()?;
        let simulator = Simulator::new("exec-pending", config.phases(), default_agents())?;
        let mut app = Self {
            running: true,
            ticks: 0,
            active_tab: Tab::Home,
            scroll: 0,
            config,
            backends,
            simulator,
            pipeline: PipelineState::default(),
            generator: GeneratorSession::default(),
            run_reports: Vec::new(),
            stored_reports: Vec::new(),
            report_index: 0,
            activity: Vec::new(),
        };
        app.reload_reports();
        Ok(app)
    }

    /// Advances both step machines to `now` and folds their events into the
    /// activity feed.
    pub fn on_tick(&mut self, now: Instant) {
        self.ticks = self.ticks.saturating_add(1);

        match self.config.simulation.counters {
            CounterMode::Fixed => self.simulator.poll(now, &mut FixedCheckpoints),
            CounterMode::Derived => {
                let mut work = DerivedCheckpoints {
                    source: self.backends.source.as_ref(),
                    executor: self.backends.executor.as_ref(),
                    config: &self.config.generation,
                    top_k: self.config.selection.top_k,
                    state: &mut self.pipeline,
                };
                self.simulator.poll(now, &mut work);
            }
        }
        for event in self.simulator.drain_events() {
            self.on_simulation_event(event);
        }

        self.generator.poll(now);
        for event in self.generator.drain_events() {
            self.on_generation_event(event);
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn next_tab(&mut self) {
        self.active_tab = self.active_tab.next();
        self.scroll = 0;
    }

    pub fn prev_tab(&mut self) {
        self.active_tab = self.active_tab.prev();
        self.scroll = 0;
    }

    pub fn select_tab(&mut self, tab: Tab) {
        if self.active_tab != tab {
            self.active_tab = tab;
            self.scroll = 0;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self, max_scroll: u16) {
        self.scroll = (self.scroll + 1).min(max_scroll);
    }

    pub fn start_execution(&mut self, now: Instant, epoch_secs: u64) -> Result<(), RunError> {
        if self.simulator.is_running() {
            self.push_activity("Start ignored: an execution is already running".to_string());
            return Err(RunError::AlreadyRunning);
        }
        let phases = self.config.phases();
        let simulator = Simulator::new(format!("exec-{epoch_secs}"), phases, default_agents())?;
        self.simulator = simulator;
        self.pipeline.clear();
        self.simulator.start(now, epoch_secs)?;
        for event in self.simulator.drain_events() {
            self.on_simulation_event(event);
        }
        Ok(())
    }

    pub fn cancel_execution(&mut self, now: Instant) -> bool {
        let cancelled = self.simulator.cancel(now);
        for event in self.simulator.drain_events() {
            self.on_simulation_event(event);
        }
        cancelled
    }

    pub fn start_generation(&mut self, now: Instant) -> Result<usize, RunError> {
        let result = self.generator.start(
            &self.config.generation,
            self.backends.source.as_ref(),
            now,
        );
        match &result {
            Ok(_) => {
                for event in self.generator.drain_events() {
                    self.on_generation_event(event);
                }
            }
            Err(err) => self.push_activity(format!("Generation rejected: {err}")),
        }
        result
    }

    pub fn cancel_generation(&mut self) -> bool {
        let cancelled = self.generator.cancel();
        for event in self.generator.drain_events() {
            self.on_generation_event(event);
        }
        cancelled
    }

    /// Marks the best `top_k` revealed cases as selected.
    pub fn select_top_tests(&mut self) -> Vec<String> {
        let selected = self.generator.select_top(self.config.selection.top_k);
        self.push_activity(format!("Selected top {} test cases", selected.len()));
        selected
    }

    pub fn reload_reports(&mut self) {
        match self.backends.reports.list() {
            Ok(reports) => self.stored_reports = reports,
            Err(err) => {
                warn!(%err, "failed to load reports");
                self.push_activity(format!("Reports unavailable: {err}"));
                self.stored_reports.clear();
            }
        }
        self.clamp_report_index();
    }

    pub fn next_report(&mut self) {
        let count = self.report_count();
        if count > 0 {
            self.report_index = (self.report_index + 1) % count;
            self.scroll = 0;
        }
    }

    pub fn prev_report(&mut self) {
        let count = self.report_count();
        if count > 0 {
            self.report_index = (self.report_index + count - 1) % count;
            self.scroll = 0;
        }
    }

    pub fn push_activity(&mut self, line: String) {
        self.activity.push(line);
        if self.activity.len() > MAX_ACTIVITY_LINES {
            let overflow = self.activity.len() - MAX_ACTIVITY_LINES;
            self.activity.drain(..overflow);
        }
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn execution(&self) -> &Execution {
        self.simulator.execution()
    }

    pub fn is_executing(&self) -> bool {
        self.simulator.is_running()
    }

    pub fn was_cancelled(&self) -> bool {
        self.simulator.was_cancelled()
    }

    pub fn current_phase_index(&self) -> Option<usize> {
        self.simulator.current_phase_index()
    }

    pub fn phase_count(&self) -> usize {
        self.simulator.phases().len()
    }

    pub fn generator(&self) -> &GeneratorSession {
        &self.generator
    }

    /// Earliest instant at which a poll would change state.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.simulator.next_deadline(), self.generator.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn last_run_report(&self) -> Option<&ExecutionReport> {
        self.run_reports.first()
    }

    pub fn is_busy(&self) -> bool {
        self.simulator.is_running() || self.generator.is_generating()
    }

    pub fn activity(&self) -> &[String] {
        &self.activity
    }

    pub fn report_count(&self) -> usize {
        self.run_reports.len() + self.stored_reports.len()
    }

    /// Reports from this session first, newest first, then the store's.
    pub fn selected_report(&self) -> Option<&ExecutionReport> {
        self.run_reports
            .iter()
            .chain(self.stored_reports.iter())
            .nth(self.report_index)
    }

    pub fn report_position(&self) -> (usize, usize) {
        (self.report_index, self.report_count())
    }

    fn clamp_report_index(&mut self) {
        let count = self.report_count();
        if count == 0 {
            self.report_index = 0;
        } else if self.report_index >= count {
            self.report_index = count - 1;
        }
    }

    fn agent_name(&self, agent_id: &str) -> String {
        self.execution()
            .agent(agent_id)
            .map(|agent| agent.name.clone())
            .unwrap_or_else(|| agent_id.to_string())
    }

    fn on_simulation_event(&mut self, event: SimulationEvent) {
        match event {
            SimulationEvent::Started => {
                let id = self.execution().id.clone();
                self.push_activity(format!("Execution {id} started"));
            }
            SimulationEvent::PhaseEntered { agent_id, task, .. } => {
                let name = self.agent_name(&agent_id);
                self.push_activity(format!("{name}: {task}"));
            }
            SimulationEvent::Step { .. } => {}
            SimulationEvent::PhaseCompleted { role, counter, .. } => {
                let line = match counter {
                    Some(count) => format!("{role} phase complete ({count})"),
                    None => format!("{role} phase complete"),
                };
                self.push_activity(line);
            }
            SimulationEvent::PhaseFailed { failure, .. } => {
                self.push_activity(format!("Execution halted: {failure}"));
            }
            SimulationEvent::Finished { duration } => {
                self.push_activity(format!(
                    "Execution completed in {:.1}s",
                    duration.as_secs_f64()
                ));
                self.record_run_report();
            }
            SimulationEvent::Cancelled { progress, .. } => {
                self.push_activity(format!("Execution cancelled at {progress:.0}%"));
            }
        }
    }

    fn record_run_report(&mut self) {
        if self.config.simulation.counters != CounterMode::Derived
            || self.pipeline.results.is_empty()
        {
            return;
        }
        let execution = self.simulator.execution();
        let report = self.pipeline.to_report(
            format!("report-{}", execution.id),
            execution.started_at_epoch_secs.unwrap_or(0),
        );
        self.push_activity(format!(
            "Report {} ready: {} passed, {} failed, {} warnings",
            report.id(),
            report.passed(),
            report.failed(),
            report.warnings()
        ));
        self.run_reports.insert(0, report);
        self.report_index = 0;
    }

    fn on_generation_event(&mut self, event: GenerationEvent) {
        match event {
            GenerationEvent::Started { candidates } => {
                let url = self.config.generation.target_url.clone();
                self.push_activity(format!(
                    "Generating up to {candidates} test cases for {url}"
                ));
            }
            GenerationEvent::Progress(_) => {}
            GenerationEvent::Revealed { id } => {
                self.push_activity(format!("Generated {id}"));
            }
            GenerationEvent::Finished { total } => {
                self.push_activity(format!("Generation finished: {total} test cases"));
            }
            GenerationEvent::Cancelled { revealed } => {
                self.push_activity(format!("Generation cancelled after {revealed} cases"));
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/app_tests.rs"]
mod tests;
