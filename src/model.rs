use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Gameplay,
    Ui,
    EdgeCase,
    Performance,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Self::Gameplay => "gameplay",
            Self::Ui => "ui",
            Self::EdgeCase => "edge-case",
            Self::Performance => "performance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
    pub category: Category,
    /// Seconds.
    pub estimated_duration: u32,
    #[serde(default)]
    pub generated: bool,
    #[serde(default)]
    pub selected: bool,
}

impl TestCase {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        priority: Priority,
        category: Category,
        estimated_duration: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            priority,
            category,
            estimated_duration,
            generated: false,
            selected: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentStatus {
    Idle,
    Planning,
    Executing,
    Validating,
    Complete,
    Error,
}

impl AgentStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Planning => "planning",
            Self::Executing => "executing",
            Self::Validating => "validating",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }

    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle | Self::Complete)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub status: AgentStatus,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task: Option<String>,
}

impl Agent {
    pub fn idle(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: AgentStatus::Idle,
            progress: 0,
            current_task: None,
        }
    }
}

/// The four agents of the reference pipeline, in phase order.
pub fn default_agents() -> Vec<Agent> {
    vec![
        Agent::idle("planner", "Planning Agent"),
        Agent::idle("generator", "Test Generator"),
        Agent::idle("executor", "Execution Agent"),
        Agent::idle("validator", "Validation Agent"),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub id: String,
    pub status: ExecutionStatus,
    /// Overall progress, clamped to `0.0..=100.0`.
    pub progress: f64,
    pub test_cases_generated: u32,
    pub test_cases_executed: u32,
    pub validations_passed: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_epoch_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    pub agents: Vec<Agent>,
}

impl Execution {
    pub fn pending(id: impl Into<String>, agents: Vec<Agent>) -> Self {
        Self {
            id: id.into(),
            status: ExecutionStatus::Pending,
            progress: 0.0,
            test_cases_generated: 0,
            test_cases_executed: 0,
            validations_passed: 0,
            started_at_epoch_secs: None,
            duration_ms: None,
            agents,
        }
    }

    pub fn agent(&self, id: &str) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id == id)
    }

    pub(crate) fn agent_mut(&mut self, id: &str) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|agent| agent.id == id)
    }

    pub fn active_agent_count(&self) -> usize {
        self.agents
            .iter()
            .filter(|agent| agent.status.is_active())
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultStatus {
    Passed,
    Failed,
    Warning,
}

impl ResultStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub repeat_check: bool,
    pub cross_agent_check: bool,
    pub confidence: f64,
}

impl Validation {
    pub fn fully_validated(&self) -> bool {
        self.repeat_check && self.cross_agent_check
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub id: String,
    pub name: String,
    pub status: ResultStatus,
    /// Seconds.
    pub duration: u32,
    #[serde(default)]
    pub artifacts: Vec<String>,
    pub validations: Validation,
    #[serde(default)]
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub target_url: String,
    pub test_types: Vec<String>,
    pub max_test_cases: i64,
    pub focus_areas: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            target_url: "https://play.ezygamers.com/".to_string(),
            test_types: ["functional", "ui", "edge-cases", "performance"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_test_cases: 25,
            focus_areas: ["number-input", "puzzle-solving", "scoring", "time-limits"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_url.trim().is_empty() {
            return Err(ConfigError::EmptyTargetUrl);
        }
        if self.max_test_cases <= 0 {
            return Err(ConfigError::NonPositiveMaxTestCases(self.max_test_cases));
        }
        Ok(())
    }

    /// Caller must have validated the config first.
    pub fn case_limit(&self) -> usize {
        usize::try_from(self.max_test_cases).unwrap_or(0)
    }
}
