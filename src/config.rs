use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;
use crate::model::GenerationConfig;
use crate::scoring::DEFAULT_TOP_K;
use crate::simulator::{Phase, PhaseRole, reference_phases};

pub const DEFAULT_CONFIG_FILE: &str = "gametester.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub generation: GenerationConfig,
    pub selection: SelectionConfig,
    pub simulation: SimulationConfig,
    pub reports: ReportsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub top_k: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Where checkpoint counters come from when a phase completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CounterMode {
    /// Sizes of the generated, executed and validated collections.
    #[default]
    Derived,
    /// The dashboard's fixed 25 / 10 / 8.
    Fixed,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub counters: CounterMode,
    pub speed: f64,
    pub phases: Vec<PhaseConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            counters: CounterMode::default(),
            speed: 1.0,
            phases: reference_phases()
                .into_iter()
                .map(|phase| PhaseConfig {
                    agent: phase.agent_id,
                    role: phase.role,
                    task: phase.task,
                    duration_ms: phase.duration.as_millis() as u64,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhaseConfig {
    pub agent: String,
    pub role: PhaseRole,
    pub task: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// Directory of `*.json` report snapshots. Canned reports are used when unset.
    pub dir: Option<String>,
}

impl AppConfig {
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path_ref = path.as_ref();
        match Self::load(path_ref) {
            Ok(config) => config,
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Self::default()
            }
            Err(err) => {
                warn!(%err, "using default configuration");
                Self::default()
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generation.validate()?;
        if self.selection.top_k == 0 {
            return Err(ConfigError::ZeroTopK);
        }
        if !self.simulation.speed.is_finite() || self.simulation.speed <= 0.0 {
            return Err(ConfigError::InvalidSpeed(self.simulation.speed));
        }
        if self.simulation.phases.is_empty() {
            return Err(ConfigError::NoPhases);
        }
        if let Some(phase) = self
            .simulation
            .phases
            .iter()
            .find(|phase| phase.duration_ms == 0)
        {
            return Err(ConfigError::ZeroPhaseDuration(phase.agent.clone()));
        }
        Ok(())
    }

    /// Phase plan with every duration divided by the configured speed.
    pub fn phases(&self) -> Vec<Phase> {
        let speed = if self.simulation.speed.is_finite() && self.simulation.speed > 0.0 {
            self.simulation.speed
        } else {
            1.0
        };
        self.simulation
            .phases
            .iter()
            .map(|phase| {
                let nanos = (phase.duration_ms as f64 * 1_000_000.0 / speed).round() as u64;
                let scaled = Duration::from_nanos(nanos);
                Phase::new(
                    phase.agent.clone(),
                    phase.role,
                    phase.task.clone(),
                    scaled.max(Duration::from_millis(1)),
                )
            })
            .collect()
    }
}
