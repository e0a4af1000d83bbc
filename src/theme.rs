use std::fs;
use std::path::Path;

use ratatui::style::Color;
use serde::Deserialize;
use tracing::warn;

use crate::model::{AgentStatus, ExecutionStatus, Priority, ResultStatus};

#[derive(Debug, Clone)]
pub struct Theme {
    pub panel_bg: Color,
    pub header_bg: Color,
    pub status_bg: Color,
    pub text_fg: Color,
    pub muted_fg: Color,
    pub active_fg: Color,
    pub primary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            panel_bg: Color::Rgb(24, 27, 38),
            header_bg: Color::Rgb(34, 38, 54),
            status_bg: Color::Rgb(18, 20, 28),
            text_fg: Color::Rgb(225, 228, 240),
            muted_fg: Color::Rgb(140, 146, 170),
            active_fg: Color::Rgb(255, 255, 255),
            primary: Color::Rgb(0, 200, 230),
            success: Color::Rgb(46, 204, 113),
            warning: Color::Rgb(241, 196, 15),
            error: Color::Rgb(231, 76, 60),
            info: Color::Rgb(52, 152, 219),
        }
    }
}

impl Theme {
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path_ref = path.as_ref();
        match fs::read_to_string(path_ref) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(theme) => theme,
                Err(err) => {
                    warn!(path = %path_ref.display(), %err, "failed to parse theme file; using defaults");
                    Self::default()
                }
            },
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path_ref.display(), %err, "failed to read theme file; using defaults");
                }
                Self::default()
            }
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        let cfg: ThemeToml = toml::from_str(s)?;
        Ok(Self {
            panel_bg: cfg.colors.panel_bg.to_color(),
            header_bg: cfg.colors.header_bg.to_color(),
            status_bg: cfg.colors.status_bg.to_color(),
            text_fg: cfg.colors.text_fg.to_color(),
            muted_fg: cfg.colors.muted_fg.to_color(),
            active_fg: cfg.colors.active_fg.to_color(),
            primary: cfg.colors.primary.to_color(),
            success: cfg.colors.success.to_color(),
            warning: cfg.colors.warning.to_color(),
            error: cfg.colors.error.to_color(),
            info: cfg.colors.info.to_color(),
        })
    }

    pub fn agent_status(&self, status: AgentStatus) -> Color {
        match status {
            AgentStatus::Idle => self.muted_fg,
            AgentStatus::Planning | AgentStatus::Executing | AgentStatus::Validating => {
                self.primary
            }
            AgentStatus::Complete => self.success,
            AgentStatus::Error => self.error,
        }
    }

    pub fn execution_status(&self, status: ExecutionStatus) -> Color {
        match status {
            ExecutionStatus::Pending => self.muted_fg,
            ExecutionStatus::Running => self.info,
            ExecutionStatus::Completed => self.success,
            ExecutionStatus::Failed => self.error,
        }
    }

    pub fn result_status(&self, status: ResultStatus) -> Color {
        match status {
            ResultStatus::Passed => self.success,
            ResultStatus::Failed => self.error,
            ResultStatus::Warning => self.warning,
        }
    }

    pub fn priority(&self, priority: Priority) -> Color {
        match priority {
            Priority::High => self.error,
            Priority::Medium => self.warning,
            Priority::Low => self.success,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ThemeToml {
    colors: ThemeColorsToml,
}

#[derive(Debug, Deserialize)]
struct ThemeColorsToml {
    panel_bg: RgbToml,
    header_bg: RgbToml,
    status_bg: RgbToml,
    text_fg: RgbToml,
    muted_fg: RgbToml,
    active_fg: RgbToml,
    primary: RgbToml,
    success: RgbToml,
    warning: RgbToml,
    error: RgbToml,
    info: RgbToml,
}

#[derive(Debug, Deserialize)]
struct RgbToml {
    r: u8,
    g: u8,
    b: u8,
}

impl RgbToml {
    fn to_color(&self) -> Color {
        Color::Rgb(self.r, self.g, self.b)
    }
}
