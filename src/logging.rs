use std::fs::File;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

/// Names the file that receives dashboard logs. Unset means no logging while the
/// dashboard owns the terminal.
pub const LOG_PATH_ENV: &str = "GAMETESTER_LOG";
const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

pub fn dashboard_log_path() -> Option<PathBuf> {
    std::env::var_os(LOG_PATH_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Dashboard mode: file logging only, never to the terminal.
pub fn init_dashboard() {
    let Some(path) = dashboard_log_path() else {
        return;
    };
    let Ok(file) = File::create(&path) else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

/// Headless mode: logs go to stderr so stdout stays machine-readable.
pub fn init_headless() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}
