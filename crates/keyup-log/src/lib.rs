// ABOUTME: Run-log setup for the keyup binary.
// ABOUTME: Every status line of a run is appended to a timestamped log file via tracing.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Prefix of generated log file names.
pub const LOG_FILE_PREFIX: &str = "keyup";

/// File name for a run started at `started`: `keyup_YYYYMMDD_HHMMSS.log`.
pub fn log_file_name(started: DateTime<Local>) -> String {
    format!(
        "{}_{}.log",
        LOG_FILE_PREFIX,
        started.format("%Y%m%d_%H%M%S")
    )
}

/// Directory containing the running executable.
pub fn exe_log_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

/// Fallback directory used when the executable's directory is read-only
/// (~/.config/keyup/logs).
pub fn fallback_log_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("keyup").join("logs"))
}

/// Candidate log paths in the order they are tried.
pub fn candidate_log_paths(explicit: Option<&Path>, started: DateTime<Local>) -> Vec<PathBuf> {
    if let Some(path) = explicit {
        return vec![path.to_path_buf()];
    }

    let name = log_file_name(started);
    [exe_log_dir(), fallback_log_dir()]
        .into_iter()
        .flatten()
        .map(|dir| dir.join(&name))
        .collect()
}

/// Install the run-log subscriber. Default: INFO level, RUST_LOG override.
///
/// Tries the explicit path if given, otherwise the executable's directory and
/// then the config directory. Returns the path actually in use. If no
/// candidate can be opened, prints a warning to stderr and returns `None`;
/// the run continues without a log.
pub fn init_run_log(explicit: Option<&Path>, started: DateTime<Local>) -> Option<PathBuf> {
    let mut last_error = None;

    for path in candidate_log_paths(explicit, started) {
        match open_log_file(&path) {
            Ok(file) => {
                if let Err(e) = install(file) {
                    eprintln!("Warning: failed to set up run log: {e}");
                    return None;
                }
                return Some(path);
            }
            Err(e) => last_error = Some(format!("{}: {e}", path.display())),
        }
    }

    if let Some(e) = last_error {
        eprintln!("Warning: failed to open run log {e}");
    }
    None
}

/// Opens `path` for appending, creating parent directories as needed.
pub fn open_log_file(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
}

fn install(file: std::fs::File) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(file))
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_ansi(false)
        .with_target(false)
        .try_init()
}
