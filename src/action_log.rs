//! Action logging for ditto commands.
//!
//! Every CLI invocation against a project appends one JSON line to the
//! project's action log. By default the log lives next to the records as
//! `<folder>/actions.jsonl`; the root marker can move it or turn it off.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::Result;
use crate::config::{CONFIG_FILE, RootConfig};

/// Default action log file name inside the storage folder.
pub const ACTION_LOG_FILE: &str = "actions.jsonl";

/// Represents a single action log entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionLog {
    /// When the command finished
    pub timestamp: DateTime<Utc>,

    /// Project root the command ran against
    pub root: String,

    /// Command name (e.g., "add", "close", "release-summary")
    pub command: String,

    /// Command arguments as JSON
    pub args: serde_json::Value,

    /// Whether the command succeeded
    pub success: bool,

    /// Error message if the command failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Command execution duration in milliseconds
    pub duration_ms: u64,

    /// Identity from the root marker
    pub user: String,
}

/// Log an action for the project rooted at `root`.
///
/// Never fails the caller: a missing or unreadable marker skips logging and
/// write errors are only reported as warnings.
pub fn log_action(
    root: &Path,
    command: &str,
    args: serde_json::Value,
    success: bool,
    error: Option<String>,
    duration_ms: u64,
) {
    let config = match RootConfig::load(&root.join(CONFIG_FILE)) {
        Ok(config) => config,
        Err(e) => {
            tracing::debug!(root = %root.display(), error = %e, "no readable marker, skipping action log");
            return;
        }
    };
    if !config.action_log_enabled() {
        return;
    }

    let entry = ActionLog {
        timestamp: Utc::now(),
        root: root.to_string_lossy().to_string(),
        command: command.to_string(),
        args,
        success,
        error,
        duration_ms,
        user: config.user_string(),
    };

    let path = log_path(root, &config);
    if let Err(e) = write_log_entry(&path, &entry) {
        tracing::warn!(path = %path.display(), error = %e, "failed to write action log");
    }
}

/// Where the action log for this project is written.
pub fn log_path(root: &Path, config: &RootConfig) -> PathBuf {
    match config.action_log_path {
        Some(ref custom) => {
            let path = expand_home(Path::new(custom));
            if path.is_absolute() { path } else { root.join(path) }
        }
        None => root.join(&config.folder).join(ACTION_LOG_FILE),
    }
}

/// Expand ~ in path to home directory.
fn expand_home(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

/// Append a log entry to the log file.
fn write_log_entry(path: &Path, entry: &ActionLog) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string(entry)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", json)?;

    Ok(())
}
