//! Command implementations for the ditto CLI.
//!
//! Each command takes an already-resolved project (or, for `init`, a root
//! path), performs one operation, persists what it changed, and returns a
//! result that renders as JSON or as human-readable text. Commands are
//! organized by entity type:
//! - `issue` - Issue CRUD, state changes, and listing
//! - `release` - Releases, components, statistics, and master names

mod issue;
mod release;

pub use issue::*;
pub use release::*;

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::Result;
use crate::config::RootConfig;
use crate::models::Issue;
use crate::storage::Project;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

/// Serialize a command result, falling back to an error object.
pub(crate) fn to_json_string<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
}

/// Current values of one issue.
#[derive(Debug, Clone, Serialize)]
pub struct IssueSummary {
    pub name: String,
    pub guid: String,
    pub title: String,
    pub state: String,
    pub component: String,
    pub release: String,
    pub owner: String,
    pub estimate: f64,
    pub actual: f64,
}

impl IssueSummary {
    pub fn new(issue: &Issue, project: &Project) -> Self {
        Self {
            name: issue.name().to_string(),
            guid: issue.guid().to_string(),
            title: issue.title().to_string(),
            state: issue.state().to_string(),
            component: issue.component(project).to_string(),
            release: issue.release(project).to_string(),
            owner: issue.owner().to_string(),
            estimate: issue.estimate(),
            actual: issue.actual(),
        }
    }

    /// One-line rendering used by listings.
    pub fn line(&self) -> String {
        let mut line = format!("{:<8} [{}] {}", self.name, self.state, self.title);
        if !self.owner.is_empty() {
            line.push_str(&format!(" ({})", self.owner));
        }
        line
    }
}

impl Output for IssueSummary {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        self.line()
    }
}

// === Init ===

#[derive(Serialize)]
pub struct InitResult {
    pub root: PathBuf,
    pub storage_dir: PathBuf,
    pub project_name: String,
    pub master_name_server: Option<String>,
}

impl Output for InitResult {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Initialized project \"{}\"", self.project_name),
            format!("  Root:    {}", self.root.display()),
            format!("  Records: {}", self.storage_dir.display()),
        ];
        if let Some(ref server) = self.master_name_server {
            lines.push(format!("  Master name server: {}", server));
        }
        lines.join("\n")
    }
}

/// Create a new project at `root`.
pub fn init(root: &Path, project_name: &str, config: RootConfig) -> Result<InitResult> {
    let project = Project::init(root, config, project_name)?;
    Ok(InitResult {
        root: project.root().to_path_buf(),
        storage_dir: project.storage_dir().to_path_buf(),
        project_name: project.meta().project_name.clone(),
        master_name_server: project
            .config()
            .is_master_name_server
            .then(|| project.config().master_name_server.clone())
            .flatten(),
    })
}
