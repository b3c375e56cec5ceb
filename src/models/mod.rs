//! Data models for ditto entities.
//!
//! This module defines the core data structures:
//! - `Issue` - Work item whose attributes live in an append-only `AttributeLog`
//! - `Release` - Named group of issues backed by a plain overwritable map
//! - `ProjectMeta` - Project-wide metadata (name, start time, component list)
//!
//! Issues reference releases and components by name only. Those references
//! are re-checked against a [`Catalog`] on every read and silently collapse to
//! blank when the target no longer exists.

pub mod attribute_log;
pub mod statistics;
pub mod validator;

pub use attribute_log::{AttributeLog, AttributeRecord};
pub use statistics::{ReleaseStatistics, normalize_hours, owners};
pub use validator::{Catalog, Validator};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// Attribute key holding an issue's pinned, globally arbitrated name.
pub const MASTER_NAME_KEY: &str = "master_name";

/// Attribute key recording which server granted the master name.
pub const MASTER_NAME_SERVER_KEY: &str = "master_name_server";

/// Issue workflow state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
        }
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IssueState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(IssueState::Open),
            "closed" => Ok(IssueState::Closed),
            _ => Err(Error::Validation(format!(
                "Invalid state: {} (expected open or closed)",
                s
            ))),
        }
    }
}

/// A tracked issue.
///
/// The GUID is fixed at creation. Everything else is derived from the
/// attribute log, except the display name which the name assigner computes
/// over the whole issue collection.
#[derive(Debug, Clone)]
pub struct Issue {
    guid: Uuid,
    log: AttributeLog,
    name: String,
}

impl Issue {
    /// Create an issue with an empty log.
    pub fn new(guid: Uuid) -> Self {
        Self::with_log(guid, AttributeLog::new())
    }

    /// Rebuild an issue from a persisted log.
    pub fn with_log(guid: Uuid, log: AttributeLog) -> Self {
        Self {
            guid,
            log,
            name: String::new(),
        }
    }

    pub fn guid(&self) -> Uuid {
        self.guid
    }

    pub fn log(&self) -> &AttributeLog {
        &self.log
    }

    /// Display name as last computed by the name assigner.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Append a raw attribute change. Callers validate first.
    pub fn set(&mut self, key: &str, value: impl ToString, user: &str) {
        self.log.set(key, value, user);
    }

    /// Current raw value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.log.get(key)
    }

    /// Creation time, i.e. the timestamp of the first log record.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.log.created_at()
    }

    pub fn title(&self) -> &str {
        self.log.get_or("title", "")
    }

    pub fn description(&self) -> &str {
        self.log.get_or("description", "")
    }

    pub fn owner(&self) -> &str {
        self.log.get_or("owner", "")
    }

    /// Current state, `open` unless explicitly closed.
    pub fn state(&self) -> IssueState {
        self.log
            .get("state")
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn estimate(&self) -> f64 {
        self.number("estimate")
    }

    pub fn actual(&self) -> f64 {
        self.number("actual")
    }

    /// Pinned name granted by a master naming server, if any.
    pub fn master_name(&self) -> Option<&str> {
        self.log.get(MASTER_NAME_KEY)
    }

    /// Referenced release, or blank if it no longer exists.
    pub fn release(&self, catalog: &dyn Catalog) -> &str {
        let release = self.log.get_or("release", "");
        if release.is_empty() || catalog.has_release(release) {
            release
        } else {
            tracing::warn!(issue = %self.guid, release, "masking reference to missing release");
            ""
        }
    }

    /// Referenced component, or blank if it no longer exists.
    pub fn component(&self, catalog: &dyn Catalog) -> &str {
        let component = self.log.get_or("component", "");
        if component.is_empty() || catalog.has_component(component) {
            component
        } else {
            tracing::warn!(issue = %self.guid, component, "masking reference to missing component");
            ""
        }
    }

    fn number(&self, key: &str) -> f64 {
        match self.log.get(key) {
            None => 0.0,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(issue = %self.guid, key, value = raw, "unparseable number, using 0");
                0.0
            }),
        }
    }
}

/// A release: a flat, overwritable attribute map.
///
/// Unlike issues, releases keep no change history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Release {
    guid: Uuid,
    values: BTreeMap<String, String>,
}

impl Release {
    pub fn new(guid: Uuid) -> Self {
        Self::with_values(guid, BTreeMap::new())
    }

    pub fn with_values(guid: Uuid, values: BTreeMap<String, String>) -> Self {
        Self { guid, values }
    }

    pub fn guid(&self) -> Uuid {
        self.guid
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn name(&self) -> &str {
        self.get("name").unwrap_or("")
    }

    pub fn description(&self) -> &str {
        self.get("description").unwrap_or("")
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Overwrite `key`. No history is kept.
    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// Project-wide metadata stored in `project.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMeta {
    /// Human-facing project name
    pub project_name: String,

    /// When the project was started
    pub started: DateTime<Utc>,

    /// Allowed component names
    #[serde(default)]
    pub components: Vec<String>,

    /// Any other keys, preserved as written
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ProjectMeta {
    pub fn new(project_name: String) -> Self {
        Self {
            project_name,
            started: Utc::now(),
            components: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn has_component(&self, name: &str) -> bool {
        self.components.iter().any(|c| c == name)
    }
}
