//! KDL schema for the `.ditto.kdl` root marker file.
//!
//! This module provides:
//! - The `RootConfig` struct representing the marker file
//! - Serialization/deserialization to/from KDL format
//! - Validation of required fields

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use std::fs;
use std::path::Path;

use crate::{Error, Result};

/// Project root configuration stored in `.ditto.kdl`.
///
/// # KDL Schema
///
/// ```kdl
/// folder "issues"
/// username "jdoe"
/// name "Jane Doe"
/// email "jane@example.com"
/// // Optional: arbitrate pinned names for all copies of this project
/// is-master-name-server #true
/// master-name-server "central"
/// // Optional: per-command action log
/// action-log #true
/// action-log-path "~/ditto-actions.jsonl"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootConfig {
    /// Storage subfolder, relative to the project root
    pub folder: String,

    /// Short username of the acting user
    pub username: String,

    /// Full name of the acting user
    pub name: String,

    /// Email address of the acting user
    pub email: String,

    /// Whether this copy arbitrates master names
    pub is_master_name_server: bool,

    /// Identity recorded alongside every master name this copy grants
    pub master_name_server: Option<String>,

    /// Whether commands are recorded in the action log (default: true)
    pub action_log: Option<bool>,

    /// Custom action log location
    pub action_log_path: Option<String>,
}

impl RootConfig {
    /// Create a config for a regular (non-master) project copy.
    pub fn new(folder: &str, username: &str, name: &str, email: &str) -> Self {
        Self {
            folder: folder.to_string(),
            username: username.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            ..Self::default()
        }
    }

    /// Identity string stamped on every attribute change.
    pub fn user_string(&self) -> String {
        format!("{} ({}) <{}>", self.username, self.name, self.email)
    }

    /// Whether the action log is enabled.
    pub fn action_log_enabled(&self) -> bool {
        self.action_log.unwrap_or(true)
    }

    /// Validate the config values.
    pub fn validate(&self) -> Result<()> {
        if self.folder.trim().is_empty() {
            return Err(Error::Config("folder must not be empty".to_string()));
        }
        if Path::new(&self.folder).is_absolute() {
            return Err(Error::Config(format!(
                "folder must be relative to the project root, got {}",
                self.folder
            )));
        }
        Ok(())
    }

    /// Parse config from a KDL document.
    pub fn from_kdl(doc: &KdlDocument) -> Result<Self> {
        let required = |key: &str| {
            string_value(doc, key)
                .ok_or_else(|| Error::Config(format!("missing required setting '{}'", key)))
        };

        let config = Self {
            folder: required("folder")?,
            username: required("username")?,
            name: required("name")?,
            email: required("email")?,
            is_master_name_server: bool_value(doc, "is-master-name-server").unwrap_or(false),
            master_name_server: string_value(doc, "master-name-server"),
            action_log: bool_value(doc, "action-log"),
            action_log_path: string_value(doc, "action-log-path"),
        };
        config.validate()?;
        Ok(config)
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        push_string(&mut doc, "folder", &self.folder);
        push_string(&mut doc, "username", &self.username);
        push_string(&mut doc, "name", &self.name);
        push_string(&mut doc, "email", &self.email);

        if self.is_master_name_server {
            push_bool(&mut doc, "is-master-name-server", true);
        }
        if let Some(ref server) = self.master_name_server {
            push_string(&mut doc, "master-name-server", server);
        }
        if let Some(enabled) = self.action_log {
            push_bool(&mut doc, "action-log", enabled);
        }
        if let Some(ref path) = self.action_log_path {
            push_string(&mut doc, "action-log-path", path);
        }

        doc.autoformat();
        doc
    }

    /// Load the config from a marker file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let doc: KdlDocument = content
            .parse()
            .map_err(|e| Error::Config(format!("Failed to parse KDL in {}: {}", path.display(), e)))?;
        Self::from_kdl(&doc)
    }

    /// Write the config to a marker file.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_kdl().to_string())?;
        Ok(())
    }
}

fn string_value(doc: &KdlDocument, key: &str) -> Option<String> {
    doc.get(key)
        .and_then(|node| node.entries().first())
        .and_then(|entry| entry.value().as_string())
        .map(str::to_string)
}

fn bool_value(doc: &KdlDocument, key: &str) -> Option<bool> {
    doc.get(key)
        .and_then(|node| node.entries().first())
        .and_then(|entry| entry.value().as_bool())
}

fn push_string(doc: &mut KdlDocument, key: &str, value: &str) {
    let mut node = KdlNode::new(key);
    node.push(KdlEntry::new(KdlValue::String(value.to_string())));
    doc.nodes_mut().push(node);
}

fn push_bool(doc: &mut KdlDocument, key: &str, value: bool) {
    let mut node = KdlNode::new(key);
    node.push(KdlEntry::new(KdlValue::Bool(value)));
    doc.nodes_mut().push(node);
}
