//! Per-attribute validation.
//!
//! Raw values coming from the command line are checked and canonicalized
//! before they reach an issue's attribute log. Checks that depend on project
//! state (known components and releases) go through a [`Catalog`].

use crate::models::statistics::normalize_hours;
use crate::models::{IssueState, MASTER_NAME_KEY, MASTER_NAME_SERVER_KEY};
use crate::{Error, Result};

/// The project names that loose references are checked against.
pub trait Catalog {
    /// Whether `name` is one of the project's components.
    fn has_component(&self, name: &str) -> bool;

    /// Whether a release named exactly `name` exists.
    fn has_release(&self, name: &str) -> bool;

    /// Resolve a possibly abbreviated release name to the full name.
    fn find_release(&self, partial: &str) -> Option<&str>;
}

/// How a raw attribute value is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    /// Any string
    Text,
    /// Non-negative decimal number
    Number,
    /// Decimal hours or `H:MM`, stored with three decimals
    Hours,
    /// One of the issue states
    State,
    /// An existing component
    Component,
    /// A component name not yet in use
    NewComponent,
    /// An existing release (partial names allowed) or blank
    ReleaseOrBlank,
    /// A release name not yet in use
    NewRelease,
    /// Written only by master name arbitration; always rejected
    Reserved,
}

impl Validator {
    /// The validator applied when setting an issue attribute.
    pub fn for_key(key: &str) -> Self {
        match key {
            "estimate" => Validator::Number,
            "actual" => Validator::Hours,
            "state" => Validator::State,
            "component" => Validator::Component,
            "release" => Validator::ReleaseOrBlank,
            MASTER_NAME_KEY | MASTER_NAME_SERVER_KEY => Validator::Reserved,
            _ => Validator::Text,
        }
    }

    /// Check `raw` and return the value to store.
    pub fn validate(&self, raw: &str, catalog: &dyn Catalog) -> Result<String> {
        match self {
            Validator::Text => Ok(raw.to_string()),
            Validator::Number => {
                let value: f64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| Error::Validation(format!("Not a number: {}", raw)))?;
                if !value.is_finite() || value < 0.0 {
                    return Err(Error::Validation(format!(
                        "Expected a non-negative number, got: {}",
                        raw
                    )));
                }
                Ok(value.to_string())
            }
            Validator::Hours => normalize_hours(raw),
            Validator::State => {
                let state: IssueState = raw.parse()?;
                Ok(state.to_string())
            }
            Validator::Component => {
                if catalog.has_component(raw) {
                    Ok(raw.to_string())
                } else {
                    Err(Error::Validation(format!("Unknown component: {}", raw)))
                }
            }
            Validator::NewComponent => {
                let name = raw.trim();
                if name.is_empty() {
                    Err(Error::Validation("Component name cannot be blank".to_string()))
                } else if name.chars().take(2).any(|c| c.is_ascii_digit()) {
                    // Local names are prefix + ordinal; a digit in the prefix makes them ambiguous
                    Err(Error::Validation(format!(
                        "Component name cannot have a digit in its first two characters: {}",
                        name
                    )))
                } else if catalog.has_component(name) {
                    Err(Error::Validation(format!("Component already exists: {}", name)))
                } else {
                    Ok(name.to_string())
                }
            }
            Validator::ReleaseOrBlank => {
                if raw.is_empty() {
                    return Ok(String::new());
                }
                catalog
                    .find_release(raw)
                    .map(str::to_string)
                    .ok_or_else(|| Error::Validation(format!("Unknown release: {}", raw)))
            }
            Validator::NewRelease => {
                let name = raw.trim();
                if name.is_empty() {
                    Err(Error::Validation("Release name cannot be blank".to_string()))
                } else if catalog.has_release(name) {
                    Err(Error::Validation(format!("Release already exists: {}", name)))
                } else {
                    Ok(name.to_string())
                }
            }
            Validator::Reserved => Err(Error::Validation(
                "Master names are assigned by the master name server".to_string(),
            )),
        }
    }
}
