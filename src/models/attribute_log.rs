//! Append-only attribute history for issues.
//!
//! Every change to an issue is recorded as an [`AttributeRecord`]. The
//! current value of a key is the value of the last record carrying that key,
//! so reads scan the whole log while writes only ever push.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single timestamped, attributed key/value change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRecord {
    /// Attribute name (e.g. "title", "state")
    pub key: String,

    /// Stringified value at the time of the change
    pub value: String,

    /// Identity of the user who made the change
    pub user: String,

    /// When the change was made
    pub timestamp: DateTime<Utc>,
}

/// Ordered sequence of attribute changes.
///
/// Serializes as a bare JSON array so an issue record file is just its log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeLog {
    records: Vec<AttributeRecord>,
}

impl AttributeLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from previously persisted records.
    pub fn from_records(records: Vec<AttributeRecord>) -> Self {
        Self { records }
    }

    /// Append a change stamped with the current time.
    pub fn set(&mut self, key: &str, value: impl ToString, user: &str) {
        self.set_at(key, value, user, Utc::now());
    }

    /// Append a change with an explicit timestamp.
    pub fn set_at(&mut self, key: &str, value: impl ToString, user: &str, timestamp: DateTime<Utc>) {
        self.records.push(AttributeRecord {
            key: key.to_string(),
            value: value.to_string(),
            user: user.to_string(),
            timestamp,
        });
    }

    /// Current value of `key`, or `None` if it was never set.
    pub fn get(&self, key: &str) -> Option<&str> {
        let mut value = None;
        for record in &self.records {
            if record.key == key {
                value = Some(record.value.as_str());
            }
        }
        value
    }

    /// Current value of `key`, falling back to `default`.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Timestamp of the first record ever appended.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.records.first().map(|r| r.timestamp)
    }

    /// Every change, oldest first.
    pub fn records(&self) -> &[AttributeRecord] {
        &self.records
    }

    /// Changes to a single key, oldest first.
    pub fn history<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a AttributeRecord> + 'a {
        self.records.iter().filter(move |r| r.key == key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
