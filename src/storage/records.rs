//! On-disk record directory.
//!
//! Layout inside the storage folder:
//! - `project.json` - project metadata
//! - `issue-<GUID>.json` - an issue's attribute log (JSON array)
//! - `release-<GUID>.json` - a release's attribute map (JSON object)
//!
//! Every write replaces the whole file through a temp file in the same
//! directory, so a record is never left half written.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::models::{AttributeLog, AttributeRecord, Issue, ProjectMeta, Release};
use crate::{Error, Result};

/// File name of the project metadata record.
pub const PROJECT_FILE: &str = "project.json";

const ISSUE_PREFIX: &str = "issue-";
const RELEASE_PREFIX: &str = "release-";
const RECORD_EXT: &str = ".json";

/// Kind of entity a record file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Issue,
    Release,
}

/// Split a record file name into its kind and embedded GUID text.
///
/// Returns `None` for files that are not entity records.
pub fn parse_record_name(file_name: &str) -> Option<(RecordKind, &str)> {
    let stem = file_name.strip_suffix(RECORD_EXT)?;
    if let Some(guid) = stem.strip_prefix(ISSUE_PREFIX) {
        Some((RecordKind::Issue, guid))
    } else {
        stem.strip_prefix(RELEASE_PREFIX)
            .map(|guid| (RecordKind::Release, guid))
    }
}

/// Everything found in a record directory.
#[derive(Debug, Default)]
pub struct Records {
    pub issues: Vec<Issue>,
    pub releases: Vec<Release>,
}

/// The storage folder of one project.
#[derive(Debug, Clone)]
pub struct RecordDir {
    path: PathBuf,
}

impl RecordDir {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn issue_path(&self, guid: Uuid) -> PathBuf {
        self.path.join(format!("{}{}{}", ISSUE_PREFIX, guid, RECORD_EXT))
    }

    pub fn release_path(&self, guid: Uuid) -> PathBuf {
        self.path.join(format!("{}{}{}", RELEASE_PREFIX, guid, RECORD_EXT))
    }

    pub fn meta_path(&self) -> PathBuf {
        self.path.join(PROJECT_FILE)
    }

    /// Read the project metadata record.
    pub fn read_meta(&self) -> Result<ProjectMeta> {
        let path = self.meta_path();
        let content = fs::read_to_string(&path).map_err(|e| Error::MalformedRecord {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        parse(&path, &content)
    }

    /// Overwrite the project metadata record.
    pub fn write_meta(&self, meta: &ProjectMeta) -> Result<()> {
        self.write_json(&self.meta_path(), meta)
    }

    /// Load every issue and release record.
    ///
    /// Any record that cannot be parsed aborts the whole scan.
    pub fn scan(&self) -> Result<Records> {
        let mut records = Records::default();

        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let Some((kind, guid_text)) = parse_record_name(file_name) else {
                continue;
            };

            let path = entry.path();
            let guid = Uuid::parse_str(guid_text).map_err(|e| Error::MalformedRecord {
                path: path.clone(),
                reason: format!("invalid GUID in file name: {}", e),
            })?;
            let content = fs::read_to_string(&path)?;

            match kind {
                RecordKind::Issue => {
                    let log: Vec<AttributeRecord> = parse(&path, &content)?;
                    records
                        .issues
                        .push(Issue::with_log(guid, AttributeLog::from_records(log)));
                }
                RecordKind::Release => {
                    let values: BTreeMap<String, String> = parse(&path, &content)?;
                    records.releases.push(Release::with_values(guid, values));
                }
            }
        }

        tracing::debug!(
            dir = %self.path.display(),
            issues = records.issues.len(),
            releases = records.releases.len(),
            "scanned record directory"
        );
        Ok(records)
    }

    /// Overwrite an issue's record with its full log.
    pub fn write_issue(&self, issue: &Issue) -> Result<()> {
        self.write_json(&self.issue_path(issue.guid()), issue.log())
    }

    /// Overwrite a release's record with its full map.
    pub fn write_release(&self, release: &Release) -> Result<()> {
        self.write_json(&self.release_path(release.guid()), release.values())
    }

    /// Delete an issue's record. Returns `false` if it was already gone.
    pub fn delete_issue(&self, guid: Uuid) -> Result<bool> {
        remove_if_present(&self.issue_path(guid))
    }

    /// Delete a release's record. Returns `false` if it was already gone.
    pub fn delete_release(&self, guid: Uuid) -> Result<bool> {
        remove_if_present(&self.release_path(guid))
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.path)?;
        serde_json::to_writer_pretty(&mut tmp, value)?;
        tmp.write_all(b"\n")?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        tracing::debug!(path = %path.display(), "wrote record");
        Ok(())
    }
}

fn parse<T: serde::de::DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
    serde_json::from_str(content).map_err(|e| Error::MalformedRecord {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn remove_if_present(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
