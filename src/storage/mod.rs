//! Entity store for ditto projects.
//!
//! A [`Project`] is loaded from its root directory in one pass: the
//! `.ditto.kdl` marker, the `project.json` metadata record, and every
//! issue/release record in the storage folder. All mutation happens in
//! memory; nothing reaches disk until one of the `save_*` methods is called.
//!
//! ## Concurrency
//!
//! There is no locking of the storage folder. Two processes saving the same
//! record race and the last writer wins. Callers must run one ditto process
//! per project at a time.

pub mod naming;
pub mod records;

pub use naming::{MasterNameGrant, compute_names};
pub use records::{PROJECT_FILE, RecordDir};

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::{CONFIG_FILE, RootConfig};
use crate::models::{
    Catalog, Issue, ProjectMeta, Release, ReleaseStatistics, Validator, owners,
};
use crate::{Error, Result};

/// In-memory view of one project and its entities.
#[derive(Debug)]
pub struct Project {
    root: PathBuf,
    config: RootConfig,
    meta: ProjectMeta,
    records: RecordDir,
    issues: Vec<Issue>,
    releases: Vec<Release>,
}

impl Project {
    /// Initialize a new project at `root`.
    ///
    /// Writes the root marker and creates the storage folder. An existing
    /// storage folder is reused and its project record left untouched.
    pub fn init(root: &Path, config: RootConfig, project_name: &str) -> Result<Self> {
        let marker = root.join(CONFIG_FILE);
        if marker.exists() {
            return Err(Error::AlreadyInitialized(root.to_path_buf()));
        }
        config.validate()?;

        let records = RecordDir::new(root.join(&config.folder));
        fs::create_dir_all(records.path())?;
        if !records.meta_path().exists() {
            records.write_meta(&ProjectMeta::new(project_name.to_string()))?;
            tracing::debug!(dir = %records.path().display(), "created project record");
        }
        config.save(&marker)?;

        Self::load(root)
    }

    /// Open the project enclosing `start`, searching upward for the marker.
    pub fn open(start: &Path) -> Result<Self> {
        let root = find_project_root(start)?;
        Self::load(&root)
    }

    /// Load the project rooted exactly at `root`.
    pub fn load(root: &Path) -> Result<Self> {
        let marker = root.join(CONFIG_FILE);
        if !marker.is_file() {
            return Err(Error::ProjectNotFound(root.to_path_buf()));
        }
        let config = RootConfig::load(&marker)?;
        let records = RecordDir::new(root.join(&config.folder));
        let meta = records.read_meta()?;
        let scanned = records.scan()?;

        let mut project = Self {
            root: root.to_path_buf(),
            config,
            meta,
            records,
            issues: scanned.issues,
            releases: scanned.releases,
        };
        project
            .releases
            .sort_by(|a, b| a.name().cmp(b.name()).then(a.guid().cmp(&b.guid())));
        project.refresh_names();

        tracing::debug!(
            root = %project.root.display(),
            issues = project.issues.len(),
            releases = project.releases.len(),
            "loaded project"
        );
        Ok(project)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &RootConfig {
        &self.config
    }

    pub fn meta(&self) -> &ProjectMeta {
        &self.meta
    }

    /// Directory holding the record files.
    pub fn storage_dir(&self) -> &Path {
        self.records.path()
    }

    /// Identity string stamped on attribute changes.
    pub fn user_string(&self) -> String {
        self.config.user_string()
    }

    /// Issues in creation order.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn releases(&self) -> &[Release] {
        &self.releases
    }

    pub fn components(&self) -> &[String] {
        &self.meta.components
    }

    // === Issue operations ===

    /// Add a new, empty issue. It is not persisted until saved.
    pub fn create_issue(&mut self) -> Uuid {
        let guid = self.fresh_guid();
        self.issues.push(Issue::new(guid));
        self.refresh_names();
        guid
    }

    pub fn issue(&self, guid: Uuid) -> Option<&Issue> {
        self.issues.iter().find(|i| i.guid() == guid)
    }

    /// Look up an issue by display name.
    pub fn get_issue(&self, name: &str) -> Option<&Issue> {
        self.issues.iter().find(|i| i.name() == name)
    }

    /// Resolve a display name, failing with a validation error.
    pub fn find_issue(&self, name: &str) -> Result<&Issue> {
        self.get_issue(name)
            .ok_or_else(|| Error::Validation(format!("No issue named: {}", name)))
    }

    /// Whether `name` is taken by any issue, pinned or local.
    pub fn is_issue_name(&self, name: &str) -> bool {
        self.issues
            .iter()
            .any(|i| i.name() == name || i.master_name() == Some(name))
    }

    /// Validate and append attribute changes to an issue.
    ///
    /// Every value is checked before anything is appended, so a rejected
    /// value leaves the issue untouched.
    pub fn set_issue_values(&mut self, guid: Uuid, values: &[(&str, &str)]) -> Result<()> {
        if self.issue(guid).is_none() {
            return Err(Error::Validation(format!("No issue with GUID {}", guid)));
        }
        let mut validated = Vec::with_capacity(values.len());
        for (key, raw) in values {
            let value = Validator::for_key(key).validate(raw, &*self)?;
            validated.push((*key, value));
        }

        let user = self.user_string();
        if let Some(issue) = self.issues.iter_mut().find(|i| i.guid() == guid) {
            for (key, value) in validated {
                issue.set(key, value, &user);
            }
        }
        self.refresh_names();
        Ok(())
    }

    /// Persist an issue's full log, replacing its record file.
    pub fn save_issue(&self, guid: Uuid) -> Result<()> {
        let issue = self
            .issue(guid)
            .ok_or_else(|| Error::Validation(format!("No issue with GUID {}", guid)))?;
        self.records.write_issue(issue)
    }

    /// Delete an issue's record and drop it from the collection.
    ///
    /// A record file that is already gone is not an error. The issue leaves
    /// the collection even when deleting the file fails.
    pub fn remove_issue(&mut self, guid: Uuid) -> Result<()> {
        let deleted = self.records.delete_issue(guid);
        self.issues.retain(|i| i.guid() != guid);
        self.refresh_names();

        match deleted {
            Ok(existed) => {
                tracing::debug!(%guid, existed, "removed issue");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    // === Release operations ===

    /// Add a new, empty release. It is not persisted until saved.
    pub fn create_release(&mut self) -> Uuid {
        let guid = self.fresh_guid();
        self.releases.push(Release::new(guid));
        guid
    }

    pub fn release(&self, guid: Uuid) -> Option<&Release> {
        self.releases.iter().find(|r| r.guid() == guid)
    }

    /// Look up a release whose name contains `partial`.
    ///
    /// An exact name match is preferred over a partial one. Blank text
    /// matches nothing.
    pub fn get_release(&self, partial: &str) -> Option<&Release> {
        if partial.trim().is_empty() {
            return None;
        }
        self.releases
            .iter()
            .find(|r| r.name() == partial)
            .or_else(|| self.releases.iter().find(|r| r.name().contains(partial)))
    }

    /// Resolve a (possibly partial) release name, failing with a validation error.
    pub fn find_release(&self, partial: &str) -> Result<&Release> {
        self.get_release(partial)
            .ok_or_else(|| Error::Validation(format!("No release matching: {}", partial)))
    }

    /// Overwrite release attributes. The name is checked for uniqueness.
    pub fn set_release_values(&mut self, guid: Uuid, values: &[(&str, &str)]) -> Result<()> {
        let current = self
            .release(guid)
            .ok_or_else(|| Error::Validation(format!("No release with GUID {}", guid)))?
            .name()
            .to_string();

        let mut validated = Vec::with_capacity(values.len());
        for (key, raw) in values {
            let value = if *key == "name" && (current.is_empty() || *raw != current) {
                Validator::NewRelease.validate(raw, &*self)?
            } else {
                raw.to_string()
            };
            validated.push((*key, value));
        }

        if let Some(release) = self.releases.iter_mut().find(|r| r.guid() == guid) {
            for (key, value) in validated {
                release.set(key, value);
            }
        }
        Ok(())
    }

    /// Persist a release's full map, replacing its record file.
    pub fn save_release(&self, guid: Uuid) -> Result<()> {
        let release = self
            .release(guid)
            .ok_or_else(|| Error::Validation(format!("No release with GUID {}", guid)))?;
        self.records.write_release(release)
    }

    /// Delete a release's record and drop it from the collection.
    ///
    /// Issues still naming the release read it back as blank.
    pub fn remove_release(&mut self, guid: Uuid) -> Result<()> {
        let deleted = self.records.delete_release(guid);
        self.releases.retain(|r| r.guid() != guid);
        deleted.map(|existed| tracing::debug!(%guid, existed, "removed release"))
    }

    /// Issues assigned to `release_name`; blank selects unassigned issues.
    pub fn release_issues(&self, release_name: &str) -> Vec<&Issue> {
        self.issues
            .iter()
            .filter(|i| i.release(self) == release_name)
            .collect()
    }

    /// Work statistics for a release, optionally for a single owner.
    pub fn release_statistics(&self, release_name: &str, owner: Option<&str>) -> ReleaseStatistics {
        ReleaseStatistics::from_issues(self.release_issues(release_name), owner)
    }

    /// Distinct non-blank owners of a release's issues.
    pub fn release_owners(&self, release_name: &str) -> BTreeSet<String> {
        owners(self.release_issues(release_name))
    }

    // === Project metadata ===

    /// Add a component to the allowed set. Persist with [`Project::save_meta`].
    pub fn add_component(&mut self, name: &str) -> Result<String> {
        let name = Validator::NewComponent.validate(name, &*self)?;
        self.meta.components.push(name.clone());
        self.refresh_names();
        Ok(name)
    }

    /// Persist the project metadata record.
    pub fn save_meta(&self) -> Result<()> {
        self.records.write_meta(&self.meta)
    }

    /// Reorder issues by creation time and recompute display names.
    ///
    /// Issues with an empty log have no creation time yet and sort last.
    pub fn refresh_names(&mut self) {
        self.issues
            .sort_by_key(|i| i.created_at().unwrap_or(DateTime::<Utc>::MAX_UTC));
        let names = compute_names(&self.issues, &*self);
        for (issue, name) in self.issues.iter_mut().zip(names) {
            issue.set_name(name);
        }
    }

    /// A v4 GUID not used by any loaded entity.
    fn fresh_guid(&self) -> Uuid {
        loop {
            let guid = Uuid::new_v4();
            if self.issue(guid).is_none() && self.release(guid).is_none() {
                return guid;
            }
            tracing::warn!(%guid, "GUID collision, regenerating");
        }
    }
}

impl Catalog for Project {
    fn has_component(&self, name: &str) -> bool {
        self.meta.has_component(name)
    }

    fn has_release(&self, name: &str) -> bool {
        !name.is_empty() && self.releases.iter().any(|r| r.name() == name)
    }

    fn find_release(&self, partial: &str) -> Option<&str> {
        self.get_release(partial).map(Release::name)
    }
}

/// Find the nearest ancestor of `start` (inclusive) holding the root marker.
pub fn find_project_root(start: &Path) -> Result<PathBuf> {
    let start = start
        .canonicalize()
        .map_err(|_| Error::ProjectNotFound(start.to_path_buf()))?;

    let mut dir = Some(start.as_path());
    while let Some(current) = dir {
        if current.join(CONFIG_FILE).is_file() {
            return Ok(current.to_path_buf());
        }
        dir = current.parent();
    }

    Err(Error::ProjectNotFound(start))
}
