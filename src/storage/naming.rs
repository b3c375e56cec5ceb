//! Display names for issues.
//!
//! Two addressing modes:
//!
//! - **Local**: issues are grouped by the first two characters of their
//!   component and numbered from 1 in creation order (`ba1`, `ba2`, ...).
//!   These names are recomputed on every load and shift when earlier issues
//!   are removed or move to another component.
//! - **Master**: a project copy configured as the master naming server pins a
//!   permanent `ditto<N>` name into each issue's log. A pinned name always
//!   wins over the local one.

use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use super::Project;
use crate::models::{Catalog, Issue, MASTER_NAME_KEY, MASTER_NAME_SERVER_KEY};
use crate::{Error, Result};

/// Prefix of every master-granted name.
pub const MASTER_NAME_PREFIX: &str = "ditto";

/// Prefix shared by local names of issues in `component`.
pub fn local_prefix(component: &str) -> String {
    component.chars().take(2).collect()
}

/// Master name for a candidate ordinal.
pub fn master_name(ordinal: usize) -> String {
    format!("{}{}", MASTER_NAME_PREFIX, ordinal)
}

/// Compute the display name of every issue, in slice order.
///
/// `issues` must already be in creation order. Pinned issues still consume an
/// ordinal in their group so later local names do not depend on pinning.
///
/// Names are the prefix followed directly by the ordinal, so they stay unique
/// only while prefixes contain no digits. New components with a digit in
/// their first two characters are rejected when added.
pub fn compute_names(issues: &[Issue], catalog: &dyn Catalog) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    issues
        .iter()
        .map(|issue| {
            let prefix = local_prefix(issue.component(catalog));
            let count = counts.entry(prefix.clone()).or_insert(0);
            *count += 1;

            match issue.master_name() {
                Some(pinned) => pinned.to_string(),
                None => format!("{}{}", prefix, count),
            }
        })
        .collect()
}

/// A master name granted during arbitration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MasterNameGrant {
    pub guid: Uuid,
    pub name: String,
    pub server: String,
}

impl Project {
    /// The server identity to record with granted names.
    ///
    /// Fails with `NotAuthorized` if this copy is not the master naming
    /// server and `Misconfigured` if it is but has no identity configured.
    pub fn master_server_identity(&self) -> Result<String> {
        let config = self.config();
        if !config.is_master_name_server {
            return Err(Error::NotAuthorized(
                "this project is not configured as the master name server".to_string(),
            ));
        }
        match config.master_name_server.as_deref().map(str::trim) {
            Some(server) if !server.is_empty() => Ok(server.to_string()),
            _ => Err(Error::Misconfigured(
                "master name server is missing the 'master-name-server' setting".to_string(),
            )),
        }
    }

    /// Pin a master name on every issue that lacks one.
    ///
    /// Candidates start at the current issue count and move up past any
    /// name already in use. Each grant is written to the issue's log and
    /// saved before the next issue is considered.
    ///
    /// Uniqueness is only checked against names this process can see, so
    /// at most one process may run this against a project at a time.
    pub fn assign_master_names(&mut self) -> Result<Vec<MasterNameGrant>> {
        let server = self.master_server_identity()?;
        let user = self.user_string();
        let mut grants = Vec::new();

        for idx in 0..self.issues.len() {
            if self.issues[idx].master_name().is_some() {
                continue;
            }

            let mut ordinal = self.issues.len();
            while self.is_issue_name(&master_name(ordinal)) {
                ordinal += 1;
            }
            let name = master_name(ordinal);

            let issue = &mut self.issues[idx];
            issue.set(MASTER_NAME_KEY, &name, &user);
            issue.set(MASTER_NAME_SERVER_KEY, &server, &user);
            issue.set_name(name.clone());
            self.records.write_issue(&self.issues[idx])?;

            tracing::debug!(guid = %self.issues[idx].guid(), name = %name, "granted master name");
            grants.push(MasterNameGrant {
                guid: self.issues[idx].guid(),
                name,
                server: server.clone(),
            });
        }

        Ok(grants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttributeLog;
    use crate::models::validator::tests::FixedCatalog;
    use chrono::{Duration, TimeZone, Utc};

    fn issues_with_components(components: &[&str]) -> Vec<Issue> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        components
            .iter()
            .enumerate()
            .map(|(i, component)| {
                let mut log = AttributeLog::new();
                log.set_at("component", component, "tester", base + Duration::minutes(i as i64));
                Issue::with_log(Uuid::new_v4(), log)
            })
            .collect()
    }

    #[test]
    fn test_local_prefix() {
        assert_eq!(local_prefix("backend"), "ba");
        assert_eq!(local_prefix("x"), "x");
        assert_eq!(local_prefix(""), "");
        assert_eq!(local_prefix("ünicode"), "ün");
    }

    #[test]
    fn test_local_names_per_component() {
        let catalog = FixedCatalog::new(&["backend", "frontend"], &[]);
        let issues = issues_with_components(&["backend", "frontend", "backend"]);
        assert_eq!(compute_names(&issues, &catalog), vec!["ba1", "fr1", "ba2"]);
    }

    #[test]
    fn test_local_names_idempotent() {
        let catalog = FixedCatalog::new(&["backend"], &[]);
        let issues = issues_with_components(&["backend", "backend"]);
        assert_eq!(
            compute_names(&issues, &catalog),
            compute_names(&issues, &catalog)
        );
    }

    #[test]
    fn test_shared_prefix_stays_unique() {
        let catalog = FixedCatalog::new(&["backend", "batch"], &[]);
        let issues = issues_with_components(&["backend", "batch"]);
        assert_eq!(compute_names(&issues, &catalog), vec!["ba1", "ba2"]);
    }

    #[test]
    fn test_unknown_component_uses_blank_prefix() {
        let catalog = FixedCatalog::new(&[], &[]);
        let issues = issues_with_components(&["gone", "gone"]);
        assert_eq!(compute_names(&issues, &catalog), vec!["1", "2"]);
    }

    #[test]
    fn test_short_and_blank_prefixes_do_not_collide() {
        let catalog = FixedCatalog::new(&["a", "ab"], &[]);
        let mut components = vec![""; 11];
        components.extend(["a"; 11]);
        components.push("ab");
        let issues = issues_with_components(&components);

        let names = compute_names(&issues, &catalog);
        let unique: std::collections::HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        assert_eq!(names[10], "11");
        assert_eq!(names[21], "a11");
        assert_eq!(names[22], "ab1");
    }

    #[test]
    fn test_pinned_name_wins_and_keeps_ordinal() {
        let catalog = FixedCatalog::new(&["backend"], &[]);
        let mut issues = issues_with_components(&["backend", "backend"]);
        issues[0].set(MASTER_NAME_KEY, "ditto7", "tester");
        assert_eq!(compute_names(&issues, &catalog), vec!["ditto7", "ba2"]);
    }

    #[test]
    fn test_master_name_format() {
        assert_eq!(master_name(0), "ditto0");
        assert_eq!(master_name(12), "ditto12");
    }
}
