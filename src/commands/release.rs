//! Release, component, and naming commands.

use serde::Serialize;

use super::{IssueSummary, Output, to_json_string};
use crate::Result;
use crate::models::ReleaseStatistics;
use crate::storage::{MasterNameGrant, Project};

fn format_statistics(stats: &ReleaseStatistics) -> String {
    format!(
        "estimated {:.2}h done / {:.2}h left, actual {:.2}h done / {:.2}h projected",
        stats.estimated_done, stats.estimated_undone, stats.actual_done, stats.actual_undone
    )
}

// === Components ===

#[derive(Serialize)]
pub struct ComponentList {
    pub components: Vec<String>,
}

impl Output for ComponentList {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        if self.components.is_empty() {
            "No components.".to_string()
        } else {
            self.components.join("\n")
        }
    }
}

/// Add a component to the project and save the project record.
pub fn component_add(project: &mut Project, name: &str) -> Result<ComponentList> {
    project.add_component(name)?;
    project.save_meta()?;
    Ok(component_list(project))
}

pub fn component_list(project: &Project) -> ComponentList {
    ComponentList {
        components: project.components().to_vec(),
    }
}

// === Releases ===

#[derive(Serialize)]
pub struct ReleaseInfo {
    pub guid: String,
    pub name: String,
    pub description: String,
    pub issues: usize,
    pub statistics: ReleaseStatistics,
}

impl Output for ReleaseInfo {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        let mut line = format!("{} ({} issues)", self.name, self.issues);
        if !self.description.is_empty() {
            line.push_str(&format!(" - {}", self.description));
        }
        line
    }
}

fn release_info(project: &Project, guid: uuid::Uuid) -> Option<ReleaseInfo> {
    let release = project.release(guid)?;
    Some(ReleaseInfo {
        guid: guid.to_string(),
        name: release.name().to_string(),
        description: release.description().to_string(),
        issues: project.release_issues(release.name()).len(),
        statistics: project.release_statistics(release.name(), None),
    })
}

/// Create and save a release. The name must not be in use.
pub fn release_add(project: &mut Project, name: &str, description: &str) -> Result<ReleaseInfo> {
    let guid = project.create_release();
    if let Err(e) = project.set_release_values(guid, &[("name", name), ("description", description)]) {
        project.remove_release(guid)?;
        return Err(e);
    }
    project.save_release(guid)?;

    release_info(project, guid)
        .ok_or_else(|| crate::Error::Validation(format!("No release with GUID {}", guid)))
}

/// Delete a release. Issues that referenced it read back as unassigned.
pub fn release_remove(project: &mut Project, name: &str) -> Result<ReleaseInfo> {
    let guid = project.find_release(name)?.guid();
    let info = release_info(project, guid)
        .ok_or_else(|| crate::Error::Validation(format!("No release matching: {}", name)))?;
    project.remove_release(guid)?;
    Ok(info)
}

#[derive(Serialize)]
pub struct ReleaseList {
    pub releases: Vec<ReleaseInfo>,
}

impl Output for ReleaseList {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        if self.releases.is_empty() {
            return "No releases.".to_string();
        }
        self.releases
            .iter()
            .map(|r| format!("{}\n  {}", r.to_human(), format_statistics(&r.statistics)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// All releases, sorted by name, with their statistics.
pub fn release_list(project: &Project) -> ReleaseList {
    ReleaseList {
        releases: project
            .releases()
            .iter()
            .filter_map(|r| release_info(project, r.guid()))
            .collect(),
    }
}

// === Summary ===

#[derive(Serialize)]
pub struct OwnerStatistics {
    pub owner: String,
    pub statistics: ReleaseStatistics,
}

#[derive(Serialize)]
pub struct ReleaseSummary {
    /// Full release name; blank for unassigned issues
    pub release: String,
    pub description: String,
    pub issues: Vec<IssueSummary>,
    pub statistics: ReleaseStatistics,
    pub owners: Vec<OwnerStatistics>,
}

impl Output for ReleaseSummary {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        let title = if self.release.is_empty() {
            "Unassigned issues".to_string()
        } else {
            format!("Release {}", self.release)
        };
        let mut lines = vec![title];
        if !self.description.is_empty() {
            lines.push(format!("  {}", self.description));
        }
        lines.push(format!("  {}", format_statistics(&self.statistics)));

        lines.push(String::new());
        if self.issues.is_empty() {
            lines.push("No issues.".to_string());
        }
        lines.extend(self.issues.iter().map(IssueSummary::line));

        if !self.owners.is_empty() {
            lines.push(String::new());
            lines.push("By owner:".to_string());
            for owner in &self.owners {
                lines.push(format!("  {}: {}", owner.owner, format_statistics(&owner.statistics)));
            }
        }
        lines.join("\n")
    }
}

/// Issues, statistics, and per-owner breakdown for a release.
///
/// A blank `release` summarizes the unassigned issues.
pub fn release_summary(project: &Project, release: &str) -> Result<ReleaseSummary> {
    let (name, description) = if release.is_empty() {
        (String::new(), String::new())
    } else {
        let found = project.find_release(release)?;
        (found.name().to_string(), found.description().to_string())
    };

    let owners = project
        .release_owners(&name)
        .into_iter()
        .map(|owner| OwnerStatistics {
            statistics: project.release_statistics(&name, Some(&owner)),
            owner,
        })
        .collect();

    Ok(ReleaseSummary {
        issues: project
            .release_issues(&name)
            .into_iter()
            .map(|issue| IssueSummary::new(issue, project))
            .collect(),
        statistics: project.release_statistics(&name, None),
        owners,
        release: name,
        description,
    })
}

// === Master names ===

#[derive(Serialize)]
pub struct MasterNames {
    pub server: String,
    pub granted: Vec<MasterNameGrant>,
}

impl Output for MasterNames {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        if self.granted.is_empty() {
            return format!("All issues already have master names ({}).", self.server);
        }
        let mut lines = vec![format!("Granted {} name(s) from {}:", self.granted.len(), self.server)];
        for grant in &self.granted {
            lines.push(format!("  {} -> {}", grant.guid, grant.name));
        }
        lines.join("\n")
    }
}

/// Pin master names on every issue lacking one.
pub fn master_names(project: &mut Project) -> Result<MasterNames> {
    let server = project.master_server_identity()?;
    let granted = project.assign_master_names()?;
    Ok(MasterNames { server, granted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{NewIssue, issue_add, issue_close};
    use crate::test_utils::TestEnv;

    fn add(project: &mut Project, title: &str, release: &str, estimate: &str, owner: &str) {
        issue_add(
            project,
            NewIssue {
                title: title.to_string(),
                release: Some(release.to_string()),
                estimate: Some(estimate.to_string()),
                owner: Some(owner.to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    }

    #[test]
    fn test_component_add_persists() {
        let env = TestEnv::new();
        let mut project = env.init_project();
        let list = component_add(&mut project, " backend ").unwrap();
        assert_eq!(list.components, vec!["backend".to_string()]);
        assert!(component_add(&mut project, "").is_err());

        assert_eq!(component_list(&env.open_project()).components.len(), 1);
    }

    #[test]
    fn test_release_add_and_list_sorted() {
        let env = TestEnv::new();
        let mut project = env.init_project();
        release_add(&mut project, "2.0", "Later").unwrap();
        release_add(&mut project, "1.0", "First").unwrap();
        assert!(release_add(&mut project, "1.0", "Again").is_err());
        assert_eq!(project.releases().len(), 2);

        let names: Vec<String> = release_list(&env.open_project())
            .releases
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["1.0", "2.0"]);
    }

    #[test]
    fn test_release_remove_unassigns_issues() {
        let env = TestEnv::new();
        let mut project = env.init_project();
        release_add(&mut project, "1.0", "").unwrap();
        add(&mut project, "a", "1.0", "1", "alice");

        let removed = release_remove(&mut project, "1.0").unwrap();
        assert_eq!(removed.issues, 1);

        let project = env.open_project();
        assert!(project.releases().is_empty());
        assert_eq!(release_summary(&project, "").unwrap().issues.len(), 1);
    }

    #[test]
    fn test_release_blank_name_rejected() {
        let env = TestEnv::new();
        let mut project = env.init_project();
        assert!(release_add(&mut project, "", "").is_err());
        assert!(project.releases().is_empty());

        release_add(&mut project, "1.0", "").unwrap();
        assert!(release_remove(&mut project, "").is_err());
        assert_eq!(env.open_project().releases().len(), 1);
    }

    #[test]
    fn test_release_summary_per_owner() {
        let env = TestEnv::new();
        let mut project = env.init_project();
        release_add(&mut project, "1.0", "First cut").unwrap();
        add(&mut project, "a", "1.0", "2", "alice");
        add(&mut project, "b", "1.0", "3", "bob");
        add(&mut project, "c", "1.0", "1", "alice");
        issue_close(&mut project, "1", Some("4")).unwrap();

        let summary = release_summary(&project, "1.0").unwrap();
        assert_eq!(summary.release, "1.0");
        assert_eq!(summary.description, "First cut");
        assert_eq!(summary.issues.len(), 3);
        assert_eq!(summary.statistics.as_tuple(), (2.0, 4.0, 4.0, 8.0));

        assert_eq!(summary.owners.len(), 2);
        assert_eq!(summary.owners[0].owner, "alice");
        assert_eq!(summary.owners[0].statistics.as_tuple(), (2.0, 1.0, 4.0, 2.0));
        assert_eq!(summary.owners[1].owner, "bob");
        assert_eq!(summary.owners[1].statistics.as_tuple(), (0.0, 3.0, 0.0, 3.0));

        assert!(summary.to_human().contains("By owner:"));
    }

    #[test]
    fn test_release_summary_unknown_release() {
        let env = TestEnv::new();
        let project = env.init_project();
        assert!(release_summary(&project, "9.9").is_err());
    }

    #[test]
    fn test_master_names_command() {
        let env = TestEnv::new();
        let mut project = env.init_master_project();
        issue_add(
            &mut project,
            NewIssue {
                title: "a".to_string(),
                ..Default::default()
            },
        )
        .unwrap();

        let result = master_names(&mut project).unwrap();
        assert_eq!(result.server, "central");
        assert_eq!(result.granted.len(), 1);
        assert_eq!(result.granted[0].name, "ditto1");

        let json: serde_json::Value = serde_json::from_str(&result.to_json()).unwrap();
        assert_eq!(json["granted"][0]["name"], "ditto1");
    }
}
