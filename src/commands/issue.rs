//! Issue commands.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{IssueSummary, Output, to_json_string};
use crate::Result;
use crate::cli::ListFilter;
use crate::models::{AttributeRecord, IssueState};
use crate::storage::Project;

/// Fields for a new issue. Optional fields are left unset when `None`.
#[derive(Debug, Default)]
pub struct NewIssue {
    pub title: String,
    pub description: Option<String>,
    pub estimate: Option<String>,
    pub component: Option<String>,
    pub release: Option<String>,
    pub owner: Option<String>,
}

/// File a new open issue and save it.
pub fn issue_add(project: &mut Project, new: NewIssue) -> Result<IssueSummary> {
    let mut values: Vec<(&str, &str)> = vec![
        ("title", new.title.as_str()),
        ("description", new.description.as_deref().unwrap_or("")),
        ("estimate", new.estimate.as_deref().unwrap_or("0")),
        ("state", IssueState::Open.as_str()),
    ];
    if let Some(ref component) = new.component {
        values.push(("component", component.as_str()));
    }
    if let Some(ref release) = new.release {
        values.push(("release", release.as_str()));
    }
    if let Some(ref owner) = new.owner {
        values.push(("owner", owner.as_str()));
    }

    let guid = project.create_issue();
    if let Err(e) = project.set_issue_values(guid, &values) {
        // Never saved, so only the in-memory copy needs dropping
        project.remove_issue(guid)?;
        return Err(e);
    }
    project.save_issue(guid)?;

    issue_summary(project, guid)
}

#[derive(Serialize)]
pub struct IssueRemoved {
    pub name: String,
    pub guid: String,
    pub title: String,
}

impl Output for IssueRemoved {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        format!("Removed {} \"{}\"", self.name, self.title)
    }
}

/// Delete an issue and its record.
pub fn issue_remove(project: &mut Project, name: &str) -> Result<IssueRemoved> {
    let issue = project.find_issue(name)?;
    let removed = IssueRemoved {
        name: issue.name().to_string(),
        guid: issue.guid().to_string(),
        title: issue.title().to_string(),
    };
    let guid = issue.guid();
    project.remove_issue(guid)?;
    Ok(removed)
}

/// Validate and record attribute changes on an issue, then save it.
///
/// The returned summary carries the issue's name after the change, which
/// differs from `name` when its component moved.
pub fn issue_set(project: &mut Project, name: &str, values: &[(&str, &str)]) -> Result<IssueSummary> {
    let guid = project.find_issue(name)?.guid();
    project.set_issue_values(guid, values)?;
    project.save_issue(guid)?;
    issue_summary(project, guid)
}

/// Close an issue, recording the actual time when given.
pub fn issue_close(project: &mut Project, name: &str, actual: Option<&str>) -> Result<IssueSummary> {
    let mut values = vec![("state", IssueState::Closed.as_str())];
    if let Some(actual) = actual {
        values.push(("actual", actual));
    }
    issue_set(project, name, &values)
}

/// Reopen an issue.
pub fn issue_open(project: &mut Project, name: &str) -> Result<IssueSummary> {
    issue_set(project, name, &[("state", IssueState::Open.as_str())])
}

fn issue_summary(project: &Project, guid: uuid::Uuid) -> Result<IssueSummary> {
    project
        .issue(guid)
        .map(|issue| IssueSummary::new(issue, project))
        .ok_or_else(|| crate::Error::Validation(format!("No issue with GUID {}", guid)))
}

// === Show ===

#[derive(Serialize)]
pub struct IssueDetail {
    #[serde(flatten)]
    pub summary: IssueSummary,
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
    pub history: Vec<AttributeRecord>,
}

impl Output for IssueDetail {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        let s = &self.summary;
        let mut lines = vec![
            format!("{} [{}] {}", s.name, s.state, s.title),
            format!("  GUID:      {}", s.guid),
            format!("  Component: {}", s.component),
            format!("  Release:   {}", s.release),
            format!("  Owner:     {}", s.owner),
            format!("  Estimate:  {}", s.estimate),
            format!("  Actual:    {}", s.actual),
        ];
        if !self.description.is_empty() {
            lines.push(String::new());
            lines.push(self.description.clone());
        }

        lines.push(String::new());
        lines.push(format!("History ({} changes):", self.history.len()));
        for record in &self.history {
            lines.push(format!(
                "  {} {} {} = {}",
                record.timestamp.format("%Y-%m-%d %H:%M"),
                record.user,
                record.key,
                record.value
            ));
        }
        lines.join("\n")
    }
}

/// Current values plus the full change history of an issue.
pub fn issue_show(project: &Project, name: &str) -> Result<IssueDetail> {
    let issue = project.find_issue(name)?;
    Ok(IssueDetail {
        summary: IssueSummary::new(issue, project),
        description: issue.description().to_string(),
        created_at: issue.created_at(),
        history: issue.log().records().to_vec(),
    })
}

// === List ===

#[derive(Serialize)]
pub struct IssueList {
    pub issues: Vec<IssueSummary>,
    pub count: usize,
}

impl Output for IssueList {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        if self.issues.is_empty() {
            return "No issues found.".to_string();
        }
        let mut lines: Vec<String> = self.issues.iter().map(IssueSummary::line).collect();
        lines.push(format!("{} issue(s)", self.count));
        lines.join("\n")
    }
}

/// List issues in creation order.
///
/// `release` narrows to one release; a blank release selects unassigned issues.
pub fn issue_list(project: &Project, filter: ListFilter, release: Option<&str>) -> Result<IssueList> {
    let release = match release {
        Some("") => Some(""),
        Some(partial) => Some(project.find_release(partial)?.name()),
        None => None,
    };

    let issues: Vec<IssueSummary> = project
        .issues()
        .iter()
        .filter(|issue| match filter {
            ListFilter::All => true,
            ListFilter::Open => issue.state() == IssueState::Open,
            ListFilter::Closed => issue.state() == IssueState::Closed,
        })
        .filter(|issue| release.is_none_or(|r| issue.release(project) == r))
        .map(|issue| IssueSummary::new(issue, project))
        .collect();

    Ok(IssueList {
        count: issues.len(),
        issues,
    })
}
