//! Work-progress statistics for releases.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{Issue, IssueState};
use crate::{Error, Result};

/// Estimated and actual effort totals for a set of issues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseStatistics {
    /// Sum of estimates over closed issues
    pub estimated_done: f64,
    /// Sum of estimates over issues that are not closed
    pub estimated_undone: f64,
    /// Sum of actual time over closed issues
    pub actual_done: f64,
    /// Projected remaining effort
    pub actual_undone: f64,
}

impl ReleaseStatistics {
    /// Aggregate over `issues`, keeping only those owned by `owner` when given.
    ///
    /// Remaining effort is extrapolated from the accuracy of completed work:
    /// `actual_done * estimated_undone / estimated_done`. With no completed
    /// estimate to learn from, the open estimates are taken at face value.
    pub fn from_issues<'a, I>(issues: I, owner: Option<&str>) -> Self
    where
        I: IntoIterator<Item = &'a Issue>,
    {
        let mut stats = Self::default();

        for issue in issues {
            if let Some(owner) = owner {
                if issue.owner() != owner {
                    continue;
                }
            }
            if issue.state() == IssueState::Closed {
                stats.estimated_done += issue.estimate();
                stats.actual_done += issue.actual();
            } else {
                stats.estimated_undone += issue.estimate();
            }
        }

        stats.actual_undone = if stats.estimated_done > 0.0 {
            stats.actual_done * (stats.estimated_undone / stats.estimated_done)
        } else {
            stats.estimated_undone
        };

        stats
    }

    /// `(estimated_done, estimated_undone, actual_done, actual_undone)`
    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (
            self.estimated_done,
            self.estimated_undone,
            self.actual_done,
            self.actual_undone,
        )
    }
}

/// Distinct non-blank owners across `issues`.
pub fn owners<'a, I>(issues: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a Issue>,
{
    issues
        .into_iter()
        .map(|issue| issue.owner())
        .filter(|owner| !owner.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Canonicalize an hours value.
///
/// Accepts decimal hours (`"2.25"`) or `H:MM` (`"1:30"`) and returns decimal
/// hours with three decimals (`"2.250"`, `"1.500"`).
pub fn normalize_hours(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let invalid = || Error::Validation(format!("Invalid time '{}': expected hours or H:MM", raw));

    let hours = match raw.split_once(':') {
        Some((h, m)) => {
            let h: u32 = h.parse().map_err(|_| invalid())?;
            if m.is_empty() || m.len() > 2 {
                return Err(invalid());
            }
            let m: u32 = m.parse().map_err(|_| invalid())?;
            if m >= 60 {
                return Err(invalid());
            }
            f64::from(h) + f64::from(m) / 60.0
        }
        None => {
            let value: f64 = raw.parse().map_err(|_| invalid())?;
            if !value.is_finite() || value < 0.0 {
                return Err(invalid());
            }
            value
        }
    };

    Ok(format!("{:.3}", hours))
}
