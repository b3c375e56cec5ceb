//! CLI argument definitions for ditto.

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

/// Ditto - A file-backed issue and release tracker.
///
/// Start with `ditto init` in the project root, then `ditto add` to file issues.
#[derive(Parser, Debug)]
#[command(name = "ditto")]
#[command(author, version, about = "Track issues and releases in plain JSON files", long_about = None)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("DITTO_GIT_COMMIT"),
    ", built ",
    env!("DITTO_BUILD_TIMESTAMP"),
    ")"
))]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Use <path> as the project root instead of searching upward from the
    /// current directory. The path must contain the `.ditto.kdl` marker.
    /// Can also be set via DITTO_ROOT environment variable.
    #[arg(short = 'C', long = "root", global = true, env = "DITTO_ROOT")]
    pub root: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which issues `list` shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListFilter {
    /// Every issue
    #[default]
    #[value(alias = "a")]
    All,
    /// Open issues only
    #[value(alias = "o")]
    Open,
    /// Closed issues only
    #[value(alias = "c")]
    Closed,
}

/// Top-level commands
#[derive(Subcommand, Debug, Serialize)]
#[serde(untagged)]
pub enum Commands {
    /// Create a project in the current directory (or --root)
    Init {
        /// Project name
        project_name: String,

        /// Storage subfolder for the record files
        #[arg(long, default_value = "issues")]
        folder: String,

        /// Your short username
        #[arg(long, env = "DITTO_USERNAME")]
        username: String,

        /// Your full name
        #[arg(long = "full-name", env = "DITTO_NAME")]
        full_name: String,

        /// Your email address
        #[arg(long, env = "DITTO_EMAIL")]
        email: String,

        /// Make this copy the master name server, identified as <ID>
        #[arg(long = "master-name-server", value_name = "ID")]
        master_name_server: Option<String>,
    },

    /// File a new issue
    Add {
        /// Issue title
        title: String,

        /// Issue description
        #[arg(short, long)]
        description: Option<String>,

        /// Estimated hours
        #[arg(short, long)]
        estimate: Option<String>,

        /// Component (must already exist)
        #[arg(short, long)]
        component: Option<String>,

        /// Release (partial names allowed)
        #[arg(short, long)]
        release: Option<String>,

        /// Owner
        #[arg(short, long)]
        owner: Option<String>,
    },

    /// Delete an issue and its history
    Remove {
        /// Issue name (e.g., ba1, ditto12)
        name: String,
    },

    /// Close an issue, optionally recording the time spent
    Close {
        /// Issue name
        name: String,

        /// Actual time spent, as hours (2.5) or H:MM (2:30)
        #[arg(short, long)]
        actual: Option<String>,
    },

    /// Reopen a closed issue
    Open {
        /// Issue name
        name: String,
    },

    /// Set an issue's estimate
    Estimate {
        /// Issue name
        name: String,

        /// Estimated hours
        estimate: String,
    },

    /// Set an issue's owner
    Own {
        /// Issue name
        name: String,

        /// New owner
        owner: String,
    },

    /// Set any issue attribute
    Set {
        /// Issue name
        name: String,

        /// Attribute key (e.g., title, description, component)
        key: String,

        /// New value
        value: String,
    },

    /// Assign an issue to a release, or unassign it
    AssignRelease {
        /// Issue name
        name: String,

        /// Release (partial names allowed); omit to unassign
        #[arg(default_value = "")]
        release: String,
    },

    /// Show an issue with its full change history
    Show {
        /// Issue name
        name: String,
    },

    /// List issues
    List {
        /// Which issues to show (all, open, closed)
        #[arg(short, long, value_enum, default_value_t = ListFilter::All)]
        filter: ListFilter,

        /// Only issues in this release (partial names allowed; "" for unassigned)
        #[arg(short, long)]
        release: Option<String>,
    },

    /// Add a component
    AddComponent {
        /// Component name
        name: String,
    },

    /// List components
    Components,

    /// Add a release
    AddRelease {
        /// Release name
        name: String,

        /// Release description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Delete a release (its issues become unassigned)
    RemoveRelease {
        /// Release name (partial names allowed)
        name: String,
    },

    /// List releases with their statistics
    Releases,

    /// Summarize a release: issues, statistics, per-owner breakdown
    ReleaseSummary {
        /// Release name (partial names allowed); omit for unassigned issues
        #[arg(default_value = "")]
        release: String,
    },

    /// Grant permanent master names (master name server only)
    MasterNames,
}

impl Commands {
    /// Command name as used in the action log.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Init { .. } => "init",
            Commands::Add { .. } => "add",
            Commands::Remove { .. } => "remove",
            Commands::Close { .. } => "close",
            Commands::Open { .. } => "open",
            Commands::Estimate { .. } => "estimate",
            Commands::Own { .. } => "own",
            Commands::Set { .. } => "set",
            Commands::AssignRelease { .. } => "assign-release",
            Commands::Show { .. } => "show",
            Commands::List { .. } => "list",
            Commands::AddComponent { .. } => "add-component",
            Commands::Components => "components",
            Commands::AddRelease { .. } => "add-release",
            Commands::RemoveRelease { .. } => "remove-release",
            Commands::Releases => "releases",
            Commands::ReleaseSummary { .. } => "release-summary",
            Commands::MasterNames => "master-names",
        }
    }

    /// Command arguments as JSON, for the action log.
    pub fn args(&self) -> serde_json::Value {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Null) | Err(_) => serde_json::json!({}),
            Ok(value) => value,
        }
    }
}
