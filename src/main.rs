//! Ditto CLI - A file-backed issue and release tracker.

use clap::Parser;
use ditto::action_log;
use ditto::cli::{Cli, Commands};
use ditto::commands::{self, NewIssue, Output};
use ditto::config::RootConfig;
use ditto::storage::{Project, find_project_root};
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let human = cli.human_readable;
    let explicit_root = cli.root.clone();

    // Serialize command for logging
    let cmd_name = cli.command.name();
    let args_json = cli.command.args();

    let start = Instant::now();
    let result = run_command(cli.command, explicit_root.as_deref(), human);
    let duration = start.elapsed().as_millis() as u64;

    let (success, error) = match &result {
        Ok(_) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };

    // Only commands that ran against a project are logged
    if let Some(root) = log_root(explicit_root) {
        action_log::log_action(&root, cmd_name, args_json, success, error, duration);
    }

    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

/// Diagnostics go to stderr, filtered by DITTO_LOG (default: warn).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("DITTO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Project root for the action log, if there is one.
fn log_root(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        let cwd = env::current_dir().ok()?;
        find_project_root(&cwd).ok()
    })
}

/// Open the project at the explicit root, or search upward from the cwd.
///
/// Priority: --root flag > DITTO_ROOT env var > nearest ancestor with a marker
fn open_project(explicit: Option<&Path>) -> Result<Project, ditto::Error> {
    match explicit {
        Some(root) => Project::load(root),
        None => Project::open(&env::current_dir()?),
    }
}

fn run_command(command: Commands, root: Option<&Path>, human: bool) -> Result<(), ditto::Error> {
    match command {
        Commands::Init {
            project_name,
            folder,
            username,
            full_name,
            email,
            master_name_server,
        } => {
            let root = match root {
                Some(root) => root.to_path_buf(),
                None => env::current_dir()?,
            };
            let mut config = RootConfig::new(&folder, &username, &full_name, &email);
            if let Some(server) = master_name_server {
                config.is_master_name_server = true;
                config.master_name_server = Some(server);
            }
            let result = commands::init(&root, &project_name, config)?;
            output(&result, human);
        }

        Commands::Add {
            title,
            description,
            estimate,
            component,
            release,
            owner,
        } => {
            let mut project = open_project(root)?;
            let result = commands::issue_add(
                &mut project,
                NewIssue {
                    title,
                    description,
                    estimate,
                    component,
                    release,
                    owner,
                },
            )?;
            output(&result, human);
        }

        Commands::Remove { name } => {
            let mut project = open_project(root)?;
            let result = commands::issue_remove(&mut project, &name)?;
            output(&result, human);
        }

        Commands::Close { name, actual } => {
            let mut project = open_project(root)?;
            let result = commands::issue_close(&mut project, &name, actual.as_deref())?;
            output(&result, human);
        }

        Commands::Open { name } => {
            let mut project = open_project(root)?;
            let result = commands::issue_open(&mut project, &name)?;
            output(&result, human);
        }

        Commands::Estimate { name, estimate } => {
            let mut project = open_project(root)?;
            let result = commands::issue_set(&mut project, &name, &[("estimate", estimate.as_str())])?;
            output(&result, human);
        }

        Commands::Own { name, owner } => {
            let mut project = open_project(root)?;
            let result = commands::issue_set(&mut project, &name, &[("owner", owner.as_str())])?;
            output(&result, human);
        }

        Commands::Set { name, key, value } => {
            let mut project = open_project(root)?;
            let result = commands::issue_set(&mut project, &name, &[(key.as_str(), value.as_str())])?;
            output(&result, human);
        }

        Commands::AssignRelease { name, release } => {
            let mut project = open_project(root)?;
            let result = commands::issue_set(&mut project, &name, &[("release", release.as_str())])?;
            output(&result, human);
        }

        Commands::Show { name } => {
            let project = open_project(root)?;
            let result = commands::issue_show(&project, &name)?;
            output(&result, human);
        }

        Commands::List { filter, release } => {
            let project = open_project(root)?;
            let result = commands::issue_list(&project, filter, release.as_deref())?;
            output(&result, human);
        }

        Commands::AddComponent { name } => {
            let mut project = open_project(root)?;
            let result = commands::component_add(&mut project, &name)?;
            output(&result, human);
        }

        Commands::Components => {
            let project = open_project(root)?;
            output(&commands::component_list(&project), human);
        }

        Commands::AddRelease { name, description } => {
            let mut project = open_project(root)?;
            let result = commands::release_add(&mut project, &name, &description)?;
            output(&result, human);
        }

        Commands::RemoveRelease { name } => {
            let mut project = open_project(root)?;
            let result = commands::release_remove(&mut project, &name)?;
            output(&result, human);
        }

        Commands::Releases => {
            let project = open_project(root)?;
            output(&commands::release_list(&project), human);
        }

        Commands::ReleaseSummary { release } => {
            let project = open_project(root)?;
            let result = commands::release_summary(&project, &release)?;
            output(&result, human);
        }

        Commands::MasterNames => {
            let mut project = open_project(root)?;
            let result = commands::master_names(&mut project)?;
            output(&result, human);
        }
    }

    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
