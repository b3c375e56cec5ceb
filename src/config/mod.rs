//! Root configuration for ditto projects.
//!
//! A project is identified by the `.ditto.kdl` marker file at its root. The
//! marker names the storage subfolder and the identity of the acting user:
//!
//! - `folder` - Storage subfolder holding `project.json` and the record files
//! - `username`, `name`, `email` - Stamped on every issue attribute change
//! - `is-master-name-server`, `master-name-server` - Master naming mode
//! - `action-log`, `action-log-path` - Per-command action log
//!
//! ## Precedence
//!
//! The project root is taken from `--root` > `DITTO_ROOT` > the nearest
//! ancestor of the working directory containing the marker file.

pub mod schema;

pub use schema::RootConfig;

/// File name of the root marker.
pub const CONFIG_FILE: &str = ".ditto.kdl";
