//! Ditto - A file-backed issue and release tracker.
//!
//! This library provides the core functionality for the `ditto` CLI tool:
//! issues with an append-only attribute history, releases, per-component
//! local naming, optional master name arbitration, and release statistics.

pub mod action_log;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod storage;

use std::path::PathBuf;


/// Library-level error type for ditto operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("No ditto project found at or above {}", .0.display())]
    ProjectNotFound(PathBuf),

    #[error("Already initialized: {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("Malformed record {}: {reason}", path.display())]
    MalformedRecord { path: PathBuf, reason: String },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Misconfigured: {0}")]
    Misconfigured(String),
}

/// Result type alias for ditto operations.
pub type Result<T> = std::result::Result<T, Error>;
