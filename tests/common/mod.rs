//! Common test utilities for ditto integration tests.
//!
//! Provides `TestEnv`, a throwaway project root that the `ditto` binary runs in.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with an isolated project root.
///
/// The `ditto()` method returns a `Command` running in the root with any
/// ditto environment variables from the outer shell cleared, making tests
/// parallel-safe.
pub struct TestEnv {
    pub root_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with an empty root.
    pub fn new() -> Self {
        Self {
            root_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a new test environment and initialize a project named `demo`.
    pub fn init() -> Self {
        let env = Self::new();
        env.ditto().args(init_args()).assert().success();
        env
    }

    /// Like [`TestEnv::init`], but as master name server `central`.
    pub fn init_master() -> Self {
        let env = Self::new();
        env.ditto()
            .args(init_args())
            .args(["--master-name-server", "central"])
            .assert()
            .success();
        env
    }

    /// Get a Command for the ditto binary running in the project root.
    pub fn ditto(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_ditto"));
        cmd.current_dir(self.root_dir.path());
        for var in ["DITTO_ROOT", "DITTO_USERNAME", "DITTO_NAME", "DITTO_EMAIL", "DITTO_LOG"] {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Run a command that must succeed and parse its JSON output.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.ditto().args(args).assert().success().get_output().stdout.clone();
        serde_json::from_slice(&output).unwrap()
    }

    /// Get the path to the project root.
    pub fn path(&self) -> &std::path::Path {
        self.root_dir.path()
    }

    /// Get the path to the storage folder.
    pub fn storage_path(&self) -> std::path::PathBuf {
        self.root_dir.path().join("issues")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Arguments for a non-interactive `ditto init`.
pub fn init_args() -> [&'static str; 8] {
    [
        "init",
        "demo",
        "--username",
        "tester",
        "--full-name",
        "Test User",
        "--email",
        "tester@example.com",
    ]
}
