//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing, including:
//! - Test environment setup with temporary config files
//! - Command builder helpers for common patterns
//! - Test data fixtures

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The logging section used throughout the CLI tests.
#[allow(dead_code)]
pub const LOG_YAML: &str = "\
log:
  filename: logs/latest.log
  compress: true
  level: info
  max:
    size: 50
    backups: 5
";

/// Test environment with an isolated directory for config files.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the temporary directory
    pub temp_path: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();

        Self {
            temp_dir,
            temp_path,
        }
    }

    /// Get a command builder for the keytree binary.
    ///
    /// Environment variables that would change parsing defaults are
    /// cleared so the host environment cannot leak into a test.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("keytree").expect("Failed to find keytree binary");
        cmd.env_remove("KEYTREE_DELIMITER")
            .env_remove("KEYTREE_OUTPUT_FORMAT")
            .env_remove("KEYTREE_LOG_MODE");
        cmd
    }

    /// Get a command builder with [`LOG_YAML`] loaded as a config file.
    pub fn command_with_log_config(&self) -> Command {
        let path = self.write_config("log.yaml", LOG_YAML);
        let mut cmd = self.command();
        cmd.arg("--file").arg(path);
        cmd
    }

    /// Get the temp path.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Write a config file into the test environment and return its path.
    pub fn write_config(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_path.join(name);
        std::fs::write(&path, contents).expect("Failed to write config file");
        path
    }
}
