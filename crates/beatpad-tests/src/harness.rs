//! Test harness utilities for running CLI commands and reading their output.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::OnceLock;
use tempfile::TempDir;

/// Result of running the beatpad CLI.
#[derive(Debug)]
pub struct CliResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CliResult {
    /// Create a CliResult from a Command Output.
    pub fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    /// Assert that the command succeeded.
    pub fn assert_success(&self) {
        assert!(
            self.success,
            "Command failed with exit code {}.\nstdout: {}\nstderr: {}",
            self.exit_code, self.stdout, self.stderr
        );
    }

    /// Assert that the command failed.
    pub fn assert_failure(&self) {
        assert!(
            !self.success,
            "Expected command to fail, but it succeeded.\nstdout: {}",
            self.stdout
        );
    }

    /// Parse stdout as a `--json` document.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout).unwrap_or_else(|e| {
            panic!(
                "stdout is not JSON ({}).\nstdout: {}\nstderr: {}",
                e, self.stdout, self.stderr
            )
        })
    }
}

/// A test harness for running beatpad CLI commands.
pub struct TestHarness {
    /// Working directory for test inputs.
    pub work_dir: TempDir,
}

impl TestHarness {
    /// Create a new test harness.
    pub fn new() -> Self {
        Self {
            work_dir: TempDir::new().expect("Failed to create work dir"),
        }
    }

    /// Get the working directory path.
    pub fn path(&self) -> &Path {
        self.work_dir.path()
    }

    /// Run the beatpad CLI with the given arguments.
    pub fn run_cli(&self, args: &[&str]) -> CliResult {
        let manifest_path = beatpad_manifest_path();

        let output = Command::new("cargo")
            .args(["run", "--quiet", "--manifest-path"])
            .arg(&manifest_path)
            .args(["-p", "beatpad-cli", "--"])
            .args(args)
            .current_dir(self.path())
            .output();

        match output {
            Ok(out) => CliResult::from_output(out),
            Err(e) => CliResult {
                success: false,
                exit_code: -1,
                stdout: String::new(),
                stderr: format!("Failed to run CLI: {}", e),
            },
        }
    }

    /// Validate a config file using the CLI.
    pub fn validate_config(&self, config_path: &Path) -> CliResult {
        self.run_cli(&["validate", "--config", path_str(config_path), "--json"])
    }

    /// Blend one position with JSON output.
    pub fn blend(&self, corners: &Path, x: f64, y: f64) -> CliResult {
        let x = x.to_string();
        let y = y.to_string();
        self.run_cli(&[
            "blend",
            "--corners",
            path_str(corners),
            "-x",
            &x,
            "-y",
            &y,
            "--json",
        ])
    }

    /// Warm the grid with JSON output.
    pub fn grid(&self, corners: &Path, config: Option<&Path>) -> CliResult {
        let mut args = vec!["grid", "--corners", path_str(corners), "--json"];
        if let Some(config) = config {
            args.extend(["--config", path_str(config)]);
        }
        self.run_cli(&args)
    }

    /// Precompute path playback with JSON output.
    pub fn path_playback(&self, corners: &Path, path: &Path, steps: usize) -> CliResult {
        let steps = steps.to_string();
        self.run_cli(&[
            "path",
            "--corners",
            path_str(corners),
            "--path",
            path_str(path),
            "--steps",
            &steps,
            "--json",
        ])
    }
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("test paths are UTF-8")
}

fn beatpad_manifest_path() -> PathBuf {
    static PATH: OnceLock<PathBuf> = OnceLock::new();
    PATH.get_or_init(|| {
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let manifest_path = manifest_dir.join("..").join("..").join("Cargo.toml");
        manifest_path.canonicalize().unwrap_or(manifest_path)
    })
    .clone()
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harness_creation() {
        let harness = TestHarness::new();
        assert!(harness.path().exists());
    }

    #[test]
    fn test_manifest_path_points_at_workspace() {
        assert!(beatpad_manifest_path().ends_with("Cargo.toml"));
    }
}
