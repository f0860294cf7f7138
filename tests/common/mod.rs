//! Shared helpers for the integration suite.

#![allow(dead_code)]

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A manifest resembling the real one, for the 9.0 images.
pub const MANIFEST_9_0: &str = r#"{
  "readme": "Versions are managed by update-dependencies.",
  "variables": {
    "base-url|9.0|nightly": "$(base-url|public|nightly)",
    "base-url|public|nightly": "https://dotnetcli.azureedge.net/dotnet",
    "dotnet|9.0|product-version": "$(runtime|9.0|product-version)",
    "runtime|9.0|build-version": "9.0.0",
    "runtime|9.0|product-version": "9.0.0",
    "runtime|9.0|linux|x64|sha": "0000",
    "runtime|9.0|linux|arm64|sha": "0000",
    "sdk|9.0|build-version": "9.0.100",
    "sdk|9.0|product-version": "9.0.100",
    "chisel|9.0|ref": "v1.0.0",
    "chisel|9.0|x64|url": "https://github.com/canonical/chisel/releases/download/v1.0.0/chisel_v1.0.0_linux_amd64.tar.gz",
    "chisel|9.0|x64|sha": "0000"
  }
}
"#;

/// A temporary directory holding a manifest and an (initially absent) config file.
pub struct TestProject {
    _temp_dir: TempDir, // Keep alive for RAII cleanup
    project_dir: PathBuf,
    config_path: PathBuf,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().join("project");
        fs::create_dir_all(&project_dir)?;
        let config_path = temp_dir.path().join("config.toml");

        Ok(Self {
            _temp_dir: temp_dir,
            project_dir,
            config_path,
        })
    }

    pub fn project_path(&self) -> &Path {
        &self.project_dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.project_dir.join("manifest.versions.json")
    }

    pub fn write_manifest(&self, content: &str) -> Result<()> {
        fs::write(self.manifest_path(), content).context("Failed to write manifest")
    }

    pub fn read_manifest(&self) -> Result<String> {
        fs::read_to_string(self.manifest_path()).context("Failed to read manifest")
    }

    pub fn write_config(&self, content: &str) -> Result<()> {
        fs::write(&self.config_path, content).context("Failed to write config")
    }

    /// Runs the binary in the project directory with an isolated config location.
    pub fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let binary = env!("CARGO_BIN_EXE_update-dependencies");
        let output = Command::new(binary)
            .args(args)
            .current_dir(&self.project_dir)
            .env("UPDATE_DEPS_CONFIG_PATH", &self.config_path)
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .output()
            .context("Failed to run update-dependencies")?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}

/// Command output helper
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        assert!(self.success, "Command failed with code {:?}\nStderr: {}", self.code, self.stderr);
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Expected stdout to contain '{text}'\nActual stdout: {}",
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Expected stderr to contain '{text}'\nActual stderr: {}",
            self.stderr
        );
        self
    }
}
