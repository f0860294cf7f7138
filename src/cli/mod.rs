//! Command-line interface for update-dependencies.
//!
//! # Available Commands
//!
//! - `specific` - Update a versions manifest for a given set of product versions
//! - `checksum` - Resolve the SHA-512 checksums of artifact URLs
//!
//! # Global Options
//!
//! All commands support these global options:
//! - `--verbose` - Enable debug output
//! - `--quiet` - Only log errors
//! - `--config` - Path to a config file (overrides `UPDATE_DEPS_CONFIG_PATH`)
//!
//! # Example
//!
//! ```bash
//! # Move the 9.0 images to a new runtime and SDK build
//! update-dependencies specific \
//!     --manifest manifest.versions.json \
//!     --product-version runtime=9.0.1 \
//!     --product-version sdk=9.0.102
//!
//! # Preview the changes without writing the manifest
//! update-dependencies specific -p runtime=9.0.1 --dry-run
//!
//! # Look up checksums
//! update-dependencies checksum \
//!     https://dotnetcli.azureedge.net/dotnet/Runtime/9.0.1/dotnet-runtime-9.0.1-linux-x64.tar.gz
//! ```

mod checksum;
mod specific;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::UpdateConfig;

pub use checksum::ChecksumCommand;
pub use specific::SpecificCommand;

/// Runtime configuration for CLI execution.
///
/// Derived from the global flags by [`Cli::build_config`], so tests can drive
/// [`Cli::execute_with_config`] without touching the process environment.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive; `None` falls back to `RUST_LOG`, then `info`
    pub log_level: Option<String>,

    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the global tracing subscriber.
    ///
    /// Does nothing if a subscriber is already installed.
    pub fn init_logging(&self) {
        let filter = match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

#[derive(Parser)]
#[command(
    name = "update-dependencies",
    about = "Update .NET product versions and checksums in a Docker versions manifest",
    version,
    long_about = "Rewrites the variables of a manifest.versions.json file (build versions, \
                  product versions, base URLs, artifact checksums and tool releases) to \
                  match a set of product versions, touching nothing else in the file."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Update the manifest for specific product versions
    Specific(SpecificCommand),

    /// Resolve checksums for artifact URLs
    Checksum(ChecksumCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        let settings = UpdateConfig::load_with_optional(config.config_path.clone()).await?;

        match self.command {
            Commands::Specific(cmd) => cmd.execute(settings).await,
            Commands::Checksum(cmd) => cmd.execute(settings).await,
        }
    }
}
