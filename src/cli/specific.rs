//! Update a versions manifest for specific product versions.
//!
//! This is the main command. It loads the manifest, runs every updater that applies to
//! the Dockerfile version, saves the manifest after each change and prints what changed
//! together with a commit message.
//!
//! # Examples
//!
//! ```bash
//! # Runtime and SDK servicing release
//! update-dependencies specific -p runtime=9.0.1 -p aspnet=9.0.1 -p sdk=9.0.102
//!
//! # Point the base URL at the public release storage
//! update-dependencies specific -p runtime=9.0.1 --release-state
//!
//! # Internal build, checksums from a local file, no artifact downloads
//! update-dependencies specific -p runtime=9.0.1 --internal \
//!     --internal-base-url https://dotnetstage.blob.core.windows.net/internal \
//!     --checksums-file checksums.txt --no-compute-shas
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::UpdateConfig;
use crate::constants::DEFAULT_MANIFEST_FILE;
use crate::core::UpdateError;
use crate::dependencies::{DependencyInfo, DependencySet};
use crate::manifest::ManifestDocument;
use crate::updater::{RunOptions, UpdateEngine, UpdateReport};

#[derive(Args, Debug, Clone)]
pub struct SpecificCommand {
    /// Path to the versions manifest
    #[arg(short, long, default_value = DEFAULT_MANIFEST_FILE)]
    manifest: PathBuf,

    /// Product version to update to, as NAME=VERSION (repeatable)
    #[arg(short = 'p', long = "product-version", value_name = "NAME=VERSION")]
    product_versions: Vec<DependencyInfo>,

    /// Dockerfile version (major.minor) to update; derived from the product versions if omitted
    #[arg(long)]
    dockerfile_version: Option<String>,

    /// Local file of `<sha512> <filename>` lines consulted before the network
    #[arg(long)]
    checksums_file: Option<PathBuf>,

    /// Point the base URL at the public release storage
    #[arg(long)]
    release_state: bool,

    /// Explicit base URL for the base-url variable
    #[arg(long)]
    base_url: Option<String>,

    /// Build comes from internal storage
    #[arg(long)]
    internal: bool,

    /// Base URL used for internal builds
    #[arg(long, requires = "internal")]
    internal_base_url: Option<String>,

    /// Branch segment of the base-url variable
    #[arg(long)]
    branch: Option<String>,

    /// Never download artifacts to compute checksums
    #[arg(long)]
    no_compute_shas: bool,

    /// Show what would change without writing the manifest
    #[arg(long)]
    dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

impl SpecificCommand {
    /// Layers the command-line flags over the loaded configuration.
    fn apply_overrides(&self, config: &mut UpdateConfig) {
        if let Some(version) = &self.dockerfile_version {
            config.dockerfile_version = Some(version.clone());
        }
        if let Some(path) = &self.checksums_file {
            config.checksums_file = Some(path.clone());
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = Some(base_url.clone());
        }
        if let Some(internal_base_url) = &self.internal_base_url {
            config.internal_base_url = Some(internal_base_url.clone());
        }
        if let Some(branch) = &self.branch {
            config.branch = branch.clone();
        }
        config.release_state |= self.release_state;
        config.internal |= self.internal;
        if self.no_compute_shas {
            config.compute_shas = false;
        }
    }

    pub async fn execute(self, mut config: UpdateConfig) -> Result<()> {
        self.apply_overrides(&mut config);

        let dependencies: DependencySet = self.product_versions.iter().cloned().collect();
        let mut document = ManifestDocument::load(&self.manifest).await?;
        let engine = UpdateEngine::from_config(config)?;

        let report = engine
            .run(
                &mut document,
                &dependencies,
                RunOptions {
                    dry_run: self.dry_run,
                },
            )
            .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            self.print_report(&report);
        }

        if report.has_errors() {
            return Err(UpdateError::RunFailed {
                count: report.errors.len(),
            }
            .into());
        }
        Ok(())
    }

    fn print_report(&self, report: &UpdateReport) {
        for warning in &report.warnings {
            eprintln!("{} {warning}", "warning:".yellow().bold());
        }
        for error in &report.errors {
            eprintln!("{} {error}", "error:".red().bold());
        }

        if !report.has_changes() {
            println!("{}", "No updates required".green());
            return;
        }

        let verb = if self.dry_run { "Would update" } else { "Updated" };
        println!(
            "{} {} variable(s) in {}",
            verb.green().bold(),
            report.updates.len(),
            self.manifest.display()
        );
        for update in &report.updates {
            println!(
                "  {} {} -> {}",
                update.variable_name.cyan(),
                update.old_value.dimmed(),
                update.new_value
            );
        }

        println!();
        println!("{}", report.commit_message());
    }
}
