//! update-dependencies - keeps a .NET Docker versions manifest in step with new builds
//!
//! The .NET container images read every product version, download URL and checksum from
//! a single JSON file, `manifest.versions.json`, whose `variables` object maps keys such
//! as `runtime|9.0|build-version` to values. Moving the images to a new build means
//! rewriting dozens of those variables consistently. This crate does that rewrite.
//!
//! # Architecture Overview
//!
//! A run takes a set of product versions (`runtime=9.0.1`, `sdk=9.0.102`, ...) and:
//!
//! 1. loads the manifest into a [`manifest::VariableStore`], which resolves `$(name)`
//!    references between variables
//! 2. discovers one updater per tracked variable from the key shape
//!    ([`updater::UpdateEngine::discover_updaters`])
//! 3. runs the updaters in stage order; each proposes a value, and changed values are
//!    patched into the original text so formatting and unrelated content survive
//! 4. reports the changes and the dependencies behind them as a commit message
//!
//! Checksums come from [`checksum::ChecksumService`], which tries a local file, release
//! checksum listings, sidecar checksum files and finally hashing the artifact, caching
//! every answer. Tool variables (chisel) come from GitHub releases through
//! [`release::ReleaseCache`].
//!
//! # Core Modules
//!
//! - [`manifest`] - the manifest document, variable store and text patching
//! - [`updater`] - updaters, resolvers, the engine and its report
//! - [`checksum`] - checksum lookup chain and HTTP fetcher
//! - [`release`] - GitHub release lookups for tools
//! - [`dependencies`] - product dependencies and build-asset mapping
//! - [`version`] - version parsing and derivation
//! - [`config`] - run settings loaded from TOML
//! - [`core`] - error types and user-facing error rendering
//! - [`cli`] - command-line interface
//! - [`utils`] - file helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use update_dependencies::config::UpdateConfig;
//! use update_dependencies::dependencies::{DependencyInfo, DependencySet};
//! use update_dependencies::manifest::ManifestDocument;
//! use update_dependencies::updater::{RunOptions, UpdateEngine};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut document = ManifestDocument::load("manifest.versions.json".as_ref()).await?;
//! let dependencies: DependencySet =
//!     [DependencyInfo::new("runtime", "9.0.1")].into_iter().collect();
//!
//! let engine = UpdateEngine::from_config(UpdateConfig::default())?;
//! let report = engine.run(&mut document, &dependencies, RunOptions::default()).await?;
//! println!("{}", report.commit_message());
//! # Ok(())
//! # }
//! ```

pub mod checksum;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod dependencies;
pub mod manifest;
pub mod release;
pub mod updater;
pub mod utils;
pub mod version;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
