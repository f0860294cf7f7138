//! Discovers updaters from manifest keys and runs them.

use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::checksum::ChecksumResolver;
use super::resolvers::{BaseUrlResolver, BuildVersionResolver, ProductVersionResolver};
use super::tools::{AssetField, RuntimeGate, ToolAssetResolver, ToolRefResolver};
use super::{
    AppliedUpdate, Diagnostics, Stage, UpdateContext, UpdateReport, ValueResolver, VariableUpdater,
};
use crate::checksum::{ChecksumService, Fetcher, HttpFetcher};
use crate::config::UpdateConfig;
use crate::constants::{
    BASE_URL_PREFIX, BUILD_VERSION_SUFFIX, CHECKSUM_SUFFIX, DOCKERFILE_VERSION_PRODUCTS,
    KEY_SEPARATOR, PRODUCT_VERSION_SUFFIX, TOOL_REF_SUFFIX, TOOL_URL_SUFFIX,
};
use crate::core::UpdateError;
use crate::dependencies::DependencySet;
use crate::manifest::{ManifestDocument, VariableStore};
use crate::release::{GitHubReleaseClient, ReleaseCache, ReleaseSource};
use crate::version::dockerfile_version;

/// Options for a single [`UpdateEngine::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Compute and apply updates in memory but never write the manifest file
    pub dry_run: bool,
}

/// Runs updaters over a manifest.
///
/// The engine owns the checksum and release caches, so running it several times (for
/// several Dockerfile versions, say) reuses every lookup already made.
pub struct UpdateEngine {
    config: UpdateConfig,
    checksums: ChecksumService,
    releases: ReleaseCache,
}

impl UpdateEngine {
    pub fn new(
        config: UpdateConfig,
        fetcher: Arc<dyn Fetcher>,
        releases: Arc<dyn ReleaseSource>,
    ) -> Self {
        let checksums = ChecksumService::new(fetcher)
            .with_checksums_file(config.checksums_file.clone())
            .with_compute_shas(config.compute_shas);

        Self {
            config,
            checksums,
            releases: ReleaseCache::new(releases),
        }
    }

    /// Creates an engine that talks to the real network.
    pub fn from_config(config: UpdateConfig) -> Result<Self> {
        let timeout = config.http_timeout();
        let fetcher = Arc::new(HttpFetcher::new(timeout)?);
        let releases = Arc::new(GitHubReleaseClient::new(timeout)?);
        Ok(Self::new(config, fetcher, releases))
    }

    #[must_use]
    pub fn config(&self) -> &UpdateConfig {
        &self.config
    }

    #[must_use]
    pub fn checksums(&self) -> &ChecksumService {
        &self.checksums
    }

    /// The `major.minor` version whose variables this run updates.
    ///
    /// Uses the configured value if set, else the first of runtime, aspnet and sdk that is
    /// provided, else any provided dependency.
    pub fn resolve_dockerfile_version(&self, dependencies: &DependencySet) -> Result<String> {
        if let Some(version) = &self.config.dockerfile_version {
            return Ok(version.clone());
        }

        let source = DOCKERFILE_VERSION_PRODUCTS
            .iter()
            .find_map(|product| dependencies.get(product))
            .or_else(|| dependencies.iter().next())
            .ok_or_else(|| UpdateError::ConfigError {
                message: "no dependency versions to derive the Dockerfile version from"
                    .to_string(),
            })?;

        dockerfile_version(&source.version)
    }

    /// Creates one updater per tracked variable of `dockerfile_version`, sorted by stage
    /// and then by variable name.
    #[must_use]
    pub fn discover_updaters(
        &self,
        variables: &VariableStore,
        dockerfile_version: &str,
    ) -> Vec<VariableUpdater> {
        let mut updaters: Vec<VariableUpdater> = variables
            .keys()
            .filter_map(|key| self.updater_for(key, dockerfile_version))
            .collect();

        updaters.sort_by(|a, b| {
            a.stage().cmp(&b.stage()).then_with(|| a.variable_name().cmp(b.variable_name()))
        });
        updaters
    }

    fn updater_for(&self, key: &str, dfv: &str) -> Option<VariableUpdater> {
        let parts: Vec<&str> = key.split(KEY_SEPARATOR).collect();
        if parts.get(1) != Some(&dfv) {
            return None;
        }

        let product = parts[0];
        if let Some(tool) = self.config.tool(product) {
            let tool = Arc::new(tool.clone());
            let gate = tool.gated_on.clone();
            let (stage, inner): (Stage, Box<dyn ValueResolver>) = match parts.as_slice() {
                [_, _, suffix] if *suffix == TOOL_REF_SUFFIX => {
                    (Stage::ToolRef, Box::new(ToolRefResolver::new(tool)) as Box<dyn ValueResolver>)
                }
                [_, _, arch, suffix] if *suffix == TOOL_URL_SUFFIX => (
                    Stage::ToolUrl,
                    Box::new(ToolAssetResolver::new(tool, *arch, AssetField::Url))
                        as Box<dyn ValueResolver>,
                ),
                [_, _, arch, suffix] if *suffix == CHECKSUM_SUFFIX => (
                    Stage::ToolChecksum,
                    Box::new(ToolAssetResolver::new(tool, *arch, AssetField::Checksum))
                        as Box<dyn ValueResolver>,
                ),
                _ => return None,
            };
            return Some(VariableUpdater::new(key, stage, Box::new(RuntimeGate::new(inner, gate))));
        }

        match parts.as_slice() {
            [base, _, branch] if *base == BASE_URL_PREFIX => (*branch == self.config.branch)
                .then(|| VariableUpdater::new(key, Stage::BaseUrl, Box::new(BaseUrlResolver))),
            [_, _, suffix] if *suffix == BUILD_VERSION_SUFFIX => Some(VariableUpdater::new(
                key,
                Stage::BuildVersion,
                Box::new(BuildVersionResolver::new(product)),
            )),
            [_, _, suffix] if *suffix == PRODUCT_VERSION_SUFFIX => Some(VariableUpdater::new(
                key,
                Stage::ProductVersion,
                Box::new(ProductVersionResolver::new(product)),
            )),
            [_, _, os, arch, suffix] if *suffix == CHECKSUM_SUFFIX => {
                self.config.url_templates_for(product).map(|_| {
                    VariableUpdater::new(
                        key,
                        Stage::Checksum,
                        Box::new(ChecksumResolver::new(key, product, *os, *arch)),
                    )
                })
            }
            _ => None,
        }
    }

    /// Updates every tracked variable of `document` for `dependencies`.
    ///
    /// Updates are applied one at a time in stage order, so later updaters see the values
    /// written by earlier ones. Unless `options.dry_run` is set the manifest is saved
    /// after each change.
    ///
    /// # Errors
    ///
    /// Configuration problems abort the run. Unresolved checksums and tool lookups do not:
    /// they are returned in [`UpdateReport::errors`].
    pub async fn run(
        &self,
        document: &mut ManifestDocument,
        dependencies: &DependencySet,
        options: RunOptions,
    ) -> Result<UpdateReport> {
        let start = Instant::now();
        let dfv = self.resolve_dockerfile_version(dependencies)?;
        let baseline = document.variables().clone();
        let updaters = self.discover_updaters(&baseline, &dfv);
        let diagnostics = Diagnostics::default();
        let mut report = UpdateReport::default();

        info!(
            "Updating {} variable(s) for Dockerfile version {dfv} with {} dependency(ies)",
            updaters.len(),
            dependencies.len()
        );

        for updater in &updaters {
            let update = {
                let ctx = UpdateContext {
                    config: &self.config,
                    dependencies,
                    dockerfile_version: &dfv,
                    variables: document.variables(),
                    baseline: &baseline,
                    checksums: &self.checksums,
                    releases: &self.releases,
                    diagnostics: &diagnostics,
                };
                updater.try_get_desired_value(&ctx).await?
            };

            if !update.is_change() {
                debug!("[{}] {} is up to date", updater.stage(), update.variable_name);
                continue;
            }

            if document.apply_update(&update.variable_name, &update.desired_value)? {
                info!(
                    "Updated {}: {} -> {}",
                    update.variable_name, update.current_value, update.desired_value
                );
                if !options.dry_run {
                    document.save()?;
                }
                report.updates.push(AppliedUpdate::from(update));
            }
        }

        let (errors, warnings) = diagnostics.into_parts();
        report.errors = errors;
        report.warnings = warnings;

        debug!(
            "Run finished in {:?}: {} update(s), {} error(s)",
            start.elapsed(),
            report.updates.len(),
            report.errors.len()
        );
        Ok(report)
    }
}
