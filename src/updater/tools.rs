//! Resolvers for tools distributed through GitHub releases.
//!
//! A tool contributes three kinds of variables:
//!
//! - `{tool}|{dfv}|ref` - the release tag, taken from the tool dependency's version
//! - `{tool}|{dfv}|{arch}|url` - the download URL of the matching release asset
//! - `{tool}|{dfv}|{arch}|sha` - the asset's digest from the release notes
//!
//! Tools are only updated together with the runtime, so every tool resolver is wrapped
//! in a [`RuntimeGate`].

use regex::Regex;
use std::sync::Arc;
use tracing::{debug, error};

use super::{ResolveFuture, Resolution, UpdateContext, ValueResolver};
use crate::config::ToolConfig;
use crate::dependencies::DependencyInfo;
use crate::release::{GitHubRelease, ReleaseAsset};

/// Only resolves when `gate_product`'s build version is changing in this run.
pub struct RuntimeGate {
    inner: Box<dyn ValueResolver>,
    gate_product: String,
}

impl RuntimeGate {
    pub fn new(inner: Box<dyn ValueResolver>, gate_product: impl Into<String>) -> Self {
        Self {
            inner,
            gate_product: gate_product.into(),
        }
    }
}

impl ValueResolver for RuntimeGate {
    fn resolve<'a>(&'a self, ctx: &'a UpdateContext<'a>) -> ResolveFuture<'a> {
        Box::pin(async move {
            if !ctx.is_changing(&self.gate_product) {
                debug!("Skipping tool update: {} is not changing", self.gate_product);
                return Ok(None);
            }
            self.inner.resolve(ctx).await
        })
    }
}

/// `{tool}|{dfv}|ref`
pub struct ToolRefResolver {
    tool: Arc<ToolConfig>,
}

impl ToolRefResolver {
    pub fn new(tool: Arc<ToolConfig>) -> Self {
        Self {
            tool,
        }
    }
}

impl ValueResolver for ToolRefResolver {
    fn resolve<'a>(&'a self, ctx: &'a UpdateContext<'a>) -> ResolveFuture<'a> {
        Box::pin(async move {
            Ok(ctx
                .dependencies
                .get(&self.tool.name)
                .map(|dep| Resolution::new(dep.version.clone(), vec![dep.clone()])))
        })
    }
}

/// Which part of the matching asset a [`ToolAssetResolver`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetField {
    /// The asset's download URL
    Url,
    /// The asset's digest from the release body
    Checksum,
}

/// `{tool}|{dfv}|{arch}|url` and `{tool}|{dfv}|{arch}|sha`
pub struct ToolAssetResolver {
    tool: Arc<ToolConfig>,
    arch: String,
    field: AssetField,
}

impl ToolAssetResolver {
    pub fn new(tool: Arc<ToolConfig>, arch: impl Into<String>, field: AssetField) -> Self {
        Self {
            tool,
            arch: arch.into(),
            field,
        }
    }

    /// The asset pattern with `{version}` and `{arch}` filled in.
    pub fn asset_pattern(&self, version: &str) -> Result<Regex, regex::Error> {
        let pattern = self
            .tool
            .asset_pattern
            .replace("{version}", &regex::escape(version))
            .replace("{arch}", &regex::escape(self.tool.asset_arch(&self.arch)));
        Regex::new(&pattern)
    }

    fn select(&self, release: &GitHubRelease, asset: &ReleaseAsset) -> Option<String> {
        match self.field {
            AssetField::Url => Some(asset.browser_download_url.clone()),
            AssetField::Checksum => release.checksum_for(&asset.name),
        }
    }

    fn report(&self, ctx: &UpdateContext<'_>, message: String) {
        error!("{message}");
        ctx.diagnostics.error(message);
    }

    async fn resolve_value(&self, ctx: &UpdateContext<'_>, dep: &DependencyInfo) -> Option<String> {
        let tool = &self.tool;
        let release = match ctx.releases.get(&tool.owner, &tool.repo, &dep.version).await {
            Ok(Some(release)) => release,
            Ok(None) => {
                self.report(
                    ctx,
                    format!("No {}/{} release tagged {}", tool.owner, tool.repo, dep.version),
                );
                return None;
            }
            Err(e) => {
                self.report(
                    ctx,
                    format!("Failed to fetch {} release {}: {e:#}", tool.name, dep.version),
                );
                return None;
            }
        };

        let pattern = match self.asset_pattern(&dep.version) {
            Ok(pattern) => pattern,
            Err(e) => {
                self.report(ctx, format!("Invalid asset pattern for {}: {e}", tool.name));
                return None;
            }
        };

        let Some(asset) = release.find_asset(&pattern) else {
            self.report(
                ctx,
                format!("No asset matching '{pattern}' in {} release {}", tool.name, dep.version),
            );
            return None;
        };

        let value = self.select(&release, asset);
        if value.is_none() {
            self.report(
                ctx,
                format!("No checksum for {} in {} release {}", asset.name, tool.name, dep.version),
            );
        }
        value
    }
}

impl ValueResolver for ToolAssetResolver {
    fn resolve<'a>(&'a self, ctx: &'a UpdateContext<'a>) -> ResolveFuture<'a> {
        Box::pin(async move {
            let Some(dep) = ctx.dependencies.get(&self.tool.name) else {
                return Ok(None);
            };

            Ok(self
                .resolve_value(ctx, dep)
                .await
                .map(|value| Resolution::new(value, vec![dep.clone()])))
        })
    }
}
