//! The update rule engine.
//!
//! Every tracked manifest variable gets one [`VariableUpdater`]: the variable name, the
//! [`Stage`] it runs in, and a [`ValueResolver`] that computes the value the variable
//! should hold. The [`engine::UpdateEngine`] discovers updaters from the manifest keys,
//! runs them in stage order and patches the manifest after each change.
//!
//! # Update Policy
//!
//! [`VariableUpdater::try_get_desired_value`] applies the rules shared by all resolvers:
//!
//! - a variable missing from the manifest is an error
//! - a value that is a `$(...)` reference is never overwritten
//! - a resolver that has nothing to say (missing dependency, gated tool, unresolved
//!   checksum) leaves the current value in place
//! - dependencies are reported only for values that actually change

pub mod checksum;
pub mod engine;
pub mod report;
pub mod resolvers;
pub mod tools;

use anyhow::Result;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use crate::checksum::ChecksumService;
use crate::config::UpdateConfig;
use crate::constants::{BASE_URL_PREFIX, BUILD_VERSION_SUFFIX};
use crate::core::UpdateError;
use crate::dependencies::{DependencyInfo, DependencySet};
use crate::manifest::{VariableStore, is_reference};
use crate::release::ReleaseCache;

pub use engine::{RunOptions, UpdateEngine};
pub use report::{AppliedUpdate, UpdateReport};

/// Update stages, in the order they run.
///
/// Checksums run after the base URL so they read the updated base URL. Tool updaters
/// run last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    BuildVersion,
    ProductVersion,
    BaseUrl,
    Checksum,
    ToolRef,
    ToolUrl,
    ToolChecksum,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BuildVersion => "build-version",
            Self::ProductVersion => "product-version",
            Self::BaseUrl => "base-url",
            Self::Checksum => "checksum",
            Self::ToolRef => "tool-ref",
            Self::ToolUrl => "tool-url",
            Self::ToolChecksum => "tool-checksum",
        };
        f.write_str(name)
    }
}

/// The outcome of evaluating one updater.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableUpdate {
    pub variable_name: String,
    pub current_value: String,
    pub desired_value: String,
    /// Dependencies that justify the change; empty when nothing changes
    pub used_dependencies: Vec<DependencyInfo>,
}

impl VariableUpdate {
    fn unchanged(variable_name: &str, current_value: String) -> Self {
        Self {
            variable_name: variable_name.to_string(),
            desired_value: current_value.clone(),
            current_value,
            used_dependencies: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_change(&self) -> bool {
        self.desired_value != self.current_value
    }
}

/// A value proposed by a resolver and the dependencies it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub value: String,
    pub used: Vec<DependencyInfo>,
}

impl Resolution {
    pub fn new(value: impl Into<String>, used: Vec<DependencyInfo>) -> Self {
        Self {
            value: value.into(),
            used,
        }
    }
}

/// Boxed future returned by [`ValueResolver::resolve`].
pub type ResolveFuture<'a> = Pin<Box<dyn Future<Output = Result<Option<Resolution>>> + Send + 'a>>;

/// Computes the value a variable should hold.
///
/// Returning `Ok(None)` keeps the current value.
pub trait ValueResolver: Send + Sync {
    fn resolve<'a>(&'a self, ctx: &'a UpdateContext<'a>) -> ResolveFuture<'a>;
}

/// One tracked variable and how to compute it.
pub struct VariableUpdater {
    variable_name: String,
    stage: Stage,
    resolver: Box<dyn ValueResolver>,
}

impl fmt::Debug for VariableUpdater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableUpdater")
            .field("variable_name", &self.variable_name)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

impl VariableUpdater {
    pub fn new(
        variable_name: impl Into<String>,
        stage: Stage,
        resolver: Box<dyn ValueResolver>,
    ) -> Self {
        Self {
            variable_name: variable_name.into(),
            stage,
            resolver,
        }
    }

    #[must_use]
    pub fn variable_name(&self) -> &str {
        &self.variable_name
    }

    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Evaluates the updater against the current manifest state.
    pub async fn try_get_desired_value(&self, ctx: &UpdateContext<'_>) -> Result<VariableUpdate> {
        let current = ctx
            .variables
            .raw_value(&self.variable_name)
            .ok_or_else(|| UpdateError::MissingVariable {
                name: self.variable_name.clone(),
            })?
            .to_string();

        if is_reference(&current) {
            return Ok(VariableUpdate::unchanged(&self.variable_name, current));
        }

        match self.resolver.resolve(ctx).await? {
            Some(resolution) if resolution.value != current => Ok(VariableUpdate {
                variable_name: self.variable_name.clone(),
                current_value: current,
                desired_value: resolution.value,
                used_dependencies: resolution.used,
            }),
            _ => Ok(VariableUpdate::unchanged(&self.variable_name, current)),
        }
    }
}

/// Errors and warnings collected while a run continues.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
}

impl Diagnostics {
    pub fn error(&self, message: impl Into<String>) {
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(message.into());
        }
    }

    pub fn warning(&self, message: impl Into<String>) {
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(message.into());
        }
    }

    /// Consumes the collector, returning `(errors, warnings)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<String>, Vec<String>) {
        (
            self.errors.into_inner().unwrap_or_default(),
            self.warnings.into_inner().unwrap_or_default(),
        )
    }
}

/// Everything a resolver may consult.
pub struct UpdateContext<'a> {
    pub config: &'a UpdateConfig,
    pub dependencies: &'a DependencySet,
    /// `major.minor` version of the variables being updated
    pub dockerfile_version: &'a str,
    /// Manifest variables including updates applied earlier in this run
    pub variables: &'a VariableStore,
    /// Manifest variables as they were when the run started
    pub baseline: &'a VariableStore,
    pub checksums: &'a ChecksumService,
    pub releases: &'a ReleaseCache,
    pub diagnostics: &'a Diagnostics,
}

impl UpdateContext<'_> {
    /// Returns `true` if `product` is provided and its build version differs from the
    /// value the manifest had when the run started.
    #[must_use]
    pub fn is_changing(&self, product: &str) -> bool {
        let Some(dependency) = self.dependencies.get(product) else {
            return false;
        };

        let key = format!("{product}|{}|{BUILD_VERSION_SUFFIX}", self.dockerfile_version);
        match self.baseline.get_value(&key) {
            Ok(previous) => previous != dependency.version,
            Err(_) => true,
        }
    }

    /// Runtime build version the artifacts of this run ship with.
    ///
    /// A provided `runtime` dependency wins; otherwise the manifest's current runtime
    /// build version is used, as for an SDK-only release.
    #[must_use]
    pub fn runtime_version(&self) -> Option<String> {
        if let Some(version) = self.dependencies.version("runtime") {
            return Some(version.to_string());
        }
        let key = format!("runtime|{}|{BUILD_VERSION_SUFFIX}", self.dockerfile_version);
        self.variables.get_value(&key).ok().filter(|v| !v.is_empty())
    }

    /// The base URL artifacts are downloaded from, read from the current manifest state.
    #[must_use]
    pub fn base_url(&self) -> String {
        let key = format!("{BASE_URL_PREFIX}|{}|{}", self.dockerfile_version, self.config.branch);
        let value = self.variables.try_get_value(&key);
        if value.is_empty() { self.config.default_base_url() } else { value }
    }
}
