//! Product dependencies that drive an update run.
//!
//! A run is parameterised by a set of [`DependencyInfo`] values: a logical product name
//! (`runtime`, `aspnet`, `sdk`, `monitor`, `chisel`, ...) and the version that product
//! should move to. They come either from explicit `name=version` arguments or from build
//! asset metadata (see [`build_assets`]).

pub mod build_assets;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::core::UpdateError;

pub use build_assets::{BuildAsset, dependencies_from_assets};

/// A product and the version it should be updated to.
///
/// An empty `version` means "not provided" and is treated like an absent dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DependencyInfo {
    /// Logical product name, e.g. `runtime`
    pub name: String,
    /// Desired version; may be empty
    pub version: String,
}

impl DependencyInfo {
    /// Creates a dependency from a name and version.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Returns `true` when a non-empty version was provided.
    #[must_use]
    pub fn has_version(&self) -> bool {
        !self.version.trim().is_empty()
    }
}

impl fmt::Display for DependencyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

impl FromStr for DependencyInfo {
    type Err = UpdateError;

    /// Parses `name=version`. The version may be empty, the name may not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, version) = s.split_once('=').ok_or_else(|| UpdateError::InvalidDependency {
            name: s.to_string(),
            reason: "expected NAME=VERSION".to_string(),
        })?;

        let name = name.trim();
        if name.is_empty() {
            return Err(UpdateError::InvalidDependency {
                name: s.to_string(),
                reason: "dependency name is empty".to_string(),
            });
        }

        Ok(Self::new(name, version.trim()))
    }
}

/// The set of dependencies for one run, keyed by product name.
///
/// Later insertions for the same name replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    entries: BTreeMap<String, DependencyInfo>,
}

impl DependencySet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a dependency.
    pub fn insert(&mut self, dependency: DependencyInfo) {
        self.entries.insert(dependency.name.clone(), dependency);
    }

    /// Returns the dependency for `name` if it was provided with a non-empty version.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DependencyInfo> {
        self.entries.get(name).filter(|d| d.has_version())
    }

    /// Returns the version for `name` if one was provided.
    #[must_use]
    pub fn version(&self, name: &str) -> Option<&str> {
        self.get(name).map(|d| d.version.as_str())
    }

    /// Iterates over dependencies that carry a version, in name order.
    pub fn iter(&self) -> impl Iterator<Item = &DependencyInfo> {
        self.entries.values().filter(|d| d.has_version())
    }

    /// Number of dependencies with a version.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns `true` when no dependency carries a version.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<DependencyInfo> for DependencySet {
    fn from_iter<T: IntoIterator<Item = DependencyInfo>>(iter: T) -> Self {
        let mut set = Self::new();
        for dependency in iter {
            set.insert(dependency);
        }
        set
    }
}
