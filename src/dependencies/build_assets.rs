//! Derive product dependencies from build asset metadata.
//!
//! A .NET build publishes packages such as `Microsoft.NETCore.App.Ref` alongside its
//! installers. The version of each well-known package is the version of the product it
//! belongs to.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::{DependencyInfo, DependencySet};
use crate::version::VersionComparator;

/// One asset produced by a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildAsset {
    /// Package or file name, e.g. `Microsoft.NETCore.App.Ref`
    pub name: String,
    /// Version the asset was published with
    pub version: String,
}

impl BuildAsset {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Known asset names and the product each one versions.
const ASSET_PRODUCTS: [(&str, &str); 3] = [
    ("Microsoft.NETCore.App.Ref", "runtime"),
    ("Microsoft.AspNetCore.App.Ref", "aspnet"),
    ("Microsoft.Dotnet.Sdk.Internal", "sdk"),
];

fn product_for_asset(asset_name: &str) -> Option<&'static str> {
    ASSET_PRODUCTS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(asset_name))
        .map(|(_, product)| *product)
}

/// Maps build assets to product dependencies.
///
/// Unknown assets are ignored. When several assets map to the same product (the SDK is
/// published once per architecture and the versions can diverge) the highest version
/// by numeric prefix is kept.
#[must_use]
pub fn dependencies_from_assets(assets: &[BuildAsset]) -> DependencySet {
    let mut versions: BTreeMap<&'static str, Vec<&str>> = BTreeMap::new();

    for asset in assets {
        if let Some(product) = product_for_asset(&asset.name) {
            versions.entry(product).or_default().push(asset.version.as_str());
        }
    }

    versions
        .into_iter()
        .filter_map(|(product, candidates)| {
            let chosen = VersionComparator::highest(&candidates)?;
            debug!("Build assets select {product} {chosen} from {} candidate(s)", candidates.len());
            Some(DependencyInfo::new(product, chosen))
        })
        .collect()
}
