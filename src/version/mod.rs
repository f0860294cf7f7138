//! Version string utilities for .NET product versions.
//!
//! Build pipelines publish long build versions (`3.1.0-preview3.19530.9`) while image
//! tags and release checksum files use shorter forms. This module converts between them:
//!
//! - [`derive_tag_version`] - the version used in tags and stable download paths
//! - [`preview_version`] - the `major.minor.patch-label.N` preview form
//! - [`dockerfile_version`] - the `major.minor` Dockerfile version
//! - [`comparison::VersionComparator`] - numeric-prefix comparison and highest-version selection
//!
//! # Examples
//!
//! ```rust,no_run
//! use update_dependencies::version::{derive_tag_version, dockerfile_version, preview_version};
//!
//! assert_eq!(derive_tag_version("3.1.100-preview2-014589"), "3.1.100-preview2");
//! assert_eq!(derive_tag_version("2.2.0-rtm-35586"), "2.2.0");
//! assert_eq!(preview_version("6.0.0-preview.5.21301.5").as_deref(), Some("6.0.0-preview.5"));
//! assert_eq!(dockerfile_version("9.0.0-rc.2.24473.5").unwrap(), "9.0");
//! ```

pub mod comparison;

use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

use crate::core::UpdateError;

pub use comparison::VersionComparator;

static PREVIEW_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+\.\d+\.\d+-[A-Za-z]+\.\d+)\.").expect("preview version pattern is valid")
});

static MAJOR_MINOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)").expect("major.minor pattern is valid"));

/// Suffixes that mark a stable build and are dropped from tag versions.
const STABLE_SUFFIXES: [&str; 2] = ["-servicing", "-rtm"];

/// Derives the tag version from a build version.
///
/// The prerelease segment (after the first `-`) is cut at a second `-` if it has one,
/// otherwise at its first `.`. A trailing `-servicing` or `-rtm` is then removed.
/// Versions without a `-` are returned unchanged.
///
/// | build version              | tag version         |
/// |----------------------------|---------------------|
/// | `3.1.100-preview2-014589`  | `3.1.100-preview2`  |
/// | `3.1.0-preview3.19530.9`   | `3.1.0-preview3`    |
/// | `2.2.0-rtm-35586`          | `2.2.0`             |
/// | `8.0.1`                    | `8.0.1`             |
#[must_use]
pub fn derive_tag_version(build_version: &str) -> String {
    let Some(hyphen) = build_version.find('-') else {
        return build_version.to_string();
    };

    let (release, prerelease) = build_version.split_at(hyphen);
    // `prerelease` still starts with the first '-'
    let label = &prerelease[1..];
    let cut = label.find('-').or_else(|| label.find('.')).unwrap_or(label.len());
    let mut tag = format!("{release}-{}", &label[..cut]);

    for suffix in STABLE_SUFFIXES {
        if let Some(stripped) = tag.strip_suffix(suffix) {
            tag = stripped.to_string();
            break;
        }
    }

    tag
}

/// Shortens a preview build version to `major.minor.patch-label.N`.
///
/// Returns `None` when the version is not of that shape
/// (e.g. `6.0.0-preview.5.21301.5` gives `6.0.0-preview.5`, `8.0.1` gives `None`).
#[must_use]
pub fn preview_version(version: &str) -> Option<String> {
    PREVIEW_VERSION.captures(version).map(|c| c[1].to_string())
}

/// Returns the `major.minor` Dockerfile version for a product version.
///
/// # Errors
///
/// Returns [`UpdateError::InvalidVersion`] when the version does not start with
/// `major.minor`.
pub fn dockerfile_version(version: &str) -> Result<String> {
    let captures = MAJOR_MINOR.captures(version).ok_or_else(|| UpdateError::InvalidVersion {
        version: version.to_string(),
    })?;
    Ok(format!("{}.{}", &captures[1], &captures[2]))
}
