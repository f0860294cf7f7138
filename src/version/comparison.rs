//! Version comparison utilities for .NET build versions.
//!
//! Build versions such as `9.0.0-preview.5.24306.7` or `8.0.100-rtm.23551.1` are not
//! always valid semantic versions and their prerelease labels do not sort the way the
//! build numbers do. Comparison here therefore looks only at the numeric
//! `major.minor.patch` prefix.
//!
//! # Examples
//!
//! ```rust,no_run
//! use update_dependencies::version::comparison::VersionComparator;
//!
//! let versions = ["6.0.1", "6.0.10", "6.0.9-preview.1"];
//! assert_eq!(VersionComparator::highest(&versions), Some("6.0.10"));
//! ```

use anyhow::Result;
use regex::Regex;
use semver::Version;
use std::sync::LazyLock;

use crate::core::UpdateError;

static NUMERIC_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.(\d+)\.(\d+)").expect("numeric prefix pattern is valid")
});

/// Version comparison utilities operating on numeric version prefixes.
pub struct VersionComparator;

impl VersionComparator {
    /// Returns the numeric `major.minor.patch` prefix of a version as a [`Version`].
    ///
    /// Common prefixes (`v`, `version-`, `release-`) are stripped first; anything after
    /// the patch number (prerelease labels, build numbers) is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::InvalidVersion`] when no numeric triple can be found.
    pub fn numeric_prefix(version_str: &str) -> Result<Version> {
        let clean = Self::strip_prefix(version_str);
        let captures = NUMERIC_PREFIX.captures(clean).ok_or_else(|| UpdateError::InvalidVersion {
            version: version_str.to_string(),
        })?;

        let part = |i: usize| -> Result<u64> {
            captures[i].parse::<u64>().map_err(|_| {
                UpdateError::InvalidVersion {
                    version: version_str.to_string(),
                }
                .into()
            })
        };

        Ok(Version::new(part(1)?, part(2)?, part(3)?))
    }

    /// Picks the highest version by numeric prefix.
    ///
    /// Unparseable entries are skipped. When two entries share the same numeric prefix
    /// the first one wins, so callers get a stable answer regardless of prerelease labels.
    pub fn highest<'a, S: AsRef<str>>(versions: &'a [S]) -> Option<&'a str> {
        let mut best: Option<(&str, Version)> = None;

        for candidate in versions {
            let candidate = candidate.as_ref();
            let Ok(parsed) = Self::numeric_prefix(candidate) else {
                continue;
            };
            let replace = match &best {
                Some((_, current)) => parsed > *current,
                None => true,
            };
            if replace {
                best = Some((candidate, parsed));
            }
        }

        best.map(|(s, _)| s)
    }

    fn strip_prefix(version_str: &str) -> &str {
        if let Some(stripped) = version_str.strip_prefix("version-") {
            stripped
        } else if let Some(stripped) = version_str.strip_prefix("release-") {
            stripped
        } else if let Some(stripped) = version_str.strip_prefix('v') {
            stripped
        } else {
            version_str
        }
    }
}
