//! Test utilities for update-dependencies
//!
//! In-memory stand-ins for the network seams ([`Fetcher`] and [`ReleaseSource`]) that
//! record every request, so tests can assert how often a URL was hit, plus a few
//! fixture builders.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use update_dependencies::checksum::ChecksumService;
//! use update_dependencies::test_utils::MockFetcher;
//!
//! let fetcher = Arc::new(
//!     MockFetcher::new().with_text("https://example.test/file.tar.gz.sha512", "abcdef"),
//! );
//! let service = ChecksumService::new(fetcher.clone());
//! ```

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, Once};

use anyhow::{Result, anyhow};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::checksum::{FetchFuture, Fetcher, sha512_hex};
use crate::release::{GitHubRelease, ReleaseAsset, ReleaseSource};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise `RUST_LOG`;
/// with neither, tests run without a subscriber.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// [`Fetcher`] serving canned responses.
///
/// Unknown URLs behave like HTTP 404. URLs registered with [`with_failure`] fail with an
/// error, like a connection reset.
///
/// [`with_failure`]: MockFetcher::with_failure
#[derive(Debug, Default)]
pub struct MockFetcher {
    texts: HashMap<String, String>,
    artifacts: HashMap<String, Vec<u8>>,
    failures: HashSet<String>,
    yielding: bool,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` for `url` from [`Fetcher::fetch_text`].
    #[must_use]
    pub fn with_text(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.texts.insert(url.into(), body.into());
        self
    }

    /// Serves `bytes` for `url` from [`Fetcher::compute_sha512`].
    #[must_use]
    pub fn with_artifact(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.artifacts.insert(url.into(), bytes);
        self
    }

    #[must_use]
    pub fn with_failure(mut self, url: impl Into<String>) -> Self {
        self.failures.insert(url.into());
        self
    }

    /// Yields to the runtime once per request, so concurrent lookups interleave.
    #[must_use]
    pub fn yielding(mut self) -> Self {
        self.yielding = true;
        self
    }

    /// How many times `url` was requested, by either method.
    pub fn request_count(&self, url: &str) -> usize {
        self.requests.lock().map(|r| r.iter().filter(|u| *u == url).count()).unwrap_or(0)
    }

    pub fn total_requests(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn record(&self, url: &str) -> Result<()> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        if self.failures.contains(url) {
            return Err(anyhow!("connection reset while fetching {url}"));
        }
        Ok(())
    }
}

impl Fetcher for MockFetcher {
    fn fetch_text<'a>(&'a self, url: &'a str) -> FetchFuture<'a, Option<String>> {
        Box::pin(async move {
            self.record(url)?;
            if self.yielding {
                tokio::task::yield_now().await;
            }
            Ok(self.texts.get(url).cloned())
        })
    }

    fn compute_sha512<'a>(&'a self, url: &'a str) -> FetchFuture<'a, Option<String>> {
        Box::pin(async move {
            self.record(url)?;
            if self.yielding {
                tokio::task::yield_now().await;
            }
            Ok(self.artifacts.get(url).map(|bytes| sha512_hex(bytes)))
        })
    }
}

/// [`ReleaseSource`] serving releases registered with [`MockReleaseSource::with_release`].
///
/// Every lookup yields to the runtime once, like a real request would.
#[derive(Debug, Default)]
pub struct MockReleaseSource {
    releases: HashMap<(String, String, String), GitHubRelease>,
    requests: Mutex<usize>,
}

impl MockReleaseSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `release` under its own tag.
    #[must_use]
    pub fn with_release(mut self, owner: &str, repo: &str, release: GitHubRelease) -> Self {
        let key = (owner.to_string(), repo.to_string(), release.tag_name.clone());
        self.releases.insert(key, release);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|count| *count).unwrap_or(0)
    }
}

impl ReleaseSource for MockReleaseSource {
    fn release_by_tag<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
        tag: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<GitHubRelease>>> + Send + 'a>> {
        Box::pin(async move {
            if let Ok(mut count) = self.requests.lock() {
                *count += 1;
            }
            tokio::task::yield_now().await;
            let key = (owner.to_string(), repo.to_string(), tag.to_string());
            Ok(self.releases.get(&key).cloned())
        })
    }
}

/// A `canonical/chisel` release with linux amd64 and arm64 assets and a checksum table
/// in its notes.
#[must_use]
pub fn chisel_release(tag: &str) -> GitHubRelease {
    let assets: Vec<ReleaseAsset> = ["amd64", "arm64"]
        .iter()
        .map(|arch| {
            let name = format!("chisel_{tag}_linux_{arch}.tar.gz");
            ReleaseAsset {
                browser_download_url: format!(
                    "https://github.com/canonical/chisel/releases/download/{tag}/{name}"
                ),
                name,
            }
        })
        .collect();

    let mut body = String::from("## Checksums\n\n| File | SHA256 |\n| --- | --- |\n");
    for (asset, fill) in assets.iter().zip(['a', 'b']) {
        body.push_str(&format!("| {} | {} |\n", asset.name, fill.to_string().repeat(64)));
    }

    GitHubRelease {
        tag_name: tag.to_string(),
        body: Some(body),
        assets,
    }
}

/// A manifest document whose `variables` section holds `pairs`, formatted the way the
/// real file is (two-space indent, one variable per line).
#[must_use]
pub fn manifest_json(pairs: &[(&str, &str)]) -> String {
    let mut variables = serde_json::Map::new();
    for (name, value) in pairs {
        variables.insert((*name).to_string(), serde_json::Value::String((*value).to_string()));
    }
    let document = serde_json::json!({ "variables": variables });
    let mut text = serde_json::to_string_pretty(&document).unwrap_or_default();
    text.push('\n');
    text
}
