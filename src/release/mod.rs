//! GitHub releases for tools bundled into images.
//!
//! Tools such as `chisel` are pulled from GitHub releases. A tool's `url` variable comes
//! from the release asset whose name matches a pattern, and its `sha` variable comes from
//! the checksum table the project publishes in the release notes.

use anyhow::{Context, Result};
use dashmap::DashMap;
use regex::Regex;
use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::constants::{GITHUB_API_BASE, USER_AGENT};
use crate::core::UpdateError;

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// The parts of a GitHub release the tool updaters need.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitHubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl GitHubRelease {
    /// First asset whose name matches `pattern`.
    #[must_use]
    pub fn find_asset(&self, pattern: &Regex) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| pattern.is_match(&asset.name))
    }

    /// Looks up the digest listed for `asset_name` in the release body.
    ///
    /// Both markdown tables (`| name | digest |`) and `<digest> <name>` lines are
    /// understood. A digest is a hex token of at least 32 characters; backticks and
    /// emphasis markers around tokens are ignored.
    #[must_use]
    pub fn checksum_for(&self, asset_name: &str) -> Option<String> {
        let body = self.body.as_deref()?;

        body.lines().find_map(|line| {
            let tokens: Vec<&str> = line
                .split(|c: char| c == '|' || c.is_whitespace())
                .map(|t| t.trim_matches(|c: char| c == '`' || c == '*'))
                .filter(|t| !t.is_empty())
                .collect();

            if !tokens.contains(&asset_name) {
                return None;
            }
            tokens.iter().find(|t| is_digest_token(t)).map(|t| t.to_lowercase())
        })
    }
}

fn is_digest_token(token: &str) -> bool {
    token.len() >= 32 && token.chars().all(|c| c.is_ascii_hexdigit())
}

/// Source of GitHub releases.
pub trait ReleaseSource: Send + Sync {
    /// Fetches the release tagged `tag`, or `None` if there is no such release.
    fn release_by_tag<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
        tag: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<GitHubRelease>>> + Send + 'a>>;
}

/// [`ReleaseSource`] backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubReleaseClient {
    client: reqwest::Client,
    api_base: String,
}

impl GitHubReleaseClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: GITHUB_API_BASE.to_string(),
        })
    }

    /// Points the client at a different API endpoint (GitHub Enterprise, test servers).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

impl ReleaseSource for GitHubReleaseClient {
    fn release_by_tag<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
        tag: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<GitHubRelease>>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{}/repos/{owner}/{repo}/releases/tags/{tag}", self.api_base);
            debug!("Fetching release {owner}/{repo}@{tag}");

            let response = self
                .client
                .get(&url)
                .header(reqwest::header::ACCEPT, "application/vnd.github+json")
                .send()
                .await
                .map_err(|e| UpdateError::NetworkError {
                    operation: format!("fetch release {owner}/{repo}@{tag}"),
                    reason: e.to_string(),
                })?;

            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !status.is_success() {
                return Err(UpdateError::NetworkError {
                    operation: format!("fetch release {owner}/{repo}@{tag}"),
                    reason: format!("HTTP {status}"),
                }
                .into());
            }

            let release = response
                .json::<GitHubRelease>()
                .await
                .with_context(|| format!("Failed to parse release {owner}/{repo}@{tag}"))?;
            Ok(Some(release))
        })
    }
}

type ReleaseKey = (String, String, String);

/// Caches releases per `(owner, repo, tag)` for the duration of a run.
pub struct ReleaseCache {
    source: Arc<dyn ReleaseSource>,
    releases: DashMap<ReleaseKey, Arc<OnceCell<Option<Arc<GitHubRelease>>>>>,
}

impl ReleaseCache {
    pub fn new(source: Arc<dyn ReleaseSource>) -> Self {
        Self {
            source,
            releases: DashMap::new(),
        }
    }

    /// Returns the release, fetching it on first use.
    ///
    /// A failed fetch is not cached; the next call tries again.
    pub async fn get(
        &self,
        owner: &str,
        repo: &str,
        tag: &str,
    ) -> Result<Option<Arc<GitHubRelease>>> {
        let key = (owner.to_string(), repo.to_string(), tag.to_string());
        let cell = self.releases.entry(key).or_default().value().clone();

        let release = cell
            .get_or_try_init(|| async {
                let release = self.source.release_by_tag(owner, repo, tag).await?;
                Ok::<_, anyhow::Error>(release.map(Arc::new))
            })
            .await?;
        Ok(release.clone())
    }
}
