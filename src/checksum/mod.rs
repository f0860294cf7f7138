//! Checksum resolution for downloadable artifacts.
//!
//! Given an artifact URL, [`ChecksumService::resolve`] tries these sources in order and
//! returns the first lower-case hex SHA-512 digest found:
//!
//! 1. a local checksums file, looked up by the URL's file name
//! 2. the release checksums listing of the runtime version (SDK and ASP.NET artifacts)
//! 3. the release checksums listing of the artifact's own build version
//! 4. the release checksums listing of the shortened preview version
//! 5. the sidecar `.sha512`/`.sha` file in the checksums storage account
//! 6. downloading the artifact and hashing it
//!
//! Sources 2-4 are only consulted for artifacts served from a public release base URL.
//! A network failure inside a source counts as "not found" for that source.
//!
//! Results are cached by URL for the lifetime of the service, including misses, and each
//! checksums listing is downloaded at most once. Concurrent lookups of the same URL or
//! listing wait for the first one instead of fetching again.

pub mod fetcher;
pub mod parse;
pub mod url;

use anyhow::{Context, Result};
use dashmap::DashMap;
use futures::future::join_all;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::version::preview_version;

pub use fetcher::{FetchFuture, Fetcher, HttpFetcher, sha512_hex};
pub use parse::ChecksumTable;
pub use url::{
    RELEASE_BASE_URLS, file_name, is_release_base_url, release_checksums_url,
    sidecar_checksum_url,
};

/// What the resolver knows about an artifact besides its URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumRequest {
    /// Artifact download URL
    pub url: String,
    /// Product the artifact belongs to (`runtime`, `sdk`, `aspnet-composite`, ...)
    pub product: String,
    /// Build version of the artifact's product
    pub build_version: Option<String>,
    /// Runtime build version the artifact ships with
    pub runtime_version: Option<String>,
    /// Base URL the artifact is served from
    pub base_url: Option<String>,
}

impl ChecksumRequest {
    pub fn new(url: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            product: product.into(),
            ..Self::default()
        }
    }

    pub fn with_build_version(mut self, version: impl Into<String>) -> Self {
        self.build_version = Some(version.into());
        self
    }

    pub fn with_runtime_version(mut self, version: impl Into<String>) -> Self {
        self.runtime_version = Some(version.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn is_sdk(&self) -> bool {
        self.product.starts_with("sdk")
    }

    /// SDK and ASP.NET artifacts are listed in the runtime's release checksums.
    fn listed_with_runtime(&self) -> bool {
        self.product.starts_with("sdk") || self.product.starts_with("aspnet")
    }

    fn release_base(&self) -> Option<&str> {
        self.base_url.as_deref().filter(|b| is_release_base_url(b))
    }
}

/// Resolves and caches artifact checksums.
pub struct ChecksumService {
    fetcher: Arc<dyn Fetcher>,
    checksums_file: Option<PathBuf>,
    compute_shas: bool,
    /// URL -> digest, `None` records a miss
    by_url: DashMap<String, Arc<OnceCell<Option<String>>>>,
    /// Checksums listing URL -> parsed table, `None` records a missing listing
    tables: DashMap<String, Arc<OnceCell<Option<Arc<ChecksumTable>>>>>,
    local_table: OnceCell<Arc<ChecksumTable>>,
}

impl ChecksumService {
    /// Creates a service that computes digests as a last resort and uses no local file.
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            checksums_file: None,
            compute_shas: true,
            by_url: DashMap::new(),
            tables: DashMap::new(),
            local_table: OnceCell::new(),
        }
    }

    /// Uses a local checksums file as the first source.
    pub fn with_checksums_file(mut self, path: Option<PathBuf>) -> Self {
        self.checksums_file = path;
        self
    }

    /// Enables or disables downloading artifacts to hash them.
    pub fn with_compute_shas(mut self, compute_shas: bool) -> Self {
        self.compute_shas = compute_shas;
        self
    }

    /// Returns the cached result for `url`, if it has been resolved before.
    #[must_use]
    pub fn cached(&self, url: &str) -> Option<Option<String>> {
        self.by_url.get(url).and_then(|entry| entry.value().get().cloned())
    }

    /// Resolves the checksum of the artifact described by `request`.
    ///
    /// # Errors
    ///
    /// Only a configured local checksums file that cannot be read is an error. Every
    /// other failure results in `Ok(None)`.
    pub async fn resolve(&self, request: &ChecksumRequest) -> Result<Option<String>> {
        let cell = self.by_url.entry(request.url.clone()).or_default().value().clone();
        if let Some(cached) = cell.get() {
            debug!("Checksum cache hit for {}", request.url);
            return Ok(cached.clone());
        }

        let digest = cell.get_or_try_init(|| self.resolve_uncached(request)).await?;
        Ok(digest.clone())
    }

    /// Resolves several artifacts concurrently.
    ///
    /// Requests for the same URL are collapsed; results come back in first-seen order.
    pub async fn resolve_batch(
        &self,
        requests: &[ChecksumRequest],
    ) -> Result<Vec<(String, Option<String>)>> {
        let mut seen = HashSet::new();
        let unique: Vec<&ChecksumRequest> =
            requests.iter().filter(|r| seen.insert(r.url.as_str())).collect();

        let results = join_all(unique.iter().map(|request| self.resolve(request))).await;

        unique
            .into_iter()
            .zip(results)
            .map(|(request, result)| result.map(|digest| (request.url.clone(), digest)))
            .collect()
    }

    async fn resolve_uncached(&self, request: &ChecksumRequest) -> Result<Option<String>> {
        let name = file_name(&request.url);

        if let Some(table) = self.local_table().await? {
            if let Some(digest) = table.get(name) {
                debug!("Found checksum for {name} in local checksums file");
                return Ok(Some(digest.to_string()));
            }
        }

        if let Some(base) = request.release_base() {
            for version in release_listing_versions(request) {
                let listing = release_checksums_url(base, &version);
                if let Some(digest) = self.lookup_listing(&listing, name).await {
                    debug!("Found checksum for {name} in {listing}");
                    return Ok(Some(digest));
                }
            }
        }

        let sidecar = sidecar_checksum_url(&request.url, request.is_sdk());
        if let Some(digest) = self.fetch_sidecar(&sidecar).await {
            debug!("Found checksum for {name} in {sidecar}");
            return Ok(Some(digest));
        }

        if self.compute_shas {
            match self.fetcher.compute_sha512(&request.url).await {
                Ok(Some(digest)) => return Ok(Some(digest)),
                Ok(None) => debug!("Artifact not found: {}", request.url),
                Err(e) => warn!("Failed to download {} for hashing: {e:#}", request.url),
            }
        }

        Ok(None)
    }

    async fn local_table(&self) -> Result<Option<Arc<ChecksumTable>>> {
        let Some(path) = &self.checksums_file else {
            return Ok(None);
        };

        let table = self
            .local_table
            .get_or_try_init(|| async {
                let content = tokio::fs::read_to_string(path).await.with_context(|| {
                    format!("Failed to read checksums file: {}", path.display())
                })?;
                let table = ChecksumTable::parse(&content);
                debug!("Loaded {} checksums from {}", table.len(), path.display());
                Ok::<_, anyhow::Error>(Arc::new(table))
            })
            .await?;

        Ok(Some(Arc::clone(table)))
    }

    async fn lookup_listing(&self, listing_url: &str, file: &str) -> Option<String> {
        let cell = self.tables.entry(listing_url.to_string()).or_default().value().clone();
        let table = cell
            .get_or_init(|| async {
                match self.fetcher.fetch_text(listing_url).await {
                    Ok(Some(content)) => Some(Arc::new(ChecksumTable::parse(&content))),
                    Ok(None) => None,
                    Err(e) => {
                        debug!("Checksums listing unavailable at {listing_url}: {e:#}");
                        None
                    }
                }
            })
            .await;

        table.as_ref().and_then(|t| t.get(file).map(str::to_string))
    }

    async fn fetch_sidecar(&self, sidecar_url: &str) -> Option<String> {
        match self.fetcher.fetch_text(sidecar_url).await {
            Ok(Some(content)) => {
                let token = content.split_whitespace().next()?.to_lowercase();
                if is_hex_digest(&token) {
                    Some(token)
                } else {
                    warn!("Ignoring sidecar checksum with unexpected content at {sidecar_url}");
                    None
                }
            }
            Ok(None) => None,
            Err(e) => {
                debug!("Sidecar checksum unavailable at {sidecar_url}: {e:#}");
                None
            }
        }
    }
}

/// Versions whose release checksums listings may contain the artifact, in lookup order.
fn release_listing_versions(request: &ChecksumRequest) -> Vec<String> {
    let mut versions: Vec<String> = Vec::new();
    let mut push = |v: &str| {
        if !v.is_empty() && !versions.iter().any(|existing| existing == v) {
            versions.push(v.to_string());
        }
    };

    if request.listed_with_runtime()
        && let Some(runtime) = &request.runtime_version
    {
        push(runtime);
    }
    if let Some(build) = &request.build_version {
        push(build);
    }
    let preview_source = request.runtime_version.as_ref().or(request.build_version.as_ref());
    if let Some(preview) = preview_source.and_then(|v| preview_version(v)) {
        push(&preview);
    }

    versions
}

fn is_hex_digest(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_hexdigit())
}
