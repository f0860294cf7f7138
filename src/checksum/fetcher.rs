//! Network access used by the checksum resolver.
//!
//! The resolver never talks to `reqwest` directly. It goes through [`Fetcher`], which
//! lets tests substitute an in-memory implementation that counts requests.

use anyhow::{Context, Result};
use sha2::{Digest, Sha512};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

use crate::constants::USER_AGENT;
use crate::core::UpdateError;

/// Boxed future returned by [`Fetcher`] methods.
pub type FetchFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// HTTP capability needed for checksum resolution.
///
/// Both methods return `Ok(None)` when the resource does not exist (HTTP 404) and an
/// error for every other failure.
pub trait Fetcher: Send + Sync {
    /// Downloads `url` as text.
    fn fetch_text<'a>(&'a self, url: &'a str) -> FetchFuture<'a, Option<String>>;

    /// Downloads `url` and returns the lower-case hex SHA-512 of its bytes.
    fn compute_sha512<'a>(&'a self, url: &'a str) -> FetchFuture<'a, Option<String>>;
}

/// Lower-case hex SHA-512 of `bytes`.
#[must_use]
pub fn sha512_hex(bytes: &[u8]) -> String {
    hex::encode(Sha512::digest(bytes))
}

/// [`Fetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_client(client))
    }

    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
        }
    }

    async fn get(&self, url: &str) -> Result<Option<reqwest::Response>> {
        let response = self.client.get(url).send().await.map_err(|e| UpdateError::NetworkError {
            operation: format!("GET {url}"),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("Not found: {url}");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(UpdateError::NetworkError {
                operation: format!("GET {url}"),
                reason: format!("HTTP {status}"),
            }
            .into());
        }

        Ok(Some(response))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_text<'a>(&'a self, url: &'a str) -> FetchFuture<'a, Option<String>> {
        Box::pin(async move {
            let Some(response) = self.get(url).await? else {
                return Ok(None);
            };

            let text = response
                .text()
                .await
                .with_context(|| format!("Failed to read response body from {url}"))?;
            Ok(Some(text))
        })
    }

    fn compute_sha512<'a>(&'a self, url: &'a str) -> FetchFuture<'a, Option<String>> {
        Box::pin(async move {
            let Some(mut response) = self.get(url).await? else {
                return Ok(None);
            };

            debug!("Computing SHA512 of {url}");
            let mut hasher = Sha512::new();
            let mut total = 0usize;
            while let Some(chunk) = response
                .chunk()
                .await
                .with_context(|| format!("Failed to download {url}"))?
            {
                total += chunk.len();
                hasher.update(&chunk);
            }

            debug!("Hashed {total} bytes from {url}");
            Ok(Some(hex::encode(hasher.finalize())))
        })
    }
}
