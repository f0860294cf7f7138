//! Resolve checksums for a batch of artifact URLs.
//!
//! Uses the same lookup chain as the manifest updater. URLs are resolved concurrently.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::checksum::ChecksumRequest;
use crate::config::UpdateConfig;
use crate::core::UpdateError;
use crate::updater::UpdateEngine;

#[derive(Args, Debug, Clone)]
pub struct ChecksumCommand {
    /// Artifact URLs
    #[arg(required = true)]
    urls: Vec<String>,

    /// Product the artifacts belong to; `sdk` selects SDK checksum naming
    #[arg(long, default_value = "runtime")]
    product: String,

    /// Build version of the artifacts, used to find release checksum listings
    #[arg(long)]
    build_version: Option<String>,

    /// Local file of `<sha512> <filename>` lines consulted before the network
    #[arg(long)]
    checksums_file: Option<PathBuf>,

    /// Never download artifacts to compute checksums
    #[arg(long)]
    no_compute_shas: bool,
}

impl ChecksumCommand {
    fn requests(&self, base_url: &str) -> Vec<ChecksumRequest> {
        self.urls
            .iter()
            .map(|url| {
                let mut request = ChecksumRequest::new(url.as_str(), self.product.as_str())
                    .with_base_url(base_url);
                if let Some(version) = &self.build_version {
                    request = request.with_build_version(version.as_str());
                }
                request
            })
            .collect()
    }

    pub async fn execute(self, mut config: UpdateConfig) -> Result<()> {
        if let Some(path) = &self.checksums_file {
            config.checksums_file = Some(path.clone());
        }
        if self.no_compute_shas {
            config.compute_shas = false;
        }

        let base_url = config.default_base_url();
        let engine = UpdateEngine::from_config(config)?;
        let results = engine.checksums().resolve_batch(&self.requests(&base_url)).await?;

        let mut missing = 0;
        for (url, digest) in &results {
            match digest {
                Some(digest) => println!("{digest}  {url}"),
                None => {
                    missing += 1;
                    eprintln!("{} no checksum found for {url}", "error:".red().bold());
                }
            }
        }

        if missing > 0 {
            return Err(UpdateError::RunFailed {
                count: missing,
            }
            .into());
        }
        Ok(())
    }
}
