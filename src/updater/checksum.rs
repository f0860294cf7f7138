//! Resolver for artifact checksum variables (`{product}|{dfv}|{os}|{arch}|sha`).
//!
//! The artifact URL is built from the product's URL templates. Each template is a
//! candidate; the first one whose checksum resolves wins. A candidate that fails is a
//! warning unless it is the last one, in which case the failure is recorded as a run
//! error and the variable keeps its current value.

use tracing::{debug, error, warn};

use super::{ResolveFuture, Resolution, UpdateContext, ValueResolver};
use crate::checksum::ChecksumRequest;
use crate::core::UpdateError;
use crate::version::derive_tag_version;

/// Values substituted into URL templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateValues<'a> {
    pub base_url: &'a str,
    pub build_version: &'a str,
    pub product_version: &'a str,
    pub os: &'a str,
    pub arch: &'a str,
}

impl TemplateValues<'_> {
    fn archive_ext(&self) -> &'static str {
        if self.os.starts_with("win") { "zip" } else { "tar.gz" }
    }

    /// Substitutes the `$PLACEHOLDER` tokens of `template`.
    #[must_use]
    pub fn expand(&self, template: &str) -> String {
        template
            .replace("$DOTNET_BASE_URL", self.base_url.trim_end_matches('/'))
            .replace("$VERSION_DIR", self.build_version)
            .replace("$VERSION_FILE", self.build_version)
            .replace("$PRODUCT_VERSION", self.product_version)
            .replace("$ARCHIVE_EXT", self.archive_ext())
            .replace("$OS", self.os)
            .replace("$ARCH", self.arch)
    }
}

#[derive(Debug, Clone)]
pub struct ChecksumResolver {
    variable: String,
    product: String,
    os: String,
    arch: String,
}

impl ChecksumResolver {
    pub fn new(
        variable: impl Into<String>,
        product: impl Into<String>,
        os: impl Into<String>,
        arch: impl Into<String>,
    ) -> Self {
        Self {
            variable: variable.into(),
            product: product.into(),
            os: os.into(),
            arch: arch.into(),
        }
    }

    fn candidate_urls(&self, ctx: &UpdateContext<'_>, build_version: &str) -> Vec<String> {
        let Some(templates) = ctx.config.url_templates_for(&self.product) else {
            return Vec::new();
        };

        let base_url = ctx.base_url();
        let product_version = derive_tag_version(build_version);
        let values = TemplateValues {
            base_url: &base_url,
            build_version,
            product_version: &product_version,
            os: &self.os,
            arch: &self.arch,
        };

        let mut urls: Vec<String> = Vec::with_capacity(templates.len());
        for template in &templates {
            let url = values.expand(template);
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        urls
    }
}

impl ValueResolver for ChecksumResolver {
    fn resolve<'a>(&'a self, ctx: &'a UpdateContext<'a>) -> ResolveFuture<'a> {
        Box::pin(async move {
            let name = ctx.config.dependency_for(&self.product);
            let Some(dependency) = ctx.dependencies.get(name) else {
                return Ok(None);
            };

            let urls = self.candidate_urls(ctx, &dependency.version);
            let base_url = ctx.base_url();
            let runtime_version = ctx.runtime_version();

            for (index, url) in urls.iter().enumerate() {
                let mut request = ChecksumRequest::new(url.as_str(), self.product.as_str())
                    .with_build_version(dependency.version.as_str())
                    .with_base_url(base_url.as_str());
                if let Some(runtime) = &runtime_version {
                    request = request.with_runtime_version(runtime.as_str());
                }

                debug!("Resolving checksum for {} from {url}", self.variable);
                if let Some(digest) = ctx.checksums.resolve(&request).await? {
                    return Ok(Some(Resolution::new(digest, vec![dependency.clone()])));
                }

                if index + 1 < urls.len() {
                    warn!("No checksum for {} at {url}, trying next candidate", self.variable);
                    ctx.diagnostics.warning(format!("No checksum for {} at {url}", self.variable));
                } else {
                    let err = UpdateError::ChecksumUnresolved {
                        variable: self.variable.clone(),
                        url: url.clone(),
                    };
                    error!("{err}");
                    ctx.diagnostics.error(err.to_string());
                }
            }

            Ok(None)
        })
    }
}
