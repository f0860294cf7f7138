//! Resolvers for version and base-url variables.

use super::{ResolveFuture, Resolution, UpdateContext, ValueResolver};
use crate::version::derive_tag_version;

/// `{product}|{dfv}|build-version`: the dependency's build version as given.
#[derive(Debug, Clone)]
pub struct BuildVersionResolver {
    product: String,
}

impl BuildVersionResolver {
    pub fn new(product: impl Into<String>) -> Self {
        Self {
            product: product.into(),
        }
    }
}

impl ValueResolver for BuildVersionResolver {
    fn resolve<'a>(&'a self, ctx: &'a UpdateContext<'a>) -> ResolveFuture<'a> {
        Box::pin(async move {
            let name = ctx.config.dependency_for(&self.product);
            Ok(ctx
                .dependencies
                .get(name)
                .map(|dep| Resolution::new(dep.version.clone(), vec![dep.clone()])))
        })
    }
}

/// `{product}|{dfv}|product-version`: the tag version derived from the build version.
#[derive(Debug, Clone)]
pub struct ProductVersionResolver {
    product: String,
}

impl ProductVersionResolver {
    pub fn new(product: impl Into<String>) -> Self {
        Self {
            product: product.into(),
        }
    }
}

impl ValueResolver for ProductVersionResolver {
    fn resolve<'a>(&'a self, ctx: &'a UpdateContext<'a>) -> ResolveFuture<'a> {
        Box::pin(async move {
            let name = ctx.config.dependency_for(&self.product);
            Ok(ctx
                .dependencies
                .get(name)
                .map(|dep| Resolution::new(derive_tag_version(&dep.version), vec![dep.clone()])))
        })
    }
}

/// `base-url|{dfv}|{branch}`: the configured base URL, when the run sets one.
///
/// Base URL changes come from configuration rather than a product, so they carry no
/// dependencies.
#[derive(Debug, Clone, Default)]
pub struct BaseUrlResolver;

impl ValueResolver for BaseUrlResolver {
    fn resolve<'a>(&'a self, ctx: &'a UpdateContext<'a>) -> ResolveFuture<'a> {
        Box::pin(async move {
            Ok(ctx.config.desired_base_url().map(|url| Resolution::new(url, Vec::new())))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::ChecksumService;
    use crate::config::UpdateConfig;
    use crate::dependencies::{DependencyInfo, DependencySet};
    use crate::manifest::VariableStore;
    use crate::release::ReleaseCache;
    use crate::test_utils::{MockFetcher, MockReleaseSource};
    use crate::updater::Diagnostics;
    use std::sync::Arc;

    async fn resolve_with(
        resolver: &dyn ValueResolver,
        config: &UpdateConfig,
        deps: &DependencySet,
    ) -> Option<Resolution> {
        let store = VariableStore::default();
        let checksums = ChecksumService::new(Arc::new(MockFetcher::new()));
        let releases = ReleaseCache::new(Arc::new(MockReleaseSource::new()));
        let diagnostics = Diagnostics::default();
        let ctx = UpdateContext {
            config,
            dependencies: deps,
            dockerfile_version: "9.0",
            variables: &store,
            baseline: &store,
            checksums: &checksums,
            releases: &releases,
            diagnostics: &diagnostics,
        };
        resolver.resolve(&ctx).await.unwrap()
    }

    #[tokio::test]
    async fn test_build_and_product_version() {
        let config = UpdateConfig::default();
        let deps: DependencySet =
            [DependencyInfo::new("aspnet", "9.0.0-rc.2.24474.3")].into_iter().collect();

        let build =
            resolve_with(&BuildVersionResolver::new("aspnet"), &config, &deps).await.unwrap();
        assert_eq!(build.value, "9.0.0-rc.2.24474.3");
        assert_eq!(build.used, vec![DependencyInfo::new("aspnet", "9.0.0-rc.2.24474.3")]);

        let product =
            resolve_with(&ProductVersionResolver::new("aspnet"), &config, &deps).await.unwrap();
        assert_eq!(product.value, "9.0.0-rc");

        // aspnet-composite is versioned by the aspnet dependency
        let composite =
            resolve_with(&BuildVersionResolver::new("aspnet-composite"), &config, &deps).await;
        assert_eq!(composite.unwrap().value, "9.0.0-rc.2.24474.3");
    }

    #[tokio::test]
    async fn test_missing_dependency_resolves_nothing() {
        let config = UpdateConfig::default();
        let deps = DependencySet::new();
        assert!(resolve_with(&BuildVersionResolver::new("sdk"), &config, &deps).await.is_none());
        assert!(resolve_with(&ProductVersionResolver::new("sdk"), &config, &deps).await.is_none());
    }

    #[tokio::test]
    async fn test_base_url() {
        let deps = DependencySet::new();
        let mut config = UpdateConfig::default();
        assert!(resolve_with(&BaseUrlResolver, &config, &deps).await.is_none());

        config.base_url = Some("https://ci.dot.net/public".to_string());
        let resolved = resolve_with(&BaseUrlResolver, &config, &deps).await.unwrap();
        assert_eq!(resolved.value, "https://ci.dot.net/public");
        assert!(resolved.used.is_empty());
    }
}
