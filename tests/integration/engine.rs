use std::sync::Arc;

use update_dependencies::checksum::release_checksums_url;
use update_dependencies::config::UpdateConfig;
use update_dependencies::dependencies::{DependencyInfo, DependencySet};
use update_dependencies::manifest::ManifestDocument;
use update_dependencies::test_utils::{MockFetcher, MockReleaseSource, chisel_release};
use update_dependencies::updater::{RunOptions, UpdateEngine};

use crate::common::{MANIFEST_9_0, TestProject};

const RELEASE_BASE: &str = "https://dotnetcli.azureedge.net/dotnet";
const X64_DIGEST: &str = "1111111111111111111111111111111111111111111111111111111111111111";
const ARM64_DIGEST: &str = "2222222222222222222222222222222222222222222222222222222222222222";

fn deps(pairs: &[(&str, &str)]) -> DependencySet {
    pairs.iter().map(|(name, version)| DependencyInfo::new(*name, *version)).collect()
}

fn runtime_listing() -> (String, String) {
    let url = release_checksums_url(RELEASE_BASE, "9.0.1");
    let body = format!(
        "Hash: SHA512\n\
         {X64_DIGEST} dotnet-runtime-9.0.1-linux-x64.tar.gz\n\
         {ARM64_DIGEST} dotnet-runtime-9.0.1-linux-arm64.tar.gz\n"
    );
    (url, body)
}

struct Fixture {
    fetcher: Arc<MockFetcher>,
    releases: Arc<MockReleaseSource>,
    engine: UpdateEngine,
}

impl Fixture {
    fn new(config: UpdateConfig) -> Self {
        let (listing, body) = runtime_listing();
        let fetcher = Arc::new(MockFetcher::new().with_text(listing, body));
        let releases = Arc::new(
            MockReleaseSource::new().with_release("canonical", "chisel", chisel_release("v1.1.0")),
        );
        let engine = UpdateEngine::new(config, fetcher.clone(), releases.clone());
        Self {
            fetcher,
            releases,
            engine,
        }
    }
}

#[tokio::test]
async fn test_runtime_update_end_to_end() {
    let project = TestProject::new().unwrap();
    project.write_manifest(MANIFEST_9_0).unwrap();

    let fixture = Fixture::new(UpdateConfig::default());
    let mut document = ManifestDocument::load(&project.manifest_path()).await.unwrap();
    let dependencies = deps(&[("runtime", "9.0.1"), ("chisel", "v1.1.0")]);
    let report =
        fixture.engine.run(&mut document, &dependencies, RunOptions::default()).await.unwrap();

    assert!(report.errors.is_empty(), "unexpected errors: {:?}", report.errors);
    let changed: Vec<&str> = report.updates.iter().map(|u| u.variable_name.as_str()).collect();
    assert_eq!(
        changed,
        vec![
            "runtime|9.0|build-version",
            "runtime|9.0|product-version",
            "runtime|9.0|linux|arm64|sha",
            "runtime|9.0|linux|x64|sha",
            "chisel|9.0|ref",
            "chisel|9.0|x64|url",
            "chisel|9.0|x64|sha",
        ]
    );

    let saved = project.read_manifest().unwrap();
    assert_eq!(saved, document.text());
    assert!(saved.contains(r#""runtime|9.0|build-version": "9.0.1","#));
    assert!(saved.contains(&format!(r#""runtime|9.0|linux|x64|sha": "{X64_DIGEST}","#)));
    assert!(saved.contains(&format!(r#""runtime|9.0|linux|arm64|sha": "{ARM64_DIGEST}","#)));
    assert!(saved.contains(r#""chisel|9.0|ref": "v1.1.0","#));
    assert!(saved.contains("chisel_v1.1.0_linux_amd64.tar.gz"));

    // untouched content survives byte for byte
    assert!(saved.contains(r#""readme": "Versions are managed by update-dependencies.","#));
    assert!(saved.contains(r#""sdk|9.0|build-version": "9.0.100","#));
    assert!(saved.contains(r#""dotnet|9.0|product-version": "$(runtime|9.0|product-version)","#));

    // both runtime checksums come from one listing download, the chisel values from one
    // release lookup
    assert_eq!(fixture.fetcher.total_requests(), 1);
    assert_eq!(fixture.releases.request_count(), 1);

    let message = report.commit_message();
    assert!(message.starts_with("Update chisel to v1.1.0, runtime to 9.0.1\n\n"));
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let fixture = Fixture::new(UpdateConfig::default());
    let dependencies = deps(&[("runtime", "9.0.1"), ("chisel", "v1.1.0")]);

    let mut document = ManifestDocument::parse(MANIFEST_9_0).unwrap();
    let first =
        fixture.engine.run(&mut document, &dependencies, RunOptions::default()).await.unwrap();
    assert!(first.has_changes());
    let after_first = document.text().to_string();

    let second =
        fixture.engine.run(&mut document, &dependencies, RunOptions::default()).await.unwrap();
    assert!(!second.has_changes());
    assert!(second.errors.is_empty());
    assert_eq!(document.text(), after_first);
}

#[tokio::test]
async fn test_tools_wait_for_runtime_change() {
    let fixture = Fixture::new(UpdateConfig::default());
    let mut document = ManifestDocument::parse(MANIFEST_9_0).unwrap();

    // runtime absent: chisel stays put even though a newer chisel is provided
    let sdk_only = deps(&[("sdk", "9.0.101"), ("chisel", "v1.1.0")]);
    let report =
        fixture.engine.run(&mut document, &sdk_only, RunOptions::default()).await.unwrap();

    assert!(report.updates.iter().all(|u| !u.variable_name.starts_with("chisel|")));
    assert_eq!(document.variables().raw_value("chisel|9.0|ref"), Some("v1.0.0"));
    assert_eq!(fixture.releases.request_count(), 0);

    // runtime provided at its current version: still no tool update
    let same_runtime = deps(&[("runtime", "9.0.0"), ("chisel", "v1.1.0")]);
    let report =
        fixture.engine.run(&mut document, &same_runtime, RunOptions::default()).await.unwrap();
    assert!(report.updates.iter().all(|u| !u.variable_name.starts_with("chisel|")));
}

#[tokio::test]
async fn test_references_are_never_overwritten() {
    let config = UpdateConfig {
        base_url: Some("https://ci.dot.net/public".to_string()),
        ..UpdateConfig::default()
    };
    let fixture = Fixture::new(config);
    let mut document = ManifestDocument::parse(MANIFEST_9_0).unwrap();

    let report = fixture
        .engine
        .run(&mut document, &deps(&[("runtime", "9.0.1")]), RunOptions::default())
        .await
        .unwrap();

    assert!(report.updates.iter().all(|u| u.variable_name != "base-url|9.0|nightly"));
    assert_eq!(
        document.variables().raw_value("base-url|9.0|nightly"),
        Some("$(base-url|public|nightly)")
    );
    assert_eq!(
        document.variables().raw_value("dotnet|9.0|product-version"),
        Some("$(runtime|9.0|product-version)")
    );
    // and the reference now resolves to the updated value
    assert_eq!(document.variables().get_value("dotnet|9.0|product-version").unwrap(), "9.0.1");
}

#[tokio::test]
async fn test_unresolved_checksum_is_reported_and_kept() {
    let fetcher = Arc::new(MockFetcher::new());
    let engine = UpdateEngine::new(
        UpdateConfig {
            compute_shas: false,
            ..UpdateConfig::default()
        },
        fetcher,
        Arc::new(MockReleaseSource::new()),
    );
    let mut document = ManifestDocument::parse(MANIFEST_9_0).unwrap();

    let dependencies = deps(&[("runtime", "9.0.1")]);
    let report = engine.run(&mut document, &dependencies, RunOptions::default()).await.unwrap();

    assert!(report.has_errors());
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors.iter().any(|e| e.contains("runtime|9.0|linux|x64|sha")));
    assert_eq!(document.variables().raw_value("runtime|9.0|linux|x64|sha"), Some("0000"));
    // version updates still went through
    assert_eq!(document.variables().raw_value("runtime|9.0|build-version"), Some("9.0.1"));
}

#[tokio::test]
async fn test_dry_run_leaves_file_untouched() {
    let project = TestProject::new().unwrap();
    project.write_manifest(MANIFEST_9_0).unwrap();

    let fixture = Fixture::new(UpdateConfig::default());
    let mut document = ManifestDocument::load(&project.manifest_path()).await.unwrap();
    let report = fixture
        .engine
        .run(
            &mut document,
            &deps(&[("runtime", "9.0.1")]),
            RunOptions {
                dry_run: true,
            },
        )
        .await
        .unwrap();

    assert!(report.has_changes());
    assert_ne!(document.text(), MANIFEST_9_0);
    assert_eq!(project.read_manifest().unwrap(), MANIFEST_9_0);
}

#[tokio::test]
async fn test_other_dockerfile_versions_are_ignored() {
    let manifest = r#"{
  "variables": {
    "runtime|8.0|build-version": "8.0.10",
    "runtime|9.0|build-version": "9.0.0"
  }
}"#;
    let fixture = Fixture::new(UpdateConfig::default());
    let mut document = ManifestDocument::parse(manifest).unwrap();

    let report = fixture
        .engine
        .run(&mut document, &deps(&[("runtime", "9.0.1")]), RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.updates.len(), 1);
    assert_eq!(document.variables().raw_value("runtime|8.0|build-version"), Some("8.0.10"));
}
