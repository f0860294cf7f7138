//! HTTP clients against a local `mockito` server.

use std::sync::Arc;
use std::time::Duration;

use update_dependencies::checksum::{
    ChecksumRequest, ChecksumService, Fetcher, HttpFetcher, sha512_hex,
};
use update_dependencies::core::UpdateError;
use update_dependencies::release::{GitHubReleaseClient, ReleaseSource};

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(Duration::from_secs(10)).unwrap()
}

#[tokio::test]
async fn test_fetch_text_statuses() {
    let mut server = mockito::Server::new_async().await;
    let found = server
        .mock("GET", "/found.sha512")
        .with_status(200)
        .with_body("abc123  file")
        .create_async()
        .await;
    let missing = server.mock("GET", "/missing.sha512").with_status(404).create_async().await;
    let broken = server.mock("GET", "/broken.sha512").with_status(500).create_async().await;

    let fetcher = fetcher();
    let base = server.url();

    let text = fetcher.fetch_text(&format!("{base}/found.sha512")).await.unwrap();
    assert_eq!(text.as_deref(), Some("abc123  file"));

    assert!(fetcher.fetch_text(&format!("{base}/missing.sha512")).await.unwrap().is_none());

    let err = fetcher.fetch_text(&format!("{base}/broken.sha512")).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<UpdateError>(), Some(UpdateError::NetworkError { .. })));

    found.assert_async().await;
    missing.assert_async().await;
    broken.assert_async().await;
}

#[tokio::test]
async fn test_compute_sha512_hashes_body() {
    let mut server = mockito::Server::new_async().await;
    let body = vec![7u8; 64 * 1024];
    let artifact = server
        .mock("GET", "/dotnet-runtime.tar.gz")
        .with_status(200)
        .with_body(body.clone())
        .create_async()
        .await;

    let digest = fetcher()
        .compute_sha512(&format!("{}/dotnet-runtime.tar.gz", server.url()))
        .await
        .unwrap();

    assert_eq!(digest, Some(sha512_hex(&body)));
    artifact.assert_async().await;
}

#[tokio::test]
async fn test_service_falls_back_to_hashing_once() {
    let mut server = mockito::Server::new_async().await;
    let sidecar = server
        .mock("GET", "/Runtime/9.0.1/dotnet-runtime-9.0.1-linux-x64.tar.gz.sha512")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;
    let artifact = server
        .mock("GET", "/Runtime/9.0.1/dotnet-runtime-9.0.1-linux-x64.tar.gz")
        .with_status(200)
        .with_body("runtime bits")
        .expect(1)
        .create_async()
        .await;

    let service = ChecksumService::new(Arc::new(fetcher()));
    let request = ChecksumRequest::new(
        format!("{}/Runtime/9.0.1/dotnet-runtime-9.0.1-linux-x64.tar.gz", server.url()),
        "runtime",
    )
    .with_build_version("9.0.1")
    .with_base_url(server.url());

    let first = service.resolve(&request).await.unwrap();
    let second = service.resolve(&request).await.unwrap();

    assert_eq!(first, Some(sha512_hex(b"runtime bits")));
    assert_eq!(second, first);
    sidecar.assert_async().await;
    artifact.assert_async().await;
}

#[tokio::test]
async fn test_release_by_tag() {
    let mut server = mockito::Server::new_async().await;
    let release = server
        .mock("GET", "/repos/canonical/chisel/releases/tags/v1.1.0")
        .match_header("accept", "application/vnd.github+json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
  "tag_name": "v1.1.0",
  "body": "| chisel_v1.1.0_linux_amd64.tar.gz | 3f2a4c1e0b9d8e7f6a5b4c3d2e1f0a9b8c7d6e5f4a3b2c1d0e9f8a7b6c5d4e3f |",
  "draft": false,
  "assets": [
    {
      "name": "chisel_v1.1.0_linux_amd64.tar.gz",
      "browser_download_url": "https://github.com/canonical/chisel/releases/download/v1.1.0/chisel_v1.1.0_linux_amd64.tar.gz",
      "size": 4096
    }
  ]
}"#,
        )
        .create_async()
        .await;
    let missing = server
        .mock("GET", "/repos/canonical/chisel/releases/tags/v9.9.9")
        .with_status(404)
        .with_body(r#"{"message": "Not Found"}"#)
        .create_async()
        .await;

    let client =
        GitHubReleaseClient::new(Duration::from_secs(10)).unwrap().with_api_base(server.url());

    let found = client.release_by_tag("canonical", "chisel", "v1.1.0").await.unwrap().unwrap();
    assert_eq!(found.tag_name, "v1.1.0");
    assert_eq!(found.assets.len(), 1);
    assert_eq!(
        found.checksum_for("chisel_v1.1.0_linux_amd64.tar.gz").as_deref(),
        Some("3f2a4c1e0b9d8e7f6a5b4c3d2e1f0a9b8c7d6e5f4a3b2c1d0e9f8a7b6c5d4e3f")
    );

    assert!(client.release_by_tag("canonical", "chisel", "v9.9.9").await.unwrap().is_none());

    release.assert_async().await;
    missing.assert_async().await;
}
