//! URL helpers for checksum lookups.

/// Base URLs of public .NET releases. Release checksum files are only published under these.
pub const RELEASE_BASE_URLS: [&str; 2] =
    ["https://dotnetcli.azureedge.net/dotnet", "https://dotnetcli.blob.core.windows.net/dotnet"];

const CDN_HOST: &str = "dotnetcli.azureedge.net";
const BLOB_HOST: &str = "dotnetcli.blob.core.windows.net";

/// Returns `true` if `base_url` is one of [`RELEASE_BASE_URLS`] (a trailing `/` is ignored).
#[must_use]
pub fn is_release_base_url(base_url: &str) -> bool {
    let trimmed = base_url.trim_end_matches('/');
    RELEASE_BASE_URLS.iter().any(|b| b.eq_ignore_ascii_case(trimmed))
}

/// URL of the release checksums listing for `version`.
#[must_use]
pub fn release_checksums_url(base_url: &str, version: &str) -> String {
    format!("{}/checksums/{version}-sha.txt", base_url.trim_end_matches('/'))
}

/// Last path segment of a URL, ignoring any query string or fragment.
#[must_use]
pub fn file_name(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let path = &url[..end];
    path.rsplit('/').next().unwrap_or(path)
}

/// URL of the sidecar checksum file published next to an artifact in binary storage.
///
/// The CDN host is mapped to the blob host, `dotnetcli` storage becomes
/// `dotnetclichecksums`, and `/public/` or `/internal/` containers gain a `-checksums`
/// suffix. Internal and non-SDK artifacts use `.sha512`, public SDK artifacts use `.sha`.
#[must_use]
pub fn sidecar_checksum_url(artifact_url: &str, is_sdk: bool) -> String {
    let (path, query) = match artifact_url.find('?') {
        Some(i) => artifact_url.split_at(i),
        None => (artifact_url, ""),
    };

    let is_internal = path.contains("/internal/");
    let url = path
        .replace(CDN_HOST, BLOB_HOST)
        .replace("://dotnetcli.", "://dotnetclichecksums.")
        .replace("/public/", "/public-checksums/")
        .replace("/internal/", "/internal-checksums/");

    let suffix = if is_internal || !is_sdk { ".sha512" } else { ".sha" };
    format!("{url}{suffix}{query}")
}
