//! Global constants used throughout the update-dependencies codebase.
//!
//! Variable key suffixes, well-known product names and network defaults live here so
//! the updater discovery code and the checksum resolver agree on them.

/// Name of the JSON object in the manifest that holds all variables.
pub const VARIABLES_SECTION: &str = "variables";

/// Default manifest file name, relative to the working directory.
pub const DEFAULT_MANIFEST_FILE: &str = "manifest.versions.json";

/// Separator between the segments of a variable key (`runtime|9.0|build-version`).
pub const KEY_SEPARATOR: char = '|';

/// Suffix of build-version variables.
pub const BUILD_VERSION_SUFFIX: &str = "build-version";

/// Suffix of product-version variables.
pub const PRODUCT_VERSION_SUFFIX: &str = "product-version";

/// Prefix of base-url variables (`base-url|9.0|nightly`).
pub const BASE_URL_PREFIX: &str = "base-url";

/// Suffix of artifact checksum variables.
pub const CHECKSUM_SUFFIX: &str = "sha";

/// Suffix of tool reference variables.
pub const TOOL_REF_SUFFIX: &str = "ref";

/// Suffix of tool download URL variables.
pub const TOOL_URL_SUFFIX: &str = "url";

/// Products whose versions can stand in for the Dockerfile version, in priority order.
pub const DOCKERFILE_VERSION_PRODUCTS: [&str; 3] = ["runtime", "aspnet", "sdk"];

/// Default branch segment used in `base-url|{dfv}|{branch}` keys.
pub const DEFAULT_BRANCH: &str = "nightly";

/// Default GitHub REST API endpoint.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// User agent sent with every HTTP request.
pub const USER_AGENT: &str = concat!("update-dependencies/", env!("CARGO_PKG_VERSION"));

/// Default HTTP request timeout in seconds.
///
/// Artifact downloads for checksum computation can be several hundred megabytes.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

/// Environment variable that overrides the configuration file location.
pub const CONFIG_PATH_ENV: &str = "UPDATE_DEPS_CONFIG_PATH";
