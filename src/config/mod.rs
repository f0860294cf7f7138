//! Configuration for update runs.
//!
//! Settings are read from a TOML file and then overridden by command line flags. The
//! file is located in this order:
//!
//! 1. the `--config` flag
//! 2. the `UPDATE_DEPS_CONFIG_PATH` environment variable
//! 3. `~/.update-deps/config.toml` (`%LOCALAPPDATA%\update-deps\config.toml` on Windows)
//!
//! A missing file is not an error; every field has a default.
//!
//! # File Format
//!
//! ```toml
//! branch = "nightly"
//! release_state = false
//! checksums_file = "checksums.txt"
//! compute_shas = true
//! http_timeout_secs = 300
//!
//! [url_templates]
//! monitor = [
//!     "$DOTNET_BASE_URL/diagnostics/monitor/$VERSION_DIR/dotnet-monitor-$VERSION_FILE-$OS-$ARCH.$ARCHIVE_EXT",
//! ]
//!
//! [product_aliases]
//! aspnet-composite = "aspnet"
//!
//! [[tools]]
//! name = "chisel"
//! owner = "canonical"
//! repo = "chisel"
//! asset_pattern = '^chisel_{version}_linux_{arch}\.tar\.gz$'
//! gated_on = "runtime"
//! arch_aliases = { x64 = "amd64", arm32 = "arm" }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::checksum::RELEASE_BASE_URLS;
use crate::constants::{CONFIG_PATH_ENV, DEFAULT_BRANCH, DEFAULT_HTTP_TIMEOUT_SECS};

/// Settings for one update run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// `major.minor` version whose variables are updated.
    ///
    /// Derived from the runtime, aspnet or sdk version when absent.
    #[serde(default)]
    pub dockerfile_version: Option<String>,

    /// Branch segment of the `base-url|{dfv}|{branch}` variable.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Explicit base URL to write into the base-url variable.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Point the base URL at the public release storage.
    #[serde(default)]
    pub release_state: bool,

    /// Use the internal base URL.
    #[serde(default)]
    pub internal: bool,

    /// Base URL used when `internal` is set.
    #[serde(default)]
    pub internal_base_url: Option<String>,

    /// Local `<digest> <filename>` listing consulted before any network lookup.
    #[serde(default)]
    pub checksums_file: Option<PathBuf>,

    /// Download artifacts to hash them when no published checksum is found.
    #[serde(default = "default_compute_shas")]
    pub compute_shas: bool,

    /// Timeout for each HTTP request, in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Artifact URL templates per product, tried in order. Products not listed here fall
    /// back to the built-in templates.
    #[serde(default)]
    pub url_templates: BTreeMap<String, Vec<String>>,

    /// Maps a product name to the dependency that versions it.
    #[serde(default = "default_product_aliases")]
    pub product_aliases: BTreeMap<String, String>,

    /// Tools fetched from GitHub releases.
    #[serde(default = "default_tools")]
    pub tools: Vec<ToolConfig>,
}

/// A tool whose `ref`, `url` and `sha` variables come from GitHub releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Product name used in variable keys and as the dependency name
    pub name: String,
    /// GitHub repository owner
    pub owner: String,
    /// GitHub repository name
    pub repo: String,
    /// Regex matching the release asset, with `{version}` and `{arch}` placeholders
    pub asset_pattern: String,
    /// Product whose build version must be changing for the tool to update
    #[serde(default = "default_gated_on")]
    pub gated_on: String,
    /// Architecture names as they appear in asset names (`x64 -> amd64`)
    #[serde(default)]
    pub arch_aliases: BTreeMap<String, String>,
}

impl ToolConfig {
    /// Asset architecture name for a manifest architecture segment.
    #[must_use]
    pub fn asset_arch<'a>(&'a self, arch: &'a str) -> &'a str {
        self.arch_aliases.get(arch).map_or(arch, String::as_str)
    }
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_compute_shas() -> bool {
    true
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_gated_on() -> String {
    "runtime".to_string()
}

fn default_product_aliases() -> BTreeMap<String, String> {
    BTreeMap::from([("aspnet-composite".to_string(), "aspnet".to_string())])
}

fn default_tools() -> Vec<ToolConfig> {
    vec![ToolConfig {
        name: "chisel".to_string(),
        owner: "canonical".to_string(),
        repo: "chisel".to_string(),
        asset_pattern: r"^chisel_{version}_linux_{arch}\.tar\.gz$".to_string(),
        gated_on: default_gated_on(),
        arch_aliases: BTreeMap::from([
            ("x64".to_string(), "amd64".to_string()),
            ("arm32".to_string(), "arm".to_string()),
        ]),
    }]
}

/// Built-in artifact URL templates: the build-version file name first, then the
/// product-version file name used by stable releases.
fn builtin_url_templates(product: &str) -> Option<Vec<String>> {
    let (dir, file) = match product {
        "runtime" => ("Runtime", "dotnet-runtime"),
        "aspnet" => ("aspnetcore/Runtime", "aspnetcore-runtime"),
        "aspnet-composite" => ("aspnetcore/Runtime", "aspnetcore-runtime-composite"),
        "sdk" => ("Sdk", "dotnet-sdk"),
        "monitor" => ("diagnostics/monitor", "dotnet-monitor"),
        _ => return None,
    };

    Some(vec![
        format!("$DOTNET_BASE_URL/{dir}/$VERSION_DIR/{file}-$VERSION_FILE-$OS-$ARCH.$ARCHIVE_EXT"),
        format!("$DOTNET_BASE_URL/{dir}/$VERSION_DIR/{file}-$PRODUCT_VERSION-$OS-$ARCH.$ARCHIVE_EXT"),
    ])
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            dockerfile_version: None,
            branch: default_branch(),
            base_url: None,
            release_state: false,
            internal: false,
            internal_base_url: None,
            checksums_file: None,
            compute_shas: default_compute_shas(),
            http_timeout_secs: default_http_timeout_secs(),
            url_templates: BTreeMap::new(),
            product_aliases: default_product_aliases(),
            tools: default_tools(),
        }
    }
}

impl UpdateConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from the default location, falling back to defaults.
    pub async fn load() -> Result<Self> {
        Self::load_with_optional(None).await
    }

    /// Loads configuration from `path` if given, else from the default location.
    ///
    /// A file that does not exist yields the default configuration.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => match Self::default_path() {
                Ok(path) => path,
                Err(_) => return Ok(Self::default()),
            },
        };

        if path.exists() {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// The configuration file location, honouring `UPDATE_DEPS_CONFIG_PATH`.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
            && !path.is_empty()
        {
            return Ok(PathBuf::from(path));
        }

        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("update-deps")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".update-deps")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// The base URL the base-url variable should hold, if this run changes it.
    ///
    /// Internal builds take precedence, then an explicit override, then the public release
    /// storage when `release_state` is set.
    #[must_use]
    pub fn desired_base_url(&self) -> Option<String> {
        if self.internal
            && let Some(internal) = &self.internal_base_url
        {
            return Some(internal.clone());
        }
        if let Some(base_url) = &self.base_url {
            return Some(base_url.clone());
        }
        if self.release_state {
            return Some(RELEASE_BASE_URLS[0].to_string());
        }
        None
    }

    /// Fallback base URL when the manifest has no base-url variable for this run.
    #[must_use]
    pub fn default_base_url(&self) -> String {
        self.desired_base_url().unwrap_or_else(|| RELEASE_BASE_URLS[0].to_string())
    }

    /// Dependency name that versions `product` (`aspnet-composite -> aspnet`).
    #[must_use]
    pub fn dependency_for<'a>(&'a self, product: &'a str) -> &'a str {
        self.product_aliases.get(product).map_or(product, String::as_str)
    }

    /// URL templates for `product`, configured ones first, built-in otherwise.
    #[must_use]
    pub fn url_templates_for(&self, product: &str) -> Option<Vec<String>> {
        self.url_templates
            .get(product)
            .filter(|templates| !templates.is_empty())
            .cloned()
            .or_else(|| builtin_url_templates(product))
    }

    /// The tool configuration named `name`.
    #[must_use]
    pub fn tool(&self, name: &str) -> Option<&ToolConfig> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = UpdateConfig::new();
        assert_eq!(config.branch, "nightly");
        assert!(config.compute_shas);
        assert_eq!(config.dependency_for("aspnet-composite"), "aspnet");
        assert_eq!(config.dependency_for("runtime"), "runtime");
        assert!(config.tool("chisel").is_some());
        assert_eq!(config.desired_base_url(), None);
    }

    #[test]
    fn test_desired_base_url_precedence() {
        let mut config = UpdateConfig::new();
        config.release_state = true;
        assert_eq!(config.desired_base_url().as_deref(), Some(RELEASE_BASE_URLS[0]));

        config.base_url = Some("https://ci.dot.net/public".to_string());
        assert_eq!(config.desired_base_url().as_deref(), Some("https://ci.dot.net/public"));

        config.internal = true;
        assert_eq!(config.desired_base_url().as_deref(), Some("https://ci.dot.net/public"));

        config.internal_base_url = Some("https://ci.dot.net/internal".to_string());
        assert_eq!(config.desired_base_url().as_deref(), Some("https://ci.dot.net/internal"));
    }

    #[test]
    fn test_url_templates_fall_back_to_builtin() {
        let mut config = UpdateConfig::new();
        let builtin = config.url_templates_for("runtime").unwrap();
        assert_eq!(builtin.len(), 2);
        assert!(builtin[0].contains("dotnet-runtime-$VERSION_FILE"));
        assert!(config.url_templates_for("unknown").is_none());

        config
            .url_templates
            .insert("runtime".to_string(), vec!["$DOTNET_BASE_URL/custom.tar.gz".to_string()]);
        assert_eq!(
            config.url_templates_for("runtime").unwrap(),
            vec!["$DOTNET_BASE_URL/custom.tar.gz".to_string()]
        );
    }

    #[test]
    fn test_tool_arch_aliases() {
        let config = UpdateConfig::new();
        let chisel = config.tool("chisel").unwrap();
        assert_eq!(chisel.asset_arch("x64"), "amd64");
        assert_eq!(chisel.asset_arch("arm64"), "arm64");
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
dockerfile_version = "8.0"
release_state = true
compute_shas = false

[url_templates]
monitor = ["$DOTNET_BASE_URL/monitor/$VERSION_FILE.zip"]
"#,
        )
        .unwrap();

        let config = UpdateConfig::load_with_optional(Some(path)).await.unwrap();
        assert_eq!(config.dockerfile_version.as_deref(), Some("8.0"));
        assert!(config.release_state);
        assert!(!config.compute_shas);
        assert_eq!(config.branch, "nightly");
        assert_eq!(config.tools.len(), 1);
        assert_eq!(
            config.url_templates_for("monitor").unwrap(),
            vec!["$DOTNET_BASE_URL/monitor/$VERSION_FILE.zip".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config =
            UpdateConfig::load_with_optional(Some(temp.path().join("absent.toml"))).await.unwrap();
        assert_eq!(config, UpdateConfig::default());
    }

    #[tokio::test]
    async fn test_invalid_toml_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "branch = [").unwrap();

        let err = UpdateConfig::load_from(&path).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[tokio::test]
    #[serial]
    async fn test_config_path_env_override() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        std::fs::write(&path, "branch = \"main\"\n").unwrap();

        // SAFETY: serialized with every other test touching this variable
        unsafe { std::env::set_var(CONFIG_PATH_ENV, &path) };
        let resolved = UpdateConfig::default_path();
        let loaded = UpdateConfig::load().await;
        unsafe { std::env::remove_var(CONFIG_PATH_ENV) };

        assert_eq!(resolved.unwrap(), path);
        assert_eq!(loaded.unwrap().branch, "main");
    }
}
