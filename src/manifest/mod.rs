//! The versions manifest document.
//!
//! A manifest is a JSON file whose `"variables"` object maps pipe-delimited keys to
//! string values:
//!
//! ```json
//! {
//!   "variables": {
//!     "base-url|9.0|nightly": "$(base-url|public|nightly)",
//!     "runtime|9.0|build-version": "9.0.0-rc.2.24473.5",
//!     "runtime|9.0|linux|x64|sha": "..."
//!   }
//! }
//! ```
//!
//! [`ManifestDocument`] owns the raw text together with its parsed [`VariableStore`] and
//! keeps both in step: every update patches the text (see [`patch`]) and then records the
//! new value in the store.

pub mod patch;
pub mod variables;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::UpdateError;
use crate::utils::fs::safe_write;

pub use patch::DocumentPatch;
pub use variables::{VariableStore, is_reference};

/// A manifest's text and variables.
#[derive(Debug, Clone)]
pub struct ManifestDocument {
    path: Option<PathBuf>,
    text: String,
    variables: VariableStore,
}

impl ManifestDocument {
    /// Parses a manifest from text that is not backed by a file.
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        Self::from_text(None, text.into())
    }

    /// Loads a manifest from disk.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

        Self::from_text(Some(path.to_path_buf()), text)
    }

    fn from_text(path: Option<PathBuf>, text: String) -> Result<Self> {
        let source =
            path.as_ref().map_or_else(|| "<memory>".to_string(), |p| p.display().to_string());

        let document: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| UpdateError::ManifestParseError {
                file: source.clone(),
                reason: e.to_string(),
            })?;

        let variables = VariableStore::from_json(&document, &source)?;
        debug!("Loaded {} variables from {source}", variables.len());

        Ok(Self {
            path,
            text,
            variables,
        })
    }

    /// The file this manifest was loaded from, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The current document text, including any applied updates.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    /// Sets `name` to `desired` in both the text and the variable store.
    ///
    /// Returns `false` when the text already held that value.
    ///
    /// # Errors
    ///
    /// [`UpdateError::MissingVariable`] if the store has no such variable,
    /// [`UpdateError::VariablePatternNotFound`] if the text does not contain it.
    pub fn apply_update(&mut self, name: &str, desired: &str) -> Result<bool> {
        if !self.variables.contains(name) {
            return Err(UpdateError::MissingVariable {
                name: name.to_string(),
            }
            .into());
        }

        let patch = DocumentPatch::new(name)?;
        let Some(patched) = patch.apply(&self.text, desired)? else {
            return Ok(false);
        };

        self.text = patched;
        self.variables.set(name, desired);
        Ok(true)
    }

    /// Writes the current text back to the file the manifest was loaded from.
    ///
    /// Documents created with [`parse`](Self::parse) have nowhere to go; saving them is a no-op.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        safe_write(path, &self.text)
            .with_context(|| format!("Failed to save manifest: {}", path.display()))
    }
}
