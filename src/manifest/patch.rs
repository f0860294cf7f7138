//! Formatting-preserving edits of a single manifest variable.
//!
//! The manifest is a hand-maintained JSON file. Re-serialising it would reorder keys and
//! reflow whitespace, so updates are applied textually: find `"name": "value"` and
//! replace only the characters of the value.

use anyhow::Result;
use regex::Regex;

use crate::core::UpdateError;

/// A compiled edit for one variable.
#[derive(Debug, Clone)]
pub struct DocumentPatch {
    name: String,
    pattern: Regex,
}

impl DocumentPatch {
    /// Builds the pattern `"<name>"\s*:\s*"<value>"` for `name`.
    pub fn new(name: &str) -> Result<Self> {
        let pattern = format!(r#""{}"\s*:\s*"(?<value>(?:[^"\\]|\\.)*)""#, regex::escape(name));
        Ok(Self {
            name: name.to_string(),
            pattern: Regex::new(&pattern)?,
        })
    }

    /// Returns the variable name this patch targets.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw (still JSON-escaped) value currently in `text`, if the pair exists.
    #[must_use]
    pub fn current_value<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.pattern.captures(text).and_then(|c| c.name("value")).map(|m| m.as_str())
    }

    /// Rewrites the first occurrence of the variable's value to `desired`.
    ///
    /// Returns `Ok(None)` when the text already holds `desired`, so applying the same
    /// patch twice leaves the document byte-for-byte unchanged.
    ///
    /// # Errors
    ///
    /// [`UpdateError::VariablePatternNotFound`] if the pair is not in `text`. Keys are
    /// never added.
    pub fn apply(&self, text: &str, desired: &str) -> Result<Option<String>> {
        let value = self
            .pattern
            .captures(text)
            .and_then(|c| c.name("value"))
            .ok_or_else(|| UpdateError::VariablePatternNotFound {
                name: self.name.clone(),
            })?;

        let encoded = encode_json_string(desired)?;
        if value.as_str() == encoded {
            return Ok(None);
        }

        let mut patched = String::with_capacity(text.len() + encoded.len());
        patched.push_str(&text[..value.start()]);
        patched.push_str(&encoded);
        patched.push_str(&text[value.end()..]);
        Ok(Some(patched))
    }
}

/// JSON-encodes `value` as the body of a string literal (without the quotes).
fn encode_json_string(value: &str) -> Result<String> {
    let quoted = serde_json::to_string(value)?;
    Ok(quoted[1..quoted.len() - 1].to_string())
}
