//! The manifest variable store.
//!
//! Variables live in the `"variables"` object of the manifest. Values are plain strings
//! that may embed references to other variables as `$(other-key)`. The store keeps the
//! raw values and resolves references on demand.

use anyhow::Result;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::constants::VARIABLES_SECTION;
use crate::core::UpdateError;

/// Matches a single `$(name)` reference.
static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\((?<name>[\w:\-.|]+)\)").expect("reference pattern is valid")
});

/// Matches a value that is entirely a reference expression.
static WHOLE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\(.*\)$").expect("whole reference pattern is valid"));

/// Returns `true` if `value` is a reference expression such as `$(runtime|9.0|build-version)`.
///
/// Updaters never overwrite such values: the referenced variable is updated instead.
#[must_use]
pub fn is_reference(value: &str) -> bool {
    WHOLE_REFERENCE.is_match(value)
}

/// In-memory view of the manifest's variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableStore {
    values: BTreeMap<String, String>,
}

impl VariableStore {
    /// Builds a store from a parsed manifest document.
    ///
    /// # Errors
    ///
    /// - [`UpdateError::MissingManifestSection`] when there is no `variables` object
    /// - [`UpdateError::ManifestParseError`] when a variable value is not a string
    pub fn from_json(document: &Value, source: &str) -> Result<Self> {
        let section = document
            .get(VARIABLES_SECTION)
            .and_then(Value::as_object)
            .ok_or_else(|| UpdateError::MissingManifestSection {
                section: VARIABLES_SECTION.to_string(),
            })?;

        let mut values = BTreeMap::new();
        for (key, value) in section {
            let Some(text) = value.as_str() else {
                return Err(UpdateError::ManifestParseError {
                    file: source.to_string(),
                    reason: format!("variable '{key}' is not a string"),
                }
                .into());
            };
            values.insert(key.clone(), text.to_string());
        }

        Ok(Self {
            values,
        })
    }

    /// Builds a store directly from key/value pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            values: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Returns the unresolved value of a variable.
    #[must_use]
    pub fn raw_value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Returns the value of a variable with all `$(...)` references resolved.
    ///
    /// # Errors
    ///
    /// [`UpdateError::MissingVariable`] if the variable (or anything it references) is not
    /// defined, [`UpdateError::CircularReference`] if the references form a cycle.
    pub fn get_value(&self, name: &str) -> Result<String> {
        let mut stack = Vec::new();
        self.resolve_variable(name, &mut stack)
    }

    /// Like [`get_value`](Self::get_value) but returns an empty string when the
    /// variable cannot be resolved.
    #[must_use]
    pub fn try_get_value(&self, name: &str) -> String {
        self.get_value(name).unwrap_or_default()
    }

    /// Resolves every `$(name)` reference in `raw`.
    ///
    /// The references are collected in a single scan of `raw`; each one is replaced by
    /// the fully resolved value of the referenced variable. Text produced by a
    /// substitution is not scanned again.
    pub fn resolve_references(&self, raw: &str) -> Result<String> {
        let mut stack = Vec::new();
        self.resolve_text(raw, &mut stack)
    }

    /// Returns `true` if the variable is defined.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterates over variable names in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replaces the raw value of an existing or new variable.
    ///
    /// Only the manifest document calls this, after the same value has been patched
    /// into the document text.
    pub(crate) fn set(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
    }

    fn resolve_variable(&self, name: &str, stack: &mut Vec<String>) -> Result<String> {
        if let Some(pos) = stack.iter().position(|n| n == name) {
            let mut chain: Vec<&str> = stack[pos..].iter().map(String::as_str).collect();
            chain.push(name);
            return Err(UpdateError::CircularReference {
                chain: chain.join(" -> "),
            }
            .into());
        }

        let raw = self.raw_value(name).ok_or_else(|| UpdateError::MissingVariable {
            name: name.to_string(),
        })?;

        stack.push(name.to_string());
        let resolved = self.resolve_text(raw, stack);
        stack.pop();
        resolved
    }

    fn resolve_text(&self, raw: &str, stack: &mut Vec<String>) -> Result<String> {
        let mut output = String::with_capacity(raw.len());
        let mut last = 0;

        for captures in REFERENCE.captures_iter(raw) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let name = &captures["name"];

            output.push_str(&raw[last..whole.start()]);
            output.push_str(&self.resolve_variable(name, stack)?);
            last = whole.end();
        }

        output.push_str(&raw[last..]);
        Ok(output)
    }
}
