//! Error handling for update-dependencies
//!
//! This module provides the error types and user-friendly error reporting used by the
//! update engine and its command line front-end. The error system follows two principles:
//! 1. **Strongly-typed errors** so callers can react to specific failures
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`UpdateError`] - Enumerated error types for every failure the engine reports
//! - [`ErrorContext`] - Wrapper that adds suggestions and details for display
//!
//! # Error Categories
//!
//! - **Manifest**: [`UpdateError::MissingVariable`], [`UpdateError::MissingManifestSection`],
//!   [`UpdateError::CircularReference`], [`UpdateError::VariablePatternNotFound`]
//! - **Checksums and network**: [`UpdateError::ChecksumUnresolved`], [`UpdateError::NetworkError`]
//! - **Input**: [`UpdateError::InvalidDependency`], [`UpdateError::InvalidVersion`],
//!   [`UpdateError::ConfigError`]
//!
//! Common library errors convert automatically:
//! - [`std::io::Error`] → [`UpdateError::IoError`]
//! - [`serde_json::Error`] → [`UpdateError::JsonError`]
//! - [`toml::de::Error`] → [`UpdateError::TomlError`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use update_dependencies::core::{UpdateError, user_friendly_error};
//!
//! let err = UpdateError::MissingVariable {
//!     name: "runtime|9.0|build-version".to_string(),
//! };
//! user_friendly_error(anyhow::Error::from(err)).display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for update-dependencies operations
///
/// Each variant carries enough context (variable names, URLs, file names) to tell the
/// user which manifest entry or remote resource caused the failure.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// A variable was requested that the manifest does not define
    #[error("Variable '{name}' is not defined in the manifest")]
    MissingVariable {
        /// Name of the missing variable
        name: String,
    },

    /// The manifest JSON has no section with the given key
    #[error("Manifest has no '{section}' section")]
    MissingManifestSection {
        /// The section key that was expected
        section: String,
    },

    /// Resolving `$(name)` references looped back to a variable already being resolved
    #[error("Circular variable reference: {chain}")]
    CircularReference {
        /// The reference chain, e.g. `a -> b -> a`
        chain: String,
    },

    /// The textual `"name": "value"` pattern for a variable could not be found in the document
    #[error("Could not find the pattern for variable '{name}' in the manifest text")]
    VariablePatternNotFound {
        /// Name of the variable whose pattern was not found
        name: String,
    },

    /// The manifest document is not valid JSON or has an unexpected shape
    #[error("Failed to parse manifest {file}: {reason}")]
    ManifestParseError {
        /// Path or description of the manifest
        file: String,
        /// Why parsing failed
        reason: String,
    },

    /// None of the checksum strategies produced a digest for a URL
    #[error("Could not resolve a checksum for '{variable}' from {url}")]
    ChecksumUnresolved {
        /// Variable that needed the checksum
        variable: String,
        /// The last URL tried
        url: String,
    },

    /// A network request failed for a reason other than "not found"
    #[error("Network error during {operation}: {reason}")]
    NetworkError {
        /// What was being fetched
        operation: String,
        /// Underlying failure
        reason: String,
    },

    /// Configuration is missing or inconsistent
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// A `name=version` dependency argument could not be parsed
    #[error("Invalid dependency '{name}': {reason}")]
    InvalidDependency {
        /// The raw input
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// A version string has no usable numeric `major.minor.patch` prefix
    #[error("Invalid version: {version}")]
    InvalidVersion {
        /// The version string that failed to parse
        version: String,
    },

    /// An update run finished but recorded errors
    #[error("Update run finished with {count} error(s)")]
    RunFailed {
        /// Number of errors recorded during the run
        count: usize,
    },

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Generic error for cases not covered by specific variants
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl Clone for UpdateError {
    fn clone(&self) -> Self {
        match self {
            Self::MissingVariable {
                name,
            } => Self::MissingVariable {
                name: name.clone(),
            },
            Self::MissingManifestSection {
                section,
            } => Self::MissingManifestSection {
                section: section.clone(),
            },
            Self::CircularReference {
                chain,
            } => Self::CircularReference {
                chain: chain.clone(),
            },
            Self::VariablePatternNotFound {
                name,
            } => Self::VariablePatternNotFound {
                name: name.clone(),
            },
            Self::ManifestParseError {
                file,
                reason,
            } => Self::ManifestParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::ChecksumUnresolved {
                variable,
                url,
            } => Self::ChecksumUnresolved {
                variable: variable.clone(),
                url: url.clone(),
            },
            Self::NetworkError {
                operation,
                reason,
            } => Self::NetworkError {
                operation: operation.clone(),
                reason: reason.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            Self::InvalidDependency {
                name,
                reason,
            } => Self::InvalidDependency {
                name: name.clone(),
                reason: reason.clone(),
            },
            Self::InvalidVersion {
                version,
            } => Self::InvalidVersion {
                version: version.clone(),
            },
            Self::RunFailed {
                count,
            } => Self::RunFailed {
                count: *count,
            },
            // For errors that don't implement Clone, convert to Other
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::JsonError(e) => Self::Other {
                message: format!("JSON error: {e}"),
            },
            Self::TomlError(e) => Self::Other {
                message: format!("TOML parsing error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error with user-facing suggestion and details
///
/// When displayed, the error message is printed in red, details in yellow and the
/// suggestion in green.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: UpdateError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: UpdateError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] suitable for printing to the user
///
/// Known [`UpdateError`] variants get tailored suggestions. I/O and TOML errors get a
/// generic hint, and everything else is shown with its full `Caused by` chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(update_error) = error.downcast_ref::<UpdateError>() {
        return create_error_context(update_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(UpdateError::Other {
                    message: format!("Permission denied: {error:#}"),
                })
                .with_suggestion("Check that the manifest file is writable by the current user");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(UpdateError::Other {
                    message: format!("File not found: {error:#}"),
                })
                .with_suggestion("Check that the manifest path is correct (see --manifest)");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(UpdateError::ConfigError {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax in your configuration file")
        .with_details("Read from --config, UPDATE_DEPS_CONFIG_PATH or ~/.update-deps/config.toml");
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();

    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(UpdateError::Other {
        message,
    })
}

fn create_error_context(error: UpdateError) -> ErrorContext {
    let (suggestion, details): (Option<String>, Option<&str>) = match &error {
        UpdateError::MissingVariable { name } => (
            Some(format!("Add '{name}' to the \"variables\" section of the manifest")),
            Some("Every variable discovered by an updater must exist before it can be updated"),
        ),
        UpdateError::MissingManifestSection { .. } => (
            Some("The manifest must be a JSON object with a top-level \"variables\" object".into()),
            Some("Only string values are supported inside \"variables\""),
        ),
        UpdateError::CircularReference { .. } => (
            Some("Replace one of the $(name) references in the cycle with a literal value".into()),
            None,
        ),
        UpdateError::VariablePatternNotFound { .. } => (
            Some("Make sure the variable is written as \"name\": \"value\" in the manifest".into()),
            Some("Manifest edits are applied textually so formatting and comments are preserved"),
        ),
        UpdateError::ManifestParseError { file, .. } => {
            (Some(format!("Check the JSON syntax in {file}")), None)
        }
        UpdateError::ChecksumUnresolved { .. } => (
            Some("Pass --checksums-file or check the URL templates in the configuration".into()),
            Some("Hashing the artifact is the last resort; see --no-compute-shas"),
        ),
        UpdateError::NetworkError { .. } => (
            Some("Check your internet connection and retry".into()),
            Some("A 404 means 'not found'; any other failure status is a network error"),
        ),
        UpdateError::ConfigError { .. } => (
            Some("Pass --dockerfile-version or a runtime, aspnet or sdk version".into()),
            None,
        ),
        UpdateError::InvalidDependency { .. } => (
            Some("Use the form NAME=VERSION, for example --product-version runtime=9.0.0".into()),
            None,
        ),
        UpdateError::InvalidVersion { .. } => {
            (Some("Versions must start with a numeric major.minor.patch triple".into()), None)
        }
        UpdateError::RunFailed { .. } => (
            None,
            Some("Variables that could not be updated kept their current values"),
        ),
        UpdateError::JsonError(_) => (Some("Check the JSON syntax of the manifest".into()), None),
        UpdateError::IoError(_) | UpdateError::TomlError(_) | UpdateError::Other { .. } => {
            (None, None)
        }
    };

    let mut ctx = ErrorContext::new(error);
    if let Some(suggestion) = suggestion {
        ctx = ctx.with_suggestion(suggestion);
    }
    if let Some(details) = details {
        ctx = ctx.with_details(details);
    }
    ctx
}
