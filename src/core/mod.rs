//! Core types shared across update-dependencies
//!
//! Currently this is the error layer: [`UpdateError`] for typed failures and
//! [`ErrorContext`] / [`user_friendly_error`] for presenting them on the command line.

pub mod error;

pub use error::{ErrorContext, UpdateError, user_friendly_error};
