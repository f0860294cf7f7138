//! Cross-cutting utilities.
//!
//! - [`fs`] - atomic file writes used when saving the manifest

pub mod fs;

pub use fs::{atomic_write, safe_write};
