//! Integration test suite for update-dependencies
//!
//! End-to-end runs of the update engine over manifest files, the command-line binary,
//! and the HTTP clients against a local mock server.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **engine**: Full runs with in-memory network seams
//! - **cli**: The `update-dependencies` binary
//! - **http**: `HttpFetcher` and `GitHubReleaseClient` against `mockito`

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cli;
mod engine;
mod http;
