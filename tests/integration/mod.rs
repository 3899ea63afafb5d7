//! Integration test suite for tsupdate
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli**: argument validation and the `version` command through the
//!   built binary
//! - **fetch**: the reqwest-backed fetcher against a local HTTP server
//!   (version metadata, checksum sidecar, artifact download)

mod cli;
mod fetch;
