//! avsrt Common Utilities
//!
//! Shared infrastructure for all avsrt crates:
//! - Error types and result aliases
//! - Canonical JSON artifacts, content hashing and atomic file writes
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod json;
pub mod logging;

pub use config::*;
pub use error::*;
pub use json::*;
