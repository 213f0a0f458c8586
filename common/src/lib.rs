//! Shared utilities for the db-bootstrap workspace
//!
//! This crate provides functionality used across the synthesis crates:
//! - Structured logging initialization
//! - Environment variable parsing helpers

pub mod config;
pub mod logging;

pub use config::ConfigExt;
pub use logging::init_logging;
