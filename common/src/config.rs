//! Environment variable parsing helpers
//!
//! Provides ergonomic helpers for reading configuration from environment
//! variables.

use anyhow::{Context, Result};
use std::env;

/// Extension trait for parsing environment variables.
///
/// Provides convenient methods for reading env vars with defaults,
/// optional values, and required values.
pub trait ConfigExt {
    /// Get an environment variable with a default value.
    ///
    /// # Example
    /// ```ignore
    /// let env_name = String::env_or("DEPLOYMENT_ENV", "production");
    /// ```
    fn env_or(name: &str, default: &str) -> String {
        env::var(name).unwrap_or_else(|_| default.to_string())
    }

    /// Get an environment variable if it is set and non-empty.
    fn env_opt(name: &str) -> Option<String> {
        env::var(name).ok().filter(|v| !v.is_empty())
    }

    /// Get a required environment variable, returning an error if not set.
    ///
    /// # Example
    /// ```ignore
    /// let name = String::env_required("DEPLOYMENT_NAME")?;
    /// ```
    fn env_required(name: &str) -> Result<String> {
        env::var(name).context(format!("{} must be set", name))
    }
}

// Blanket implementation for all types
impl<T> ConfigExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back_to_default() {
        assert_eq!(String::env_or("DB_BOOTSTRAP_TEST_UNSET", "fallback"), "fallback");
    }

    #[test]
    fn test_env_opt_treats_empty_as_unset() {
        env::set_var("DB_BOOTSTRAP_TEST_EMPTY", "");
        assert_eq!(String::env_opt("DB_BOOTSTRAP_TEST_EMPTY"), None);
    }

    #[test]
    fn test_env_required_reports_missing_variable() {
        let err = String::env_required("DB_BOOTSTRAP_TEST_MISSING").unwrap_err();
        assert!(err.to_string().contains("DB_BOOTSTRAP_TEST_MISSING"));
    }
}
