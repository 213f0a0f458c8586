//! Deployment-config file model for the synthesis CLI.
//!
//! Only the fields the synthesizer needs; everything optional carries a
//! serde default so a minimal config stays minimal.

use crate::bootstrap::BootstrapOptions;
use crate::server::ServerOptions;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Top-level synthesis config.
#[derive(Debug, Deserialize)]
pub struct SynthConfig {
    /// Deployment name; falls back to `DEPLOYMENT_NAME` when omitted.
    #[serde(default)]
    pub deployment: Option<String>,
    pub server: ServerSection,
    pub bootstrap: BootstrapSection,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default)]
    pub db_name: Option<String>,
    #[serde(default)]
    pub snapshot: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(default)]
    pub engine_version: Option<String>,
    #[serde(default)]
    pub deletion_protect: bool,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct BootstrapSection {
    /// Logical id of the bootstrap construct.
    #[serde(default = "default_bootstrap_id")]
    pub id: String,
    pub dbname: String,
    pub username: String,
    #[serde(default)]
    pub read_only_username: Option<String>,
    #[serde(default = "default_secrets_prefix")]
    pub secrets_prefix: String,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    pub handler: HandlerSection,
}

#[derive(Debug, Deserialize)]
pub struct HandlerSection {
    pub name: String,
    pub version: String,
}

fn default_engine() -> String {
    "postgres".to_string()
}

fn default_bootstrap_id() -> String {
    "app-db".to_string()
}

fn default_secrets_prefix() -> String {
    "deploy/db".to_string()
}

impl SynthConfig {
    /// Load and parse a config file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&content).context("Failed to parse synthesis config")
    }
}

impl ServerSection {
    pub fn to_options(&self) -> ServerOptions {
        ServerOptions {
            db_name: self.db_name.clone(),
            snapshot: self.snapshot.clone(),
            identifier: self.identifier.clone(),
            engine: self.engine.clone(),
            engine_version: self.engine_version.clone(),
            deletion_protect: self.deletion_protect,
            address: self.address.clone(),
            port: self.port,
        }
    }
}

impl BootstrapSection {
    pub fn to_options(&self) -> BootstrapOptions {
        let mut options =
            BootstrapOptions::new(&self.dbname, &self.username, &self.secrets_prefix);
        options.engine = self.engine.clone();
        options.read_only_username = self.read_only_username.clone();
        options.port = self.port;
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parses_with_defaults() {
        let config: SynthConfig = serde_yaml::from_str(
            r#"
deployment: myapp-staging
server:
  db_name: app
bootstrap:
  dbname: app
  username: app_user
  handler:
    name: bootstrap-fn
    version: v1
"#,
        )
        .unwrap();

        assert_eq!(config.deployment.as_deref(), Some("myapp-staging"));
        assert_eq!(config.server.engine, "postgres");
        assert!(!config.server.deletion_protect);
        assert_eq!(config.bootstrap.id, "app-db");
        assert_eq!(config.bootstrap.secrets_prefix, "deploy/db");
        assert_eq!(config.bootstrap.read_only_username, None);
    }

    #[test]
    fn test_missing_handler_is_an_error() {
        let result: std::result::Result<SynthConfig, _> = serde_yaml::from_str(
            r#"
server:
  db_name: app
bootstrap:
  dbname: app
  username: app_user
"#,
        );
        assert!(result.is_err());
    }
}
