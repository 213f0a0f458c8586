//! Database-server capability interface and the provisioning factory.
//!
//! The orchestrator never depends on a concrete server shape, only on the
//! [`DatabaseServer`] trait. Two concrete variants satisfy it: a fresh
//! instance provisioned with an initial database, and an instance restored
//! from a snapshot.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::json;
use synth::{
    Deployment, GeneratedSecret, GenerationPolicy, ResourceKind, ResourceRef, SecretArn,
    SecretHandle,
};
use tracing::info;

/// Default administrative username, matching what managed engines create.
const ADMIN_USERNAME: &str = "postgres";

/// Network endpoint a database listens on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

/// Capability interface every database-server variant satisfies.
pub trait DatabaseServer: std::fmt::Debug {
    /// Reference to the administrative secret, if one is attached.
    fn admin_secret(&self) -> Option<&SecretArn>;

    /// Engine identifier, if the server knows it.
    fn engine(&self) -> Option<&str>;

    /// Endpoint the server listens on.
    fn endpoint(&self) -> &Endpoint;

    /// Graph node for the server, when it was registered in this deployment.
    fn resource(&self) -> Option<&ResourceRef> {
        None
    }
}

/// Resolve the engine identifier from an explicit override or the server.
///
/// Fails fast when neither source supplies one; this is a configuration
/// error, not something to discover at provisioning time.
pub fn resolve_engine(explicit: Option<&str>, server: &dyn DatabaseServer) -> Result<String> {
    explicit
        .or_else(|| server.engine())
        .map(str::to_string)
        .ok_or(Error::MissingEngine)
}

/// Default listening port for an engine.
pub fn default_port(engine: &str) -> u16 {
    match engine {
        "mysql" | "mariadb" => 3306,
        _ => 5432,
    }
}

/// What happens to the server's storage when the definition is torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    Destroy,
    Snapshot,
}

/// Options for [`create_database_server`].
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Initial database name. Required unless restoring from a snapshot.
    pub db_name: Option<String>,
    /// Snapshot identifier to restore from.
    pub snapshot: Option<String>,
    /// Extra identifier joined with the deployment name.
    pub identifier: Option<String>,
    pub engine: String,
    pub engine_version: Option<String>,
    pub deletion_protect: bool,
    /// Endpoint host. Derived from the instance identifier when not given.
    pub address: Option<String>,
    pub port: Option<u16>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            db_name: None,
            snapshot: None,
            identifier: None,
            engine: "postgres".to_string(),
            engine_version: None,
            deletion_protect: false,
            address: None,
            port: None,
        }
    }
}

/// Fresh database server provisioned with an initial database.
#[derive(Debug)]
pub struct DatabaseInstance {
    identifier: String,
    engine: String,
    endpoint: Endpoint,
    admin_secret: SecretHandle,
    resource: ResourceRef,
    db_name: String,
}

impl DatabaseInstance {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

impl DatabaseServer for DatabaseInstance {
    fn admin_secret(&self) -> Option<&SecretArn> {
        Some(&self.admin_secret.arn)
    }

    fn engine(&self) -> Option<&str> {
        Some(&self.engine)
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn resource(&self) -> Option<&ResourceRef> {
        Some(&self.resource)
    }
}

/// Database server restored from an existing snapshot.
///
/// The administrative user is always `postgres` on restore and its
/// credentials are regenerated rather than carried over.
#[derive(Debug)]
pub struct SnapshotInstance {
    identifier: String,
    engine: String,
    endpoint: Endpoint,
    admin_secret: SecretHandle,
    resource: ResourceRef,
    snapshot: String,
}

impl SnapshotInstance {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }
}

impl DatabaseServer for SnapshotInstance {
    fn admin_secret(&self) -> Option<&SecretArn> {
        Some(&self.admin_secret.arn)
    }

    fn engine(&self) -> Option<&str> {
        Some(&self.engine)
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn resource(&self) -> Option<&ResourceRef> {
        Some(&self.resource)
    }
}

/// Provision a database-server definition and its administrative secret.
///
/// Returns the snapshot variant when a snapshot identifier is given, the
/// fresh variant otherwise. One of `db_name` and `snapshot` is required.
pub fn create_database_server(
    deployment: &mut Deployment,
    id: &str,
    options: ServerOptions,
) -> Result<Box<dyn DatabaseServer>> {
    if options.db_name.is_none() && options.snapshot.is_none() {
        return Err(Error::MissingDatabaseSource);
    }

    let identifier = match &options.identifier {
        Some(extra) => format!("{}-{}", deployment.context().name, extra),
        None => deployment.context().name.clone(),
    };
    let engine = options.engine.clone();
    let port = options.port.unwrap_or_else(|| default_port(&engine));
    let host = options
        .address
        .clone()
        .unwrap_or_else(|| format!("{identifier}.db.internal"));
    let endpoint = Endpoint { host, port };

    let removal_policy = if options.deletion_protect {
        RemovalPolicy::Snapshot
    } else {
        RemovalPolicy::Destroy
    };

    let mut admin_template = json!({
        "engine": engine,
        "host": endpoint.host,
        "port": endpoint.port,
        "username": ADMIN_USERNAME,
    });
    if let Some(db_name) = &options.db_name {
        admin_template["dbname"] = json!(db_name);
    }

    let suffix = deployment.identity_suffix(id);
    let admin_secret = GeneratedSecret {
        name: format!("{identifier}/admin/{suffix}"),
        description: format!("Administrative credentials for {identifier}"),
        template: admin_template,
        policy: GenerationPolicy::default(),
    }
    .register(deployment, &format!("{id}/admin-secret"))?;

    let mut properties = json!({
        "identifier": identifier,
        "engine": engine,
        "deletion_protection": options.deletion_protect,
        "removal_policy": removal_policy,
        "endpoint": endpoint,
        "admin_secret": admin_secret.arn,
    });
    if let Some(version) = &options.engine_version {
        properties["engine_version"] = json!(version);
    }
    if let Some(db_name) = &options.db_name {
        properties["db_name"] = json!(db_name);
    }
    if let Some(snapshot) = &options.snapshot {
        properties["snapshot"] = json!(snapshot);
    }

    let resource = deployment.add_resource(id, ResourceKind::DatabaseServer, properties)?;
    deployment.add_dependency(&resource, &admin_secret.resource)?;

    info!(identifier = %identifier, engine = %engine, "Registered database server");

    match options.snapshot {
        Some(snapshot) => Ok(Box::new(SnapshotInstance {
            identifier,
            engine,
            endpoint,
            admin_secret,
            resource,
            snapshot,
        })),
        None => Ok(Box::new(DatabaseInstance {
            identifier,
            engine,
            endpoint,
            admin_secret,
            resource,
            // Checked above: no snapshot means db_name is present.
            db_name: options.db_name.unwrap_or_default(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synth::DeploymentContext;

    fn deployment() -> Deployment {
        Deployment::new(DeploymentContext::new("myapp-staging"))
    }

    #[test]
    fn test_requires_db_name_or_snapshot() {
        let mut deployment = deployment();
        let err = create_database_server(&mut deployment, "db", ServerOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::MissingDatabaseSource));
        assert!(deployment.resources().is_empty());
    }

    #[test]
    fn test_identifier_joins_deployment_name() {
        let mut deployment = deployment();
        let server = create_database_server(
            &mut deployment,
            "db",
            ServerOptions {
                db_name: Some("app".to_string()),
                identifier: Some("primary".to_string()),
                ..ServerOptions::default()
            },
        )
        .unwrap();

        assert_eq!(server.endpoint().host, "myapp-staging-primary.db.internal");
        assert_eq!(server.endpoint().port, 5432);
        assert_eq!(server.engine(), Some("postgres"));
        assert!(server.admin_secret().is_some());
    }

    #[test]
    fn test_snapshot_restore_has_no_db_name() {
        let mut deployment = deployment();
        create_database_server(
            &mut deployment,
            "db",
            ServerOptions {
                snapshot: Some("snap-0123".to_string()),
                deletion_protect: true,
                ..ServerOptions::default()
            },
        )
        .unwrap();

        let node = &deployment.resources()[1];
        assert_eq!(node.properties["snapshot"], "snap-0123");
        assert_eq!(node.properties["removal_policy"], "snapshot");
        assert!(node.properties.get("db_name").is_none());
    }

    #[test]
    fn test_default_port_follows_engine() {
        assert_eq!(default_port("postgres"), 5432);
        assert_eq!(default_port("mysql"), 3306);
        assert_eq!(default_port("mariadb"), 3306);
    }
}
