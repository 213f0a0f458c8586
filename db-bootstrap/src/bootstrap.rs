//! Bootstrap orchestration.
//!
//! Composes the credential secrets, the handler permission set, and the
//! provisioning request into one registered construct, and exposes the
//! dependency handle downstream definitions order themselves after.

use crate::error::{Error, Result};
use crate::permissions::{bind_handler, HandlerGrants};
use crate::request::RequestProperties;
use crate::secrets::{materialize_user_secret, UserSecretSpec};
use crate::server::{default_port, resolve_engine, DatabaseServer};
use synth::{CustomResource, Deployment, ExecutionProvider, Handler, ResourceRef, SecretHandle};
use tracing::info;

/// Options for [`BootstrappedDb::new`].
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    pub new_dbname: String,
    pub new_username: String,
    /// Prefix the credential secrets are namespaced under.
    pub secrets_prefix: String,
    /// Engine override when the server does not expose one.
    pub engine: Option<String>,
    /// When set, a second, independent read-only user is provisioned.
    pub read_only_username: Option<String>,
    /// Listening port. Defaults per engine when not set.
    pub port: Option<u16>,
}

impl BootstrapOptions {
    pub fn new(
        new_dbname: impl Into<String>,
        new_username: impl Into<String>,
        secrets_prefix: impl Into<String>,
    ) -> Self {
        Self {
            new_dbname: new_dbname.into(),
            new_username: new_username.into(),
            secrets_prefix: secrets_prefix.into(),
            engine: None,
            read_only_username: None,
            port: None,
        }
    }
}

/// Credential secrets produced by the bootstrap, by user.
///
/// A tagged variant rather than a nullable field: code consuming the
/// read-only credentials has to acknowledge they may not exist.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Only the main login user was provisioned.
    Main(SecretHandle),
    /// Main user plus a read-only user, each with an independent secret.
    MainAndReadOnly {
        main: SecretHandle,
        read_only: SecretHandle,
    },
}

impl Credentials {
    pub fn main(&self) -> &SecretHandle {
        match self {
            Self::Main(main) => main,
            Self::MainAndReadOnly { main, .. } => main,
        }
    }

    pub fn read_only(&self) -> Option<&SecretHandle> {
        match self {
            Self::Main(_) => None,
            Self::MainAndReadOnly { read_only, .. } => Some(read_only),
        }
    }
}

/// A registered database bootstrap.
///
/// Construction performs the whole composition: configuration validation,
/// credential secrets, handler permissions, and the provisioning request
/// registered against the execution provider. Nothing runs at
/// construction time; the external engine invokes the handler when it
/// realizes the registered node.
#[derive(Debug)]
pub struct BootstrappedDb {
    id: String,
    credentials: Credentials,
    request: RequestProperties,
    service_token: String,
    resource: ResourceRef,
}

impl BootstrappedDb {
    pub fn new(
        deployment: &mut Deployment,
        id: &str,
        db: &dyn DatabaseServer,
        handler: &Handler,
        options: BootstrapOptions,
    ) -> Result<Self> {
        // Configuration checks come first: a failure here must leave the
        // deployment untouched.
        let admin_secret = db.admin_secret().ok_or(Error::MissingAdminSecret)?.clone();
        let engine = resolve_engine(options.engine.as_deref(), db)?;
        if handler.name.trim().is_empty() {
            return Err(Error::InvalidHandler("handler principal is blank".to_string()));
        }
        if handler.version.trim().is_empty() {
            return Err(Error::InvalidHandler("handler version token is blank".to_string()));
        }
        require_value("new_dbname", &options.new_dbname)?;
        require_value("new_username", &options.new_username)?;
        if let Some(read_only_username) = &options.read_only_username {
            require_value("read_only_username", read_only_username)?;
        }

        let endpoint = db.endpoint().clone();
        let port = options.port.unwrap_or_else(|| default_port(&engine));

        let main_spec = UserSecretSpec {
            dbname: &options.new_dbname,
            username: &options.new_username,
            engine: &engine,
            host: &endpoint.host,
            port,
        };
        let main = materialize_user_secret(
            deployment,
            &format!("{id}/secret"),
            &options.secrets_prefix,
            id,
            &main_spec,
        )?;

        let credentials = match &options.read_only_username {
            Some(read_only_username) => {
                let read_only_spec = UserSecretSpec {
                    username: read_only_username,
                    ..main_spec
                };
                let read_only = materialize_user_secret(
                    deployment,
                    &format!("{id}/read-only-secret"),
                    &options.secrets_prefix,
                    &format!("{id} read-only"),
                    &read_only_spec,
                )?;
                Credentials::MainAndReadOnly { main, read_only }
            }
            None => Credentials::Main(main),
        };

        let provider = ExecutionProvider::register(deployment, &format!("{id}/provider"), handler)?;

        bind_handler(
            deployment,
            handler,
            &HandlerGrants {
                admin_secret: &admin_secret,
                user_secret: &credentials.main().arn,
                read_only_secret: credentials.read_only().map(|handle| &handle.arn),
                endpoint: &endpoint,
                port,
            },
        )?;

        let request = RequestProperties {
            conn_secret_arn: admin_secret,
            new_user_secret_arn: credentials.main().arn.clone(),
            read_only_user_secret_arn: credentials.read_only().map(|handle| handle.arn.clone()),
            version: handler.version.clone(),
        };

        let mut depends_on = vec![&credentials.main().resource, &provider.resource];
        if let Some(read_only) = credentials.read_only() {
            depends_on.push(&read_only.resource);
        }
        if let Some(server) = db.resource() {
            depends_on.push(server);
        }

        let resource = CustomResource::register(
            deployment,
            &format!("{id}/resource"),
            &provider.service_token,
            request.to_value(),
            &depends_on,
        )?;

        info!(
            id,
            dbname = %options.new_dbname,
            username = %options.new_username,
            read_only = options.read_only_username.is_some(),
            "Registered database bootstrap"
        );

        Ok(Self {
            id: id.to_string(),
            credentials,
            request,
            service_token: provider.service_token,
            resource,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Secret handles for the provisioned users.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Property bag registered for the execution engine.
    pub fn request(&self) -> &RequestProperties {
        &self.request
    }

    pub fn service_token(&self) -> &str {
        &self.service_token
    }

    /// Dependency handle: the registered provisioning node.
    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    /// Order `construct` strictly after this bootstrap's registration node.
    ///
    /// This is build order only: the dependent is realized after the
    /// provisioning request exists in the graph, not after the external
    /// handler has finished running against the database. Completion
    /// tracking is the execution engine's job.
    pub fn is_required_by(&self, deployment: &mut Deployment, construct: &ResourceRef) -> Result<()> {
        deployment.add_dependency(construct, &self.resource)?;
        Ok(())
    }
}

fn require_value(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::BlankField { field })
    } else {
        Ok(())
    }
}
