//! Minimal permission set for the provisioning handler.
//!
//! The handler can read the secrets in play and open one network
//! connection to the database, nothing else. Grants land in the
//! deployment's duplicate-free sets, so binding the same inputs again
//! changes nothing.

use crate::error::{Error, Result};
use crate::server::Endpoint;
use synth::{Deployment, Handler, SecretArn};
use tracing::debug;

/// Everything the handler is allowed to touch.
#[derive(Debug)]
pub struct HandlerGrants<'a> {
    /// The server's administrative secret.
    pub admin_secret: &'a SecretArn,
    /// The main user's credential secret.
    pub user_secret: &'a SecretArn,
    /// The read-only user's credential secret, when one exists.
    pub read_only_secret: Option<&'a SecretArn>,
    pub endpoint: &'a Endpoint,
    pub port: u16,
}

/// Grant the handler read access to the secrets and connect access to the
/// database port. Additive and idempotent.
pub fn bind_handler(
    deployment: &mut Deployment,
    handler: &Handler,
    grants: &HandlerGrants<'_>,
) -> Result<()> {
    let principal = handler.principal();
    if principal.trim().is_empty() {
        return Err(Error::InvalidHandler("handler principal is blank".to_string()));
    }

    deployment.grant_secret_read(principal, grants.user_secret.as_str());
    if let Some(read_only) = grants.read_only_secret {
        deployment.grant_secret_read(principal, read_only.as_str());
    }
    deployment.grant_secret_read(principal, grants.admin_secret.as_str());
    deployment.allow_connect(principal, &grants.endpoint.host, grants.port);

    debug!(principal, host = %grants.endpoint.host, port = grants.port, "Bound handler permissions");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use synth::DeploymentContext;

    #[test]
    fn test_rebinding_adds_nothing() {
        let mut deployment = Deployment::new(DeploymentContext::new("myapp"));
        let handler = Handler::new("bootstrap-fn", "v1");
        let admin = SecretArn::new("myapp/db/admin");
        let user = SecretArn::new("myapp/db/user");
        let reader = SecretArn::new("myapp/db/reader");
        let endpoint = Endpoint { host: "db.internal".to_string(), port: 5432 };

        let grants = HandlerGrants {
            admin_secret: &admin,
            user_secret: &user,
            read_only_secret: Some(&reader),
            endpoint: &endpoint,
            port: 5432,
        };

        bind_handler(&mut deployment, &handler, &grants).unwrap();
        bind_handler(&mut deployment, &handler, &grants).unwrap();

        assert_eq!(deployment.secret_reads().len(), 3);
        assert_eq!(deployment.network_rules().len(), 1);
    }

    #[test]
    fn test_blank_principal_is_rejected_before_any_grant() {
        let mut deployment = Deployment::new(DeploymentContext::new("myapp"));
        let handler = Handler::new("  ", "v1");
        let admin = SecretArn::new("myapp/db/admin");
        let user = SecretArn::new("myapp/db/user");
        let endpoint = Endpoint { host: "db.internal".to_string(), port: 5432 };

        let err = bind_handler(
            &mut deployment,
            &handler,
            &HandlerGrants {
                admin_secret: &admin,
                user_secret: &user,
                read_only_secret: None,
                endpoint: &endpoint,
                port: 5432,
            },
        )
        .unwrap_err();

        assert!(matches!(err, Error::InvalidHandler(_)));
        assert!(deployment.secret_reads().is_empty());
        assert!(deployment.network_rules().is_empty());
    }
}
