//! Credential-secret materialization for provisioned users.
//!
//! One secret per user, each with the same fixed template: every
//! connection parameter except the password, which only exists as a
//! generation policy until the deployment engine materializes the value.

use crate::error::Result;
use serde_json::json;
use synth::{Deployment, GeneratedSecret, GenerationPolicy, SecretHandle};

/// Connection parameters embedded in a user's credential secret.
///
/// Consumers read a complete connection document from one place:
/// `{dbname, engine, port, host, username}` plus the generated `password`.
#[derive(Debug, Clone, Copy)]
pub struct UserSecretSpec<'a> {
    pub dbname: &'a str,
    pub username: &'a str,
    pub engine: &'a str,
    pub host: &'a str,
    pub port: u16,
}

/// Secret name under the caller's prefix: `prefix/id/suffix`.
///
/// Spaces in the id are flattened to underscores. The suffix comes from
/// the construct identity, so independent constructs of the same stack
/// never collide on a name.
pub fn secret_name(prefix: &str, id: &str, suffix: &str) -> String {
    format!(
        "{}/{}/{}",
        prefix.trim_end_matches('/'),
        id.replace(' ', "_"),
        suffix
    )
}

/// Materialize one credential secret for a user.
pub fn materialize_user_secret(
    deployment: &mut Deployment,
    path: &str,
    prefix: &str,
    id: &str,
    spec: &UserSecretSpec<'_>,
) -> Result<SecretHandle> {
    let suffix = deployment.identity_suffix(id);
    let name = secret_name(prefix, id, &suffix);
    let description = format!("Deployed by {}", deployment.context().name);

    let template = json!({
        "dbname": spec.dbname,
        "engine": spec.engine,
        "port": spec.port,
        "host": spec.host,
        "username": spec.username,
    });

    let handle = GeneratedSecret {
        name,
        description,
        template,
        policy: GenerationPolicy::default(),
    }
    .register(deployment, path)?;

    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use synth::DeploymentContext;

    #[test]
    fn test_secret_name_shape() {
        assert_eq!(secret_name("myapp/dev", "Api DB", "0a1b2c3d"), "myapp/dev/Api_DB/0a1b2c3d");
        assert_eq!(secret_name("myapp/dev/", "db", "0a1b2c3d"), "myapp/dev/db/0a1b2c3d");
    }

    #[test]
    fn test_template_holds_every_field_but_password() {
        let mut deployment = Deployment::new(DeploymentContext::new("myapp"));
        let spec = UserSecretSpec {
            dbname: "app",
            username: "app_user",
            engine: "postgres",
            host: "db.internal",
            port: 5432,
        };

        let handle =
            materialize_user_secret(&mut deployment, "db/secret", "myapp/dev", "db", &spec).unwrap();

        let node = &deployment.resources()[0];
        let template = &node.properties["template"];
        assert_eq!(template["dbname"], "app");
        assert_eq!(template["username"], "app_user");
        assert_eq!(template["engine"], "postgres");
        assert_eq!(template["host"], "db.internal");
        assert_eq!(template["port"], 5432);
        assert!(template.get("password").is_none());

        assert_eq!(node.properties["generate"]["generate_key"], "password");
        assert_eq!(node.properties["generate"]["exclude_punctuation"], true);
        assert_eq!(node.properties["description"], "Deployed by myapp");
        assert!(handle.arn.as_str().starts_with("secret://myapp/dev/db/"));
    }
}
