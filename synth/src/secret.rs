//! Generated-secret definitions.
//!
//! A secret registered here carries its full template plus a generation
//! policy for the one key produced at deploy time. Synthesis only ever
//! sees the definition; the secret value is materialized wholesale by the
//! deployment engine on first realization and read, never written, by
//! consumers afterwards.

use crate::graph::{Deployment, ResourceKind, ResourceRef, SynthError};
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                              abcdefghijklmnopqrstuvwxyz\
                              0123456789";
const PUNCTUATION: &[u8] = b"!#$%&()*+,-./:;<=>?@[]^_{|}~";

/// Reference to a secret, in `secret://{name}` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretArn(String);

impl SecretArn {
    pub fn new(name: &str) -> Self {
        Self(format!("secret://{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the deploy-time secret service produces the generated key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationPolicy {
    pub generate_key: String,
    pub length: usize,
    pub exclude_punctuation: bool,
}

impl Default for GenerationPolicy {
    fn default() -> Self {
        Self {
            generate_key: "password".to_string(),
            length: 32,
            exclude_punctuation: true,
        }
    }
}

/// Definition of a secret whose value is generated at deploy time.
///
/// The template holds every field except the generated one.
#[derive(Debug, Clone)]
pub struct GeneratedSecret {
    pub name: String,
    pub description: String,
    pub template: Value,
    pub policy: GenerationPolicy,
}

impl GeneratedSecret {
    /// Register the definition as a resource node.
    pub fn register(
        self,
        deployment: &mut Deployment,
        path: &str,
    ) -> Result<SecretHandle, SynthError> {
        let arn = SecretArn::new(&self.name);
        let properties = json!({
            "name": self.name,
            "description": self.description,
            "template": self.template,
            "generate": self.policy,
        });

        let resource = deployment.add_resource(path, ResourceKind::Secret, properties)?;
        Ok(SecretHandle { arn, resource })
    }
}

/// A registered secret: its reference plus its graph node.
#[derive(Debug, Clone)]
pub struct SecretHandle {
    pub arn: SecretArn,
    pub resource: ResourceRef,
}

/// Generate a secret value according to the policy.
///
/// Excluding punctuation keeps the value safe to splice into connection
/// strings and shell invocations without quoting.
pub fn generate_password(policy: &GenerationPolicy) -> String {
    let mut charset = ALPHANUMERIC.to_vec();
    if !policy.exclude_punctuation {
        charset.extend_from_slice(PUNCTUATION);
    }

    let mut rng = rand::thread_rng();
    (0..policy.length)
        .map(|_| {
            let idx = rng.gen_range(0..charset.len());
            charset[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DeploymentContext;

    #[test]
    fn test_password_excludes_punctuation_by_default() {
        let policy = GenerationPolicy::default();
        for _ in 0..50 {
            let password = generate_password(&policy);
            assert_eq!(password.len(), 32);
            assert!(password.chars().all(|c| c.is_ascii_alphanumeric()), "{password}");
        }
    }

    #[test]
    fn test_password_draws_from_extended_charset_when_allowed() {
        let policy = GenerationPolicy {
            exclude_punctuation: false,
            length: 64,
            ..GenerationPolicy::default()
        };
        let password = generate_password(&policy);
        assert_eq!(password.len(), 64);
        assert!(password
            .bytes()
            .all(|b| ALPHANUMERIC.contains(&b) || PUNCTUATION.contains(&b)));
    }

    #[test]
    fn test_register_exposes_arn_and_node() {
        let mut deployment = Deployment::new(DeploymentContext::new("test-stack"));
        let handle = GeneratedSecret {
            name: "myapp/db/0a1b2c3d".to_string(),
            description: "Deployed by test-stack".to_string(),
            template: serde_json::json!({"username": "app"}),
            policy: GenerationPolicy::default(),
        }
        .register(&mut deployment, "db/secret")
        .unwrap();

        assert_eq!(handle.arn.as_str(), "secret://myapp/db/0a1b2c3d");
        assert_eq!(handle.resource.path(), "db/secret");
        assert_eq!(deployment.resources().len(), 1);
    }
}
