//! Deployment graph: resource nodes, dependency edges, and grant sets.
//!
//! Resources keep their registration order, dependency edges are recorded
//! on the dependent node, and grants are duplicate-free, so re-synthesizing
//! an unchanged definition reproduces the manifest byte for byte.

use common::ConfigExt;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Errors raised while assembling the graph.
///
/// All of these indicate a misassembled definition and surface before
/// anything is realized.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("a resource is already registered at `{0}`")]
    DuplicatePath(String),

    #[error("resource `{0}` is not part of this deployment")]
    UnknownNode(String),
}

/// Identity of the surrounding deployment.
///
/// Threaded explicitly into [`Deployment::new`]; nothing in the graph reads
/// ambient global state. The name ends up in secret descriptions and
/// instance identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentContext {
    pub name: String,
    pub environment: String,
}

impl DeploymentContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            environment: "production".to_string(),
        }
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Read the context from `DEPLOYMENT_NAME` and `DEPLOYMENT_ENV`.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            name: String::env_required("DEPLOYMENT_NAME")?,
            environment: String::env_or("DEPLOYMENT_ENV", "production"),
        })
    }
}

/// What kind of node a resource is, as it appears in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    DatabaseServer,
    Secret,
    ExecutionProvider,
    CustomResource,
}

/// A registered resource node.
#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    pub path: String,
    pub kind: ResourceKind,
    pub properties: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// Opaque handle to a registered resource node.
///
/// Other definitions attach dependency edges to it. Holding a handle says
/// nothing about whether the resource has been realized, only that it
/// exists in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    index: usize,
    path: String,
}

impl ResourceRef {
    /// Logical path of the referenced node.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Read grant on one secret for one principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretReadGrant {
    pub principal: String,
    pub secret: String,
}

/// Inbound connection allowance from a principal to a host and port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkRule {
    pub principal: String,
    pub host: String,
    pub port: u16,
}

/// The deployment under synthesis.
#[derive(Debug)]
pub struct Deployment {
    context: DeploymentContext,
    resources: Vec<Resource>,
    secret_reads: Vec<SecretReadGrant>,
    network_rules: Vec<NetworkRule>,
}

/// Serialized view of a deployment.
#[derive(Debug, Serialize)]
pub struct Manifest<'a> {
    pub deployment: &'a str,
    pub environment: &'a str,
    pub resources: &'a [Resource],
    pub secret_reads: &'a [SecretReadGrant],
    pub network_rules: &'a [NetworkRule],
}

impl Deployment {
    pub fn new(context: DeploymentContext) -> Self {
        Self {
            context,
            resources: Vec::new(),
            secret_reads: Vec::new(),
            network_rules: Vec::new(),
        }
    }

    pub fn context(&self) -> &DeploymentContext {
        &self.context
    }

    /// Registered resources, in registration order.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn secret_reads(&self) -> &[SecretReadGrant] {
        &self.secret_reads
    }

    pub fn network_rules(&self) -> &[NetworkRule] {
        &self.network_rules
    }

    /// Register a resource node at a logical path.
    pub fn add_resource(
        &mut self,
        path: &str,
        kind: ResourceKind,
        properties: Value,
    ) -> Result<ResourceRef, SynthError> {
        if self.resources.iter().any(|r| r.path == path) {
            return Err(SynthError::DuplicatePath(path.to_string()));
        }

        debug!(path, ?kind, "Registering resource");

        self.resources.push(Resource {
            path: path.to_string(),
            kind,
            properties,
            depends_on: Vec::new(),
        });

        Ok(ResourceRef {
            index: self.resources.len() - 1,
            path: path.to_string(),
        })
    }

    /// Record that `dependent` must be realized after `dependency`.
    ///
    /// Adding the same edge twice is a no-op.
    pub fn add_dependency(
        &mut self,
        dependent: &ResourceRef,
        dependency: &ResourceRef,
    ) -> Result<(), SynthError> {
        self.check_ref(dependency)?;
        self.check_ref(dependent)?;

        let node = &mut self.resources[dependent.index];
        if !node.depends_on.contains(&dependency.path) {
            node.depends_on.push(dependency.path.clone());
        }
        Ok(())
    }

    /// Allow a principal to read a secret. Additive and idempotent.
    pub fn grant_secret_read(&mut self, principal: &str, secret: &str) {
        let grant = SecretReadGrant {
            principal: principal.to_string(),
            secret: secret.to_string(),
        };
        if !self.secret_reads.contains(&grant) {
            self.secret_reads.push(grant);
        }
    }

    /// Allow a principal to connect to a host and port. Additive and idempotent.
    pub fn allow_connect(&mut self, principal: &str, host: &str, port: u16) {
        let rule = NetworkRule {
            principal: principal.to_string(),
            host: host.to_string(),
            port,
        };
        if !self.network_rules.contains(&rule) {
            self.network_rules.push(rule);
        }
    }

    /// Fixed-length suffix derived from a construct's identity.
    ///
    /// Stable for the same deployment name and id, distinct across ids, so
    /// names built from it never collide with those of a different logical
    /// construct.
    pub fn identity_suffix(&self, id: &str) -> String {
        let digest = md5::compute(format!("{}/{}", self.context.name, id));
        format!("{:x}", digest)[..8].to_string()
    }

    pub fn manifest(&self) -> Manifest<'_> {
        Manifest {
            deployment: &self.context.name,
            environment: &self.context.environment,
            resources: &self.resources,
            secret_reads: &self.secret_reads,
            network_rules: &self.network_rules,
        }
    }

    /// Serialize the manifest. Stable across re-synthesis of an unchanged
    /// definition.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.manifest())
    }

    fn check_ref(&self, node: &ResourceRef) -> Result<(), SynthError> {
        match self.resources.get(node.index) {
            Some(resource) if resource.path == node.path => Ok(()),
            _ => Err(SynthError::UnknownNode(node.path.clone())),
        }
    }
}
