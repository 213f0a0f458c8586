//! Execution providers and custom resources.
//!
//! A provider binds an external handler so the deployment engine can
//! dispatch lifecycle events to it; a custom resource is the node those
//! events are dispatched for. Registration is pure composition: nothing
//! here invokes the handler, validates connectivity, or blocks.

use crate::graph::{Deployment, ResourceKind, ResourceRef, SynthError};
use serde_json::{json, Value};

/// External invokable unit addressable by an execution provider.
///
/// `name` doubles as the principal grants are issued against. `version`
/// must change whenever the handler's executable logic changes; it is the
/// only signal that forces the engine to re-invoke an otherwise unchanged
/// request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handler {
    pub name: String,
    pub version: String,
}

impl Handler {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// The principal grants are issued against.
    pub fn principal(&self) -> &str {
        &self.name
    }
}

/// A registered execution provider bound to one handler.
#[derive(Debug, Clone)]
pub struct ExecutionProvider {
    pub service_token: String,
    pub resource: ResourceRef,
}

impl ExecutionProvider {
    /// Register a provider for the handler and expose its service token.
    pub fn register(
        deployment: &mut Deployment,
        path: &str,
        handler: &Handler,
    ) -> Result<Self, SynthError> {
        let resource = deployment.add_resource(
            path,
            ResourceKind::ExecutionProvider,
            json!({ "handler": handler.name }),
        )?;

        Ok(Self {
            service_token: format!("provider://{path}"),
            resource,
        })
    }
}

/// Custom-resource registration.
pub struct CustomResource;

impl CustomResource {
    /// Register a resource node whose realization the execution engine owns.
    ///
    /// `depends_on` edges are recorded up front so the engine schedules the
    /// node only after everything it reads exists.
    pub fn register(
        deployment: &mut Deployment,
        path: &str,
        service_token: &str,
        properties: Value,
        depends_on: &[&ResourceRef],
    ) -> Result<ResourceRef, SynthError> {
        let node = deployment.add_resource(
            path,
            ResourceKind::CustomResource,
            json!({
                "service_token": service_token,
                "properties": properties,
            }),
        )?;

        for dependency in depends_on {
            deployment.add_dependency(&node, dependency)?;
        }

        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DeploymentContext;

    #[test]
    fn test_custom_resource_records_dependencies() {
        let mut deployment = Deployment::new(DeploymentContext::new("test-stack"));
        let handler = Handler::new("bootstrap-fn", "v1");

        let provider = ExecutionProvider::register(&mut deployment, "db/provider", &handler).unwrap();
        assert_eq!(provider.service_token, "provider://db/provider");

        let secret = deployment
            .add_resource("db/secret", ResourceKind::Secret, json!({}))
            .unwrap();

        let node = CustomResource::register(
            &mut deployment,
            "db/resource",
            &provider.service_token,
            json!({"version": "v1"}),
            &[&secret, &provider.resource],
        )
        .unwrap();

        let registered = &deployment.resources()[2];
        assert_eq!(node.path(), "db/resource");
        assert_eq!(registered.depends_on, vec!["db/secret", "db/provider"]);
        assert_eq!(registered.properties["service_token"], "provider://db/provider");
    }
}
