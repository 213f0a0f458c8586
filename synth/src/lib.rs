//! Deterministic deployment-graph synthesis
//!
//! This crate models the slice of a deployment runtime that definitions
//! register into: a graph of resource nodes with dependency edges,
//! duplicate-free permission sets, generated-secret definitions, and
//! event-driven execution providers. Synthesis is a single pass over plain
//! data; registering a node never touches a live system, and serializing
//! the same definition twice yields byte-identical manifests.
//!
//! Realization of the manifest (create/update/delete dispatch, retries,
//! completion tracking) belongs to the deployment engine that consumes it,
//! not to this crate.

pub mod graph;
pub mod provider;
pub mod secret;

pub use graph::{Deployment, DeploymentContext, ResourceKind, ResourceRef, SynthError};
pub use provider::{CustomResource, ExecutionProvider, Handler};
pub use secret::{GeneratedSecret, GenerationPolicy, SecretArn, SecretHandle};
