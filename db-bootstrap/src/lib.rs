//! Bootstrap provisioning of application-level database objects.
//!
//! Infrastructure tooling can create a database *server*, but creating the
//! logical database, login user, and credentials on it takes an out-of-band
//! execution step that runs after the server exists. [`BootstrappedDb`]
//! registers everything that step needs into a deployment graph: credential
//! secrets with a deterministic shape, the minimal permission set for the
//! external provisioning handler, and the provisioning request itself,
//! wired to an event-driven execution provider.
//!
//! The construct only assembles the definition. Executing SQL, retrying,
//! and tracking completion belong to the execution engine that consumes the
//! synthesized manifest.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod permissions;
pub mod request;
pub mod secrets;
pub mod server;

pub use bootstrap::{BootstrapOptions, BootstrappedDb, Credentials};
pub use error::{Error, Result};
pub use request::{plan_change, LifecycleEvent, RequestProperties};
pub use server::{
    create_database_server, default_port, resolve_engine, DatabaseServer, Endpoint, ServerOptions,
};
