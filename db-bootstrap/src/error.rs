//! Error types for bootstrap synthesis.

use thiserror::Error;

/// Errors raised while assembling a bootstrap definition.
///
/// Everything here is a configuration error: raised synchronously at
/// definition time, before any resource is registered, so a failed
/// construction leaves no partial state behind. Failures of the
/// provisioning handler itself happen inside the external execution engine
/// and never surface through this type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("database has no administrative secret attached")]
    MissingAdminSecret,

    #[error("no engine identifier: the server exposes none and no override was given")]
    MissingEngine,

    #[error("invalid handler: {0}")]
    InvalidHandler(String),

    #[error("`{field}` must not be blank")]
    BlankField { field: &'static str },

    #[error("either `db_name` or `snapshot` must be provided")]
    MissingDatabaseSource,

    #[error("unsupported change to `{field}`: only `version` may change on a registered request")]
    UnsupportedPropertyChange { field: &'static str },

    #[error(transparent)]
    Synth(#[from] synth::SynthError),
}

pub type Result<T> = std::result::Result<T, Error>;
