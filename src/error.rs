use thiserror::Error;

/// Errors surfaced by the simulation core.
///
/// Nothing here is retried: the core is pure computation, so a failure means
/// the request itself was wrong.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("team not found: {0}")]
    TeamNotFound(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("cannot analyze an empty batch of game results")]
    EmptyBatch,

    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("failed to load configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
