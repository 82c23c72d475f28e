//! Shared error type for the orchestrator kernel.
//!
//! Crate-specific errors (`DbError`, `StorageError`, `PipelineError`, ...)
//! each carry their own `thiserror` enum and convert into `MpoError` at
//! the seams where code crosses a crate boundary without caring about
//! the lower-level detail (e.g. the binary's top-level wiring).

use thiserror::Error;

/// Top-level error type used by the `mpo` binary and anywhere multiple
/// crates' errors need to be handled uniformly.
#[derive(Debug, Error)]
pub enum MpoError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("index error: {0}")]
    Index(String),

    #[error("broker error: {0}")]
    Broker(String),

    #[error("pipeline error: {0}")]
    Pipeline(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, MpoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_include_context() {
        let err = MpoError::Config("missing DATABASE_URL".into());
        assert_eq!(err.to_string(), "configuration error: missing DATABASE_URL");
    }

    #[test]
    fn io_error_converts_via_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: MpoError = io_err.into();
        assert!(err.to_string().contains("io error"));
    }
}
