//! Index Gateway error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("index backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;

impl From<IndexError> for mpo_core::MpoError {
    fn from(err: IndexError) -> Self {
        mpo_core::MpoError::Index(err.to_string())
    }
}
