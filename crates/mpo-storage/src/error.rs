//! Artifact Store Gateway error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AuthDenied(String),

    #[error("transient storage failure: {0}")]
    Transient(String),

    #[error("object corrupt: {0}")]
    Corrupt(String),

    #[error("storage quota exceeded: {0}")]
    Quota(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Only `Transient` failures are worth retrying with backoff; the
    /// rest are either permanent or require a different key/caller fix.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Transient(_))
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl From<StorageError> for mpo_core::MpoError {
    fn from(err: StorageError) -> Self {
        mpo_core::MpoError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_is_retryable() {
        assert!(StorageError::Transient("disk busy".into()).is_retryable());
        assert!(!StorageError::NotFound("k".into()).is_retryable());
        assert!(!StorageError::Corrupt("k".into()).is_retryable());
    }
}
