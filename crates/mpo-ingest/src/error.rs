//! Ingestion Coordinator error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("media_file not found: {0}")]
    NotFound(String),

    #[error("file owned by a different account")]
    OwnerMismatch,

    #[error("content hash mismatch: claimed {claimed}, observed {observed}")]
    HashMismatch { claimed: String, observed: String },

    #[error("media_file is not in a state that accepts an upload: {0}")]
    NotPending(String),

    #[error(transparent)]
    Db(#[from] mpo_db::DbError),

    #[error(transparent)]
    Storage(#[from] mpo_storage::StorageError),

    #[error(transparent)]
    Broker(#[from] mpo_broker::BrokerError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;

impl From<IngestError> for mpo_core::MpoError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::HashMismatch { .. } | IngestError::NotPending(_) | IngestError::OwnerMismatch => {
                mpo_core::MpoError::Conflict(err.to_string())
            }
            IngestError::NotFound(_) => mpo_core::MpoError::NotFound(err.to_string()),
            other => mpo_core::MpoError::Other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_mismatch_converts_to_conflict() {
        let err = IngestError::HashMismatch {
            claimed: "aa".into(),
            observed: "bb".into(),
        };
        let mpo_err: mpo_core::MpoError = err.into();
        assert!(matches!(mpo_err, mpo_core::MpoError::Conflict(_)));
    }

    #[test]
    fn not_found_converts_to_not_found() {
        let err = IngestError::NotFound("media_file 1".into());
        let mpo_err: mpo_core::MpoError = err.into();
        assert!(matches!(mpo_err, mpo_core::MpoError::NotFound(_)));
    }
}
