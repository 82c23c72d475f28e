//! Recovery Reaper error type.

use mpo_common::FailureKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReaperError {
    #[error("file not safe to delete: {0}")]
    NotSafeToDelete(String),

    #[error(transparent)]
    Db(#[from] mpo_db::DbError),

    #[error(transparent)]
    Storage(#[from] mpo_storage::StorageError),

    #[error(transparent)]
    Index(#[from] mpo_index::IndexError),

    #[error(transparent)]
    Tlm(#[from] mpo_tlm::TlmError),
}

impl ReaperError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ReaperError::NotSafeToDelete(_) => FailureKind::FileNotSafeToDelete,
            _ => FailureKind::TransientInfra,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReaperError>;

impl From<ReaperError> for mpo_core::MpoError {
    fn from(err: ReaperError) -> Self {
        match err {
            ReaperError::NotSafeToDelete(msg) => mpo_core::MpoError::Conflict(msg),
            other => mpo_core::MpoError::Other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_safe_to_delete_maps_to_its_failure_kind() {
        let err = ReaperError::NotSafeToDelete("file 1 is Processing".into());
        assert_eq!(err.failure_kind(), FailureKind::FileNotSafeToDelete);
    }
}
