//! Metadata Store error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("row not found: {0}")]
    NotFound(String),

    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error("optimistic concurrency check failed: {0}")]
    ConcurrencyConflict(String),

    #[error("query error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<DbError> for mpo_core::MpoError {
    fn from(err: DbError) -> Self {
        mpo_core::MpoError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_mpo_error() {
        let err = DbError::NotFound("media_file 1".into());
        let mpo_err: mpo_core::MpoError = err.into();
        assert!(mpo_err.to_string().contains("media_file 1"));
    }
}
