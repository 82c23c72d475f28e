//! Task Lifecycle Manager error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TlmError {
    #[error("illegal transition: {0}")]
    IllegalTransition(String),

    #[error(transparent)]
    Db(#[from] mpo_db::DbError),
}

pub type Result<T> = std::result::Result<T, TlmError>;

impl From<TlmError> for mpo_core::MpoError {
    fn from(err: TlmError) -> Self {
        match err {
            TlmError::IllegalTransition(msg) => mpo_core::MpoError::InvalidState(msg),
            TlmError::Db(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_transition_converts_to_invalid_state() {
        let err = TlmError::IllegalTransition("Pending -> Completed".into());
        let mpo_err: mpo_core::MpoError = err.into();
        assert!(matches!(mpo_err, mpo_core::MpoError::InvalidState(_)));
    }
}
