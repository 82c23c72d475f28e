//! Broker error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("unknown queue: {0}")]
    UnknownQueue(String),

    #[error("queue closed: {0}")]
    Closed(String),

    #[error("job not found: {0}")]
    NotFound(String),

    #[error("broker backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, BrokerError>;

impl From<BrokerError> for mpo_core::MpoError {
    fn from(err: BrokerError) -> Self {
        mpo_core::MpoError::Broker(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_mpo_error() {
        let err = BrokerError::UnknownQueue("gpu2".into());
        let mpo_err: mpo_core::MpoError = err.into();
        assert!(mpo_err.to_string().contains("gpu2"));
    }
}
