//! Notification Bus error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("no subscribers for owner {0}")]
    NoSubscribers(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NotifyError>;

impl From<NotifyError> for mpo_core::MpoError {
    fn from(err: NotifyError) -> Self {
        mpo_core::MpoError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_mpo_error() {
        let err = NotifyError::NoSubscribers("owner-1".into());
        let mpo_err: mpo_core::MpoError = err.into();
        assert!(mpo_err.to_string().contains("owner-1"));
    }
}
