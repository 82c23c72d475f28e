//! Job Dispatcher error type: wraps every lower-layer error a worker
//! loop can hit while routing a delivery to its handler.

use mpo_common::FailureKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Pipeline(#[from] mpo_pipelines::PipelineError),

    #[error(transparent)]
    Tlm(#[from] mpo_tlm::TlmError),

    #[error(transparent)]
    Db(#[from] mpo_db::DbError),

    #[error(transparent)]
    Storage(#[from] mpo_storage::StorageError),

    #[error(transparent)]
    Index(#[from] mpo_index::IndexError),

    #[error(transparent)]
    Broker(#[from] mpo_broker::BrokerError),

    #[error(transparent)]
    Ingest(#[from] mpo_ingest::IngestError),

    #[error("malformed job payload: {0}")]
    MalformedPayload(String),

    #[error("io error materializing job input: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatchError {
    /// Best-effort classification for the retry decision. Errors from
    /// `mpo-pipelines` already carry an explicit `FailureKind`; a
    /// hiccup anywhere else in the stack (a DB write between stages, a
    /// storage read, a broker call) is classified `TransientInfra`
    /// since those are exactly the failures a retry can paper over. A
    /// malformed payload never succeeds on redelivery, so it is
    /// `InputQuality` regardless of how the job got that way.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            DispatchError::Pipeline(e) => e.failure_kind(),
            DispatchError::MalformedPayload(_) => FailureKind::InputQuality,
            _ => FailureKind::TransientInfra,
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_payload_is_input_quality() {
        let err = DispatchError::MalformedPayload("missing field `file_id`".into());
        assert_eq!(err.failure_kind(), FailureKind::InputQuality);
    }

    #[test]
    fn pipeline_error_delegates_its_own_classification() {
        let err = DispatchError::Pipeline(mpo_pipelines::PipelineError::ModelAuth("x".into()));
        assert_eq!(err.failure_kind(), FailureKind::ModelAuth);
    }

    #[test]
    fn db_error_is_transient_infra() {
        let err = DispatchError::Db(mpo_db::DbError::NotFound("media_file 1".into()));
        assert_eq!(err.failure_kind(), FailureKind::TransientInfra);
    }
}
