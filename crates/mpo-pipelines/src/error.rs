//! Stage Pipeline error type: carries a `FailureKind` so the Task
//! Lifecycle Manager can decide retry-vs-terminal without matching on
//! this crate's variants.

use mpo_common::FailureKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("transient infrastructure failure: {0}")]
    TransientInfra(String),

    #[error("input quality issue: {0}")]
    InputQuality(String),

    #[error("model/provider auth failure: {0}")]
    ModelAuth(String),

    #[error("cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            PipelineError::TransientInfra(_) => FailureKind::TransientInfra,
            PipelineError::InputQuality(_) => FailureKind::InputQuality,
            PipelineError::ModelAuth(_) => FailureKind::ModelAuth,
            PipelineError::Cancelled => FailureKind::Cancelled,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl From<PipelineError> for mpo_core::MpoError {
    fn from(err: PipelineError) -> Self {
        mpo_core::MpoError::Pipeline(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kind_maps_each_variant() {
        assert_eq!(
            PipelineError::TransientInfra("x".into()).failure_kind(),
            FailureKind::TransientInfra
        );
        assert_eq!(PipelineError::Cancelled.failure_kind(), FailureKind::Cancelled);
        assert_eq!(
            PipelineError::ModelAuth("x".into()).failure_kind(),
            FailureKind::ModelAuth
        );
        assert_eq!(
            PipelineError::InputQuality("x".into()).failure_kind(),
            FailureKind::InputQuality
        );
    }
}
