//! Shared failure taxonomy for stage pipelines.
//!
//! A `PipelineError` in `mpo-pipelines` carries one of these so the Task
//! Lifecycle Manager can decide retry vs. terminal without matching on
//! crate-specific error enums.

use serde::{Deserialize, Serialize};

/// Classification of a pipeline failure, independent of which stage
/// raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network blip, OOM, model server unavailable -- retry with backoff.
    TransientInfra,
    /// No audio track, corrupted container, no detectable speech --
    /// terminal, message is user-actionable.
    InputQuality,
    /// Missing or invalid model/provider credentials -- terminal,
    /// admin-actionable.
    ModelAuth,
    /// The operator or user requested cancellation -- terminal, not an
    /// error in UX terms.
    Cancelled,
    /// Duplicate content hash or a lost compare-and-swap race --
    /// resolved by returning the canonical row, not surfaced as failure.
    Conflict,
    /// The file is not safe to delete in its current state.
    FileNotSafeToDelete,
}

impl FailureKind {
    /// Whether the Task Lifecycle Manager should schedule an automatic
    /// retry for this failure, subject to `retry_count < max_retries`.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureKind::TransientInfra)
    }

    /// Whether this failure should be presented to the end user as an
    /// actionable error message (vs. only logged / surfaced to admins).
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            FailureKind::InputQuality | FailureKind::Cancelled | FailureKind::ModelAuth
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_infra_is_retryable() {
        assert!(FailureKind::TransientInfra.is_retryable());
        assert!(!FailureKind::InputQuality.is_retryable());
        assert!(!FailureKind::ModelAuth.is_retryable());
        assert!(!FailureKind::Cancelled.is_retryable());
        assert!(!FailureKind::Conflict.is_retryable());
        assert!(!FailureKind::FileNotSafeToDelete.is_retryable());
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&FailureKind::TransientInfra).unwrap();
        assert_eq!(json, "\"transient_infra\"");
    }
}
