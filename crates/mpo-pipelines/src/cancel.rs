//! Cooperative cancellation: pipelines never get preempted, they poll a
//! [`CancelToken`] at suspension points between units of work.

use std::sync::Arc;

use mpo_core::traits::ProgressSink;

use crate::error::{PipelineError, Result};

/// Wraps a `ProgressSink` and a task id so pipeline code can call
/// `token.check(&task_id).await?` at each suspension point named in
/// spec §4.7 (after stream open, between major stages, inside
/// alignment per-chunk) instead of threading the sink through directly.
#[derive(Clone)]
pub struct CancelToken {
    sink: Arc<dyn ProgressSink>,
}

impl CancelToken {
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self { sink }
    }

    /// Returns `Err(PipelineError::Cancelled)` if cancellation has been
    /// requested; otherwise `Ok(())`. Callers use `token.check(id).await?`
    /// so the suspension point reads as a single expression.
    pub async fn check(&self, task_id: &str) -> Result<()> {
        if self
            .sink
            .is_cancelled(task_id)
            .await
            .unwrap_or(false)
        {
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mpo_core::Result as CoreResult;

    struct FakeSink {
        cancelled: bool,
    }

    #[async_trait]
    impl ProgressSink for FakeSink {
        async fn heartbeat(&self, _task_id: &str) -> CoreResult<()> {
            Ok(())
        }
        async fn progress(&self, _task_id: &str, _percent: u8, _stage: Option<&str>) -> CoreResult<()> {
            Ok(())
        }
        async fn is_cancelled(&self, _task_id: &str) -> CoreResult<bool> {
            Ok(self.cancelled)
        }
    }

    #[tokio::test]
    async fn uncancelled_token_passes_check() {
        let token = CancelToken::new(Arc::new(FakeSink { cancelled: false }));
        assert!(token.check("task-1").await.is_ok());
    }

    #[tokio::test]
    async fn cancelled_token_fails_check() {
        let token = CancelToken::new(Arc::new(FakeSink { cancelled: true }));
        let err = token.check("task-1").await.unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
    }
}
