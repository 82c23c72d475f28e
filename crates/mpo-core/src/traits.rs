//! Cross-cutting traits shared by every component crate.
//!
//! These are the seams components are mocked at in tests: a pipeline
//! depends on `ProgressSink`, not a concrete notification bus client; a
//! worker depends on `Service`, not a concrete broker consumer.

use async_trait::async_trait;

use crate::error::Result;

/// A component with an explicit start/stop lifecycle, driven by the
/// binary's process wiring.
#[async_trait]
pub trait Service {
    async fn start(&self) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }
}

/// A component that performs setup before it can serve requests
/// (opening pools, priming caches, running migrations).
#[async_trait]
pub trait Initializable {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }
}

/// A component that accepts configuration after construction, used by
/// `ConfigHandle::reload()` to push new settings into running services.
#[async_trait]
pub trait Configurable {
    type Config: Send + Sync;

    async fn configure(&mut self, _config: Self::Config) -> Result<()> {
        Ok(())
    }
}

/// A component that reports liveness and metrics for the process's
/// health endpoint.
#[async_trait]
pub trait Monitorable {
    async fn status(&self) -> Result<String> {
        Ok("ok".to_string())
    }

    async fn metrics(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!({}))
    }
}

/// The progress-reporting seam a stage pipeline pushes heartbeats and
/// percentage updates through. Implemented by `mpo-tlm` (to update the
/// task row and detect stalls) and by `mpo-notify` (to fan updates out
/// to subscribed clients); pipelines hold a `Box<dyn ProgressSink>` and
/// never know which.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Record a heartbeat with no percentage change, used to prove the
    /// worker is still alive for the reaper's stall detection.
    async fn heartbeat(&self, task_id: &str) -> Result<()>;

    /// Record a percentage (0-100) and optional human-readable stage name.
    async fn progress(&self, task_id: &str, percent: u8, stage: Option<&str>) -> Result<()>;

    /// Check whether cancellation has been requested for this task.
    /// Pipelines call this at their suspension points between units of
    /// work rather than polling a flag directly.
    async fn is_cancelled(&self, task_id: &str) -> Result<bool> {
        let _ = task_id;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use test_log::test;

    mock! {
        Sink {}
        #[async_trait]
        impl ProgressSink for Sink {
            async fn heartbeat(&self, task_id: &str) -> Result<()>;
            async fn progress(&self, task_id: &str, percent: u8, stage: Option<&str>) -> Result<()>;
            async fn is_cancelled(&self, task_id: &str) -> Result<bool>;
        }
    }

    #[test]
    fn mock_progress_sink_satisfies_expectations() {
        let mut mock = MockSink::new();
        mock.expect_heartbeat().times(1).returning(|_| Ok(()));
        mock.expect_progress()
            .times(1)
            .returning(|_, _, _| Ok(()));
        mock.expect_is_cancelled().returning(|_| Ok(false));

        tokio_test::block_on(async {
            mock.heartbeat("task-1").await.unwrap();
            mock.progress("task-1", 42, Some("transcribing")).await.unwrap();
            assert!(!mock.is_cancelled("task-1").await.unwrap());
        });
    }
}
