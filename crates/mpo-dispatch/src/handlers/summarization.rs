//! Routes `TaskKind::Summarization` deliveries: joins a file's
//! persisted segments into transcript text and runs the summarization
//! pipeline. Writes only `MediaFile.summarization_status`/`summary`,
//! never the file's overall `status` -- a `not_configured` or `failed`
//! summary never moves a `Completed` file out of that state.

use mpo_broker::job::Delivery;
use mpo_common::{SummarizationStatus, TaskStatus};
use mpo_pipelines::summarization::{self, SummarizationOutcome};
use mpo_pipelines::CancelToken;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::context::DispatchContext;
use crate::error::{DispatchError, Result};
use crate::worker::{Outcome, MAX_NON_OWNING_REDELIVERIES};

#[derive(Debug, Clone, Deserialize)]
struct SummarizationPayload {
    file_id: Uuid,
}

#[instrument(level = "debug", skip(ctx, delivery))]
pub async fn handle(delivery: &Delivery, ctx: &DispatchContext) -> Result<Outcome> {
    let task_id = delivery.job.task_id.clone();
    let payload: SummarizationPayload = serde_json::from_value(delivery.job.payload.clone())
        .map_err(|e| DispatchError::MalformedPayload(e.to_string()))?;

    ctx.media_files
        .set_summarization_status(payload.file_id, SummarizationStatus::Processing, None)
        .await?;

    let token = CancelToken::new(ctx.tlm.clone());
    match run(ctx, payload.file_id, &token, &task_id).await {
        Ok(outcome) => {
            let (status, summary) = match outcome {
                SummarizationOutcome::Completed(text) => (SummarizationStatus::Completed, Some(text)),
                SummarizationOutcome::NotConfigured => (SummarizationStatus::NotConfigured, None),
            };
            ctx.media_files
                .set_summarization_status(payload.file_id, status, summary.as_deref())
                .await?;
            ctx.tasks.finish(&task_id, TaskStatus::Succeeded, None).await?;
            info!("✅ summarized media_file {}", payload.file_id);
            Ok(Outcome::Ack)
        }
        Err(e) => {
            let kind = e.failure_kind();
            warn!("⚠️ summarization task {task_id} for media_file {} failed: {e}", payload.file_id);
            if kind.is_retryable() && delivery.redelivery_count < MAX_NON_OWNING_REDELIVERIES {
                Ok(Outcome::Nack)
            } else {
                ctx.media_files
                    .set_summarization_status(payload.file_id, SummarizationStatus::Failed, None)
                    .await?;
                ctx.tasks.finish(&task_id, TaskStatus::Failed, Some(&e.to_string())).await?;
                Ok(Outcome::Ack)
            }
        }
    }
}

async fn run(
    ctx: &DispatchContext,
    file_id: Uuid,
    token: &CancelToken,
    task_id: &str,
) -> Result<SummarizationOutcome> {
    let segments = ctx.segments.list_for_file(file_id).await?;
    let lines: Vec<String> = segments.into_iter().map(|s| s.text).collect();
    let transcript_text = summarization::join_transcript(&lines);

    let outcome = summarization::run(
        &transcript_text,
        ctx.summarizer.as_ref(),
        ctx.secrets.as_ref(),
        token,
        task_id,
    )
    .await?;
    Ok(outcome)
}
