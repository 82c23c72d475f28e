//! Routes `TaskKind::UrlIngest` deliveries: fetches the source,
//! stores the bytes under the placeholder's storage path, and hands
//! off to the Ingestion Coordinator's finalize step -- the same
//! dedup-or-store decision a direct upload goes through. Unlike
//! transcription, this task kind never touches `MediaFile.status`
//! (the row stays `Pending` until the transcription job it indirectly
//! enqueues flips it), so retry here leans on the broker's own
//! redelivery rather than a fresh `Task` row.

use mpo_broker::job::Delivery;
use mpo_common::TaskStatus;
use mpo_pipelines::url_ingest as url_ingest_pipeline;
use mpo_pipelines::CancelToken;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::context::DispatchContext;
use crate::error::{DispatchError, Result};
use crate::worker::{Outcome, MAX_NON_OWNING_REDELIVERIES};

#[derive(Debug, Clone, Deserialize)]
struct UrlIngestPayload {
    file_id: Uuid,
    url: String,
    storage_path: String,
}

#[instrument(level = "debug", skip(ctx, delivery))]
pub async fn handle(delivery: &Delivery, ctx: &DispatchContext) -> Result<Outcome> {
    let task_id = delivery.job.task_id.clone();
    let payload: UrlIngestPayload = serde_json::from_value(delivery.job.payload.clone())
        .map_err(|e| DispatchError::MalformedPayload(e.to_string()))?;

    let token = CancelToken::new(ctx.tlm.clone());
    match run(ctx, &payload, &token, &task_id).await {
        Ok(()) => {
            ctx.tasks.finish(&task_id, TaskStatus::Succeeded, None).await?;
            info!("✅ finished url ingest task {task_id} for media_file {}", payload.file_id);
            Ok(Outcome::Ack)
        }
        Err(e) => {
            let kind = e.failure_kind();
            warn!("⚠️ url ingest task {task_id} for media_file {} failed: {e}", payload.file_id);
            if kind.is_retryable() && delivery.redelivery_count < MAX_NON_OWNING_REDELIVERIES {
                Ok(Outcome::Nack)
            } else {
                ctx.tasks.finish(&task_id, TaskStatus::Failed, Some(&e.to_string())).await?;
                Ok(Outcome::Ack)
            }
        }
    }
}

async fn run(ctx: &DispatchContext, payload: &UrlIngestPayload, token: &CancelToken, task_id: &str) -> Result<()> {
    let fetched = url_ingest_pipeline::run(&payload.url, ctx.downloader.as_ref(), token, task_id).await?;

    let mut reader = std::io::Cursor::new(fetched.bytes.clone());
    ctx.store
        .put(&payload.storage_path, &mut reader, fetched.bytes.len() as u64, &fetched.content_type)
        .await?;

    let task = ctx.tasks.get(task_id).await?;
    ctx.ingest
        .finalize_url_ingest(
            task.owner,
            payload.file_id,
            fetched.bytes.len() as i64,
            &fetched.content_type,
            fetched.content_hash.as_bytes(),
        )
        .await?;
    Ok(())
}
