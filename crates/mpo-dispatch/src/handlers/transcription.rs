//! Routes `TaskKind::Transcription` deliveries: drives the `Pending ->
//! Processing` CAS, materializes the stored object to a local file,
//! runs the transcription pipeline, and persists segments/speakers
//! through the Task Lifecycle Manager. A retryable failure re-enqueues
//! a fresh job under a new task id rather than relying on the broker's
//! own redelivery, since the TLM's retry budget is tracked on the file
//! row, not on any one `Task`.

use std::collections::HashMap;

use mpo_broker::job::{Delivery, Job};
use mpo_common::TaskKind;
use mpo_db::segment::NewSegment;
use mpo_pipelines::transcription::TranscriptionPipeline;
use mpo_pipelines::{CancelToken, TranscriptionInput, TranscriptionOutput};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::context::DispatchContext;
use crate::error::{DispatchError, Result};
use crate::materialize::materialize_to_tempfile;
use crate::worker::Outcome;

#[derive(Debug, Clone, Deserialize)]
struct TranscriptionPayload {
    file_id: Uuid,
    storage_path: String,
}

#[instrument(level = "debug", skip(ctx, delivery))]
pub async fn handle(delivery: &Delivery, ctx: &DispatchContext) -> Result<Outcome> {
    let task_id = delivery.job.task_id.clone();
    let payload: TranscriptionPayload = serde_json::from_value(delivery.job.payload.clone())
        .map_err(|e| DispatchError::MalformedPayload(e.to_string()))?;

    let file = ctx.tlm.dispatch(payload.file_id, &task_id).await?;
    let owner = file.owner;

    match run_pipeline(ctx, &payload, &task_id).await {
        Ok(output) => persist_success(ctx, owner, payload.file_id, &task_id, output).await?,
        Err(e) => handle_failure(ctx, owner, &payload, &task_id, e).await?,
    }

    Ok(Outcome::Ack)
}

async fn run_pipeline(
    ctx: &DispatchContext,
    payload: &TranscriptionPayload,
    task_id: &str,
) -> Result<TranscriptionOutput> {
    let materialized = materialize_to_tempfile(ctx.store.as_ref(), &payload.storage_path).await?;

    let models = ctx.config.current().models.clone();
    let input = TranscriptionInput {
        local_path: materialized.path.clone(),
        min_speakers: models.min_speakers,
        max_speakers: models.max_speakers,
        num_speakers: models.num_speakers,
        language_hint: None,
    };

    let pipeline = TranscriptionPipeline {
        transcriber: ctx.transcriber.clone(),
        diarizer: ctx.diarizer.clone(),
        garbage_cleanup: models.garbage_cleanup.clone(),
    };
    let token = CancelToken::new(ctx.tlm.clone());
    let output = pipeline.run(&input, &token, task_id).await?;
    drop(materialized);
    Ok(output)
}

async fn persist_success(
    ctx: &DispatchContext,
    owner: Uuid,
    file_id: Uuid,
    task_id: &str,
    output: TranscriptionOutput,
) -> Result<()> {
    let mut label_to_speaker_id = HashMap::new();
    for embedding in &output.speakers {
        let speaker = ctx
            .speakers
            .create(file_id, owner, &embedding.label, Some(embedding.vector.clone()))
            .await?;
        ctx.index
            .upsert_speaker_embedding(speaker.id, owner, &embedding.vector)
            .await?;
        label_to_speaker_id.insert(embedding.label.clone(), speaker.id);
    }

    let mut new_segments = Vec::with_capacity(output.segments.len());
    let mut transcript_text = String::new();
    let mut speaker_labels: Vec<String> = Vec::new();
    for seg in &output.segments {
        let speaker_id = seg
            .speaker_label
            .as_ref()
            .and_then(|label| label_to_speaker_id.get(label).copied());
        if let Some(label) = &seg.speaker_label {
            if !speaker_labels.contains(label) {
                speaker_labels.push(label.clone());
            }
        }
        transcript_text.push_str(&seg.text);
        transcript_text.push('\n');
        new_segments.push(NewSegment {
            speaker_id,
            start_time: seg.start,
            end_time: seg.end,
            text: seg.text.clone(),
        });
    }

    ctx.segments.bulk_insert(file_id, &new_segments).await?;

    let file = ctx.tlm.complete(file_id, task_id, output.duration_secs).await?;

    ctx.index
        .index_transcript(file_id, owner, &transcript_text, &speaker_labels, &[], &file.display_name)
        .await?;

    info!("✅ persisted transcription result for media_file {file_id}");
    Ok(())
}

async fn handle_failure(
    ctx: &DispatchContext,
    owner: Uuid,
    payload: &TranscriptionPayload,
    task_id: &str,
    error: DispatchError,
) -> Result<()> {
    let kind = error.failure_kind();
    warn!("⚠️ transcription task {task_id} for media_file {} failed: {error}", payload.file_id);

    if kind == mpo_common::FailureKind::Cancelled {
        ctx.tlm.confirm_cancel(payload.file_id).await?;
        return Ok(());
    }

    let file = ctx.tlm.fail(payload.file_id, task_id, &error.to_string(), kind).await?;

    if !file.status.is_terminal() {
        schedule_retry(ctx, owner, payload.file_id, &payload.storage_path, file.retry_count);
    }
    Ok(())
}

/// Spawns a detached sleep-then-enqueue rather than blocking this
/// worker's loop for the backoff duration, so the gpu queue keeps
/// draining other files' jobs while this one waits its turn.
fn schedule_retry(ctx: &DispatchContext, owner: Uuid, file_id: Uuid, storage_path: &str, retry_count: i32) {
    let delay = ctx.tlm.retry_delay(retry_count);
    let tasks = ctx.tasks.clone();
    let broker = ctx.broker.clone();
    let storage_path = storage_path.to_string();

    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        let job = Job::new(
            TaskKind::Transcription,
            json!({ "file_id": file_id, "storage_path": storage_path }),
        );
        if let Err(e) = tasks.create(&job.task_id, owner, Some(file_id), TaskKind::Transcription).await {
            warn!("⚠️ failed to create retry task row for media_file {file_id}: {e}");
            return;
        }
        if let Err(e) = broker.enqueue(job).await {
            warn!("⚠️ failed to re-enqueue retry job for media_file {file_id}: {e}");
        }
    });
}
