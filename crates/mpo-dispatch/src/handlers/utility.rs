//! Utility-queue handlers for `TaskKind::Waveform` and
//! `TaskKind::Reindex` -- jobs that need no injected model runner, so
//! they live directly in the dispatcher rather than as `mpo-pipelines`
//! stage pipelines.

use mpo_broker::job::Delivery;
use mpo_common::TaskStatus;
use serde::Deserialize;
use serde_json::json;
use tokio::io::AsyncReadExt;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::context::DispatchContext;
use crate::error::{DispatchError, Result};
use crate::worker::{Outcome, MAX_NON_OWNING_REDELIVERIES};

const WAVEFORM_BUCKETS: usize = 256;

#[derive(Debug, Clone, Deserialize)]
struct WaveformPayload {
    file_id: Uuid,
}

#[instrument(level = "debug", skip(ctx, delivery))]
pub async fn handle_waveform(delivery: &Delivery, ctx: &DispatchContext) -> Result<Outcome> {
    let task_id = delivery.job.task_id.clone();
    let payload: WaveformPayload = serde_json::from_value(delivery.job.payload.clone())
        .map_err(|e| DispatchError::MalformedPayload(e.to_string()))?;

    match run_waveform(ctx, payload.file_id).await {
        Ok(()) => {
            ctx.tasks.finish(&task_id, TaskStatus::Succeeded, None).await?;
            info!("✅ generated waveform for media_file {}", payload.file_id);
            Ok(Outcome::Ack)
        }
        Err(e) => finish_or_retry(ctx, delivery, &task_id, e).await,
    }
}

async fn run_waveform(ctx: &DispatchContext, file_id: Uuid) -> Result<()> {
    let file = ctx.media_files.get(file_id).await?;
    let mut object = ctx.store.get(&file.storage_path).await?;

    let mut bytes = Vec::new();
    object.reader.read_to_end(&mut bytes).await?;

    let peaks = downsample_peaks(&bytes, WAVEFORM_BUCKETS);
    let body = serde_json::to_vec(&json!({ "peaks": peaks }))
        .map_err(|e| DispatchError::MalformedPayload(e.to_string()))?;
    let waveform_key = format!("{}/{}/waveform", file.owner, file.id);

    let mut reader = std::io::Cursor::new(body.clone());
    ctx.store
        .put(&waveform_key, &mut reader, body.len() as u64, "application/json")
        .await?;
    Ok(())
}

/// A deterministic, codec-free stand-in for real PCM peak extraction:
/// buckets the raw object bytes and reports each bucket's average
/// deviation from the mid-byte value as its "peak". Decoding the
/// actual audio container is out of scope the same way ASR/diarization
/// model runners are -- this keeps the waveform artifact's shape (a
/// downsampled amplitude envelope) real without depending on a codec
/// crate the rest of the stack has no other use for.
fn downsample_peaks(bytes: &[u8], buckets: usize) -> Vec<f32> {
    if bytes.is_empty() || buckets == 0 {
        return Vec::new();
    }
    let chunk_size = (bytes.len() / buckets).max(1);
    bytes
        .chunks(chunk_size)
        .take(buckets)
        .map(|chunk| {
            let sum: f32 = chunk.iter().map(|b| (*b as f32 - 128.0).abs()).sum();
            sum / chunk.len() as f32 / 128.0
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
struct ReindexPayload {
    file_id: Uuid,
}

#[instrument(level = "debug", skip(ctx, delivery))]
pub async fn handle_reindex(delivery: &Delivery, ctx: &DispatchContext) -> Result<Outcome> {
    let task_id = delivery.job.task_id.clone();
    let payload: ReindexPayload = serde_json::from_value(delivery.job.payload.clone())
        .map_err(|e| DispatchError::MalformedPayload(e.to_string()))?;

    match run_reindex(ctx, payload.file_id).await {
        Ok(()) => {
            ctx.tasks.finish(&task_id, TaskStatus::Succeeded, None).await?;
            info!("✅ reindexed media_file {}", payload.file_id);
            Ok(Outcome::Ack)
        }
        Err(e) => finish_or_retry(ctx, delivery, &task_id, e).await,
    }
}

async fn run_reindex(ctx: &DispatchContext, file_id: Uuid) -> Result<()> {
    let file = ctx.media_files.get(file_id).await?;
    let segments = ctx.segments.list_for_file(file_id).await?;
    let speakers = ctx.speakers.list_for_file(file_id).await?;

    let transcript_text = segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let speaker_labels: Vec<String> = speakers.iter().map(|s| s.label.clone()).collect();

    ctx.index
        .index_transcript(file_id, file.owner, &transcript_text, &speaker_labels, &[], &file.display_name)
        .await?;

    for speaker in &speakers {
        if let Some(embedding) = &speaker.embedding {
            ctx.index
                .upsert_speaker_embedding(speaker.id, file.owner, embedding)
                .await?;
        }
    }
    Ok(())
}

async fn finish_or_retry(
    ctx: &DispatchContext,
    delivery: &Delivery,
    task_id: &str,
    error: DispatchError,
) -> Result<Outcome> {
    let kind = error.failure_kind();
    warn!("⚠️ utility task {task_id} failed: {error}");
    if kind.is_retryable() && delivery.redelivery_count < MAX_NON_OWNING_REDELIVERIES {
        Ok(Outcome::Nack)
    } else {
        ctx.tasks
            .finish(task_id, TaskStatus::Failed, Some(&error.to_string()))
            .await?;
        Ok(Outcome::Ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downsample_peaks_handles_empty_input() {
        assert!(downsample_peaks(&[], 256).is_empty());
    }

    #[test]
    fn downsample_peaks_produces_at_most_bucket_count_values() {
        let bytes = vec![128u8; 1000];
        let peaks = downsample_peaks(&bytes, 10);
        assert!(peaks.len() <= 10);
    }

    #[test]
    fn silent_bytes_produce_near_zero_peaks() {
        let bytes = vec![128u8; 100];
        let peaks = downsample_peaks(&bytes, 4);
        assert!(peaks.iter().all(|p| *p < 0.01));
    }
}
