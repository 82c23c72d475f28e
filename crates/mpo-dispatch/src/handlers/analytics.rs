//! Routes `TaskKind::Analytics` deliveries: computes talk-time,
//! turn-taking, interruption, and question statistics from a file's
//! already-persisted segments. Pure function of DB state, no model
//! runners or object-store reads involved.

use mpo_broker::job::Delivery;
use mpo_common::TaskStatus;
use mpo_pipelines::analytics::{self, AnalyticsSegment};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::context::DispatchContext;
use crate::error::{DispatchError, Result};
use crate::worker::{Outcome, MAX_NON_OWNING_REDELIVERIES};

const UNKNOWN_SPEAKER_LABEL: &str = "UNKNOWN";

#[derive(Debug, Clone, Deserialize)]
struct AnalyticsPayload {
    file_id: Uuid,
}

#[instrument(level = "debug", skip(ctx, delivery))]
pub async fn handle(delivery: &Delivery, ctx: &DispatchContext) -> Result<Outcome> {
    let task_id = delivery.job.task_id.clone();
    let payload: AnalyticsPayload = serde_json::from_value(delivery.job.payload.clone())
        .map_err(|e| DispatchError::MalformedPayload(e.to_string()))?;

    match run(ctx, payload.file_id).await {
        Ok(()) => {
            ctx.tasks.finish(&task_id, TaskStatus::Succeeded, None).await?;
            info!("✅ computed analytics for media_file {}", payload.file_id);
            Ok(Outcome::Ack)
        }
        Err(e) => {
            let kind = e.failure_kind();
            warn!("⚠️ analytics task {task_id} for media_file {} failed: {e}", payload.file_id);
            if kind.is_retryable() && delivery.redelivery_count < MAX_NON_OWNING_REDELIVERIES {
                Ok(Outcome::Nack)
            } else {
                ctx.tasks.finish(&task_id, TaskStatus::Failed, Some(&e.to_string())).await?;
                Ok(Outcome::Ack)
            }
        }
    }
}

async fn run(ctx: &DispatchContext, file_id: Uuid) -> Result<()> {
    let segments = ctx.segments.list_for_file(file_id).await?;
    let speakers = ctx.speakers.list_for_file(file_id).await?;

    let label_for = |speaker_id: Option<Uuid>| -> String {
        speaker_id
            .and_then(|id| speakers.iter().find(|s| s.id == id))
            .map(|s| s.label.clone())
            .unwrap_or_else(|| UNKNOWN_SPEAKER_LABEL.to_string())
    };

    let analytics_segments: Vec<AnalyticsSegment> = segments
        .iter()
        .map(|s| AnalyticsSegment {
            speaker_label: label_for(s.speaker_id),
            start_time: s.start_time,
            end_time: s.end_time,
            text: s.text.clone(),
        })
        .collect();

    let report = analytics::analyze(&analytics_segments);
    let talk_time_by_speaker = serde_json::to_value(&report.talk_time)
        .map_err(|e| DispatchError::MalformedPayload(e.to_string()))?;

    ctx.analytics
        .upsert(
            file_id,
            talk_time_by_speaker,
            report.turns.len() as i32,
            report.interruptions.len() as i32,
            report.questions.len() as i32,
        )
        .await?;
    Ok(())
}
