//! Repository for the per-file `analytics` row: one overwrite-upsert per
//! completed analytics run, per spec §4.7's talk-time/turn/interruption/
//! question report.

use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::models::AnalyticsRow;

#[derive(Debug, Clone)]
pub struct AnalyticsRepo {
    pool: PgPool,
}

impl AnalyticsRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upserts the report for `media_file_id`, overwriting any prior run
    /// the same way `IndexGateway::index_transcript` overwrites -- a
    /// re-run is idempotent, not additive.
    #[instrument(level = "debug", skip(self, talk_time_by_speaker))]
    pub async fn upsert(
        &self,
        media_file_id: Uuid,
        talk_time_by_speaker: serde_json::Value,
        turn_count: i32,
        interruption_count: i32,
        question_count: i32,
    ) -> Result<AnalyticsRow> {
        debug!("🔧 upserting analytics for media_file {media_file_id}");
        let row = sqlx::query_as::<_, AnalyticsRow>(
            r#"
            INSERT INTO analytics
                (media_file_id, talk_time_by_speaker, turn_count, interruption_count, question_count, computed_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (media_file_id) DO UPDATE SET
                talk_time_by_speaker = EXCLUDED.talk_time_by_speaker,
                turn_count = EXCLUDED.turn_count,
                interruption_count = EXCLUDED.interruption_count,
                question_count = EXCLUDED.question_count,
                computed_at = NOW()
            RETURNING *
            "#,
        )
        .bind(media_file_id)
        .bind(talk_time_by_speaker)
        .bind(turn_count)
        .bind(interruption_count)
        .bind(question_count)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get(&self, media_file_id: Uuid) -> Result<Option<AnalyticsRow>> {
        let row = sqlx::query_as::<_, AnalyticsRow>(
            "SELECT * FROM analytics WHERE media_file_id = $1",
        )
        .bind(media_file_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    // Upsert/overwrite behavior needs a live database; covered by
    // mpo-tlm's integration suite the same way media_file.rs's CAS
    // transitions are.
}
