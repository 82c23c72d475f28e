//! Repository for `TranscriptSegment` rows.

use sqlx::PgPool;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::models::TranscriptSegment;

#[derive(Debug, Clone)]
pub struct SegmentRepo {
    pool: PgPool,
}

/// A segment awaiting insertion; `id` is assigned at insert time.
#[derive(Debug, Clone)]
pub struct NewSegment {
    pub speaker_id: Option<Uuid>,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
}

impl SegmentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Bulk-insert all segments for a file in one transaction, per §4.2.
    /// Sequence numbers are assigned by input order, which callers are
    /// expected to have already sorted by `start_time`.
    #[instrument(level = "debug", skip(self, segments))]
    pub async fn bulk_insert(
        &self,
        media_file_id: Uuid,
        segments: &[NewSegment],
    ) -> Result<Vec<TranscriptSegment>> {
        debug!(
            "🔧 bulk-inserting {} segments for media_file {media_file_id}",
            segments.len()
        );
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(segments.len());

        for (sequence, seg) in segments.iter().enumerate() {
            let row = sqlx::query_as::<_, TranscriptSegment>(
                r#"
                INSERT INTO transcript_segment
                    (id, media_file_id, speaker_id, start_time, end_time, text, sequence)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(media_file_id)
            .bind(seg.speaker_id)
            .bind(seg.start_time)
            .bind(seg.end_time)
            .bind(&seg.text)
            .bind(sequence as i32)
            .fetch_one(&mut *tx)
            .await?;
            inserted.push(row);
        }

        tx.commit().await?;
        info!(
            "✅ inserted {} segments for media_file {media_file_id}",
            inserted.len()
        );
        Ok(inserted)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn list_for_file(&self, media_file_id: Uuid) -> Result<Vec<TranscriptSegment>> {
        let rows = sqlx::query_as::<_, TranscriptSegment>(
            "SELECT * FROM transcript_segment WHERE media_file_id = $1 ORDER BY sequence ASC",
        )
        .bind(media_file_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn delete_for_file(&self, media_file_id: Uuid) -> Result<u64> {
        let affected = sqlx::query("DELETE FROM transcript_segment WHERE media_file_id = $1")
            .bind(media_file_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected)
    }
}
