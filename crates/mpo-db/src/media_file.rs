//! Repository for `MediaFile` rows: creation, dedup lookup, and the
//! compare-and-swap transitions the Task Lifecycle Manager drives.

use chrono::Utc;
use mpo_common::{FileStatus, SummarizationStatus};
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{DbError, Result};
use crate::models::MediaFile;

#[derive(Debug, Clone)]
pub struct MediaFileRepo {
    pool: PgPool,
}

/// Outcome of [`MediaFileRepo::finalize_download`]: either the
/// placeholder row now holds the real content, or it was discarded in
/// favor of an existing file with the same `(owner, content_hash)`.
#[derive(Debug, Clone)]
pub enum DownloadFinalizeOutcome {
    Stored(MediaFile),
    Duplicate(MediaFile),
}

impl MediaFileRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Look up an existing file by `(owner, content_hash)` for dedup.
    #[instrument(level = "debug", skip(self, content_hash))]
    pub async fn find_by_content_hash(
        &self,
        owner: Uuid,
        content_hash: &[u8],
    ) -> Result<Option<MediaFile>> {
        let row = sqlx::query_as::<_, MediaFile>(
            "SELECT * FROM media_file WHERE owner = $1 AND content_hash = $2",
        )
        .bind(owner)
        .bind(content_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<MediaFile> {
        sqlx::query_as::<_, MediaFile>("SELECT * FROM media_file WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("media_file {id}")))
    }

    /// Create a Pending row for a freshly-prepared upload. `id` is chosen
    /// by the caller (rather than generated here) so the Ingestion
    /// Coordinator can derive `storage_path = {owner}/{uuid}/original`
    /// from the same id it inserts. Relies on the `(owner, content_hash)`
    /// unique constraint to reject concurrent duplicate prepares; the
    /// caller recovers via `find_by_content_hash` on conflict.
    #[instrument(level = "debug", skip(self, content_hash))]
    pub async fn create_pending(
        &self,
        id: Uuid,
        owner: Uuid,
        display_name: &str,
        byte_length: i64,
        mime_class: &str,
        storage_path: &str,
        content_hash: &[u8],
    ) -> Result<MediaFile> {
        debug!("🔧 creating pending media_file {id}");

        let result = sqlx::query_as::<_, MediaFile>(
            r#"
            INSERT INTO media_file
                (id, owner, display_name, byte_length, mime_class, storage_path,
                 content_hash, status, max_retries, upload_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', 3, NOW())
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(display_name)
        .bind(byte_length)
        .bind(mime_class)
        .bind(storage_path)
        .bind(content_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(file) => {
                info!("✅ created pending media_file {}", file.id);
                Ok(file)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                warn!("⚠️ duplicate prepare for owner={owner}, recovering existing row");
                self.find_by_content_hash(owner, content_hash)
                    .await?
                    .ok_or_else(|| {
                        DbError::Conflict("unique violation but no row found on recovery".into())
                    })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Records the duration the Ingestion Coordinator's probe found
    /// before a transcription job has run. Transcription overwrites this
    /// with the authoritative value from the ASR output in [`Self::complete`].
    #[instrument(level = "debug", skip(self))]
    pub async fn set_probed_duration(&self, id: Uuid, duration_secs: f64) -> Result<()> {
        sqlx::query("UPDATE media_file SET duration_secs = $2 WHERE id = $1 AND status = 'pending'")
            .bind(id)
            .bind(duration_secs)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Records the outcome of a summarization attempt, independent of the
    /// file's overall `status` -- a `not_configured` or `failed` summary
    /// status never moves the file out of `Completed`.
    #[instrument(level = "debug", skip(self, summary))]
    pub async fn set_summarization_status(
        &self,
        id: Uuid,
        status: SummarizationStatus,
        summary: Option<&str>,
    ) -> Result<()> {
        sqlx::query("UPDATE media_file SET summarization_status = $2, summary = $3 WHERE id = $1")
            .bind(id)
            .bind(status)
            .bind(summary)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Overwrites a URL-ingest row's placeholder hash/storage fields once
    /// the download stage has fetched and hashed the real bytes. Recovers
    /// from a `(owner, content_hash)` collision the same way
    /// [`Self::create_pending`] does: the placeholder row loses the race
    /// and the caller is handed the file that already holds this content.
    #[instrument(level = "debug", skip(self, content_hash))]
    pub async fn finalize_download(
        &self,
        id: Uuid,
        byte_length: i64,
        mime_class: &str,
        storage_path: &str,
        content_hash: &[u8],
    ) -> Result<DownloadFinalizeOutcome> {
        let result = sqlx::query_as::<_, MediaFile>(
            r#"
            UPDATE media_file
            SET byte_length = $2, mime_class = $3, storage_path = $4, content_hash = $5
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(byte_length)
        .bind(mime_class)
        .bind(storage_path)
        .bind(content_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(file) => {
                info!("✅ finalized downloaded media_file {id}");
                Ok(DownloadFinalizeOutcome::Stored(file))
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                warn!("⚠️ downloaded content duplicates an existing file, discarding placeholder {id}");
                let placeholder = self.get(id).await?;
                self.delete(id).await?;
                let existing = self
                    .find_by_content_hash(placeholder.owner, content_hash)
                    .await?
                    .ok_or_else(|| {
                        DbError::Conflict("unique violation but no row found on recovery".into())
                    })?;
                Ok(DownloadFinalizeOutcome::Duplicate(existing))
            }
            Err(sqlx::Error::RowNotFound) => Err(DbError::ConcurrencyConflict(format!(
                "media_file {id} is not Pending"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// `Pending -> Processing`: set `active_task_id`/`task_started_at`,
    /// clear `last_error`. Fails with `ConcurrencyConflict` if another
    /// task already owns the file or it isn't in a startable state.
    #[instrument(level = "debug", skip(self))]
    pub async fn start_processing(&self, id: Uuid, task_id: &str) -> Result<MediaFile> {
        let row = sqlx::query_as::<_, MediaFile>(
            r#"
            UPDATE media_file
            SET status = 'processing',
                active_task_id = $2,
                task_started_at = NOW(),
                task_last_update = NOW(),
                last_error = NULL
            WHERE id = $1 AND status IN ('pending', 'error') AND active_task_id IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| {
            DbError::ConcurrencyConflict(format!(
                "media_file {id} is not in a startable state or already owned"
            ))
        })
    }

    /// `Processing -> Completed`: clears `active_task_id`, stamps
    /// `completed_at`. Segment insertion happens in the same transaction
    /// by the caller; this only flips the file row.
    #[instrument(level = "debug", skip(self))]
    pub async fn complete(&self, id: Uuid, task_id: &str, duration_secs: f64) -> Result<MediaFile> {
        let row = sqlx::query_as::<_, MediaFile>(
            r#"
            UPDATE media_file
            SET status = 'completed',
                active_task_id = NULL,
                duration_secs = $3,
                completed_at = NOW(),
                task_last_update = NOW()
            WHERE id = $1 AND active_task_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(task_id)
        .bind(duration_secs)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| {
            DbError::ConcurrencyConflict(format!("media_file {id} not owned by task {task_id}"))
        })
    }

    /// Stage failure: increments `retry_count`, records `last_error`, and
    /// either moves back to `Pending` (retryable, under the retry
    /// budget) or leaves the file in `Error`.
    #[instrument(level = "debug", skip(self))]
    pub async fn fail(&self, id: Uuid, task_id: &str, error: &str, retryable: bool) -> Result<MediaFile> {
        let file = self.get(id).await?;
        let next_retry_count = file.retry_count + 1;
        let should_retry = retryable && next_retry_count < file.max_retries;
        let next_status = if should_retry {
            FileStatus::Pending
        } else {
            FileStatus::Error
        };

        let row = sqlx::query_as::<_, MediaFile>(
            r#"
            UPDATE media_file
            SET status = $3,
                active_task_id = NULL,
                retry_count = $4,
                last_error = $5,
                task_last_update = NOW()
            WHERE id = $1 AND active_task_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(task_id)
        .bind(next_status)
        .bind(next_retry_count)
        .bind(error)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| {
            DbError::ConcurrencyConflict(format!("media_file {id} not owned by task {task_id}"))
        })
    }

    /// `Processing -> Cancelling`, set when `cancellation_requested` is
    /// raised; does not preempt the running stage.
    #[instrument(level = "debug", skip(self))]
    pub async fn request_cancel(&self, id: Uuid) -> Result<MediaFile> {
        let row = sqlx::query_as::<_, MediaFile>(
            r#"
            UPDATE media_file
            SET status = 'cancelling', cancellation_requested = TRUE, task_last_update = NOW()
            WHERE id = $1 AND status = 'processing'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| {
            DbError::ConcurrencyConflict(format!("media_file {id} is not Processing"))
        })
    }

    /// `Cancelling -> Cancelled`, invoked either by the owning worker on
    /// observing the flag, or by the reaper on timeout.
    #[instrument(level = "debug", skip(self))]
    pub async fn finish_cancel(&self, id: Uuid) -> Result<MediaFile> {
        let row = sqlx::query_as::<_, MediaFile>(
            r#"
            UPDATE media_file
            SET status = 'cancelled',
                active_task_id = NULL,
                force_delete_eligible = TRUE,
                task_last_update = NOW()
            WHERE id = $1 AND status = 'cancelling'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| DbError::ConcurrencyConflict(format!("media_file {id} is not Cancelling")))
    }

    /// `Processing -> Orphaned`, written by the reaper when
    /// `task_last_update` has gone stale with no heartbeat.
    #[instrument(level = "debug", skip(self))]
    pub async fn mark_orphaned(&self, id: Uuid) -> Result<MediaFile> {
        let row = sqlx::query_as::<_, MediaFile>(
            r#"
            UPDATE media_file
            SET status = 'orphaned',
                active_task_id = NULL,
                recovery_attempts = recovery_attempts + 1,
                task_last_update = NOW()
            WHERE id = $1 AND status = 'processing'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| DbError::ConcurrencyConflict(format!("media_file {id} is not Processing")))
    }

    /// `Orphaned -> Pending`, triggered by operator recovery.
    #[instrument(level = "debug", skip(self))]
    pub async fn recover(&self, id: Uuid) -> Result<MediaFile> {
        let row = sqlx::query_as::<_, MediaFile>(
            r#"
            UPDATE media_file
            SET status = 'pending', last_error = NULL
            WHERE id = $1 AND status = 'orphaned'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| DbError::ConcurrencyConflict(format!("media_file {id} is not Orphaned")))
    }

    /// Write a progress/heartbeat update. Callers (the TLM's rate
    /// limiter) decide whether enough time/delta has passed to call
    /// this; the repo itself does not rate-limit.
    #[instrument(level = "debug", skip(self))]
    pub async fn touch_progress(&self, id: Uuid, task_id: &str) -> Result<()> {
        let affected = sqlx::query(
            "UPDATE media_file SET task_last_update = NOW() WHERE id = $1 AND active_task_id = $2",
        )
        .bind(id)
        .bind(task_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(DbError::ConcurrencyConflict(format!(
                "media_file {id} not owned by task {task_id}"
            )));
        }
        Ok(())
    }

    /// Scans rows stuck in `Processing` with a stale `task_last_update`,
    /// used by the Recovery Reaper's stall sweep.
    #[instrument(level = "debug", skip(self))]
    pub async fn find_stale_processing(
        &self,
        older_than: chrono::DateTime<Utc>,
    ) -> Result<Vec<MediaFile>> {
        let rows = sqlx::query_as::<_, MediaFile>(
            "SELECT * FROM media_file WHERE status = 'processing' AND task_last_update < $1",
        )
        .bind(older_than)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn find_stale_pending(&self, older_than: chrono::DateTime<Utc>) -> Result<Vec<MediaFile>> {
        let rows = sqlx::query_as::<_, MediaFile>(
            "SELECT * FROM media_file WHERE status = 'pending' AND upload_time < $1",
        )
        .bind(older_than)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn find_stale_cancelling(
        &self,
        older_than: chrono::DateTime<Utc>,
    ) -> Result<Vec<MediaFile>> {
        let rows = sqlx::query_as::<_, MediaFile>(
            "SELECT * FROM media_file WHERE status = 'cancelling' AND task_last_update < $1",
        )
        .bind(older_than)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Refuses with `Ok(false)` when the file is live and not eligible
    /// for force delete; callers surface `FailureKind::FileNotSafeToDelete`.
    #[instrument(level = "debug", skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let file = self.get(id).await?;
        let blocked = matches!(file.status, FileStatus::Processing | FileStatus::Cancelling)
            && !file.force_delete_eligible;
        if blocked {
            return Ok(false);
        }

        sqlx::query("DELETE FROM media_file WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!("✅ deleted media_file {id}");
        Ok(true)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn list_by_owner(&self, owner: Uuid, limit: i64) -> Result<Vec<MediaFile>> {
        let rows = sqlx::query_as::<_, MediaFile>(
            "SELECT * FROM media_file WHERE owner = $1 ORDER BY upload_time DESC LIMIT $2",
        )
        .bind(owner)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    // Repository behavior is covered by `mpo-tlm`'s state-machine tests
    // against a real Postgres instance; this crate's unit tests stick to
    // pure logic (see `error.rs`, `migrations.rs`).
}
