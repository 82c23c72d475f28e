//! Repository for `Task` rows (the audit trail of dispatched jobs).

use mpo_common::{TaskKind, TaskStatus};
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{DbError, Result};
use crate::models::Task;

#[derive(Debug, Clone)]
pub struct TaskRepo {
    pool: PgPool,
}

impl TaskRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn create(
        &self,
        id: &str,
        owner: Uuid,
        file_id: Option<Uuid>,
        kind: TaskKind,
    ) -> Result<Task> {
        debug!("🔧 creating task {id} kind={kind:?}");
        let row = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO task (id, owner, file_id, kind, status, progress, last_update, created_at)
            VALUES ($1, $2, $3, $4, 'queued', 0.0, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(file_id)
        .bind(kind)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get(&self, id: &str) -> Result<Task> {
        sqlx::query_as::<_, Task>("SELECT * FROM task WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("task {id}")))
    }

    /// Progress must be monotonically non-decreasing within a single
    /// run; callers are expected to enforce that at the TLM layer, this
    /// only persists the value it's given.
    #[instrument(level = "debug", skip(self))]
    pub async fn update_progress(&self, id: &str, progress: f64) -> Result<()> {
        sqlx::query(
            "UPDATE task SET progress = $2, status = 'running', last_update = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(progress)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn finish(&self, id: &str, status: TaskStatus, error: Option<&str>) -> Result<()> {
        sqlx::query(
            "UPDATE task SET status = $2, error = $3, last_update = NOW(), progress = CASE WHEN $2 = 'succeeded' THEN 1.0 ELSE progress END WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn active_for_file(&self, file_id: Uuid) -> Result<Option<Task>> {
        let row = sqlx::query_as::<_, Task>(
            "SELECT * FROM task WHERE file_id = $1 AND status IN ('queued', 'running') ORDER BY created_at DESC LIMIT 1",
        )
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
