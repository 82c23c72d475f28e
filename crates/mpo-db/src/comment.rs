//! Repository for per-file `Comment` rows: user annotation, no
//! orchestration semantics, per §3.

use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Comment;

#[derive(Debug, Clone)]
pub struct CommentRepo {
    pool: PgPool,
}

impl CommentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(level = "debug", skip(self, body))]
    pub async fn create(&self, media_file_id: Uuid, owner: Uuid, body: &str) -> Result<Comment> {
        let row = sqlx::query_as::<_, Comment>(
            "INSERT INTO comment (id, media_file_id, owner, body, created_at) VALUES ($1, $2, $3, $4, NOW()) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(media_file_id)
        .bind(owner)
        .bind(body)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn list_for_file(&self, media_file_id: Uuid) -> Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comment WHERE media_file_id = $1 ORDER BY created_at ASC",
        )
        .bind(media_file_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM comment WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
