//! Repositories for user-level grouping: collections and tags. No
//! orchestration semantics, just uniqueness rules per §4.2.

use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Collection, Tag};

#[derive(Debug, Clone)]
pub struct CollectionRepo {
    pool: PgPool,
}

impl CollectionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn create(&self, owner: Uuid, name: &str) -> Result<Collection> {
        let row = sqlx::query_as::<_, Collection>(
            "INSERT INTO collection (id, owner, name, created_at) VALUES ($1, $2, $3, NOW()) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn add_file(&self, collection_id: Uuid, media_file_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO collection_file (collection_id, media_file_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(collection_id)
        .bind(media_file_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn remove_file(&self, collection_id: Uuid, media_file_id: Uuid) -> Result<()> {
        sqlx::query(
            "DELETE FROM collection_file WHERE collection_id = $1 AND media_file_id = $2",
        )
        .bind(collection_id)
        .bind(media_file_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn list_for_owner(&self, owner: Uuid) -> Result<Vec<Collection>> {
        let rows = sqlx::query_as::<_, Collection>(
            "SELECT * FROM collection WHERE owner = $1 ORDER BY name ASC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[derive(Debug, Clone)]
pub struct TagRepo {
    pool: PgPool,
}

impl TagRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Tag names are unique globally; fetches the existing row if the
    /// name is already taken instead of erroring.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_or_create(&self, name: &str) -> Result<Tag> {
        if let Some(existing) = sqlx::query_as::<_, Tag>("SELECT * FROM tag WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
        {
            return Ok(existing);
        }

        let row = sqlx::query_as::<_, Tag>(
            "INSERT INTO tag (id, name) VALUES ($1, $2) ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn attach(&self, media_file_id: Uuid, tag_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO media_file_tag (media_file_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(media_file_id)
        .bind(tag_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn list_for_file(&self, media_file_id: Uuid) -> Result<Vec<Tag>> {
        let rows = sqlx::query_as::<_, Tag>(
            r#"
            SELECT tag.* FROM tag
            JOIN media_file_tag ON media_file_tag.tag_id = tag.id
            WHERE media_file_tag.media_file_id = $1
            ORDER BY tag.name ASC
            "#,
        )
        .bind(media_file_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
