//! Schema migrations for the Metadata Store.

use sqlx::postgres::PgPool;
use tracing::{debug, info, instrument};

use crate::error::Result;

pub const MIGRATION_VERSION: &str = "20260101000000";

#[instrument(level = "debug", skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    debug!("🔧 starting database migrations");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version TEXT PRIMARY KEY,
            applied_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    let statements = vec![
        r#"
        CREATE TABLE IF NOT EXISTS media_file (
            id UUID PRIMARY KEY,
            owner UUID NOT NULL,
            display_name TEXT NOT NULL,
            byte_length BIGINT NOT NULL,
            mime_class TEXT NOT NULL,
            storage_path TEXT NOT NULL,
            content_hash BYTEA NOT NULL,
            duration_secs DOUBLE PRECISION,
            status TEXT NOT NULL DEFAULT 'pending',
            retry_count INTEGER NOT NULL DEFAULT 0,
            max_retries INTEGER NOT NULL DEFAULT 3,
            active_task_id TEXT,
            task_started_at TIMESTAMP WITH TIME ZONE,
            task_last_update TIMESTAMP WITH TIME ZONE,
            last_error TEXT,
            cancellation_requested BOOLEAN NOT NULL DEFAULT FALSE,
            force_delete_eligible BOOLEAN NOT NULL DEFAULT FALSE,
            recovery_attempts INTEGER NOT NULL DEFAULT 0,
            summarization_status TEXT,
            summary TEXT,
            upload_time TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            completed_at TIMESTAMP WITH TIME ZONE,
            CONSTRAINT media_file_owner_hash_unique UNIQUE (owner, content_hash)
        )
        "#,
        r#"CREATE INDEX IF NOT EXISTS media_file_owner_upload_time_idx ON media_file (owner, upload_time)"#,
        r#"CREATE INDEX IF NOT EXISTS media_file_status_idx ON media_file (status)"#,
        r#"CREATE INDEX IF NOT EXISTS media_file_content_hash_idx ON media_file (content_hash)"#,
        r#"CREATE INDEX IF NOT EXISTS media_file_active_task_id_idx ON media_file (active_task_id)"#,
        r#"CREATE INDEX IF NOT EXISTS media_file_task_last_update_idx ON media_file (task_last_update)"#,
        r#"
        CREATE TABLE IF NOT EXISTS task (
            id TEXT PRIMARY KEY,
            owner UUID NOT NULL,
            file_id UUID REFERENCES media_file(id) ON DELETE CASCADE,
            kind TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'queued',
            progress DOUBLE PRECISION NOT NULL DEFAULT 0.0,
            last_update TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            error TEXT,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        )
        "#,
        r#"CREATE INDEX IF NOT EXISTS task_file_id_idx ON task (file_id)"#,
        r#"CREATE INDEX IF NOT EXISTS task_status_idx ON task (status)"#,
        r#"
        CREATE TABLE IF NOT EXISTS speaker_profile (
            id UUID PRIMARY KEY,
            owner UUID NOT NULL,
            display_name TEXT NOT NULL,
            embedding REAL[],
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS speaker (
            id UUID PRIMARY KEY,
            media_file_id UUID NOT NULL REFERENCES media_file(id) ON DELETE CASCADE,
            owner UUID NOT NULL,
            label TEXT NOT NULL,
            embedding REAL[],
            profile_id UUID REFERENCES speaker_profile(id) ON DELETE SET NULL,
            CONSTRAINT speaker_file_label_unique UNIQUE (owner, media_file_id, label)
        )
        "#,
        r#"CREATE INDEX IF NOT EXISTS speaker_media_file_id_idx ON speaker (media_file_id)"#,
        r#"
        CREATE TABLE IF NOT EXISTS speaker_match (
            speaker_a UUID NOT NULL REFERENCES speaker_profile(id) ON DELETE CASCADE,
            speaker_b UUID NOT NULL REFERENCES speaker_profile(id) ON DELETE CASCADE,
            score DOUBLE PRECISION NOT NULL,
            PRIMARY KEY (speaker_a, speaker_b),
            CONSTRAINT speaker_match_canonical_order CHECK (speaker_a < speaker_b)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS transcript_segment (
            id UUID PRIMARY KEY,
            media_file_id UUID NOT NULL REFERENCES media_file(id) ON DELETE CASCADE,
            speaker_id UUID REFERENCES speaker(id) ON DELETE SET NULL,
            start_time DOUBLE PRECISION NOT NULL,
            end_time DOUBLE PRECISION NOT NULL,
            text TEXT NOT NULL,
            sequence INTEGER NOT NULL,
            CONSTRAINT transcript_segment_times_valid CHECK (end_time > start_time)
        )
        "#,
        r#"CREATE INDEX IF NOT EXISTS transcript_segment_media_file_id_idx ON transcript_segment (media_file_id)"#,
        r#"CREATE INDEX IF NOT EXISTS transcript_segment_speaker_id_idx ON transcript_segment (speaker_id)"#,
        r#"
        CREATE TABLE IF NOT EXISTS collection (
            id UUID PRIMARY KEY,
            owner UUID NOT NULL,
            name TEXT NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT collection_owner_name_unique UNIQUE (owner, name)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS collection_file (
            collection_id UUID NOT NULL REFERENCES collection(id) ON DELETE CASCADE,
            media_file_id UUID NOT NULL REFERENCES media_file(id) ON DELETE CASCADE,
            PRIMARY KEY (collection_id, media_file_id)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS tag (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS media_file_tag (
            media_file_id UUID NOT NULL REFERENCES media_file(id) ON DELETE CASCADE,
            tag_id UUID NOT NULL REFERENCES tag(id) ON DELETE CASCADE,
            PRIMARY KEY (media_file_id, tag_id)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS comment (
            id UUID PRIMARY KEY,
            media_file_id UUID NOT NULL REFERENCES media_file(id) ON DELETE CASCADE,
            owner UUID NOT NULL,
            body TEXT NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS analytics (
            media_file_id UUID PRIMARY KEY REFERENCES media_file(id) ON DELETE CASCADE,
            talk_time_by_speaker JSONB NOT NULL DEFAULT '{}'::jsonb,
            turn_count INTEGER NOT NULL DEFAULT 0,
            interruption_count INTEGER NOT NULL DEFAULT 0,
            question_count INTEGER NOT NULL DEFAULT 0,
            computed_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        )
        "#,
    ];

    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }

    sqlx::query("INSERT INTO _migrations (version) VALUES ($1) ON CONFLICT DO NOTHING")
        .bind(MIGRATION_VERSION)
        .execute(pool)
        .await?;

    info!("✅ database migrations applied, version={}", MIGRATION_VERSION);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_version_is_a_timestamp_like_string() {
        assert_eq!(MIGRATION_VERSION.len(), 14);
        assert!(MIGRATION_VERSION.chars().all(|c| c.is_ascii_digit()));
    }
}
