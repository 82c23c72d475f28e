//! Row types for the Metadata Store's tables.

use chrono::{DateTime, Utc};
use mpo_common::{FileStatus, SummarizationStatus, TaskKind, TaskStatus};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MediaFile {
    pub id: Uuid,
    pub owner: Uuid,
    pub display_name: String,
    pub byte_length: i64,
    pub mime_class: String,
    pub storage_path: String,
    pub content_hash: Vec<u8>,
    pub duration_secs: Option<f64>,
    pub status: FileStatus,
    pub retry_count: i32,
    pub max_retries: i32,
    pub active_task_id: Option<String>,
    pub task_started_at: Option<DateTime<Utc>>,
    pub task_last_update: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub cancellation_requested: bool,
    pub force_delete_eligible: bool,
    pub recovery_attempts: i32,
    pub summarization_status: Option<SummarizationStatus>,
    pub summary: Option<String>,
    pub upload_time: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: String,
    pub owner: Uuid,
    pub file_id: Option<Uuid>,
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub progress: f64,
    pub last_update: DateTime<Utc>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TranscriptSegment {
    pub id: Uuid,
    pub media_file_id: Uuid,
    pub speaker_id: Option<Uuid>,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
    pub sequence: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Speaker {
    pub id: Uuid,
    pub media_file_id: Uuid,
    pub owner: Uuid,
    pub label: String,
    pub embedding: Option<Vec<f32>>,
    pub profile_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SpeakerProfile {
    pub id: Uuid,
    pub owner: Uuid,
    pub display_name: String,
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SpeakerMatch {
    pub speaker_a: Uuid,
    pub speaker_b: Uuid,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Collection {
    pub id: Uuid,
    pub owner: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalyticsRow {
    pub media_file_id: Uuid,
    pub talk_time_by_speaker: serde_json::Value,
    pub turn_count: i32,
    pub interruption_count: i32,
    pub question_count: i32,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub media_file_id: Uuid,
    pub owner: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
