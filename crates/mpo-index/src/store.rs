//! `IndexGateway`: the search seam stage pipelines and the façade depend
//! on. Document id is always the file's surrogate id; re-indexing a file
//! is an overwrite, never an append (§4.3's idempotence contract).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;

/// Filters a transcript search may be narrowed by. All fields are
/// conjunctive (AND); an empty/`None` field means "no constraint".
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub tags: Vec<String>,
    pub speakers: Vec<String>,
    pub file_type: Option<String>,
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

/// A transcript search result with the matched file id and a highlight
/// snippet for display.
#[derive(Debug, Clone)]
pub struct TranscriptHit {
    pub file_id: Uuid,
    pub score: f32,
    pub highlight: String,
}

/// A speaker embedding similarity result.
#[derive(Debug, Clone)]
pub struct SpeakerHit {
    pub speaker_id: Uuid,
    pub score: f32,
}

#[async_trait]
pub trait IndexGateway: Send + Sync {
    /// Indexes (or re-indexes, overwriting) the transcript for `file_id`.
    async fn index_transcript(
        &self,
        file_id: Uuid,
        owner: Uuid,
        text: &str,
        speakers: &[String],
        tags: &[String],
        title: &str,
    ) -> Result<()>;

    async fn search_transcripts(
        &self,
        owner: Uuid,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<TranscriptHit>>;

    /// Overwrite-upserts the embedding for `speaker_id`.
    async fn upsert_speaker_embedding(&self, speaker_id: Uuid, owner: Uuid, vec: &[f32]) -> Result<()>;

    async fn search_similar_speakers(
        &self,
        vec: &[f32],
        owner: Uuid,
        k: usize,
    ) -> Result<Vec<SpeakerHit>>;

    /// Removes the transcript document for `file_id`, if present.
    /// Idempotent: deleting an already-absent document succeeds.
    async fn delete_document(&self, file_id: Uuid) -> Result<()>;
}
