//! In-process `IndexGateway`: an inverted token index for transcripts
//! and brute-force cosine kNN for speaker embeddings. Satisfies the
//! overwrite-idempotence contract so it is usable wherever a real
//! search engine (OpenSearch, Qdrant, ...) would later be substituted,
//! and is exactly what the single-node/dev deployment and test suite
//! run against.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::store::{IndexGateway, SearchFilters, SpeakerHit, TranscriptHit};

#[derive(Debug, Clone)]
struct TranscriptDoc {
    owner: Uuid,
    text: String,
    tokens: Vec<String>,
    speakers: Vec<String>,
    tags: Vec<String>,
    title: String,
    indexed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct SpeakerDoc {
    owner: Uuid,
    vec: Vec<f32>,
}

#[derive(Debug, Default)]
struct State {
    transcripts: HashMap<Uuid, TranscriptDoc>,
    speakers: HashMap<Uuid, SpeakerDoc>,
}

/// An in-memory `IndexGateway`. Cheap to construct, fine for tests and
/// single-node deployments; not durable across restarts.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    state: RwLock<State>,
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IndexGateway for MemoryIndex {
    #[instrument(level = "debug", skip(self, text))]
    async fn index_transcript(
        &self,
        file_id: Uuid,
        owner: Uuid,
        text: &str,
        speakers: &[String],
        tags: &[String],
        title: &str,
    ) -> Result<()> {
        let doc = TranscriptDoc {
            owner,
            text: text.to_string(),
            tokens: tokenize(text),
            speakers: speakers.to_vec(),
            tags: tags.to_vec(),
            title: title.to_string(),
            indexed_at: Utc::now(),
        };
        let mut state = self.state.write().expect("memory index lock poisoned");
        debug!("🔧 indexing transcript doc={file_id} (overwrite={})", state.transcripts.contains_key(&file_id));
        state.transcripts.insert(file_id, doc);
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn search_transcripts(
        &self,
        owner: Uuid,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<TranscriptHit>> {
        let needle = tokenize(query);
        let state = self.state.read().expect("memory index lock poisoned");

        let mut hits: Vec<TranscriptHit> = state
            .transcripts
            .iter()
            .filter(|(_, doc)| doc.owner == owner)
            .filter(|(_, doc)| {
                filters
                    .tags
                    .iter()
                    .all(|t| doc.tags.iter().any(|dt| dt == t))
            })
            .filter(|(_, doc)| {
                filters
                    .speakers
                    .iter()
                    .all(|s| doc.speakers.iter().any(|ds| ds == s))
            })
            .filter(|(_, doc)| {
                filters.after.map_or(true, |a| doc.indexed_at >= a)
                    && filters.before.map_or(true, |b| doc.indexed_at <= b)
            })
            .filter_map(|(id, doc)| {
                let matched = needle.iter().filter(|t| doc.tokens.contains(t)).count();
                if needle.is_empty() || matched > 0 {
                    let score = if needle.is_empty() {
                        1.0
                    } else {
                        matched as f32 / needle.len() as f32
                    };
                    Some(TranscriptHit {
                        file_id: *id,
                        score,
                        highlight: highlight(&doc.text, &needle),
                    })
                } else {
                    None
                }
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(hits)
    }

    #[instrument(level = "debug", skip(self, vec))]
    async fn upsert_speaker_embedding(&self, speaker_id: Uuid, owner: Uuid, vec: &[f32]) -> Result<()> {
        let mut state = self.state.write().expect("memory index lock poisoned");
        state.speakers.insert(
            speaker_id,
            SpeakerDoc {
                owner,
                vec: vec.to_vec(),
            },
        );
        Ok(())
    }

    #[instrument(level = "debug", skip(self, vec))]
    async fn search_similar_speakers(
        &self,
        vec: &[f32],
        owner: Uuid,
        k: usize,
    ) -> Result<Vec<SpeakerHit>> {
        let state = self.state.read().expect("memory index lock poisoned");
        let mut hits: Vec<SpeakerHit> = state
            .speakers
            .iter()
            .filter(|(_, doc)| doc.owner == owner)
            .map(|(id, doc)| SpeakerHit {
                speaker_id: *id,
                score: cosine(vec, &doc.vec),
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete_document(&self, file_id: Uuid) -> Result<()> {
        let mut state = self.state.write().expect("memory index lock poisoned");
        state.transcripts.remove(&file_id);
        Ok(())
    }
}

fn highlight(text: &str, needle: &[String]) -> String {
    if needle.is_empty() {
        return text.chars().take(160).collect();
    }
    let lower = text.to_lowercase();
    for token in needle {
        if let Some(pos) = lower.find(token.as_str()) {
            let start = pos.saturating_sub(40);
            let end = (pos + token.len() + 40).min(text.len());
            return text[start..end].to_string();
        }
    }
    text.chars().take(160).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Uuid {
        Uuid::nil()
    }

    #[tokio::test]
    async fn reindexing_a_file_overwrites_rather_than_appends() {
        let index = MemoryIndex::new();
        let file_id = Uuid::new_v4();

        index
            .index_transcript(file_id, owner(), "hello world", &[], &[], "t1")
            .await
            .unwrap();
        index
            .index_transcript(file_id, owner(), "goodbye world", &[], &[], "t1")
            .await
            .unwrap();

        let hits = index
            .search_transcripts(owner(), "hello", &SearchFilters::default())
            .await
            .unwrap();
        assert!(hits.is_empty());

        let hits = index
            .search_transcripts(owner(), "goodbye", &SearchFilters::default())
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn search_is_scoped_to_owner() {
        let index = MemoryIndex::new();
        let other_owner = Uuid::new_v4();
        let file_id = Uuid::new_v4();

        index
            .index_transcript(file_id, other_owner, "shared secret", &[], &[], "t")
            .await
            .unwrap();

        let hits = index
            .search_transcripts(owner(), "shared", &SearchFilters::default())
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn delete_document_is_idempotent() {
        let index = MemoryIndex::new();
        let file_id = Uuid::new_v4();
        index.delete_document(file_id).await.unwrap();
        index
            .index_transcript(file_id, owner(), "text", &[], &[], "t")
            .await
            .unwrap();
        index.delete_document(file_id).await.unwrap();
        index.delete_document(file_id).await.unwrap();

        let hits = index
            .search_transcripts(owner(), "text", &SearchFilters::default())
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn similar_speakers_ranks_by_cosine_similarity() {
        let index = MemoryIndex::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        index.upsert_speaker_embedding(a, owner(), &[1.0, 0.0]).await.unwrap();
        index.upsert_speaker_embedding(b, owner(), &[0.0, 1.0]).await.unwrap();

        let hits = index
            .search_similar_speakers(&[1.0, 0.0], owner(), 2)
            .await
            .unwrap();
        assert_eq!(hits[0].speaker_id, a);
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn tag_filter_excludes_non_matching_documents() {
        let index = MemoryIndex::new();
        let file_id = Uuid::new_v4();
        index
            .index_transcript(file_id, owner(), "meeting notes", &[], &["standup".into()], "t")
            .await
            .unwrap();

        let mut filters = SearchFilters::default();
        filters.tags = vec!["retro".into()];
        let hits = index.search_transcripts(owner(), "meeting", &filters).await.unwrap();
        assert!(hits.is_empty());

        filters.tags = vec!["standup".into()];
        let hits = index.search_transcripts(owner(), "meeting", &filters).await.unwrap();
        assert_eq!(hits.len(), 1);
    }
}
