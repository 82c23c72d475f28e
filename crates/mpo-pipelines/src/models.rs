//! Injected model runner seams. Pipelines depend on these traits, never
//! on a concrete WhisperX/PyAnnote/LLM client, so the stage logic in
//! [`crate::transcription`] and [`crate::summarization`] stays
//! deterministic and testable with fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Input to a transcription run: a readable stream already resolved to a
/// local path by the time it reaches the pipeline (the Ingestion
/// Coordinator has already landed the upload in C1 under its planned
/// key before a transcription job is enqueued).
#[derive(Debug, Clone)]
pub struct TranscriptionInput {
    pub local_path: String,
    pub min_speakers: u32,
    pub max_speakers: u32,
    /// Per-file override of the configured speaker count, per spec §4.
    pub num_speakers: Option<u32>,
    pub language_hint: Option<String>,
}

/// A single word with its aligned timing, the atom [`RawSegment`]s are
/// built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordTiming {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

/// One contiguous span of speech from a single speaker, before
/// diarization has assigned a stable label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub words: Vec<WordTiming>,
    /// Local label assigned by the diarizer (`SPEAKER_00`, ...); `None`
    /// until diarization has run.
    pub speaker_label: Option<String>,
}

/// A fixed-length embedding for one detected speaker, keyed by the same
/// label used on [`RawSegment::speaker_label`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerEmbedding {
    pub label: String,
    pub vector: Vec<f32>,
}

/// Everything the transcription pipeline produces for one file, handed
/// to `mpo-tlm` to persist transactionally (segments + speakers) and to
/// `mpo-index` to index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionOutput {
    pub duration_secs: f64,
    pub detected_language: String,
    pub segments: Vec<RawSegment>,
    pub speakers: Vec<SpeakerEmbedding>,
}

/// WhisperX-shaped ASR seam: language detect, segment, and word-align in
/// one call, since in practice those three stages share the same
/// decoder pass.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, input: &TranscriptionInput) -> Result<TranscriptionOutput>;
}

/// PyAnnote-shaped diarization seam, run against the already-aligned
/// segments to assign speaker labels and produce embeddings.
#[async_trait]
pub trait Diarizer: Send + Sync {
    async fn diarize(
        &self,
        local_path: &str,
        segments: &mut [RawSegment],
        min_speakers: u32,
        max_speakers: u32,
        num_speakers: Option<u32>,
    ) -> Result<Vec<SpeakerEmbedding>>;
}

/// LLM-shaped summarization seam. Returns `Ok(None)` rather than an
/// error when no provider is configured, since `not_configured` is a
/// terminal-but-not-failed state per `SummarizationStatus`.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, transcript_text: &str) -> Result<Option<String>>;
}

/// HTTP(S) source fetch seam for the URL ingest pipeline, abstracted so
/// tests can substitute a fixed byte stream instead of making a real
/// request.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Returns the downloaded bytes plus the server-reported content
    /// type, or an error classified as `TransientInfra` /
    /// `InputQuality` depending on whether the failure looks retryable.
    async fn download(&self, url: &str) -> Result<(Vec<u8>, String)>;
}

/// Provider credentials for the summarization pipeline, shared between
/// the API facade and the NLP worker so both resolve secrets the same
/// way rather than each parsing environment variables independently.
#[async_trait]
pub trait SecretsProvider: Send + Sync {
    async fn llm_api_key(&self) -> Result<Option<String>>;
}

/// Stand-in `Transcriber` used where no real WhisperX-shaped runner is
/// wired in (the model itself is out of scope per spec §1). Surfaces a
/// `ModelAuth` failure rather than silently fabricating a transcript,
/// since an unconfigured ASR backend is an admin-actionable condition,
/// not a transient one.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredTranscriber;

#[async_trait]
impl Transcriber for UnconfiguredTranscriber {
    async fn transcribe(&self, _input: &TranscriptionInput) -> Result<TranscriptionOutput> {
        Err(crate::error::PipelineError::ModelAuth(
            "no transcription model runner configured".to_string(),
        ))
    }
}

/// Stand-in `Diarizer` counterpart to [`UnconfiguredTranscriber`].
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredDiarizer;

#[async_trait]
impl Diarizer for UnconfiguredDiarizer {
    async fn diarize(
        &self,
        _local_path: &str,
        _segments: &mut [RawSegment],
        _min_speakers: u32,
        _max_speakers: u32,
        _num_speakers: Option<u32>,
    ) -> Result<Vec<SpeakerEmbedding>> {
        Err(crate::error::PipelineError::ModelAuth(
            "no diarization model runner configured".to_string(),
        ))
    }
}

/// Default `Summarizer` for deployments with no LLM provider wired in.
/// Unlike the transcriber/diarizer stand-ins, this resolves to
/// `Ok(None)` rather than an error: `SummarizationStatus::NotConfigured`
/// is a legitimate terminal state the summarization pipeline already
/// models via [`SecretsProvider`], not a failure.
#[derive(Debug, Clone, Default)]
pub struct NullSummarizer;

#[async_trait]
impl Summarizer for NullSummarizer {
    async fn summarize(&self, _transcript_text: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Default `SecretsProvider` reporting no configured key, used the same
/// way until an operator wires a real secret store in.
#[derive(Debug, Clone, Default)]
pub struct NullSecretsProvider;

#[async_trait]
impl SecretsProvider for NullSecretsProvider {
    async fn llm_api_key(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcription_input_carries_per_file_speaker_override() {
        let input = TranscriptionInput {
            local_path: "/tmp/a.wav".into(),
            min_speakers: 1,
            max_speakers: 20,
            num_speakers: Some(2),
            language_hint: None,
        };
        assert_eq!(input.num_speakers, Some(2));
    }

    #[tokio::test]
    async fn unconfigured_transcriber_fails_with_model_auth() {
        let input = TranscriptionInput {
            local_path: "/tmp/a.wav".into(),
            min_speakers: 1,
            max_speakers: 20,
            num_speakers: None,
            language_hint: None,
        };
        let err = UnconfiguredTranscriber.transcribe(&input).await.unwrap_err();
        assert_eq!(err.failure_kind(), mpo_common::FailureKind::ModelAuth);
    }

    #[tokio::test]
    async fn null_summarizer_resolves_to_not_configured() {
        assert_eq!(NullSummarizer.summarize("text").await.unwrap(), None);
    }

    #[tokio::test]
    async fn null_secrets_provider_has_no_key() {
        assert_eq!(NullSecretsProvider.llm_api_key().await.unwrap(), None);
    }
}
