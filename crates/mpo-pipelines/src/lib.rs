//! Stage Pipelines (C7): transcription, summarization, analytics, and
//! URL ingest. Each pipeline is a deterministic function of its input
//! row plus model configuration, reporting progress through a
//! `ProgressSink` and never mutating DB rows directly -- all state
//! transitions go through the Task Lifecycle Manager.

pub mod analytics;
pub mod cancel;
pub mod error;
pub mod models;
pub mod summarization;
pub mod transcription;
pub mod url_ingest;

pub use cancel::CancelToken;
pub use error::{PipelineError, Result};
pub use models::{
    Diarizer, Downloader, NullSecretsProvider, NullSummarizer, SecretsProvider, Summarizer,
    Transcriber, TranscriptionInput, TranscriptionOutput, UnconfiguredDiarizer,
    UnconfiguredTranscriber,
};
