//! One module per `TaskKind`, each exposing a `handle` (or
//! `handle_waveform`/`handle_reindex`) entry point with the same shape:
//! deserialize the job payload, run the work, and report back an
//! `Outcome` for the worker loop to ack or nack.

pub mod analytics;
pub mod summarization;
pub mod transcription;
pub mod url_ingest;
pub mod utility;
