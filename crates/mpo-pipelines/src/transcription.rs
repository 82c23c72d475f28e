//! Transcription pipeline: stream open, language detect, segment,
//! word-align, diarize, garbage-word cleanup, per spec §4.7 step 2.
//!
//! The pipeline itself holds no state across calls; every dependency
//! (model runners, progress sink, config) is passed in, so a run is a
//! pure function of its inputs modulo the injected trait objects.

use std::sync::Arc;

use mpo_core::config::GarbageCleanupConfig;
use tracing::{debug, info, instrument};

use crate::cancel::CancelToken;
use crate::error::{PipelineError, Result};
use crate::models::{Diarizer, Transcriber, TranscriptionInput, TranscriptionOutput};

/// Runs the full stage sequence for one file, checking `token` at each
/// suspension point (after stream open, between detect/transcribe and
/// diarize, and once more before returning) so a cancellation observed
/// at the first suspension point leaves `segments` empty in the
/// returned output -- the caller (mpo-tlm) then persists nothing.
#[instrument(level = "debug", skip(transcriber, diarizer, token), fields(path = %input.local_path))]
pub async fn run(
    input: &TranscriptionInput,
    transcriber: &dyn Transcriber,
    diarizer: &dyn Diarizer,
    garbage_cleanup: &GarbageCleanupConfig,
    token: &CancelToken,
    task_id: &str,
) -> Result<TranscriptionOutput> {
    token.check(task_id).await?;

    debug!("🔧 transcribing {}", input.local_path);
    let mut output = transcriber.transcribe(input).await?;

    token.check(task_id).await?;

    let embeddings = diarizer
        .diarize(
            &input.local_path,
            &mut output.segments,
            input.min_speakers,
            input.max_speakers,
            input.num_speakers,
        )
        .await?;
    output.speakers = embeddings;

    token.check(task_id).await?;

    if garbage_cleanup.enabled {
        clean_garbage_words(&mut output, garbage_cleanup.max_word_length);
    }

    info!(
        "✅ transcribed {} ({} segments, {} speakers)",
        input.local_path,
        output.segments.len(),
        output.speakers.len()
    );
    Ok(output)
}

/// Replaces any word longer than `max_word_length` with no interior
/// whitespace with a `[background noise]` marker, and rebuilds each
/// segment's `text` from its cleaned words. ASR models occasionally
/// emit long token runs on pure noise (fan hum, clipping) instead of
/// failing outright; this keeps those out of the transcript without
/// dropping the segment's timing.
fn clean_garbage_words(output: &mut TranscriptionOutput, max_word_length: usize) {
    const MARKER: &str = "[background noise]";

    for segment in &mut output.segments {
        let mut changed = false;
        for word in &mut segment.words {
            if word.word.len() > max_word_length && !word.word.contains(char::is_whitespace) {
                word.word = MARKER.to_string();
                changed = true;
            }
        }
        if changed {
            segment.text = segment
                .words
                .iter()
                .map(|w| w.word.as_str())
                .collect::<Vec<_>>()
                .join(" ");
        }
    }
}

/// Thin convenience wrapper used by `mpo-dispatch`'s GPU worker loop,
/// bundling the injected runners behind `Arc` so a single worker can
/// hold them across many jobs without re-resolving trait objects.
pub struct TranscriptionPipeline {
    pub transcriber: Arc<dyn Transcriber>,
    pub diarizer: Arc<dyn Diarizer>,
    pub garbage_cleanup: GarbageCleanupConfig,
}

impl TranscriptionPipeline {
    pub async fn run(
        &self,
        input: &TranscriptionInput,
        token: &CancelToken,
        task_id: &str,
    ) -> Result<TranscriptionOutput> {
        run(
            input,
            self.transcriber.as_ref(),
            self.diarizer.as_ref(),
            &self.garbage_cleanup,
            token,
            task_id,
        )
        .await
    }
}

impl From<mpo_core::MpoError> for PipelineError {
    fn from(err: mpo_core::MpoError) -> Self {
        PipelineError::TransientInfra(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawSegment, SpeakerEmbedding, WordTiming};
    use async_trait::async_trait;
    use mpo_core::traits::ProgressSink;
    use mpo_core::Result as CoreResult;

    struct FakeTranscriber {
        output: TranscriptionOutput,
    }

    #[async_trait]
    impl Transcriber for FakeTranscriber {
        async fn transcribe(&self, _input: &TranscriptionInput) -> Result<TranscriptionOutput> {
            Ok(self.output.clone())
        }
    }

    struct FakeDiarizer;

    #[async_trait]
    impl Diarizer for FakeDiarizer {
        async fn diarize(
            &self,
            _local_path: &str,
            segments: &mut [RawSegment],
            _min: u32,
            _max: u32,
            _num: Option<u32>,
        ) -> Result<Vec<SpeakerEmbedding>> {
            for seg in segments.iter_mut() {
                seg.speaker_label = Some("SPEAKER_00".to_string());
            }
            Ok(vec![SpeakerEmbedding {
                label: "SPEAKER_00".to_string(),
                vector: vec![0.1, 0.2],
            }])
        }
    }

    struct FakeSink {
        cancelled: bool,
    }

    #[async_trait]
    impl ProgressSink for FakeSink {
        async fn heartbeat(&self, _task_id: &str) -> CoreResult<()> {
            Ok(())
        }
        async fn progress(&self, _task_id: &str, _percent: u8, _stage: Option<&str>) -> CoreResult<()> {
            Ok(())
        }
        async fn is_cancelled(&self, _task_id: &str) -> CoreResult<bool> {
            Ok(self.cancelled)
        }
    }

    fn sample_output() -> TranscriptionOutput {
        TranscriptionOutput {
            duration_secs: 4.8,
            detected_language: "en".to_string(),
            segments: vec![RawSegment {
                start: 0.0,
                end: 1.2,
                text: "hello xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx world".to_string(),
                words: vec![
                    WordTiming {
                        word: "hello".to_string(),
                        start: 0.0,
                        end: 0.3,
                    },
                    WordTiming {
                        word: "x".repeat(40),
                        start: 0.3,
                        end: 0.9,
                    },
                    WordTiming {
                        word: "world".to_string(),
                        start: 0.9,
                        end: 1.2,
                    },
                ],
                speaker_label: None,
            }],
            speakers: vec![],
        }
    }

    #[tokio::test]
    async fn happy_path_assigns_speakers_and_cleans_garbage() {
        let transcriber = FakeTranscriber {
            output: sample_output(),
        };
        let diarizer = FakeDiarizer;
        let token = CancelToken::new(Arc::new(FakeSink { cancelled: false }));
        let input = TranscriptionInput {
            local_path: "/tmp/hello.wav".into(),
            min_speakers: 1,
            max_speakers: 20,
            num_speakers: None,
            language_hint: None,
        };
        let cleanup = GarbageCleanupConfig {
            enabled: true,
            max_word_length: 30,
        };

        let out = run(&input, &transcriber, &diarizer, &cleanup, &token, "task-1")
            .await
            .unwrap();

        assert_eq!(out.segments.len(), 1);
        assert_eq!(out.segments[0].speaker_label.as_deref(), Some("SPEAKER_00"));
        assert!(out.segments[0].text.contains("[background noise]"));
        assert!(!out.segments[0].text.contains("xxxx"));
        assert_eq!(out.speakers.len(), 1);
    }

    #[tokio::test]
    async fn disabled_cleanup_leaves_garbage_words_untouched() {
        let transcriber = FakeTranscriber {
            output: sample_output(),
        };
        let diarizer = FakeDiarizer;
        let token = CancelToken::new(Arc::new(FakeSink { cancelled: false }));
        let input = TranscriptionInput {
            local_path: "/tmp/hello.wav".into(),
            min_speakers: 1,
            max_speakers: 20,
            num_speakers: None,
            language_hint: None,
        };
        let cleanup = GarbageCleanupConfig {
            enabled: false,
            max_word_length: 30,
        };

        let out = run(&input, &transcriber, &diarizer, &cleanup, &token, "task-1")
            .await
            .unwrap();

        assert!(out.segments[0].text.contains("xxxx"));
    }

    #[tokio::test]
    async fn cancellation_at_first_suspension_point_yields_no_segments() {
        let transcriber = FakeTranscriber {
            output: sample_output(),
        };
        let diarizer = FakeDiarizer;
        let token = CancelToken::new(Arc::new(FakeSink { cancelled: true }));
        let input = TranscriptionInput {
            local_path: "/tmp/hello.wav".into(),
            min_speakers: 1,
            max_speakers: 20,
            num_speakers: None,
            language_hint: None,
        };
        let cleanup = GarbageCleanupConfig::default();

        let err = run(&input, &transcriber, &diarizer, &cleanup, &token, "task-1")
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Cancelled));
    }
}
