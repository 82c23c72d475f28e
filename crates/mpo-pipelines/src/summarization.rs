//! Summarization pipeline: turns a file's transcript text into an LLM
//! summary, or resolves to "not configured" when no secrets provider
//! has a usable key -- a terminal-but-not-failed outcome, distinct from
//! a transient provider error.

use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::models::{SecretsProvider, Summarizer};

/// Outcome of a summarization attempt, mirroring
/// `mpo_common::SummarizationStatus` minus the in-flight states that
/// only exist on the DB row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummarizationOutcome {
    Completed(String),
    NotConfigured,
}

/// Joins transcript segments into one text blob in sequence order, the
/// shape every summarizer implementation is expected to consume.
pub fn join_transcript(segments: &[String]) -> String {
    segments.join("\n")
}

/// Checks cancellation, resolves a provider key, and runs the
/// summarizer. The API facade and the NLP worker both route through
/// this function so secrets are resolved identically regardless of
/// caller.
pub async fn run(
    transcript_text: &str,
    summarizer: &dyn Summarizer,
    secrets: &dyn SecretsProvider,
    token: &CancelToken,
    task_id: &str,
) -> Result<SummarizationOutcome> {
    token.check(task_id).await?;

    let key = secrets.llm_api_key().await?;
    if key.is_none() {
        debug!("⚠️ no LLM key configured, skipping summarization");
        return Ok(SummarizationOutcome::NotConfigured);
    }

    token.check(task_id).await?;

    match summarizer.summarize(transcript_text).await? {
        Some(summary) => {
            info!("✅ summarized transcript ({} chars)", summary.len());
            Ok(SummarizationOutcome::Completed(summary))
        }
        None => Ok(SummarizationOutcome::NotConfigured),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use async_trait::async_trait;
    use mpo_core::traits::ProgressSink;
    use mpo_core::Result as CoreResult;
    use std::sync::Arc;

    struct FakeSummarizer {
        reply: Option<String>,
    }

    #[async_trait]
    impl Summarizer for FakeSummarizer {
        async fn summarize(&self, _text: &str) -> Result<Option<String>> {
            Ok(self.reply.clone())
        }
    }

    struct FakeSecrets {
        key: Option<String>,
    }

    #[async_trait]
    impl SecretsProvider for FakeSecrets {
        async fn llm_api_key(&self) -> Result<Option<String>> {
            Ok(self.key.clone())
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

    #[tokio::test]
    async fn missing_key_resolves_not_configured_without_calling_summarizer() {
        let summarizer = FakeSummarizer {
            reply: Some("should not be reached".to_string()),
        };
        let secrets = FakeSecrets { key: None };
        let token = CancelToken::new(Arc::new(FakeSink { cancelled: false }));

        let outcome = run("transcript text", &summarizer, &secrets, &token, "task-1")
            .await
            .unwrap();

        assert_eq!(outcome, SummarizationOutcome::NotConfigured);
    }

    #[tokio::test]
    async fn configured_provider_returns_completed_summary() {
        let summarizer = FakeSummarizer {
            reply: Some("a concise summary".to_string()),
        };
        let secrets = FakeSecrets {
            key: Some("sk-test".to_string()),
        };
        let token = CancelToken::new(Arc::new(FakeSink { cancelled: false }));

        let outcome = run("transcript text", &summarizer, &secrets, &token, "task-1")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SummarizationOutcome::Completed("a concise summary".to_string())
        );
    }

    #[tokio::test]
    async fn cancellation_short_circuits_before_resolving_secrets() {
        let summarizer = FakeSummarizer { reply: None };
        let secrets = FakeSecrets {
            key: Some("sk-test".to_string()),
        };
        let token = CancelToken::new(Arc::new(FakeSink { cancelled: true }));

        let err = run("transcript text", &summarizer, &secrets, &token, "task-1")
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Cancelled));
    }
}
