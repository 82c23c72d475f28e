//! URL ingest pipeline: fetches a remote source, hashes it the same
//! way an uploaded file would be hashed, and hands the bytes off to the
//! Ingestion Coordinator's dedup/store path. Runs on the `download`
//! queue rather than `gpu`, per `TaskKind::UrlIngest`'s queue class.

use async_trait::async_trait;
use mpo_core::hash::hash_bytes;
use mpo_core::ContentHash;
use reqwest::Client;
use tracing::{debug, info, instrument};

use crate::cancel::CancelToken;
use crate::error::{PipelineError, Result};
use crate::models::Downloader;

/// Default `Downloader` backed by a shared `reqwest::Client`, used by
/// `mpo-dispatch`'s download queue worker. Failures that look like
/// transport-level issues (connect/timeout) are classified
/// `TransientInfra`; a non-2xx response is `InputQuality` since the
/// source URL itself is what's wrong.
#[derive(Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    #[instrument(level = "debug", skip(self))]
    async fn download(&self, url: &str) -> Result<(Vec<u8>, String)> {
        let response = self.client.get(url).send().await.map_err(|e| {
            PipelineError::TransientInfra(format!("request to source url failed: {e}"))
        })?;

        if !response.status().is_success() {
            return Err(PipelineError::InputQuality(format!(
                "source url returned status {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let bytes = response.bytes().await.map_err(|e| {
            PipelineError::TransientInfra(format!("reading source url body failed: {e}"))
        })?;

        Ok((bytes.to_vec(), content_type))
    }
}

/// A downloaded source ready to be handed to C1/C2, mirroring the shape
/// a direct upload would already have by the time a transcription job
/// is enqueued.
pub struct FetchedSource {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub content_hash: ContentHash,
}

/// Fetches `url`, checking cancellation before the request and again
/// after the body lands -- the only two suspension points a single
/// download has, since the transfer itself isn't chunked at this layer.
pub async fn run(
    url: &str,
    downloader: &dyn Downloader,
    token: &CancelToken,
    task_id: &str,
) -> Result<FetchedSource> {
    token.check(task_id).await?;

    debug!("🔧 fetching source url");
    let (bytes, content_type) = downloader.download(url).await?;

    token.check(task_id).await?;

    if bytes.is_empty() {
        return Err(PipelineError::InputQuality(
            "downloaded source contained no bytes".to_string(),
        ));
    }

    let content_hash = hash_bytes(&bytes);
    info!("✅ fetched source ({} bytes)", bytes.len());

    Ok(FetchedSource {
        bytes,
        content_type,
        content_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mpo_core::traits::ProgressSink;
    use mpo_core::Result as CoreResult;
    use std::sync::Arc;

    struct FakeDownloader {
        bytes: Vec<u8>,
        content_type: String,
    }

    #[async_trait]
    impl Downloader for FakeDownloader {
        async fn download(&self, _url: &str) -> Result<(Vec<u8>, String)> {
            Ok((self.bytes.clone(), self.content_type.clone()))
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
    async fn fetched_source_hash_matches_direct_hash_of_same_bytes() {
        let downloader = FakeDownloader {
            bytes: b"a recording".to_vec(),
            content_type: "audio/wav".to_string(),
        };
        let token = CancelToken::new(Arc::new(FakeSink { cancelled: false }));

        let fetched = run("https://example.com/a.wav", &downloader, &token, "task-1")
            .await
            .unwrap();

        assert_eq!(fetched.content_hash, hash_bytes(b"a recording"));
    }

    #[tokio::test]
    async fn empty_body_is_input_quality_error() {
        let downloader = FakeDownloader {
            bytes: vec![],
            content_type: "audio/wav".to_string(),
        };
        let token = CancelToken::new(Arc::new(FakeSink { cancelled: false }));

        let err = run("https://example.com/a.wav", &downloader, &token, "task-1")
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::InputQuality(_)));
    }
}
