//! URL ingest intake: create a placeholder Pending row before the bytes
//! exist, enqueue a download job, then finalize the row once
//! `mpo-dispatch`'s download worker hands back the fetched content.
//! Per spec §4.5, "the download stage fetches, hashes, stores, and
//! transitions the row identically to a local upload" -- the coordinator
//! provides the finalize half of that, the dispatcher the fetch half.

use mpo_common::TaskKind;
use mpo_db::media_file::DownloadFinalizeOutcome;
use mpo_db::models::MediaFile;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::IngestionCoordinator;

#[derive(Debug, Clone, Deserialize)]
pub struct UrlIngestRequest {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UrlIngestResponse {
    pub file_id: Uuid,
}

impl IngestionCoordinator {
    /// Reserves a Pending row under a placeholder hash -- the real
    /// content doesn't exist yet to hash -- and enqueues the download
    /// job that will fetch it. The placeholder is salted with a fresh
    /// uuid so it can never collide with a real `(owner, content_hash)`
    /// pair before [`Self::finalize_url_ingest`] overwrites it.
    #[instrument(level = "debug", skip(self))]
    pub async fn ingest_url(&self, owner: Uuid, request: UrlIngestRequest) -> Result<UrlIngestResponse> {
        let id = Uuid::new_v4();
        let storage_path = format!("{owner}/{id}/original");
        let placeholder_hash = Uuid::new_v4();
        let filename = derive_filename(&request.url);

        let file = self
            .media_files
            .create_pending(
                id,
                owner,
                &filename,
                0,
                "application/octet-stream",
                &storage_path,
                placeholder_hash.as_bytes(),
            )
            .await?;

        let job = mpo_broker::job::Job::new(
            TaskKind::UrlIngest,
            json!({ "file_id": file.id, "url": request.url, "storage_path": storage_path }),
        );
        self.tasks
            .create(&job.task_id, owner, Some(file.id), TaskKind::UrlIngest)
            .await?;
        self.broker.enqueue(job).await?;

        info!("✅ queued url ingest for media_file {}", file.id);
        Ok(UrlIngestResponse { file_id: file.id })
    }

    /// Called by the download queue worker once it has fetched and
    /// hashed the source. Overwrites the placeholder fields, probes
    /// metadata, and enqueues transcription exactly as a direct upload
    /// would -- or, if the real content turns out to dedup against an
    /// existing file, discards the placeholder and reports the existing
    /// file instead without enqueueing anything new.
    #[instrument(level = "debug", skip(self, content_hash))]
    pub async fn finalize_url_ingest(
        &self,
        owner: Uuid,
        file_id: Uuid,
        byte_length: i64,
        content_type: &str,
        content_hash: &[u8],
    ) -> Result<MediaFile> {
        let file = self.media_files.get(file_id).await?;

        let outcome = self
            .media_files
            .finalize_download(file_id, byte_length, content_type, &file.storage_path, content_hash)
            .await?;

        let finalized = match outcome {
            DownloadFinalizeOutcome::Stored(file) => {
                let metadata = self.probe.probe(self.store.as_ref(), &file.storage_path).await?;
                if let Some(duration_secs) = metadata.duration_secs {
                    self.media_files.set_probed_duration(file.id, duration_secs).await?;
                }
                self.enqueue_transcription(owner, file.id, &file.storage_path).await?;
                self.media_files.get(file.id).await?
            }
            DownloadFinalizeOutcome::Duplicate(existing) => {
                self.store.delete(&file.storage_path).await.ok();
                existing
            }
        };

        info!("✅ finalized url ingest for media_file {file_id}");
        Ok(finalized)
    }
}

/// Best-effort display name from a source URL's final path segment,
/// falling back to a generic name for bare-domain or trailing-slash URLs.
fn derive_filename(url: &str) -> String {
    url.rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("source")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_taken_from_final_path_segment() {
        assert_eq!(derive_filename("https://example.com/episode.mp3"), "episode.mp3");
    }

    #[test]
    fn filename_falls_back_for_bare_domain() {
        assert_eq!(derive_filename("https://example.com"), "source");
    }

    #[test]
    fn filename_falls_back_for_trailing_slash() {
        assert_eq!(derive_filename("https://example.com/episodes/"), "source");
    }
}
