//! Media metadata probing seam, per spec §4.5 step 2 ("probes media
//! metadata: codec, duration, sample rate, creation date, device,
//! encoder"). Treated the same way `mpo-pipelines` treats model
//! runners -- an opaque callable behind a trait, so the coordinator's
//! logic stays deterministic and testable with a fake.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mpo_storage::ObjectStore;

use crate::error::Result;

/// Best-effort container/codec metadata extracted from an uploaded
/// object. Every field is optional since container inspection may
/// legitimately fail to find some of them (e.g. no creation date atom)
/// without that being an `InputQuality` error on its own -- only the
/// stage pipeline's own inability to find any audio is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbedMetadata {
    pub codec: Option<String>,
    pub duration_secs: Option<f64>,
    pub sample_rate_hz: Option<u32>,
    pub creation_date: Option<DateTime<Utc>>,
    pub device: Option<String>,
    pub encoder: Option<String>,
}

/// Probes the object already landed under `key` in `store`. Takes the
/// store rather than a local path so a networked object-store backend
/// doesn't need to expose filesystem access for this one read.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, store: &dyn ObjectStore, key: &str) -> Result<ProbedMetadata>;
}

/// Default prober used where no container-inspection tool (e.g. an
/// `ffprobe` binary wrapper) is configured. Stage pipelines still
/// compute an authoritative `duration_secs` from the ASR output at
/// transcription time, per spec §4.7 step 5 -- this probe only
/// populates the informational fields available before that run.
#[derive(Debug, Clone, Default)]
pub struct NullMediaProbe;

#[async_trait]
impl MediaProbe for NullMediaProbe {
    async fn probe(&self, _store: &dyn ObjectStore, _key: &str) -> Result<ProbedMetadata> {
        Ok(ProbedMetadata::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpo_storage::fs_store::FsObjectStore;

    #[tokio::test]
    async fn null_probe_returns_all_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());
        let probe = NullMediaProbe;
        let metadata = probe.probe(&store, "owner/file/original").await.unwrap();
        assert_eq!(metadata, ProbedMetadata::default());
    }
}
