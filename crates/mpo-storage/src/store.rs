//! `ObjectStore`: the storage seam stage pipelines and the ingestion
//! coordinator depend on, implemented by `FsObjectStore` for local
//! development and wrappable with `RetryingObjectStore` for flaky
//! backends.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::Result;

/// An inclusive-exclusive byte range, mirroring HTTP `Range` semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A readable object plus the metadata a caller needs to serve it.
pub struct ObjectReader {
    pub reader: Box<dyn AsyncRead + Unpin + Send>,
    pub size: u64,
    pub content_type: String,
    /// The range actually served, which may be narrower than requested
    /// if the caller asked past the end of the object.
    pub range: Option<ByteRange>,
}

/// Hierarchical keys take the form `{owner}/{file_uuid}/{role}` with
/// roles like `original`, `thumbnail`, `waveform`, or `derived/*`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes must be atomic from the reader's perspective: a partial
    /// write must never be observable under `key`.
    async fn put(
        &self,
        key: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
        size: u64,
        content_type: &str,
    ) -> Result<()>;

    async fn get(&self, key: &str) -> Result<ObjectReader>;

    /// Honors an HTTP-style byte range; fails with `NotFound` if `key`
    /// is absent.
    async fn stream_range(&self, key: &str, range: ByteRange) -> Result<ObjectReader>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String>;
}
