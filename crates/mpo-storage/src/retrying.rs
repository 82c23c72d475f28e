//! Decorator that retries `Transient` failures with capped exponential
//! backoff, reusing `mpo-core::retry` rather than rolling its own.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mpo_core::retry::Backoff;
use tokio::io::AsyncRead;
use tracing::warn;

use crate::error::{Result, StorageError};
use crate::store::{ByteRange, ObjectReader, ObjectStore};

pub struct RetryingObjectStore<S> {
    inner: Arc<S>,
    backoff: Backoff,
}

impl<S: ObjectStore> RetryingObjectStore<S> {
    pub fn new(inner: Arc<S>) -> Self {
        Self {
            inner,
            backoff: Backoff::default(),
        }
    }

    pub fn with_backoff(inner: Arc<S>, backoff: Backoff) -> Self {
        Self { inner, backoff }
    }

    async fn retry<T, F, Fut>(&self, op_name: &str, mut attempt_fn: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match attempt_fn().await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_retryable() && !self.backoff.exhausted(attempt) => {
                    warn!("⚠️ {op_name} attempt {attempt} failed transiently: {e}, retrying");
                    tokio::time::sleep(self.backoff.delay(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for RetryingObjectStore<S> {
    async fn put(
        &self,
        key: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
        size: u64,
        content_type: &str,
    ) -> Result<()> {
        // A partial `put` isn't safely retryable without re-reading the
        // source, which this decorator does not buffer; `put` failures
        // propagate immediately rather than retrying.
        self.inner.put(key, reader, size, content_type).await
    }

    async fn get(&self, key: &str) -> Result<ObjectReader> {
        self.retry("get", || self.inner.get(key)).await
    }

    async fn stream_range(&self, key: &str, range: ByteRange) -> Result<ObjectReader> {
        self.retry("stream_range", || self.inner.stream_range(key, range))
            .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.retry("delete", || self.inner.delete(key)).await
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String> {
        self.retry("presign_get", || self.inner.presign_get(key, ttl))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_store::FsObjectStore;
    use std::io::Cursor;

    #[tokio::test]
    async fn delegates_successful_calls_through() {
        let dir = tempfile::tempdir().unwrap();
        let inner = Arc::new(FsObjectStore::new(dir.path()));
        let store = RetryingObjectStore::new(inner);

        let data = b"abc".to_vec();
        let mut reader = Cursor::new(data.clone());
        store
            .put("o/f/original", &mut reader, data.len() as u64, "text/plain")
            .await
            .unwrap();

        let err = store.get("o/missing/original").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
