//! Local filesystem `ObjectStore`, used for development and as the
//! default backend when no networked store is configured.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, StorageError};
use crate::store::{ByteRange, ObjectReader, ObjectStore};

pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.contains("..") {
            return Err(StorageError::AuthDenied(format!(
                "key must not contain '..': {key}"
            )));
        }
        Ok(self.root.join(key))
    }

    fn staging_path(&self) -> PathBuf {
        let token: u64 = rand::thread_rng().gen();
        self.root.join(".staging").join(format!("{token:016x}"))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    #[instrument(level = "debug", skip(self, reader))]
    async fn put(
        &self,
        key: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
        size: u64,
        content_type: &str,
    ) -> Result<()> {
        let final_path = self.path_for(key)?;
        let staging_path = self.staging_path();

        if let Some(parent) = staging_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        debug!("🔧 staging write for key={key} at {staging_path:?}");
        {
            let mut staged = fs::File::create(&staging_path).await?;
            let copied = tokio::io::copy(reader, &mut staged).await?;
            if copied != size {
                fs::remove_file(&staging_path).await.ok();
                return Err(StorageError::Corrupt(format!(
                    "expected {size} bytes for key={key}, wrote {copied}"
                )));
            }
            staged.flush().await?;
        }

        fs::rename(&staging_path, &final_path).await?;
        write_sidecar(&final_path, content_type).await?;

        info!("✅ stored key={key} ({size} bytes)");
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn get(&self, key: &str) -> Result<ObjectReader> {
        let path = self.path_for(key)?;
        let metadata = fs::metadata(&path)
            .await
            .map_err(|_| StorageError::NotFound(key.to_string()))?;
        let content_type = read_sidecar(&path).await;

        let file = fs::File::open(&path).await?;
        Ok(ObjectReader {
            reader: Box::new(file),
            size: metadata.len(),
            content_type,
            range: None,
        })
    }

    #[instrument(level = "debug", skip(self))]
    async fn stream_range(&self, key: &str, range: ByteRange) -> Result<ObjectReader> {
        let path = self.path_for(key)?;
        let metadata = fs::metadata(&path)
            .await
            .map_err(|_| StorageError::NotFound(key.to_string()))?;
        let content_type = read_sidecar(&path).await;

        let size = metadata.len();
        let served_end = range.end.min(size);
        if range.start >= served_end {
            return Err(StorageError::Corrupt(format!(
                "range {}..{} out of bounds for {size}-byte object {key}",
                range.start, range.end
            )));
        }

        let mut file = fs::File::open(&path).await?;
        file.seek(std::io::SeekFrom::Start(range.start)).await?;
        let served = ByteRange::new(range.start, served_end);
        let limited = file.take(served.len());

        Ok(ObjectReader {
            reader: Box::new(limited),
            size,
            content_type,
            range: Some(served),
        })
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                let _ = fs::remove_file(sidecar_path(&path)).await;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("⚠️ delete of missing key={key} treated as success");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(level = "debug", skip(self))]
    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String> {
        self.path_for(key)?; // validates the key even though we don't open it
        let expires_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .saturating_add(ttl)
            .as_secs();

        let token = URL_SAFE_NO_PAD.encode(format!("{key}:{expires_at}"));
        Ok(format!("mpo-fs:///{token}"))
    }
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".content-type");
    PathBuf::from(os)
}

async fn write_sidecar(path: &Path, content_type: &str) -> Result<()> {
    fs::write(sidecar_path(path), content_type.as_bytes()).await?;
    Ok(())
}

async fn read_sidecar(path: &Path) -> String {
    fs::read_to_string(sidecar_path(path))
        .await
        .unwrap_or_else(|_| "application/octet-stream".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    async fn store() -> (FsObjectStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (FsObjectStore::new(dir.path()), dir)
    }

    #[tokio::test]
    async fn put_then_get_round_trips_bytes_and_content_type() {
        let (store, _dir) = store().await;
        let data = b"hello orchestrator".to_vec();
        let mut reader = Cursor::new(data.clone());

        store
            .put("owner1/file1/original", &mut reader, data.len() as u64, "audio/wav")
            .await
            .unwrap();

        let mut obj = store.get("owner1/file1/original").await.unwrap();
        let mut buf = Vec::new();
        obj.reader.read_to_end(&mut buf).await.unwrap();

        assert_eq!(buf, data);
        assert_eq!(obj.content_type, "audio/wav");
        assert_eq!(obj.size, data.len() as u64);
    }

    #[tokio::test]
    async fn get_missing_key_is_not_found() {
        let (store, _dir) = store().await;
        let err = store.get("owner1/missing/original").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn put_rejects_size_mismatch() {
        let (store, _dir) = store().await;
        let mut reader = Cursor::new(b"short".to_vec());
        let err = store
            .put("owner1/file1/original", &mut reader, 100, "audio/wav")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }

    #[tokio::test]
    async fn stream_range_serves_requested_window() {
        let (store, _dir) = store().await;
        let data = b"0123456789".to_vec();
        let mut reader = Cursor::new(data.clone());
        store
            .put("owner1/file1/original", &mut reader, data.len() as u64, "text/plain")
            .await
            .unwrap();

        let mut obj = store
            .stream_range("owner1/file1/original", ByteRange::new(2, 5))
            .await
            .unwrap();
        let mut buf = Vec::new();
        obj.reader.read_to_end(&mut buf).await.unwrap();

        assert_eq!(buf, b"234");
        assert_eq!(obj.range, Some(ByteRange::new(2, 5)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (store, _dir) = store().await;
        store.delete("owner1/never-existed/original").await.unwrap();
    }

    #[tokio::test]
    async fn rejects_path_traversal_keys() {
        let (store, _dir) = store().await;
        let err = store.get("../etc/passwd").await.unwrap_err();
        assert!(matches!(err, StorageError::AuthDenied(_)));
    }
}
