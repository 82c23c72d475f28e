//! Bridges `mpo-storage`'s stream-shaped `ObjectStore::get` to the
//! filesystem-path input the transcription pipeline's model runners
//! expect. A temp file is cheaper to wire up than teaching every
//! `Transcriber`/`Diarizer` implementation to read an arbitrary
//! `AsyncRead`, and matches how a real WhisperX/PyAnnote process would
//! be invoked (as a subprocess over a file path) anyway.

use mpo_storage::ObjectStore;
use tempfile::NamedTempFile;

/// A local copy of an object-store entry. Holding `_guard` keeps the
/// temp file from being removed while `path` is still in use; it is
/// deleted on drop.
pub struct MaterializedFile {
    _guard: NamedTempFile,
    pub path: String,
}

pub async fn materialize_to_tempfile(
    store: &dyn ObjectStore,
    storage_path: &str,
) -> mpo_storage::Result<MaterializedFile> {
    let mut object = store.get(storage_path).await?;

    let guard = NamedTempFile::new()?;
    let path = guard.path().to_string_lossy().to_string();

    let mut file = tokio::fs::File::create(&path).await?;
    tokio::io::copy(&mut object.reader, &mut file).await?;

    Ok(MaterializedFile { _guard: guard, path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mpo_storage::{ByteRange, ObjectReader};
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    struct FakeStore {
        bytes: Vec<u8>,
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn put(
            &self,
            _key: &str,
            _reader: &mut (dyn tokio::io::AsyncRead + Unpin + Send),
            _size: u64,
            _content_type: &str,
        ) -> mpo_storage::Result<()> {
            unimplemented!("not exercised by this test")
        }

        async fn get(&self, _key: &str) -> mpo_storage::Result<ObjectReader> {
            let bytes = self.bytes.clone();
            Ok(ObjectReader {
                reader: Box::new(std::io::Cursor::new(bytes.clone())),
                size: bytes.len() as u64,
                content_type: "audio/wav".to_string(),
                range: None,
            })
        }

        async fn stream_range(&self, _key: &str, _range: ByteRange) -> mpo_storage::Result<ObjectReader> {
            unimplemented!("not exercised by this test")
        }

        async fn delete(&self, _key: &str) -> mpo_storage::Result<()> {
            Ok(())
        }

        async fn presign_get(&self, _key: &str, _ttl: Duration) -> mpo_storage::Result<String> {
            unimplemented!("not exercised by this test")
        }
    }

    #[tokio::test]
    async fn materializes_object_bytes_to_a_readable_local_file() {
        let store = FakeStore {
            bytes: b"a small recording".to_vec(),
        };

        let materialized = materialize_to_tempfile(&store, "owner/file/original")
            .await
            .unwrap();

        let mut contents = Vec::new();
        tokio::fs::File::open(&materialized.path)
            .await
            .unwrap()
            .read_to_end(&mut contents)
            .await
            .unwrap();
        assert_eq!(contents, b"a small recording");
    }
}
