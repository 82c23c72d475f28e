//! Content-addressed hashing used to dedup uploads.
//!
//! Small files (<= [`SAMPLE_SIZE`]) are hashed in full. Larger files are
//! hashed from three 64 KiB windows (head, middle, tail) plus the file
//! size, so that dedup is cheap even for multi-gigabyte recordings
//! without reading the whole file. Collisions between distinct large
//! files that happen to share head/mid/tail windows are accepted as a
//! deliberate trade-off; the comment at the call site in `mpo-ingest`
//! spells this out.

use std::io::SeekFrom;

use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Bytes sampled from each of the head/mid/tail windows for large files.
pub const SAMPLE_SIZE: u64 = 64 * 1024;

/// A 128-bit content digest, truncated from SHA-256.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(pub [u8; 16]);

impl ContentHash {
    /// Hash of the empty byte sequence under [`hash_bytes`]. Computed once
    /// below rather than hand-picked, so it always matches the algorithm.
    pub fn empty() -> Self {
        hash_bytes(&[])
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Hash a fully in-memory buffer.
///
/// Applies the same head/mid/tail sampling rule as [`content_hash`] so
/// that hashing a buffer already read into memory agrees with hashing
/// the file it came from.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
    let size = data.len() as u64;
    let mut hasher = Sha256::new();

    if size <= SAMPLE_SIZE {
        hasher.update(data);
    } else {
        let sample = SAMPLE_SIZE as usize;
        let mid_start = (data.len() - sample) / 2;
        hasher.update(&data[..sample]);
        hasher.update(&data[mid_start..mid_start + sample]);
        hasher.update(&data[data.len() - sample..]);
    }
    hasher.update(size.to_le_bytes());

    let digest = hasher.finalize();
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest[..16]);
    ContentHash(out)
}

/// Hash computed from windows sampled elsewhere -- e.g. by a streaming
/// upload that tees the bytes it forwards to an object store into the
/// same head/mid/tail buffers instead of re-reading the file afterward.
/// Equivalent to [`hash_bytes`]/[`content_hash`] run over the same
/// underlying data. For `total_size <= SAMPLE_SIZE`, `head` must hold
/// the entire file and `mid`/`tail` are ignored.
pub fn hash_from_windows(head: &[u8], mid: &[u8], tail: &[u8], total_size: u64) -> ContentHash {
    let mut hasher = Sha256::new();
    if total_size <= SAMPLE_SIZE {
        hasher.update(head);
    } else {
        hasher.update(head);
        hasher.update(mid);
        hasher.update(tail);
    }
    hasher.update(total_size.to_le_bytes());

    let digest = hasher.finalize();
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest[..16]);
    ContentHash(out)
}

/// Hash an open file by sampling head/mid/tail windows for large files,
/// seeking between each read instead of loading the whole file.
pub async fn content_hash(
    file: &mut tokio::fs::File,
) -> std::io::Result<ContentHash> {
    let size = file.metadata().await?.len();
    let mut hasher = Sha256::new();

    if size <= SAMPLE_SIZE {
        file.seek(SeekFrom::Start(0)).await?;
        let mut buf = Vec::with_capacity(size as usize);
        file.read_to_end(&mut buf).await?;
        hasher.update(&buf);
    } else {
        let sample = SAMPLE_SIZE;
        let mid_offset = (size - sample) / 2;

        let mut buf = vec![0u8; sample as usize];

        file.seek(SeekFrom::Start(0)).await?;
        file.read_exact(&mut buf).await?;
        hasher.update(&buf);

        file.seek(SeekFrom::Start(mid_offset)).await?;
        file.read_exact(&mut buf).await?;
        hasher.update(&buf);

        file.seek(SeekFrom::Start(size - sample)).await?;
        file.read_exact(&mut buf).await?;
        hasher.update(&buf);
    }
    hasher.update(size.to_le_bytes());

    let digest = hasher.finalize();
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest[..16]);
    Ok(ContentHash(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn empty_hash_is_stable() {
        let a = ContentHash::empty();
        let b = hash_bytes(&[]);
        assert_eq!(a, b);
    }

    #[test]
    fn small_files_hash_full_contents() {
        let a = hash_bytes(b"hello world");
        let b = hash_bytes(b"hello world!");
        assert_ne!(a, b);
    }

    #[test]
    fn hex_encoding_round_trips_length() {
        let h = hash_bytes(b"abc");
        assert_eq!(h.to_hex().len(), 32);
    }

    #[tokio::test]
    async fn file_hash_matches_in_memory_hash_for_small_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.bin");
        let data = b"a small recording".to_vec();
        tokio::fs::write(&path, &data).await.unwrap();

        let mut file = tokio::fs::File::open(&path).await.unwrap();
        let from_file = content_hash(&mut file).await.unwrap();
        let from_bytes = hash_bytes(&data);

        assert_eq!(from_file, from_bytes);
    }

    #[tokio::test]
    async fn file_hash_matches_in_memory_hash_for_large_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("large.bin");

        let mut data = vec![0u8; (SAMPLE_SIZE as usize) * 3 + 12345];
        for (i, b) in data.iter_mut().enumerate() {
            *b = (i % 251) as u8;
        }
        tokio::fs::write(&path, &data).await.unwrap();

        let mut file = tokio::fs::File::open(&path).await.unwrap();
        let from_file = content_hash(&mut file).await.unwrap();
        let from_bytes = hash_bytes(&data);

        assert_eq!(from_file, from_bytes);
    }

    #[test]
    fn hash_from_windows_matches_hash_bytes_for_small_file() {
        let data = b"a small recording".to_vec();
        let from_windows = hash_from_windows(&data, &[], &[], data.len() as u64);
        assert_eq!(from_windows, hash_bytes(&data));
    }

    #[test]
    fn hash_from_windows_matches_hash_bytes_for_large_file() {
        let size = (SAMPLE_SIZE as usize) * 3 + 500;
        let mut data = vec![0u8; size];
        for (i, b) in data.iter_mut().enumerate() {
            *b = (i % 251) as u8;
        }
        let sample = SAMPLE_SIZE as usize;
        let mid_start = (data.len() - sample) / 2;

        let head = &data[..sample];
        let mid = &data[mid_start..mid_start + sample];
        let tail = &data[data.len() - sample..];

        let from_windows = hash_from_windows(head, mid, tail, size as u64);
        assert_eq!(from_windows, hash_bytes(&data));
    }

    #[tokio::test]
    async fn differing_middles_produce_different_hashes() {
        let dir = tempfile::tempdir().unwrap();

        let size = (SAMPLE_SIZE as usize) * 3 + 100;
        let data_a = vec![0u8; size];
        let mut data_b = vec![0u8; size];
        let mid = size / 2;
        data_b[mid] = data_b[mid].wrapping_add(1);

        let path_a = dir.path().join("a.bin");
        let path_b = dir.path().join("b.bin");
        tokio::fs::write(&path_a, &data_a).await.unwrap();
        tokio::fs::write(&path_b, &data_b).await.unwrap();

        let mut fa = tokio::fs::File::open(&path_a).await.unwrap();
        let mut fb = tokio::fs::File::open(&path_b).await.unwrap();
        let ha = content_hash(&mut fa).await.unwrap();
        let hb = content_hash(&mut fb).await.unwrap();

        assert_ne!(ha, hb);
    }
}
