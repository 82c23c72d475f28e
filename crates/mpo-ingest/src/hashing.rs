//! Hashes an upload body while it streams into the object store, so
//! the dedup check never needs a second pass over the bytes. Tees each
//! chunk read through [`WindowSampler`] as it forwards them unchanged,
//! then finishes with [`mpo_core::hash::hash_from_windows`] -- the same
//! algorithm [`mpo_core::hash::content_hash`] uses against an already-
//! landed file.

use std::pin::Pin;
use std::task::{Context, Poll};

use mpo_core::hash::{hash_from_windows, ContentHash, SAMPLE_SIZE};
use tokio::io::{AsyncRead, ReadBuf};

/// Accumulates the head/mid/tail byte windows [`mpo_core::hash`] samples,
/// given the total size up front so window boundaries are known without
/// seeking.
struct WindowSampler {
    total_size: u64,
    pos: u64,
    mid_start: u64,
    head: Vec<u8>,
    mid: Vec<u8>,
    tail: Vec<u8>,
}

impl WindowSampler {
    fn new(total_size: u64) -> Self {
        let sample = SAMPLE_SIZE.min(total_size) as usize;
        let mid_start = total_size.saturating_sub(SAMPLE_SIZE) / 2;
        Self {
            total_size,
            pos: 0,
            mid_start,
            head: Vec::with_capacity(sample),
            mid: Vec::with_capacity(sample),
            tail: Vec::with_capacity(sample),
        }
    }

    /// Feeds `chunk`, which was read starting at the current `pos`, into
    /// whichever window buffers it overlaps, then advances `pos`.
    fn feed(&mut self, chunk: &[u8]) {
        if self.total_size <= SAMPLE_SIZE {
            self.head.extend_from_slice(chunk);
            self.pos += chunk.len() as u64;
            return;
        }

        let chunk_start = self.pos;
        let chunk_end = self.pos + chunk.len() as u64;

        Self::copy_overlap(chunk, chunk_start, chunk_end, 0, SAMPLE_SIZE, &mut self.head);
        Self::copy_overlap(
            chunk,
            chunk_start,
            chunk_end,
            self.mid_start,
            self.mid_start + SAMPLE_SIZE,
            &mut self.mid,
        );
        Self::copy_overlap(
            chunk,
            chunk_start,
            chunk_end,
            self.total_size - SAMPLE_SIZE,
            self.total_size,
            &mut self.tail,
        );

        self.pos = chunk_end;
    }

    fn copy_overlap(
        chunk: &[u8],
        chunk_start: u64,
        chunk_end: u64,
        win_start: u64,
        win_end: u64,
        into: &mut Vec<u8>,
    ) {
        let start = chunk_start.max(win_start);
        let end = chunk_end.min(win_end);
        if start >= end {
            return;
        }
        let lo = (start - chunk_start) as usize;
        let hi = (end - chunk_start) as usize;
        into.extend_from_slice(&chunk[lo..hi]);
    }

    fn finish(self) -> ContentHash {
        hash_from_windows(&self.head, &self.mid, &self.tail, self.total_size)
    }
}

/// Wraps an `AsyncRead`, forwarding every byte unchanged to the caller
/// while accumulating the hash windows as a side effect of each poll.
/// `declared_size` must match the number of bytes the inner reader will
/// actually yield; [`TeeReader::finish`] is only meaningful once the
/// caller has read to EOF (or the object store's expected-size check
/// has already confirmed as much).
pub struct TeeReader<R> {
    inner: R,
    sampler: WindowSampler,
}

impl<R: AsyncRead + Unpin> TeeReader<R> {
    pub fn new(inner: R, declared_size: u64) -> Self {
        Self {
            inner,
            sampler: WindowSampler::new(declared_size),
        }
    }

    pub fn finish(self) -> ContentHash {
        self.sampler.finish()
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for TeeReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let before = buf.filled().len();
        let poll = Pin::new(&mut self.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll {
            let chunk = &buf.filled()[before..];
            if !chunk.is_empty() {
                self.sampler.feed(chunk);
            }
        }
        poll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpo_core::hash::hash_bytes;
    use tokio::io::AsyncReadExt;

    async fn tee_hash(data: &[u8], chunk_size: usize) -> ContentHash {
        // Simulate a reader that yields in small chunks, the way a real
        // network body would, rather than one big read.
        let mut cursor = std::io::Cursor::new(data.to_vec());
        let mut tee = TeeReader::new(&mut cursor, data.len() as u64);
        let mut out = Vec::new();
        let mut buf = vec![0u8; chunk_size];
        loop {
            let n = tee.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, data);
        tee.finish()
    }

    #[tokio::test]
    async fn small_file_hash_matches_hash_bytes() {
        let data = b"hello world".repeat(100);
        let hash = tee_hash(&data, 7).await;
        assert_eq!(hash, hash_bytes(&data));
    }

    #[tokio::test]
    async fn large_file_hash_matches_hash_bytes_regardless_of_chunk_size() {
        let size = (SAMPLE_SIZE as usize) * 3 + 777;
        let mut data = vec![0u8; size];
        for (i, b) in data.iter_mut().enumerate() {
            *b = (i % 251) as u8;
        }

        let hash_small_chunks = tee_hash(&data, 4096).await;
        let hash_large_chunks = tee_hash(&data, 1 << 20).await;

        assert_eq!(hash_small_chunks, hash_bytes(&data));
        assert_eq!(hash_large_chunks, hash_bytes(&data));
    }

    #[tokio::test]
    async fn empty_file_hash_matches_empty_constant() {
        let hash = tee_hash(&[], 16).await;
        assert_eq!(hash, ContentHash::empty());
    }
}
