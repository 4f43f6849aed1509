//! Batched output for pack bodies
//!
//! Small writes are queued and handed to the inner writer once the queue
//! passes [`FLUSH_THRESHOLD`]. Entries of [`LARGE_FILE_THRESHOLD`] bytes or
//! more skip the queue: it is flushed first, then the entry is written
//! directly. Every flush returns only after the inner writer has accepted
//! all queued bytes.

use std::io::{Read, Write};

use super::buffer_pool::BufferPool;
use crate::error::Result;

/// Queued bytes that trigger a flush
pub const FLUSH_THRESHOLD: usize = 1024 * 1024;

/// Entries at least this large bypass the queue
pub const LARGE_FILE_THRESHOLD: usize = 1024 * 1024;

/// Chunk size used when copying from a reader
const COPY_CHUNK: usize = 256 * 1024;

pub struct StreamingWriter<W: Write> {
    inner: W,
    queue: Vec<u8>,
    pool: BufferPool,
    bytes_written: u64,
    flushes: u64,
}

impl<W: Write> StreamingWriter<W> {
    pub fn new(inner: W) -> Self {
        let mut pool = BufferPool::default();
        let queue = pool.acquire(FLUSH_THRESHOLD);
        Self {
            inner,
            queue,
            pool,
            bytes_written: 0,
            flushes: 0,
        }
    }

    /// Queue small bytes
    ///
    /// # Errors
    /// Returns an error if a triggered flush fails.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.queue.extend_from_slice(data);
        self.bytes_written += data.len() as u64;
        self.flush_if_needed()
    }

    /// Write one entry body, bypassing the queue when it is large
    ///
    /// # Errors
    /// Returns an error if the inner writer fails.
    pub fn write_file(&mut self, data: &[u8]) -> Result<()> {
        if data.len() < LARGE_FILE_THRESHOLD {
            return self.write(data);
        }
        self.flush()?;
        self.inner.write_all(data)?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    /// Copy exactly `len` bytes from `reader`
    ///
    /// # Errors
    /// Returns an error if the reader ends early or a write fails.
    pub fn copy_from<R: Read>(&mut self, reader: &mut R, len: u64) -> Result<()> {
        let len_usize = usize::try_from(len).unwrap_or(usize::MAX);
        if len_usize < LARGE_FILE_THRESHOLD {
            let start = self.queue.len();
            self.queue.resize(start + len_usize, 0);
            reader.read_exact(&mut self.queue[start..])?;
            self.bytes_written += len;
            return self.flush_if_needed();
        }

        self.flush()?;
        let mut scratch = self.pool.acquire(COPY_CHUNK);
        scratch.resize(COPY_CHUNK, 0);
        let mut left = len;
        while left > 0 {
            let chunk = usize::try_from(left).map_or(COPY_CHUNK, |l| l.min(COPY_CHUNK));
            reader.read_exact(&mut scratch[..chunk])?;
            self.inner.write_all(&scratch[..chunk])?;
            left -= chunk as u64;
        }
        self.pool.release(scratch);
        self.bytes_written += len;
        Ok(())
    }

    /// Flush once the queue passes the threshold
    ///
    /// # Errors
    /// Returns an error if the inner writer fails.
    pub fn flush_if_needed(&mut self) -> Result<()> {
        if self.queue.len() >= FLUSH_THRESHOLD {
            self.flush()?;
        }
        Ok(())
    }

    /// Hand every queued byte to the inner writer
    ///
    /// # Errors
    /// Returns an error if the inner writer fails.
    pub fn flush(&mut self) -> Result<()> {
        if !self.queue.is_empty() {
            // write_all retries partial and interrupted writes until drained.
            self.inner.write_all(&self.queue)?;
            self.queue.clear();
            self.flushes += 1;
        }
        self.inner.flush()?;
        Ok(())
    }

    /// Bytes accepted so far, queued or written
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush and return the inner writer
    ///
    /// # Errors
    /// Returns an error if the final flush fails.
    pub fn finish(mut self) -> Result<W> {
        self.flush()?;
        tracing::debug!(
            "Streamed {} bytes in {} flushes (buffer hit rate {:.2})",
            self.bytes_written,
            self.flushes,
            self.pool.stats().hit_rate()
        );
        let queue = std::mem::take(&mut self.queue);
        self.pool.release(queue);
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Accepts at most 7 bytes per call
    struct Trickle(Vec<u8>);

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = buf.len().min(7);
            self.0.extend_from_slice(&buf[..n]);
            Ok(n)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_small_writes_are_batched() {
        let mut stream = StreamingWriter::new(Vec::new());
        stream.write(b"abc").unwrap();
        stream.write_file(b"def").unwrap();
        assert_eq!(stream.bytes_written(), 6);
        assert_eq!(stream.finish().unwrap(), b"abcdef");
    }

    #[test]
    fn test_partial_writes_drain() {
        let mut stream = StreamingWriter::new(Trickle(Vec::new()));
        stream.write(&[1u8; 100]).unwrap();
        stream.flush().unwrap();
        assert_eq!(stream.finish().unwrap().0.len(), 100);
    }

    #[test]
    fn test_large_file_keeps_order() {
        let large = vec![9u8; LARGE_FILE_THRESHOLD + 10];
        let mut stream = StreamingWriter::new(Vec::new());
        stream.write(b"head").unwrap();
        stream.write_file(&large).unwrap();
        stream.write(b"tail").unwrap();
        let out = stream.finish().unwrap();
        assert_eq!(&out[..4], b"head");
        assert_eq!(out.len(), 8 + large.len());
        assert_eq!(&out[out.len() - 4..], b"tail");
    }

    #[test]
    fn test_copy_from_reader() {
        let source = (0..=255u8).cycle().take(LARGE_FILE_THRESHOLD * 2).collect::<Vec<_>>();
        let mut reader = Cursor::new(source.clone());
        let mut stream = StreamingWriter::new(Vec::new());
        stream.copy_from(&mut reader, 10).unwrap();
        stream.copy_from(&mut reader, source.len() as u64 - 10).unwrap();
        assert_eq!(stream.finish().unwrap(), source);
    }

    #[test]
    fn test_copy_from_short_reader_fails() {
        let mut reader = Cursor::new(vec![1u8, 2]);
        let mut stream = StreamingWriter::new(Vec::new());
        assert!(stream.copy_from(&mut reader, 5).is_err());
    }
}
