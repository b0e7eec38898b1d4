//! Chunked line reading.
//!
//! Input is read in fixed-size chunks and split on `\n` at the byte level.
//! The trailing fragment of each chunk is carried over and prefixed onto the
//! next one, so a line (or a multi-byte character) cut by a chunk boundary is
//! only decoded once it is complete. Lines over [`MAX_LINE_SIZE`] are cut
//! short after one extra byte instead of growing the carry without bound.

use std::io;
use async_stream::try_stream;
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_stream::Stream;

use crate::parser::MAX_LINE_SIZE;

/// Incremental `\n` splitter with a carry-over buffer.
///
/// A line longer than the limit keeps only its first `limit + 1` bytes, so
/// the carry stays bounded and the line still reads as oversized downstream.
#[derive(Debug)]
pub struct LineSplitter {
    carry: BytesMut,
    limit: usize,
    truncated: bool,
}

impl Default for LineSplitter {
    fn default() -> Self {
        Self::with_limit(MAX_LINE_SIZE)
    }
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            carry: BytesMut::new(),
            limit,
            truncated: false,
        }
    }

    /// Feed one chunk, returning every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.append(&rest[..pos]);
            lines.push(self.take_line());
            rest = &rest[pos + 1..];
        }
        self.append(rest);

        lines
    }

    /// Flush the final unterminated line, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.carry.is_empty() {
            return None;
        }
        Some(self.take_line())
    }

    pub fn pending_bytes(&self) -> usize {
        self.carry.len()
    }

    fn append(&mut self, bytes: &[u8]) {
        let room = (self.limit + 1).saturating_sub(self.carry.len());
        if bytes.len() > room {
            if !self.truncated {
                tracing::debug!(limit = self.limit, "overlong line truncated while splitting");
            }
            self.truncated = true;
        }
        self.carry.extend_from_slice(&bytes[..bytes.len().min(room)]);
    }

    fn take_line(&mut self) -> String {
        let raw = self.carry.split();
        let line = if self.truncated {
            String::from_utf8_lossy(&raw).into_owned()
        } else {
            decode_line(&raw)
        };
        self.truncated = false;
        line
    }
}

/// Split a fully resident buffer with the same rules as the streaming path.
pub fn split_lines(bytes: &[u8]) -> Vec<String> {
    let mut splitter = LineSplitter::new();
    let mut lines = splitter.push(bytes);
    lines.extend(splitter.finish());
    lines
}

/// Stream the lines of `reader`, reading `chunk_size` bytes at a time and
/// yielding to the scheduler between chunks. The reader is owned by the
/// stream and released when the stream is dropped.
pub fn line_stream<R>(mut reader: R, chunk_size: usize) -> impl Stream<Item = io::Result<String>>
where
    R: AsyncRead + Unpin,
{
    try_stream! {
        let mut splitter = LineSplitter::new();
        let mut buf = vec![0u8; chunk_size.max(1)];

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            for line in splitter.push(&buf[..n]) {
                yield line;
            }
            tokio::task::yield_now().await;
        }

        if let Some(rest) = splitter.finish() {
            yield rest;
        }
    }
}

/// Count lines by scanning for `\n` only. A non-empty unterminated final
/// line counts as one more.
pub async fn count_lines<R>(mut reader: R, chunk_size: usize) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut count = 0usize;
    let mut last = None;

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        count += buf[..n].iter().filter(|&&b| b == b'\n').count();
        last = Some(buf[n - 1]);
        tokio::task::yield_now().await;
    }

    if matches!(last, Some(b) if b != b'\n') {
        count += 1;
    }
    Ok(count)
}
