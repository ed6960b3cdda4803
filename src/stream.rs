//! Byte-range streams
//!
//! The overlay consumes remote content through [`RangeSource`]: give it
//! a byte range, get back an async stream of exactly that sub-range of
//! the ciphertext. Streams are plain boxed `AsyncRead`s; cancellation is
//! dropping the future that drives them.

use async_trait::async_trait;
use bytes::Bytes;
use std::io::Cursor;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::Result;

/// An async byte stream with no further seeking capability
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// A half-open byte range `[start, start + length)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: u64,
    pub length: u64,
}

impl RangeSpec {
    pub fn new(start: u64, length: u64) -> Self {
        RangeSpec { start, length }
    }
}

/// Source of ciphertext byte ranges for one remote object
#[async_trait]
pub trait RangeSource: Send + Sync {
    /// Return a stream over exactly the requested sub-range.
    async fn range_read(&self, range: RangeSpec) -> Result<ByteStream>;
}

/// Wrap an in-memory buffer as a [`ByteStream`].
pub fn memory_stream(data: Bytes) -> ByteStream {
    Box::new(Cursor::new(data))
}

/// Concatenate two streams.
pub fn chain(first: ByteStream, second: ByteStream) -> ByteStream {
    Box::new(first.chain(second))
}

/// Drain a stream into memory. Test and small-payload helper.
pub async fn read_all(mut stream: ByteStream) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    Ok(buf)
}
