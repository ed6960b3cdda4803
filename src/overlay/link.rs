//! Ranged decrypting reads with a per-link file-header cache
//!
//! Every decryption session re-derives cipher state from the fixed-size
//! ciphertext header, so a naive range source would re-fetch the first
//! bytes on every sub-range request a streaming consumer makes. The
//! caching source memoizes the header once per open link:
//!
//! - offset-0 reads within the header are served from the cache, or
//!   populate it with one exact-header fetch;
//! - offset-0 reads past the header peel the header off the front of
//!   the single full-range response and cache it, then splice it back;
//! - reads not starting at offset 0 bypass the cache entirely.

use bytes::Bytes;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;

use async_trait::async_trait;

use crate::cipher::{Cipher, FILE_HEADER_SIZE};
use crate::error::{Error, Result};
use crate::model::{Link, Object};
use crate::stream::{chain, memory_stream, ByteStream, RangeSource, RangeSpec};

use super::CryptDriver;

/// Range source that caches the ciphertext file header for one link.
///
/// The guard is held only while the cache is read or populated; a
/// populated header is immutable and exactly [`FILE_HEADER_SIZE`] bytes.
pub(crate) struct HeaderCachingSource {
    inner: Arc<dyn RangeSource>,
    header: Mutex<Option<Bytes>>,
}

impl HeaderCachingSource {
    pub(crate) fn new(inner: Arc<dyn RangeSource>) -> Self {
        HeaderCachingSource {
            inner,
            header: Mutex::new(None),
        }
    }

    /// Read exactly the header length from a stream, reporting how many
    /// bytes actually arrived on a short read.
    async fn read_header(stream: &mut ByteStream) -> Result<Bytes> {
        let mut buf = vec![0u8; FILE_HEADER_SIZE];
        let mut filled = 0;
        while filled < FILE_HEADER_SIZE {
            let n = stream.read(&mut buf[filled..]).await?;
            if n == 0 {
                return Err(Error::TruncatedHeader {
                    expected: FILE_HEADER_SIZE,
                    actual: filled,
                });
            }
            filled += n;
        }
        Ok(Bytes::from(buf))
    }
}

#[async_trait]
impl RangeSource for HeaderCachingSource {
    async fn range_read(&self, range: RangeSpec) -> Result<ByteStream> {
        let header_len = FILE_HEADER_SIZE as u64;

        if range.start != 0 || range.length == 0 {
            return self.inner.range_read(range).await;
        }

        if range.length <= header_len {
            let mut guard = self.header.lock().await;
            if let Some(header) = guard.as_ref() {
                return Ok(memory_stream(header.slice(0..range.length as usize)));
            }
            let mut stream = self
                .inner
                .range_read(RangeSpec::new(0, header_len))
                .await?;
            // A populate failure must not leave a half-filled cache.
            let header = Self::read_header(&mut stream).await?;
            *guard = Some(header.clone());
            return Ok(memory_stream(header.slice(0..range.length as usize)));
        }

        // Request extends past the header. If the header is cached,
        // fetch only the remainder and splice the cached bytes in front.
        {
            let guard = self.header.lock().await;
            if let Some(header) = guard.as_ref().cloned() {
                drop(guard);
                let rest = self
                    .inner
                    .range_read(RangeSpec::new(header_len, range.length - header_len))
                    .await?;
                return Ok(chain(memory_stream(header), rest));
            }
        }

        // Not cached: fetch the full range once, peel the header off the
        // front of that same response, and cache it. The guard stays
        // held so the first successful populator wins.
        let mut guard = self.header.lock().await;
        if let Some(header) = guard.as_ref().cloned() {
            // Raced with another populator while unlocked above.
            let rest = self
                .inner
                .range_read(RangeSpec::new(header_len, range.length - header_len))
                .await?;
            return Ok(chain(memory_stream(header), rest));
        }
        let mut stream = self.inner.range_read(range).await?;
        let header = Self::read_header(&mut stream).await?;
        *guard = Some(header.clone());
        Ok(chain(memory_stream(header), stream))
    }
}

/// Range source that decrypts on the fly through the cipher.
struct DecryptingRangeSource {
    cipher: Arc<dyn Cipher>,
    ciphertext: Arc<HeaderCachingSource>,
}

#[async_trait]
impl RangeSource for DecryptingRangeSource {
    async fn range_read(&self, range: RangeSpec) -> Result<ByteStream> {
        self.cipher
            .decrypt_data_seek(self.ciphertext.clone(), range.start, range.length)
            .await
    }
}

impl CryptDriver {
    /// Open a decrypting, range-capable link to a logical file.
    ///
    /// A remote backend whose link cannot serve arbitrary ranges is
    /// incompatible with the overlay and fails here, before any bytes
    /// are returned.
    pub async fn link(&self, file: &Object) -> Result<Link> {
        let remote_link = self.remote.link(&file.path).await?;

        // The backend reports ciphertext length; the object's own size
        // was already decrypted at listing time. Only the former goes
        // through the cipher.
        let content_length = if remote_link.content_length > 0 {
            self.cipher.decrypted_size(remote_link.content_length)?
        } else {
            file.size
        };
        let Some(source) = remote_link.range_source else {
            return Err(Error::RangeUnsupported);
        };

        let caching = Arc::new(HeaderCachingSource::new(source));
        Ok(Link {
            content_length,
            range: Arc::new(DecryptingRangeSource {
                cipher: self.cipher.clone(),
                ciphertext: caching,
            }),
        })
    }
}
