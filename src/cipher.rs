//! The cipher capability consumed by the overlay
//!
//! The overlay does not implement cryptography. It drives an external
//! cipher through this seam: name codecs, size mapping, an encrypting
//! writer for uploads, and a seekable decrypting reader for ranged
//! downloads. Implementations must be stateless and reentrant; the
//! overlay calls them concurrently.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::NameEncryptionMode;
use crate::error::Result;
use crate::stream::{ByteStream, RangeSource};

/// Fixed size of the on-disk ciphertext header. Every decryption session
/// re-derives its state from these leading bytes.
pub const FILE_HEADER_SIZE: usize = 32;

/// Parameters handed to a [`CipherFactory`], already revealed and
/// normalized by the driver.
#[derive(Debug, Clone)]
pub struct CipherParams {
    pub password: String,
    pub salt: String,
    pub filename_encryption: NameEncryptionMode,
    pub directory_name_encryption: NameEncryptionMode,
    pub filename_encoding: String,
    pub encrypted_suffix: String,
}

/// Builds a cipher from normalized driver configuration.
///
/// Construction failure is fatal for driver startup.
pub trait CipherFactory: Send + Sync {
    fn build(&self, params: CipherParams) -> Result<Arc<dyn Cipher>>;
}

impl<F> CipherFactory for F
where
    F: Fn(CipherParams) -> Result<Arc<dyn Cipher>> + Send + Sync,
{
    fn build(&self, params: CipherParams) -> Result<Arc<dyn Cipher>> {
        self(params)
    }
}

/// The cipher capability.
///
/// Directory names are full `/`-separated paths encrypted segment by
/// segment; file names are single leaf names. Decryption failure on a
/// name or size means the input was not produced by this cipher.
#[async_trait]
pub trait Cipher: Send + Sync {
    /// Encrypt a directory path, segment-wise.
    fn encrypt_dir_name(&self, path: &str) -> String;

    /// Decrypt a directory path, segment-wise.
    fn decrypt_dir_name(&self, path: &str) -> Result<String>;

    /// Encrypt a single file leaf name.
    fn encrypt_file_name(&self, name: &str) -> String;

    /// Decrypt a single file leaf name.
    fn decrypt_file_name(&self, name: &str) -> Result<String>;

    /// Ciphertext size for a given plaintext size.
    fn encrypted_size(&self, plain_size: u64) -> u64;

    /// Plaintext size for a given ciphertext size. Fails when the
    /// ciphertext size is impossible (shorter than the header).
    fn decrypted_size(&self, cipher_size: u64) -> Result<u64>;

    /// Wrap a plaintext stream into its encrypting form for upload.
    async fn encrypt_data(&self, plain: ByteStream) -> Result<ByteStream>;

    /// Open a decrypting reader over the logical range
    /// `[offset, offset + length)`, pulling ciphertext ranges from
    /// `source` as needed (header first, then a seek into the body).
    async fn decrypt_data_seek(
        &self,
        source: Arc<dyn RangeSource>,
        offset: u64,
        length: u64,
    ) -> Result<ByteStream>;
}
