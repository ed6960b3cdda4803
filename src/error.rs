//! Error types for veilfs

use thiserror::Error;

/// Result type alias for veilfs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the overlay driver
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or malformed configuration (fatal, blocks driver startup)
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Object does not exist at the given path
    #[error("object not found: {0}")]
    NotFound(String),

    /// Name or size decryption failed for a single entry
    #[error("cipher error: {0}")]
    Cipher(String),

    /// The remote backend does not implement the requested capability
    #[error("operation not supported by the remote backend: {0}")]
    NotSupported(&'static str),

    /// The remote backend cannot serve arbitrary byte ranges
    #[error("remote storage driver needs to be enhanced to support encryption (no range reads)")]
    RangeUnsupported,

    /// Header fetch returned fewer bytes than the cipher's fixed header length
    #[error("truncated file header: expected {expected} bytes, got {actual}")]
    TruncatedHeader { expected: usize, actual: usize },

    /// Error reported by the remote backend
    #[error("remote backend error: {0}")]
    Remote(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means "the object does not exist".
    ///
    /// Only this class triggers the second guess during ambiguous path
    /// lookup; every other class propagates immediately.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
