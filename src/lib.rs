//! veilfs - Encrypting storage overlay driver
//!
//! This library wraps a remote object-storage backend and presents a
//! logical, encrypted-at-rest view of it: names and sizes decrypt on
//! listing, content decrypts on demand through ranged reads, and writes
//! encrypt name and content before delegating to the backend. The
//! cipher itself and the remote backend are consumed capabilities, not
//! implemented here.

pub mod cache;
pub mod cipher;
pub mod config;
pub mod error;
pub mod model;
pub mod obscure;
pub mod overlay;
pub mod paths;
pub mod remote;
pub mod stream;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::CryptConfig;
pub use error::{Error, Result};
pub use overlay::CryptDriver;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cipher::{Cipher, CipherFactory, CipherParams, FILE_HEADER_SIZE};
    pub use crate::config::CryptConfig;
    pub use crate::error::{Error, Result};
    pub use crate::model::{Link, ListArgs, Object, UploadRequest};
    pub use crate::overlay::CryptDriver;
    pub use crate::remote::{Remote, RemoteLink};
    pub use crate::stream::{RangeSource, RangeSpec};
}
