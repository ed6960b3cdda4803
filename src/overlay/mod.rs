//! The encrypting storage overlay driver
//!
//! Wraps one remote backend and presents a decrypted logical view:
//! - listing decrypts names and sizes, dropping undecodable entries;
//! - reads decrypt byte ranges on demand through a header-caching
//!   range source;
//! - writes encrypt content and file name before delegating;
//! - metadata and batch operations translate between plaintext and
//!   ciphertext names and delegate structure to the remote backend.

mod batch;
mod driver;
mod link;
mod path;

pub use driver::CryptDriver;
