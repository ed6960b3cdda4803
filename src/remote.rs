//! The remote backend capability consumed by the overlay
//!
//! One [`Remote`] wraps whatever storage actually holds the ciphertext.
//! Paths given to a remote are full remote (ciphertext) paths. Batch
//! operations are optional capabilities: the overlay queries them at
//! call time through the `as_batch_*` accessors and reports
//! `Error::NotSupported` when a backend lacks one, instead of falling
//! back to slow per-item calls.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::model::{Object, StorageDetails, UploadRequest};
use crate::stream::RangeSource;

/// An opened handle to one remote object's content.
pub struct RemoteLink {
    /// Ciphertext length, when the backend reports it
    pub content_length: u64,
    /// Ranged access to the ciphertext. `None` means the backend cannot
    /// serve arbitrary ranges and is incompatible with the overlay.
    pub range_source: Option<Arc<dyn RangeSource>>,
}

/// The remote object-storage abstraction.
#[async_trait]
pub trait Remote: Send + Sync {
    /// List the children of a remote directory.
    async fn list(&self, dir_path: &str) -> Result<Vec<Object>>;

    /// Resolve a single remote path to its object.
    async fn get(&self, path: &str) -> Result<Object>;

    /// Open a content link for a remote file.
    async fn link(&self, path: &str) -> Result<RemoteLink>;

    /// Create a remote directory.
    async fn make_dir(&self, path: &str) -> Result<()>;

    /// Move an object into another directory.
    async fn move_obj(&self, src_path: &str, dst_dir_path: &str) -> Result<()>;

    /// Rename an object in place.
    async fn rename(&self, path: &str, new_name: &str) -> Result<()>;

    /// Copy an object into another directory.
    async fn copy_obj(&self, src_path: &str, dst_dir_path: &str) -> Result<()>;

    /// Remove an object (recursively for folders).
    async fn remove(&self, path: &str) -> Result<()>;

    /// Upload content into a directory.
    async fn put(&self, dir_path: &str, upload: UploadRequest) -> Result<()>;

    /// Storage details (disk usage) for this backend.
    async fn details(&self) -> Result<StorageDetails>;

    /// Batch-move capability, when implemented.
    fn as_batch_move(&self) -> Option<&dyn BatchMove> {
        None
    }

    /// Batch-copy capability, when implemented.
    fn as_batch_copy(&self) -> Option<&dyn BatchCopy> {
        None
    }

    /// Batch-remove capability, when implemented.
    fn as_batch_remove(&self) -> Option<&dyn BatchRemove> {
        None
    }

    /// Batch-rename capability, when implemented.
    fn as_batch_rename(&self) -> Option<&dyn BatchRename> {
        None
    }
}

/// Optional capability: move several children of one directory at once.
#[async_trait]
pub trait BatchMove: Send + Sync {
    async fn batch_move(&self, src_dir: &Object, objs: &[Object], dst_dir: &Object) -> Result<()>;
}

/// Optional capability: copy several children of one directory at once.
#[async_trait]
pub trait BatchCopy: Send + Sync {
    async fn batch_copy(&self, src_dir: &Object, objs: &[Object], dst_dir: &Object) -> Result<()>;
}

/// Optional capability: remove several children of one directory at once.
#[async_trait]
pub trait BatchRemove: Send + Sync {
    async fn batch_remove(&self, dir: &Object, objs: &[Object]) -> Result<()>;
}

/// Optional capability: rename several children of one directory at
/// once. Each entry pairs the existing object with its new (ciphertext)
/// name.
#[async_trait]
pub trait BatchRename: Send + Sync {
    async fn batch_rename(&self, dir: &Object, renames: &[(Object, String)]) -> Result<()>;
}
