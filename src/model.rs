//! Object model shared by the overlay and the remote backend seam
//!
//! The overlay presents logical (plaintext) views of encrypted remote
//! objects. A logical [`Object`] keeps the *remote* ciphertext path as
//! its identity so that later operations (link, rename, remove) can find
//! the backing object without re-encrypting the whole path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::stream::{ByteStream, RangeSource};

/// A filesystem item, either the remote backend's raw (ciphertext) view
/// or the overlay's decrypted logical view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Object {
    /// Full path on the remote backend (ciphertext names)
    pub path: String,
    /// Display name: ciphertext for remote objects, plaintext for logical ones
    pub name: String,
    /// Size in bytes; folders always report 0
    pub size: u64,
    /// Folder flag
    pub is_folder: bool,
    /// Modification time
    pub modified: DateTime<Utc>,
    /// Creation time
    pub ctime: DateTime<Utc>,
    /// Thumbnail URL, synthesized from the logical path when enabled
    pub thumbnail: Option<String>,
}

impl Object {
    /// Create a folder object with zero size.
    pub fn folder(path: String, name: String, modified: DateTime<Utc>, ctime: DateTime<Utc>) -> Self {
        Object {
            path,
            name,
            size: 0,
            is_folder: true,
            modified,
            ctime,
            thumbnail: None,
        }
    }
}

/// Arguments for a directory listing
#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    /// Bypass and repopulate any cached listing
    pub refresh: bool,
    /// Logical path the caller requested, used for thumbnail synthesis
    pub req_path: Option<String>,
}

/// Arguments shared by all batch operations
#[derive(Debug, Clone, Default)]
pub struct BatchArgs {
    /// Logical path of the source directory
    pub src_dir_path: String,
    /// Logical path of the destination directory (move/copy only)
    pub dst_dir_path: Option<String>,
}

/// One rename within a batch-rename request
#[derive(Debug, Clone)]
pub struct RenameOp {
    /// Current logical name of the child
    pub name: String,
    /// Requested new logical name
    pub new_name: String,
}

/// A batch-remove request: named children of one logical directory
#[derive(Debug, Clone)]
pub struct BatchRemoveSet {
    /// Logical path of the directory holding the children
    pub dir_path: String,
    /// Logical names of the children to remove
    pub names: Vec<String>,
}

/// Content upload handed to `put`
pub struct UploadRequest {
    /// Logical file name
    pub name: String,
    /// Plaintext size in bytes
    pub size: u64,
    /// Modification time to record
    pub modified: DateTime<Utc>,
    /// MIME type of the payload
    pub mimetype: String,
    /// Content stream
    pub reader: ByteStream,
    /// Force a plain streaming upload; set for ciphertext payloads where
    /// content-addressed rapid upload can never match
    pub force_stream_upload: bool,
}

impl std::fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRequest")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("mimetype", &self.mimetype)
            .field("force_stream_upload", &self.force_stream_upload)
            .finish_non_exhaustive()
    }
}

/// An opened, time-bounded handle to one logical file's content.
///
/// The range source yields plaintext: requests are logical ranges and
/// decryption happens underneath, against the remote ciphertext.
pub struct Link {
    /// Plaintext length of the file
    pub content_length: u64,
    /// Range-capable decrypting byte source
    pub range: Arc<dyn RangeSource>,
}

/// Disk usage reported by the remote backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiskUsage {
    pub total_bytes: u64,
    pub free_bytes: u64,
}

/// Storage details passed through from the remote backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageDetails {
    pub disk_usage: DiskUsage,
}
