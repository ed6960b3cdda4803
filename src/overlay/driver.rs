//! Core driver operations: init, list, get, and the single-object
//! structural operations

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::ListingCache;
use crate::cipher::{Cipher, CipherFactory, CipherParams};
use crate::config::CryptConfig;
use crate::error::Result;
use crate::model::{ListArgs, Object, StorageDetails, UploadRequest};
use crate::paths::{join_path, path_equal, split_dir_file};
use crate::remote::Remote;

/// The encrypting overlay driver.
///
/// Holds no mutable state besides the listing cache; the cipher and the
/// remote backend are stateless, reentrant collaborators, so a single
/// driver instance is safe for concurrent use.
pub struct CryptDriver {
    pub(crate) config: CryptConfig,
    pub(crate) cipher: Arc<dyn Cipher>,
    pub(crate) remote: Arc<dyn Remote>,
    pub(crate) cache: ListingCache,
}

impl CryptDriver {
    /// Initialize the driver: obscure credentials (idempotent), validate
    /// the configuration, and construct the cipher. Any failure here is
    /// fatal and no partially initialized driver is observable.
    pub fn new(
        mut config: CryptConfig,
        remote: Arc<dyn Remote>,
        cipher_factory: &dyn CipherFactory,
    ) -> Result<Self> {
        config.normalize();
        config.validate()?;

        let params = CipherParams {
            password: config.reveal_password()?,
            salt: config.reveal_salt()?,
            filename_encryption: config.filename_encryption,
            directory_name_encryption: config.directory_name_encryption,
            filename_encoding: config.filename_encoding.clone(),
            encrypted_suffix: config.encrypted_suffix.clone(),
        };
        let cipher = cipher_factory.build(params)?;

        Ok(CryptDriver {
            config,
            cipher,
            remote,
            cache: ListingCache::new(),
        })
    }

    /// The normalized configuration.
    pub fn config(&self) -> &CryptConfig {
        &self.config
    }

    /// List the decrypted children of a logical directory.
    ///
    /// Remote children whose name (or, for files, size) fails to decrypt
    /// are not part of the logical namespace and are dropped without
    /// failing the listing. Hidden names are filtered after decryption.
    pub async fn list(&self, dir: &Object, args: &ListArgs) -> Result<Vec<Object>> {
        let remote_dir = dir.path.as_str();

        let cached = if args.refresh {
            None
        } else {
            self.cache.get(remote_dir)
        };
        let children = match cached {
            Some(children) => children,
            None => {
                let children = self.remote.list(remote_dir).await?;
                self.cache.insert(remote_dir, children.clone());
                children
            }
        };

        let mut result = Vec::with_capacity(children.len());
        for child in children {
            if child.is_folder {
                let name = match self.cipher.decrypt_dir_name(&child.name) {
                    Ok(name) => name,
                    Err(err) => {
                        debug!(raw = %child.name, %err, "dropping undecodable directory entry");
                        continue;
                    }
                };
                if !self.config.show_hidden && name.starts_with('.') {
                    continue;
                }
                result.push(Object::folder(
                    child.path.clone(),
                    name,
                    child.modified,
                    child.ctime,
                ));
                continue;
            }

            let size = match self.cipher.decrypted_size(child.size) {
                Ok(size) => size,
                Err(err) => {
                    debug!(raw = %child.name, %err, "dropping entry with undecodable size");
                    continue;
                }
            };
            let name = match self.cipher.decrypt_file_name(&child.name) {
                Ok(name) => name,
                Err(err) => {
                    debug!(raw = %child.name, %err, "dropping undecodable file entry");
                    continue;
                }
            };
            if !self.config.show_hidden && name.starts_with('.') {
                continue;
            }

            let thumbnail = self.thumbnail_for(args, &name);
            result.push(Object {
                path: child.path.clone(),
                name,
                size,
                is_folder: false,
                modified: child.modified,
                ctime: child.ctime,
                thumbnail,
            });
        }

        Ok(result)
    }

    // Thumbnails are synthesized from the logical request path only;
    // ciphertext names never leak into thumbnail URLs.
    fn thumbnail_for(&self, args: &ListArgs, logical_name: &str) -> Option<String> {
        if !self.config.thumbnail {
            return None;
        }
        let req_path = args.req_path.as_deref()?;
        if !req_path.starts_with('/') {
            return None;
        }
        Some(join_path(
            &join_path(req_path, ".thumbnails"),
            &format!("{}.webp", logical_name),
        ))
    }

    /// Resolve a logical path to its logical object.
    ///
    /// Decryption failures degrade to the raw name/size rather than
    /// failing: the object's identity is still meaningful for move,
    /// rename, and remove even when its metadata cannot be decoded.
    pub async fn get(&self, path: &str) -> Result<Object> {
        if path_equal(path, "/") {
            let epoch = DateTime::<Utc>::UNIX_EPOCH;
            return Ok(Object::folder(
                self.config.remote_path.clone(),
                "Root".to_string(),
                epoch,
                epoch,
            ));
        }

        let remote_obj = self.get_encrypted_object(path).await?;
        let mut name = remote_obj.name.clone();
        let mut size = remote_obj.size;
        if remote_obj.is_folder {
            match self.cipher.decrypt_dir_name(&remote_obj.name) {
                Ok(decrypted) => name = decrypted,
                Err(err) => warn!(%path, %err, "decrypt_dir_name failed, using raw name"),
            }
        } else {
            match self.cipher.decrypted_size(size) {
                Ok(decrypted) => size = decrypted,
                Err(err) => warn!(%path, %err, "decrypted_size failed, using raw size"),
            }
            match self.cipher.decrypt_file_name(&remote_obj.name) {
                Ok(decrypted) => name = decrypted,
                Err(err) => warn!(%path, %err, "decrypt_file_name failed, using raw name"),
            }
        }

        Ok(Object {
            path: remote_obj.path,
            name,
            size,
            is_folder: remote_obj.is_folder,
            modified: remote_obj.modified,
            ctime: remote_obj.ctime,
            thumbnail: None,
        })
    }

    /// Create a logical directory under `parent`.
    pub async fn make_dir(&self, parent: &Object, dir_name: &str) -> Result<()> {
        let encrypted = self.cipher.encrypt_dir_name(dir_name);
        self.remote
            .make_dir(&join_path(&parent.path, &encrypted))
            .await?;
        self.cache.invalidate(&parent.path);
        Ok(())
    }

    /// Move an object into another logical directory. Whole-subtree
    /// structure is the remote backend's concern; paths are already in
    /// ciphertext space.
    pub async fn move_to(&self, src: &Object, dst_dir: &Object) -> Result<()> {
        self.remote.move_obj(&src.path, &dst_dir.path).await?;
        self.cache.invalidate(&self.parent_dir(&src.path));
        self.cache.invalidate(&dst_dir.path);
        Ok(())
    }

    /// Rename an object in place, re-encrypting only the leaf name.
    pub async fn rename(&self, src: &Object, new_name: &str) -> Result<()> {
        let encrypted = if src.is_folder {
            self.cipher.encrypt_dir_name(new_name)
        } else {
            self.cipher.encrypt_file_name(new_name)
        };
        self.remote.rename(&src.path, &encrypted).await?;
        self.cache.invalidate(&self.parent_dir(&src.path));
        Ok(())
    }

    /// Copy an object into another logical directory.
    pub async fn copy_to(&self, src: &Object, dst_dir: &Object) -> Result<()> {
        self.remote.copy_obj(&src.path, &dst_dir.path).await?;
        self.cache.invalidate(&dst_dir.path);
        Ok(())
    }

    /// Remove an object.
    pub async fn remove(&self, obj: &Object) -> Result<()> {
        self.remote.remove(&obj.path).await?;
        self.cache.invalidate(&self.parent_dir(&obj.path));
        Ok(())
    }

    /// Encrypt and upload content.
    ///
    /// Ciphertext depends on a per-file random component, so
    /// content-addressed rapid upload can never match; the upload is
    /// forced onto the plain streaming path.
    pub async fn put(&self, dst_dir: &Object, upload: UploadRequest) -> Result<()> {
        let encrypted_reader = self.cipher.encrypt_data(upload.reader).await?;
        let out = UploadRequest {
            name: self.cipher.encrypt_file_name(&upload.name),
            size: self.cipher.encrypted_size(upload.size),
            modified: upload.modified,
            mimetype: "application/octet-stream".to_string(),
            reader: encrypted_reader,
            force_stream_upload: true,
        };
        self.remote.put(&dst_dir.path, out).await?;
        self.cache.invalidate(&dst_dir.path);
        Ok(())
    }

    /// Disk usage, passed through from the remote backend.
    pub async fn get_details(&self) -> Result<StorageDetails> {
        self.remote.details().await
    }

    pub(crate) fn parent_dir(&self, path: &str) -> String {
        let (dir, _) = split_dir_file(path);
        crate::paths::clean_path(dir)
    }
}
