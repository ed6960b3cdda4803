//! Batch operations: plaintext-to-ciphertext name reconciliation
//!
//! A batch request names several children of one logical directory. The
//! overlay lists the matching remote directory, decrypts each child's
//! name, and keeps only the children the caller asked for; undecodable
//! children are dropped with a warning, never aborting the batch. The
//! remote backend only ever sees ciphertext identifiers.

use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::error::{Error, Result};
use crate::model::{BatchArgs, BatchRemoveSet, Object, RenameOp};

use super::CryptDriver;

impl CryptDriver {
    /// Decrypt the children of a logical directory's remote counterpart
    /// and keep those whose plaintext name the caller requested.
    async fn match_encrypted_children(
        &self,
        logical_dir: &str,
        requested: &HashSet<&str>,
    ) -> Result<Vec<(String, Object)>> {
        let remote_dir = self.path_for_remote(logical_dir, true);
        let children = self.remote.list(&remote_dir).await?;

        let mut matched = Vec::new();
        for child in children {
            let decrypted = if child.is_folder {
                self.cipher.decrypt_dir_name(&child.name)
            } else {
                self.cipher.decrypt_file_name(&child.name)
            };
            match decrypted {
                Ok(name) => {
                    if requested.contains(name.as_str()) {
                        matched.push((name, child));
                    }
                }
                Err(err) => {
                    warn!(raw = %child.name, %err, "failed to decrypt child name, skipping");
                }
            }
        }
        Ok(matched)
    }

    fn require_dst<'a>(args: &'a BatchArgs, op: &'static str) -> Result<&'a str> {
        args.dst_dir_path
            .as_deref()
            .ok_or_else(|| Error::Config(format!("{} requires a destination directory", op)))
    }

    fn invalidate_remote_dir(&self, logical_dir: &str) {
        self.cache.invalidate(&self.path_for_remote(logical_dir, true));
    }

    /// Move the named children of one logical directory in a single
    /// remote batch. Fails with [`Error::NotSupported`] before touching
    /// the remote backend when it lacks the capability.
    pub async fn batch_move(&self, args: &BatchArgs, names: &[String]) -> Result<()> {
        let Some(mover) = self.remote.as_batch_move() else {
            return Err(Error::NotSupported("batch move"));
        };
        let dst_path = Self::require_dst(args, "batch move")?.to_string();

        let src_dir = self.get_encrypted_object(&args.src_dir_path).await?;
        let dst_dir = self.get_encrypted_object(&dst_path).await?;

        let requested: HashSet<&str> = names.iter().map(String::as_str).collect();
        let matched = self
            .match_encrypted_children(&args.src_dir_path, &requested)
            .await?;
        let objs: Vec<Object> = matched.into_iter().map(|(_, obj)| obj).collect();

        mover.batch_move(&src_dir, &objs, &dst_dir).await?;

        self.invalidate_remote_dir(&args.src_dir_path);
        self.invalidate_remote_dir(&dst_path);
        Ok(())
    }

    /// Copy the named children of one logical directory in a single
    /// remote batch.
    pub async fn batch_copy(&self, args: &BatchArgs, names: &[String]) -> Result<()> {
        let Some(copier) = self.remote.as_batch_copy() else {
            return Err(Error::NotSupported("batch copy"));
        };
        let dst_path = Self::require_dst(args, "batch copy")?.to_string();

        let src_dir = self.get_encrypted_object(&args.src_dir_path).await?;
        let dst_dir = self.get_encrypted_object(&dst_path).await?;

        let requested: HashSet<&str> = names.iter().map(String::as_str).collect();
        let matched = self
            .match_encrypted_children(&args.src_dir_path, &requested)
            .await?;
        let objs: Vec<Object> = matched.into_iter().map(|(_, obj)| obj).collect();

        copier.batch_copy(&src_dir, &objs, &dst_dir).await?;

        self.invalidate_remote_dir(&dst_path);
        Ok(())
    }

    /// Remove the named children of one logical directory in a single
    /// remote batch. Names that match nothing, and children that fail to
    /// decrypt, are silently skipped; the batch proceeds on the rest.
    pub async fn batch_remove(&self, set: &BatchRemoveSet) -> Result<()> {
        let Some(remover) = self.remote.as_batch_remove() else {
            return Err(Error::NotSupported("batch remove"));
        };

        let dir = self.get_encrypted_object(&set.dir_path).await?;

        let requested: HashSet<&str> = set.names.iter().map(String::as_str).collect();
        let matched = self
            .match_encrypted_children(&set.dir_path, &requested)
            .await?;
        let objs: Vec<Object> = matched.into_iter().map(|(_, obj)| obj).collect();

        remover.batch_remove(&dir, &objs).await?;

        self.invalidate_remote_dir(&set.dir_path);
        Ok(())
    }

    /// Rename the named children of one logical directory in a single
    /// remote batch. Each kept child's new name is encrypted before the
    /// remote backend sees it.
    pub async fn batch_rename(&self, dir_path: &str, renames: &[RenameOp]) -> Result<()> {
        let Some(renamer) = self.remote.as_batch_rename() else {
            return Err(Error::NotSupported("batch rename"));
        };

        let dir = self.get_encrypted_object(dir_path).await?;

        let new_names: HashMap<&str, &str> = renames
            .iter()
            .map(|op| (op.name.as_str(), op.new_name.as_str()))
            .collect();
        let requested: HashSet<&str> = new_names.keys().copied().collect();
        let matched = self.match_encrypted_children(dir_path, &requested).await?;

        let mut pairs = Vec::with_capacity(matched.len());
        for (plain_name, obj) in matched {
            let Some(new_name) = new_names.get(plain_name.as_str()) else {
                continue;
            };
            let encrypted = if obj.is_folder {
                self.cipher.encrypt_dir_name(new_name)
            } else {
                self.cipher.encrypt_file_name(new_name)
            };
            pairs.push((obj, encrypted));
        }

        renamer.batch_rename(&dir, &pairs).await?;

        self.invalidate_remote_dir(dir_path);
        Ok(())
    }
}
