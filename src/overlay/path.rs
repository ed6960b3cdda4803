//! Logical-to-remote path translation and the two-guess lookup

use crate::error::Result;
use crate::model::Object;
use crate::paths::{clean_path, join_path, split_dir_file};

use super::CryptDriver;

/// Guess what a trailing path segment names.
///
/// Returns `(first_guess_is_folder, second_try)`. A trailing `/` is a
/// confirmed folder; a final segment without a dot is probably a folder
/// but worth a file retry; one with a dot is probably a file but worth a
/// folder retry.
pub(crate) fn guess_path(path: &str) -> (bool, bool) {
    if path.ends_with('/') {
        return (true, false);
    }
    let last_segment = match path.rfind('/') {
        Some(idx) => &path[idx..],
        None => path,
    };
    if !last_segment.contains('.') {
        return (true, true);
    }
    (false, true)
}

impl CryptDriver {
    /// Translate a logical path into its full remote (ciphertext) path:
    /// root + segment-wise encrypted ancestors + encrypted leaf.
    pub(crate) fn path_for_remote(&self, path: &str, is_folder: bool) -> String {
        let mut path = path.to_string();
        if is_folder && !path.ends_with('/') {
            path.push('/');
        }
        let (dir, file_name) = split_dir_file(&path);

        let remote_dir = self.cipher.encrypt_dir_name(dir);
        let joined = join_path(&self.config.remote_path, &remote_dir);
        if file_name.trim().is_empty() {
            clean_path(&joined)
        } else {
            clean_path(&join_path(
                &joined,
                &self.cipher.encrypt_file_name(file_name),
            ))
        }
    }

    /// Resolve a logical path to the backing encrypted object.
    ///
    /// The path-shape guess is only a first try: when it misses with a
    /// not-found error and the path was ambiguous, the opposite guess is
    /// attempted once. Every other error class propagates directly.
    pub(crate) async fn get_encrypted_object(&self, path: &str) -> Result<Object> {
        let (first_is_folder, second_try) = guess_path(path);
        let remote_path = self.path_for_remote(path, first_is_folder);
        match self.remote.get(&remote_path).await {
            Ok(obj) => Ok(obj),
            Err(err) if err.is_not_found() && second_try => {
                let remote_path = self.path_for_remote(path, !first_is_folder);
                self.remote.get(&remote_path).await
            }
            Err(err) => Err(err),
        }
    }
}
