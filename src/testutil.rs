//! Test doubles: a reversible mock cipher, an in-memory remote backend,
//! and a range source that records every request it serves.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::cipher::{Cipher, CipherFactory, CipherParams, FILE_HEADER_SIZE};
use crate::error::{Error, Result};
use crate::model::{DiskUsage, Object, StorageDetails, UploadRequest};
use crate::paths::{clean_path, join_path, split_dir_file};
use crate::remote::{BatchCopy, BatchMove, BatchRemove, BatchRename, Remote, RemoteLink};
use crate::stream::{memory_stream, read_all, ByteStream, RangeSource, RangeSpec};

/// Header the mock cipher writes in front of every ciphertext.
pub const MOCK_HEADER: [u8; FILE_HEADER_SIZE] = [0xA5; FILE_HEADER_SIZE];

const XOR_KEY: u8 = 0x5A;

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Reversible mock cipher: base64 name codec plus XOR content framing.
/// Decrypt fails on names/sizes the mock did not produce, which is what
/// the drop-on-failure paths need.
pub struct MockCipher {
    suffix: String,
}

impl MockCipher {
    pub fn new() -> Self {
        MockCipher {
            suffix: ".bin".to_string(),
        }
    }

    pub fn with_suffix(suffix: &str) -> Self {
        MockCipher {
            suffix: suffix.to_string(),
        }
    }

    /// Factory building a [`MockCipher`] from driver params.
    pub fn factory() -> impl CipherFactory {
        |params: CipherParams| -> Result<Arc<dyn Cipher>> {
            Ok(Arc::new(MockCipher::with_suffix(&params.encrypted_suffix)))
        }
    }

    fn encode_segment(segment: &str) -> String {
        URL_SAFE_NO_PAD.encode(segment.as_bytes())
    }

    fn decode_segment(segment: &str) -> Result<String> {
        let raw = URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|e| Error::Cipher(format!("bad name encoding: {}", e)))?;
        String::from_utf8(raw).map_err(|e| Error::Cipher(format!("bad name bytes: {}", e)))
    }
}

fn xor_body(data: &[u8]) -> Vec<u8> {
    data.iter().map(|b| b ^ XOR_KEY).collect()
}

#[async_trait]
impl Cipher for MockCipher {
    fn encrypt_dir_name(&self, path: &str) -> String {
        path.split('/')
            .map(|seg| {
                if seg.is_empty() {
                    String::new()
                } else {
                    Self::encode_segment(seg)
                }
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    fn decrypt_dir_name(&self, path: &str) -> Result<String> {
        let segments = path
            .split('/')
            .map(|seg| {
                if seg.is_empty() {
                    Ok(String::new())
                } else {
                    Self::decode_segment(seg)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(segments.join("/"))
    }

    fn encrypt_file_name(&self, name: &str) -> String {
        format!("{}{}", Self::encode_segment(name), self.suffix)
    }

    fn decrypt_file_name(&self, name: &str) -> Result<String> {
        let encoded = name
            .strip_suffix(self.suffix.as_str())
            .ok_or_else(|| Error::Cipher(format!("missing suffix on {:?}", name)))?;
        Self::decode_segment(encoded)
    }

    fn encrypted_size(&self, plain_size: u64) -> u64 {
        plain_size + FILE_HEADER_SIZE as u64
    }

    fn decrypted_size(&self, cipher_size: u64) -> Result<u64> {
        cipher_size
            .checked_sub(FILE_HEADER_SIZE as u64)
            .ok_or_else(|| Error::Cipher(format!("ciphertext too short: {}", cipher_size)))
    }

    async fn encrypt_data(&self, plain: ByteStream) -> Result<ByteStream> {
        let body = read_all(plain).await?;
        let mut out = Vec::with_capacity(FILE_HEADER_SIZE + body.len());
        out.extend_from_slice(&MOCK_HEADER);
        out.extend_from_slice(&xor_body(&body));
        Ok(memory_stream(Bytes::from(out)))
    }

    async fn decrypt_data_seek(
        &self,
        source: Arc<dyn RangeSource>,
        offset: u64,
        length: u64,
    ) -> Result<ByteStream> {
        let header = read_all(
            source
                .range_read(RangeSpec::new(0, FILE_HEADER_SIZE as u64))
                .await?,
        )
        .await?;
        if header != MOCK_HEADER {
            return Err(Error::Cipher("bad ciphertext header".to_string()));
        }
        let body = read_all(
            source
                .range_read(RangeSpec::new(FILE_HEADER_SIZE as u64 + offset, length))
                .await?,
        )
        .await?;
        Ok(memory_stream(Bytes::from(xor_body(&body))))
    }
}

/// Encrypt a plaintext buffer the way [`MockCipher::encrypt_data`] does.
pub fn mock_ciphertext(plain: &[u8]) -> Bytes {
    let mut out = Vec::with_capacity(FILE_HEADER_SIZE + plain.len());
    out.extend_from_slice(&MOCK_HEADER);
    out.extend_from_slice(&xor_body(plain));
    Bytes::from(out)
}

/// Range source over an in-memory buffer that records every request.
pub struct CountingRangeSource {
    data: Bytes,
    pub requests: Mutex<Vec<RangeSpec>>,
}

impl CountingRangeSource {
    pub fn new(data: Bytes) -> Self {
        CountingRangeSource {
            data,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl RangeSource for CountingRangeSource {
    async fn range_read(&self, range: RangeSpec) -> Result<ByteStream> {
        self.requests.lock().unwrap().push(range);
        let len = self.data.len() as u64;
        let start = range.start.min(len);
        let end = range.start.saturating_add(range.length).min(len);
        // May return fewer bytes than asked, like a truncated remote.
        Ok(memory_stream(self.data.slice(start as usize..end as usize)))
    }
}

#[derive(Clone)]
struct Node {
    is_folder: bool,
    content: Bytes,
}

/// Upload captured by [`MemoryRemote::put`].
pub struct RecordedUpload {
    pub dir_path: String,
    pub name: String,
    pub size: u64,
    pub mimetype: String,
    pub force_stream_upload: bool,
    pub content: Vec<u8>,
}

/// In-memory remote backend. Batch capabilities and range support are
/// toggles so tests can model both capable and incapable backends.
pub struct MemoryRemote {
    nodes: Mutex<BTreeMap<String, Node>>,
    pub uploads: Mutex<Vec<RecordedUpload>>,
    pub batch_log: Mutex<Vec<String>>,
    pub last_range_source: Mutex<Option<Arc<CountingRangeSource>>>,
    batch_enabled: bool,
    range_support: bool,
    report_content_length: bool,
    details: Option<StorageDetails>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        MemoryRemote {
            nodes: Mutex::new(BTreeMap::new()),
            uploads: Mutex::new(Vec::new()),
            batch_log: Mutex::new(Vec::new()),
            last_range_source: Mutex::new(None),
            batch_enabled: false,
            range_support: true,
            report_content_length: true,
            details: Some(StorageDetails {
                disk_usage: DiskUsage {
                    total_bytes: 1 << 40,
                    free_bytes: 1 << 39,
                },
            }),
        }
    }

    pub fn with_batch_support() -> Self {
        MemoryRemote {
            batch_enabled: true,
            ..MemoryRemote::new()
        }
    }

    pub fn without_range_support() -> Self {
        MemoryRemote {
            range_support: false,
            ..MemoryRemote::new()
        }
    }

    /// Like some backends, hands out links that do not carry a length.
    pub fn without_reported_length() -> Self {
        MemoryRemote {
            report_content_length: false,
            ..MemoryRemote::new()
        }
    }

    pub fn add_folder(&self, path: &str) {
        self.nodes.lock().unwrap().insert(
            clean_path(path),
            Node {
                is_folder: true,
                content: Bytes::new(),
            },
        );
    }

    pub fn add_file(&self, path: &str, content: Bytes) {
        self.nodes.lock().unwrap().insert(
            clean_path(path),
            Node {
                is_folder: false,
                content,
            },
        );
    }

    pub fn contains(&self, path: &str) -> bool {
        self.nodes.lock().unwrap().contains_key(&clean_path(path))
    }

    pub fn paths(&self) -> Vec<String> {
        self.nodes.lock().unwrap().keys().cloned().collect()
    }

    fn object_for(path: &str, node: &Node) -> Object {
        let (_, leaf) = split_dir_file(path);
        Object {
            path: path.to_string(),
            name: leaf.to_string(),
            size: node.content.len() as u64,
            is_folder: node.is_folder,
            modified: fixed_time(),
            ctime: fixed_time(),
            thumbnail: None,
        }
    }

    fn parent_of(path: &str) -> String {
        let (dir, _) = split_dir_file(path);
        clean_path(dir)
    }

    fn rekey_subtree(&self, src: &str, dst: &str) -> Result<()> {
        let src = clean_path(src);
        let dst = clean_path(dst);
        let mut nodes = self.nodes.lock().unwrap();
        if !nodes.contains_key(&src) {
            return Err(Error::NotFound(src));
        }
        let prefix = format!("{}/", src);
        let keys: Vec<String> = nodes
            .keys()
            .filter(|k| **k == src || k.starts_with(&prefix))
            .cloned()
            .collect();
        for key in keys {
            let node = nodes.remove(&key).unwrap();
            let new_key = format!("{}{}", dst, &key[src.len()..]);
            nodes.insert(new_key, node);
        }
        Ok(())
    }
}

#[async_trait]
impl Remote for MemoryRemote {
    async fn list(&self, dir_path: &str) -> Result<Vec<Object>> {
        let dir = clean_path(dir_path);
        let nodes = self.nodes.lock().unwrap();
        Ok(nodes
            .iter()
            .filter(|(path, _)| Self::parent_of(path) == dir && **path != dir)
            .map(|(path, node)| Self::object_for(path, node))
            .collect())
    }

    async fn get(&self, path: &str) -> Result<Object> {
        let path = clean_path(path);
        let nodes = self.nodes.lock().unwrap();
        nodes
            .get(&path)
            .map(|node| Self::object_for(&path, node))
            .ok_or(Error::NotFound(path))
    }

    async fn link(&self, path: &str) -> Result<RemoteLink> {
        let path = clean_path(path);
        let content = {
            let nodes = self.nodes.lock().unwrap();
            let node = nodes.get(&path).ok_or_else(|| Error::NotFound(path.clone()))?;
            node.content.clone()
        };
        let range_source = if self.range_support {
            let source = Arc::new(CountingRangeSource::new(content.clone()));
            *self.last_range_source.lock().unwrap() = Some(source.clone());
            Some(source as Arc<dyn RangeSource>)
        } else {
            None
        };
        let content_length = if self.report_content_length {
            content.len() as u64
        } else {
            0
        };
        Ok(RemoteLink {
            content_length,
            range_source,
        })
    }

    async fn make_dir(&self, path: &str) -> Result<()> {
        self.add_folder(path);
        Ok(())
    }

    async fn move_obj(&self, src_path: &str, dst_dir_path: &str) -> Result<()> {
        let src = clean_path(src_path);
        let (_, leaf) = split_dir_file(&src);
        let dst = join_path(&clean_path(dst_dir_path), leaf);
        self.rekey_subtree(&src, &dst)
    }

    async fn rename(&self, path: &str, new_name: &str) -> Result<()> {
        let src = clean_path(path);
        let dst = join_path(&Self::parent_of(&src), new_name);
        self.rekey_subtree(&src, &dst)
    }

    async fn copy_obj(&self, src_path: &str, dst_dir_path: &str) -> Result<()> {
        let src = clean_path(src_path);
        let (_, leaf) = split_dir_file(&src);
        let dst = join_path(&clean_path(dst_dir_path), leaf);
        let mut nodes = self.nodes.lock().unwrap();
        let prefix = format!("{}/", src);
        let copies: Vec<(String, Node)> = nodes
            .iter()
            .filter(|(k, _)| **k == src || k.starts_with(&prefix))
            .map(|(k, n)| (format!("{}{}", dst, &k[src.len()..]), n.clone()))
            .collect();
        if copies.is_empty() {
            return Err(Error::NotFound(src));
        }
        for (k, n) in copies {
            nodes.insert(k, n);
        }
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let path = clean_path(path);
        let mut nodes = self.nodes.lock().unwrap();
        let prefix = format!("{}/", path);
        let keys: Vec<String> = nodes
            .keys()
            .filter(|k| **k == path || k.starts_with(&prefix))
            .cloned()
            .collect();
        if keys.is_empty() {
            return Err(Error::NotFound(path));
        }
        for key in keys {
            nodes.remove(&key);
        }
        Ok(())
    }

    async fn put(&self, dir_path: &str, upload: UploadRequest) -> Result<()> {
        let content = read_all(upload.reader).await?;
        let path = join_path(&clean_path(dir_path), &upload.name);
        self.add_file(&path, Bytes::from(content.clone()));
        self.uploads.lock().unwrap().push(RecordedUpload {
            dir_path: clean_path(dir_path),
            name: upload.name,
            size: upload.size,
            mimetype: upload.mimetype,
            force_stream_upload: upload.force_stream_upload,
            content,
        });
        Ok(())
    }

    async fn details(&self) -> Result<StorageDetails> {
        self.details.ok_or(Error::NotSupported("details"))
    }

    fn as_batch_move(&self) -> Option<&dyn BatchMove> {
        self.batch_enabled.then_some(self as &dyn BatchMove)
    }

    fn as_batch_copy(&self) -> Option<&dyn BatchCopy> {
        self.batch_enabled.then_some(self as &dyn BatchCopy)
    }

    fn as_batch_remove(&self) -> Option<&dyn BatchRemove> {
        self.batch_enabled.then_some(self as &dyn BatchRemove)
    }

    fn as_batch_rename(&self) -> Option<&dyn BatchRename> {
        self.batch_enabled.then_some(self as &dyn BatchRename)
    }
}

#[async_trait]
impl BatchMove for MemoryRemote {
    async fn batch_move(&self, src_dir: &Object, objs: &[Object], dst_dir: &Object) -> Result<()> {
        self.batch_log
            .lock()
            .unwrap()
            .push(format!("move {} -> {} ({})", src_dir.path, dst_dir.path, objs.len()));
        for obj in objs {
            self.move_obj(&obj.path, &dst_dir.path).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BatchCopy for MemoryRemote {
    async fn batch_copy(&self, src_dir: &Object, objs: &[Object], dst_dir: &Object) -> Result<()> {
        self.batch_log
            .lock()
            .unwrap()
            .push(format!("copy {} -> {} ({})", src_dir.path, dst_dir.path, objs.len()));
        for obj in objs {
            self.copy_obj(&obj.path, &dst_dir.path).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BatchRemove for MemoryRemote {
    async fn batch_remove(&self, dir: &Object, objs: &[Object]) -> Result<()> {
        self.batch_log
            .lock()
            .unwrap()
            .push(format!("remove {} ({})", dir.path, objs.len()));
        for obj in objs {
            self.remove(&obj.path).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BatchRename for MemoryRemote {
    async fn batch_rename(&self, dir: &Object, renames: &[(Object, String)]) -> Result<()> {
        self.batch_log
            .lock()
            .unwrap()
            .push(format!("rename {} ({})", dir.path, renames.len()));
        for (obj, new_name) in renames {
            self.rename(&obj.path, new_name).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_name_round_trip() {
        let cipher = MockCipher::new();
        for name in ["a.txt", "with space.mkv", ".hidden", "ünïcode"] {
            let encrypted = cipher.encrypt_file_name(name);
            assert_ne!(encrypted, name);
            assert_eq!(cipher.decrypt_file_name(&encrypted).unwrap(), name);
        }
        for dir in ["docs", "/a/b/", "a/b.c/d"] {
            let encrypted = cipher.encrypt_dir_name(dir);
            assert_eq!(cipher.decrypt_dir_name(&encrypted).unwrap(), dir);
        }
    }

    #[test]
    fn test_mock_rejects_foreign_names() {
        let cipher = MockCipher::new();
        // Missing suffix, bad encoding.
        assert!(cipher.decrypt_file_name("plain.txt").is_err());
        assert!(cipher.decrypt_file_name("not!base64!.bin").is_err());
        assert!(cipher.decrypt_dir_name("not!base64!").is_err());
    }

    #[tokio::test]
    async fn test_mock_content_round_trip() {
        let cipher = MockCipher::new();
        let plain = b"some plaintext body";
        let encrypted = read_all(
            cipher
                .encrypt_data(memory_stream(Bytes::from_static(plain)))
                .await
                .unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(encrypted.len(), plain.len() + FILE_HEADER_SIZE);
        assert_eq!(encrypted, mock_ciphertext(plain));

        let source = Arc::new(CountingRangeSource::new(Bytes::from(encrypted)));
        let decrypted = read_all(
            cipher
                .decrypt_data_seek(source, 5, 9)
                .await
                .unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(decrypted, &plain[5..14]);
    }
}
