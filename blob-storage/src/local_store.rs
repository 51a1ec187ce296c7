use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use tokio::fs;

use crate::store::{BlobError, BlobResult, BlobStore};

/// Bytes escaped when a key becomes a file name.
const KEY_ENCODE_SET: &AsciiSet = &CONTROLS.add(b'%').add(b'/').add(b'\\');

/// A `BlobStore` that keeps each bucket as a directory under `base_path`.
///
/// Every blob is one flat file named after its escaped key, so `raw` and `raw/a.json`
/// can live side by side: they land in `<base_path>/<bucket>/raw` and
/// `<base_path>/<bucket>/raw%2Fa.json`.
#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    base_path: PathBuf,
}

impl LocalBlobStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    fn bucket_dir(&self, bucket: &str) -> BlobResult<PathBuf> {
        if !is_plain_segment(bucket) {
            return Err(BlobError::InvalidKey { key: bucket.to_string() });
        }
        Ok(self.base_path.join(bucket))
    }

    fn blob_path(&self, bucket: &str, key: &str) -> BlobResult<PathBuf> {
        let dir = self.bucket_dir(bucket)?;
        if key.is_empty() || !key.split('/').all(is_plain_segment) {
            return Err(BlobError::InvalidKey { key: key.to_string() });
        }
        Ok(dir.join(utf8_percent_encode(key, KEY_ENCODE_SET).to_string()))
    }

    async fn require_bucket(&self, bucket: &str) -> BlobResult<PathBuf> {
        let dir = self.bucket_dir(bucket)?;
        if fs::metadata(&dir).await.map(|m| m.is_dir()).unwrap_or(false) {
            Ok(dir)
        } else {
            Err(BlobError::BucketNotFound { bucket: bucket.to_string() })
        }
    }
}

fn is_plain_segment(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !segment.contains('\\')
}

/// Turns a blob file name back into its key.
fn key_for(file_name: &OsStr) -> Option<String> {
    let decoded = percent_decode_str(file_name.to_str()?).decode_utf8().ok()?;
    Some(decoded.into_owned())
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn bucket_exists(&self, bucket: &str) -> BlobResult<bool> {
        let dir = self.bucket_dir(bucket)?;
        match fs::metadata(&dir).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_bucket(&self, bucket: &str) -> BlobResult<()> {
        let dir = self.bucket_dir(bucket)?;
        fs::create_dir_all(dir).await?;
        Ok(())
    }

    async fn put_blob(&self, bucket: &str, key: &str, data: &[u8]) -> BlobResult<()> {
        self.require_bucket(bucket).await?;
        let path = self.blob_path(bucket, key)?;
        fs::write(path, data).await?;
        Ok(())
    }

    async fn get_blob(&self, bucket: &str, key: &str) -> BlobResult<Vec<u8>> {
        self.require_bucket(bucket).await?;
        let path = self.blob_path(bucket, key)?;
        match fs::read(path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BlobError::NotFound { key: key.to_string() })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_keys(&self, bucket: &str, prefix: &str) -> BlobResult<Vec<String>> {
        let root = self.require_bucket(bucket).await?;
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            match key_for(&entry.file_name()) {
                Some(key) if key.starts_with(prefix) => keys.push(key),
                _ => {}
            }
        }
        keys.sort();
        Ok(keys)
    }
}
