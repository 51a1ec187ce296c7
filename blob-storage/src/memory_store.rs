use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::{BlobError, BlobResult, BlobStore};

/// Operations that an [`InMemoryBlobStore`] can be told to fail.
#[derive(Clone, Copy, Debug, Default)]
pub struct Faults {
    pub bucket_exists: bool,
    pub create_bucket: bool,
    pub put: bool,
    pub get: bool,
    pub list: bool,
}

#[derive(Debug, Default)]
struct Calls {
    bucket_exists: AtomicUsize,
    create_bucket: AtomicUsize,
    put: AtomicUsize,
    get: AtomicUsize,
    list: AtomicUsize,
}

/// Call counts observed by an [`InMemoryBlobStore`], failed calls included.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub bucket_exists: usize,
    pub create_bucket: usize,
    pub put: usize,
    pub get: usize,
    pub list: usize,
}

/// A process-local `BlobStore`. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    buckets: RwLock<HashMap<String, BTreeMap<String, Vec<u8>>>>,
    faults: Faults,
    calls: Calls,
}

fn injected(op: &str) -> BlobError {
    BlobError::Io(io::Error::new(io::ErrorKind::Other, format!("injected {op} failure")))
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_faults(faults: Faults) -> Self {
        Self { faults, ..Self::default() }
    }

    /// Creates `bucket` up front, as if a previous run had already done so.
    pub fn with_bucket(mut self, bucket: &str) -> Self {
        self.buckets.get_mut().entry(bucket.to_string()).or_default();
        self
    }

    /// Stores a blob up front, creating its bucket if needed. Not counted as a put.
    pub fn with_blob(mut self, bucket: &str, key: &str, data: impl Into<Vec<u8>>) -> Self {
        self.buckets
            .get_mut()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), data.into());
        self
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            bucket_exists: self.calls.bucket_exists.load(Ordering::SeqCst),
            create_bucket: self.calls.create_bucket.load(Ordering::SeqCst),
            put: self.calls.put.load(Ordering::SeqCst),
            get: self.calls.get.load(Ordering::SeqCst),
            list: self.calls.list.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn bucket_exists(&self, bucket: &str) -> BlobResult<bool> {
        self.calls.bucket_exists.fetch_add(1, Ordering::SeqCst);
        if self.faults.bucket_exists {
            return Err(injected("bucket_exists"));
        }
        Ok(self.buckets.read().await.contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> BlobResult<()> {
        self.calls.create_bucket.fetch_add(1, Ordering::SeqCst);
        if self.faults.create_bucket {
            return Err(injected("create_bucket"));
        }
        self.buckets.write().await.entry(bucket.to_string()).or_default();
        Ok(())
    }

    async fn put_blob(&self, bucket: &str, key: &str, data: &[u8]) -> BlobResult<()> {
        self.calls.put.fetch_add(1, Ordering::SeqCst);
        if self.faults.put {
            return Err(injected("put"));
        }
        let mut buckets = self.buckets.write().await;
        let blobs = buckets
            .get_mut(bucket)
            .ok_or_else(|| BlobError::BucketNotFound { bucket: bucket.to_string() })?;
        blobs.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn get_blob(&self, bucket: &str, key: &str) -> BlobResult<Vec<u8>> {
        self.calls.get.fetch_add(1, Ordering::SeqCst);
        if self.faults.get {
            return Err(injected("get"));
        }
        let buckets = self.buckets.read().await;
        let blobs = buckets
            .get(bucket)
            .ok_or_else(|| BlobError::BucketNotFound { bucket: bucket.to_string() })?;
        blobs
            .get(key)
            .cloned()
            .ok_or_else(|| BlobError::NotFound { key: key.to_string() })
    }

    async fn list_keys(&self, bucket: &str, prefix: &str) -> BlobResult<Vec<String>> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        if self.faults.list {
            return Err(injected("list"));
        }
        let buckets = self.buckets.read().await;
        let blobs = buckets
            .get(bucket)
            .ok_or_else(|| BlobError::BucketNotFound { bucket: bucket.to_string() })?;
        Ok(blobs
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}
