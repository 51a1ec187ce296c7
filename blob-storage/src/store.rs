use std::error::Error as StdError;

use async_trait::async_trait;
use thiserror::Error;

pub type BlobResult<T> = Result<T, BlobError>;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob {key} not found")]
    NotFound { key: String },

    #[error("bucket {bucket} not found")]
    BucketNotFound { bucket: String },

    #[error("invalid blob key {key:?}")]
    InvalidKey { key: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object store error: {0}")]
    Backend(#[from] Box<dyn StdError + Send + Sync>),
}

impl BlobError {
    pub fn backend<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        BlobError::Backend(Box::new(err))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BlobError::NotFound { .. } | BlobError::BucketNotFound { .. })
    }
}

/// Storage for opaque blobs addressed by bucket and key.
///
/// Implementations report failures as typed errors; callers that want the
/// sentinel-style contract go through [`crate::gateway::Gateway`].
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns `Ok(false)` only when the store reports the bucket as absent.
    async fn bucket_exists(&self, bucket: &str) -> BlobResult<bool>;

    async fn create_bucket(&self, bucket: &str) -> BlobResult<()>;

    /// Writes a blob, replacing whatever was stored under the key.
    async fn put_blob(&self, bucket: &str, key: &str, data: &[u8]) -> BlobResult<()>;

    async fn get_blob(&self, bucket: &str, key: &str) -> BlobResult<Vec<u8>>;

    /// Keys sharing `prefix`, in lexicographic order. One listing call, no paging.
    async fn list_keys(&self, bucket: &str, prefix: &str) -> BlobResult<Vec<String>>;
}
