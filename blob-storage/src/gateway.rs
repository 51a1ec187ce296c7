use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::store::{BlobError, BlobStore};

/// The only way the service talks to the object store.
///
/// Store failures stop here: they are logged and turned into `false`, `None` or
/// an empty listing. Callers cannot tell a missing key from a failed read.
#[derive(Clone)]
pub struct Gateway {
    config: GatewayConfig,
    store: Arc<dyn BlobStore>,
}

fn log_failure(op: &'static str, bucket: &str, key: &str, err: &BlobError) {
    if err.is_not_found() {
        tracing::warn!(op, bucket, key, "{}", err);
    } else {
        tracing::error!(op, bucket, key, "{}", err);
    }
}

impl Gateway {
    pub fn new(config: GatewayConfig, store: Arc<dyn BlobStore>) -> Self {
        Self { config, store }
    }

    pub fn bucket(&self) -> &str {
        self.config.bucket()
    }

    /// Makes sure the configured bucket exists, creating it when absent.
    ///
    /// A failed existence check is treated like an absent bucket, so the create
    /// call decides the outcome.
    pub async fn ensure_bucket(&self) -> bool {
        let bucket = self.bucket();
        match self.store.bucket_exists(bucket).await {
            Ok(true) => return true,
            Ok(false) => tracing::info!(bucket, "bucket missing, creating it"),
            Err(err) => log_failure("bucket_exists", bucket, "", &err),
        }
        match self.store.create_bucket(bucket).await {
            Ok(()) => {
                tracing::info!(bucket, "created bucket");
                true
            }
            Err(err) => {
                log_failure("create_bucket", bucket, "", &err);
                false
            }
        }
    }

    pub async fn put(&self, key: &str, data: &[u8]) -> bool {
        match self.store.put_blob(self.bucket(), key, data).await {
            Ok(()) => {
                tracing::debug!(bucket = self.bucket(), key, len = data.len(), "stored blob");
                true
            }
            Err(err) => {
                log_failure("put", self.bucket(), key, &err);
                false
            }
        }
    }

    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        match self.store.get_blob(self.bucket(), key).await {
            Ok(data) => Some(data),
            Err(err) => {
                log_failure("get", self.bucket(), key, &err);
                None
            }
        }
    }

    pub async fn list(&self, prefix: &str) -> Vec<String> {
        match self.store.list_keys(self.bucket(), prefix).await {
            Ok(keys) => keys,
            Err(err) => {
                log_failure("list", self.bucket(), prefix, &err);
                Vec::new()
            }
        }
    }
}
