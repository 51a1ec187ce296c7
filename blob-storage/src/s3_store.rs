use std::error::Error as StdError;
use std::fmt::Debug;

use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client as S3Client;

use crate::store::{BlobError, BlobResult, BlobStore};

const DEFAULT_REGION: &str = "us-east-1";

/// Creates an S3 client from the default AWS provider chain.
///
/// With `endpoint` set the client talks to an S3-compatible server such as MinIO,
/// which needs path-style addressing.
pub async fn create_s3_client(endpoint: Option<&str>) -> S3Client {
    let region_provider = RegionProviderChain::default_provider().or_else(DEFAULT_REGION);
    let base_config = aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await;

    let mut builder = Builder::from(&base_config);
    if let Some(endpoint) = endpoint {
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }
    S3Client::from_conf(builder.build())
}

fn sdk_error<E, R>(op: &str, err: SdkError<E, R>) -> BlobError
where
    E: StdError + Send + Sync + 'static,
    R: Debug + Send + Sync + 'static,
{
    BlobError::Backend(format!("{op}: {}", DisplayErrorContext(&err)).into())
}

/// A `BlobStore` backed by one long-lived S3 client.
#[derive(Clone, Debug)]
pub struct S3BlobStore {
    s3_client: S3Client,
}

impl S3BlobStore {
    pub fn new(s3_client: S3Client) -> Self {
        Self { s3_client }
    }

    fn location_constraint(&self) -> Option<CreateBucketConfiguration> {
        let region = self.s3_client.config().region()?.as_ref().to_string();
        if region == DEFAULT_REGION {
            // us-east-1 rejects an explicit constraint
            return None;
        }
        Some(
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region.as_str()))
                .build(),
        )
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn bucket_exists(&self, bucket: &str) -> BlobResult<bool> {
        match self.s3_client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => match err.as_service_error() {
                Some(service_err) if service_err.is_not_found() => Ok(false),
                _ => Err(sdk_error("head_bucket", err)),
            },
        }
    }

    async fn create_bucket(&self, bucket: &str) -> BlobResult<()> {
        let result = self
            .s3_client
            .create_bucket()
            .bucket(bucket)
            .set_create_bucket_configuration(self.location_constraint())
            .send()
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(err) => match err.as_service_error() {
                Some(service_err) if service_err.is_bucket_already_owned_by_you() => Ok(()),
                _ => Err(sdk_error("create_bucket", err)),
            },
        }
    }

    async fn put_blob(&self, bucket: &str, key: &str, data: &[u8]) -> BlobResult<()> {
        self.s3_client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|err| sdk_error("put_object", err))?;
        Ok(())
    }

    async fn get_blob(&self, bucket: &str, key: &str) -> BlobResult<Vec<u8>> {
        let resp = match self.s3_client.get_object().bucket(bucket).key(key).send().await {
            Ok(resp) => resp,
            Err(err) => {
                return match err.as_service_error() {
                    Some(service_err) if service_err.is_no_such_key() => {
                        Err(BlobError::NotFound { key: key.to_string() })
                    }
                    _ => Err(sdk_error("get_object", err)),
                }
            }
        };
        let data = resp.body.collect().await.map_err(BlobError::backend)?;
        Ok(data.into_bytes().to_vec())
    }

    async fn list_keys(&self, bucket: &str, prefix: &str) -> BlobResult<Vec<String>> {
        let resp = match self
            .s3_client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                return match err.as_service_error() {
                    Some(service_err) if service_err.is_no_such_bucket() => {
                        Err(BlobError::BucketNotFound { bucket: bucket.to_string() })
                    }
                    _ => Err(sdk_error("list_objects_v2", err)),
                }
            }
        };
        Ok(resp
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect())
    }
}
