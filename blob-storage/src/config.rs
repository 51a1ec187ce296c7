use thiserror::Error;

/// Every bucket this service touches must carry this prefix.
pub const BUCKET_PREFIX: &str = "bdi-aircraft";

/// Environment variable that names the target bucket.
pub const BUCKET_ENV_VAR: &str = "BDI_S3_BUCKET";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("BDI_S3_BUCKET environment variable must be set")]
    Missing,

    #[error("S3 bucket name must start with 'bdi-aircraft', got {bucket:?}")]
    BadPrefix { bucket: String },

    #[error("{bucket:?} is not a valid S3 bucket name: {reason}")]
    InvalidName { bucket: String, reason: &'static str },
}

/// Validated settings for a [`crate::gateway::Gateway`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayConfig {
    bucket: String,
}

impl GatewayConfig {
    pub fn new(bucket: impl Into<String>) -> Result<Self, ConfigError> {
        let bucket = bucket.into();
        if bucket.is_empty() {
            return Err(ConfigError::Missing);
        }
        if !bucket.starts_with(BUCKET_PREFIX) {
            return Err(ConfigError::BadPrefix { bucket });
        }
        if let Some(reason) = naming_violation(&bucket) {
            return Err(ConfigError::InvalidName { bucket, reason });
        }
        Ok(Self { bucket })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn naming_violation(bucket: &str) -> Option<&'static str> {
    if bucket.len() > 63 {
        return Some("longer than 63 characters");
    }
    if !bucket
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
    {
        return Some("only lowercase letters, digits, '-' and '.' are allowed");
    }
    if bucket.ends_with('-') || bucket.ends_with('.') {
        return Some("must end with a letter or digit");
    }
    if bucket.contains("..") {
        return Some("must not contain consecutive periods");
    }
    None
}
