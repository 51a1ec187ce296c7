use std::path::PathBuf;

use blob_store::config::BUCKET_ENV_VAR;
use clap::{Parser, ValueEnum};
use url::Url;

pub const DEFAULT_FEED_URL: &str = "https://opensky-network.org/api/states/all";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// AWS S3 or any S3-compatible server
    S3,
    /// A directory per bucket under `--data-dir`
    Local,
    /// Process memory, gone on restart
    Memory,
}

/// Stores aircraft feed snapshots and uploaded files in an object store bucket.
#[derive(Parser, Debug)]
#[clap(version, about)]
pub struct Args {
    /// Target bucket; must start with `bdi-aircraft`
    #[clap(long, env = BUCKET_ENV_VAR)]
    pub(crate) bucket: String,
    #[clap(long, env = "BDI_HTTP_ADDR", default_value = "127.0.0.1:8080")]
    pub(crate) http_addr: String,
    #[clap(long, value_enum, default_value_t = Backend::S3)]
    pub(crate) backend: Backend,
    #[clap(long, default_value = "data")]
    pub(crate) data_dir: PathBuf,
    /// Endpoint override for S3-compatible servers such as MinIO
    #[clap(long, env = "BDI_S3_ENDPOINT")]
    pub(crate) s3_endpoint: Option<String>,
    #[clap(long, env = "BDI_FEED_URL", default_value = DEFAULT_FEED_URL)]
    pub(crate) feed_url: Url,
}
