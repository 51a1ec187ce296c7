//! Object-store access for the aircraft storage service.
//!
//! [`gateway::Gateway`] is the sentinel-returning façade the HTTP layer uses;
//! [`store::BlobStore`] is the typed seam its backends implement.
//! [`aggregate`] merges stored raw feed snapshots into one prepared document.

pub mod aggregate;
pub mod config;
pub mod gateway;
pub mod local_store;
pub mod memory_store;
pub mod s3_store;
pub mod store;

pub use config::{ConfigError, GatewayConfig};
pub use gateway::Gateway;
pub use store::{BlobError, BlobResult, BlobStore};
