mod errors;
mod feed_client;
mod params;
mod services;

use std::io;
use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};
use blob_store::local_store::LocalBlobStore;
use blob_store::memory_store::InMemoryBlobStore;
use blob_store::s3_store::{create_s3_client, S3BlobStore};
use blob_store::{BlobStore, Gateway, GatewayConfig};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::feed_client::FeedClient;
use crate::params::{Args, Backend};
use crate::services::AppState;

async fn build_store(args: &Args) -> Arc<dyn BlobStore> {
    match args.backend {
        Backend::S3 => {
            let client = create_s3_client(args.s3_endpoint.as_deref()).await;
            Arc::new(S3BlobStore::new(client))
        }
        Backend::Local => Arc::new(LocalBlobStore::new(args.data_dir.clone())),
        Backend::Memory => Arc::new(InMemoryBlobStore::new()),
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Bucket problems are fatal here so that no request ever sees them.
    let config = match GatewayConfig::new(args.bucket.clone()) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("refusing to start: {}", err);
            return Err(io::Error::new(io::ErrorKind::InvalidInput, err));
        }
    };

    let gateway = Gateway::new(config, build_store(&args).await);
    tracing::info!(
        bucket = gateway.bucket(),
        backend = ?args.backend,
        feed = %args.feed_url,
        "serving on {}",
        args.http_addr
    );

    let state = web::Data::new(AppState {
        gateway,
        feed: FeedClient::new(args.feed_url.clone()),
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .service(services::health)
            .service(web::scope("/api/s4").configure(services::configure))
    })
    .bind(args.http_addr.clone())?
    .run()
    .await
}
