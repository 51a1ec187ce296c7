use actix_web::{post, web, HttpResponse};
use blob_store::aggregate::{self, raw_key};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::ApiErr;
use crate::services::{AppState, APP_TYPE_JSON};

const DEFAULT_FILE_LIMIT: u32 = 100;

fn default_file_limit() -> u32 {
    DEFAULT_FILE_LIMIT
}

#[derive(Serialize, Deserialize, Validate)]
struct DownloadQuery {
    #[serde(default = "default_file_limit")]
    #[validate(range(min = 1, max = 10000))]
    file_limit: u32,
}

fn ok() -> HttpResponse {
    HttpResponse::Ok().content_type(APP_TYPE_JSON).json("OK")
}

/// Stores one snapshot of the aircraft feed under `raw/`.
#[post("/aircraft/download")]
pub async fn download_aircraft_data(
    query: web::Query<DownloadQuery>,
    shared_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiErr> {
    if let Err(validation_err) = query.validate() {
        return Err(ApiErr::InvalidQuery(validation_err.to_string()));
    }
    if !shared_state.gateway.ensure_bucket().await {
        return Err(ApiErr::BucketUnavailable);
    }

    tracing::info!(feed = %shared_state.feed.feed_url(), "fetching aircraft feed");
    let snapshot = shared_state.feed.fetch().await?;

    let key = raw_key(query.file_limit);
    if !shared_state.gateway.put(&key, snapshot.to_string().as_bytes()).await {
        return Err(ApiErr::RawUploadFailed);
    }
    tracing::info!(key = key.as_str(), "stored aircraft feed snapshot");
    Ok(ok())
}

/// Merges every raw snapshot into `prepared/aircraft_data.json`.
#[post("/aircraft/prepare")]
pub async fn prepare_aircraft_data(
    shared_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiErr> {
    if !shared_state.gateway.ensure_bucket().await {
        return Err(ApiErr::BucketUnavailable);
    }

    let summary = aggregate::prepare(&shared_state.gateway).await?;
    tracing::info!(
        sources = summary.sources,
        records = summary.records,
        "prepared aircraft data"
    );
    Ok(ok())
}
