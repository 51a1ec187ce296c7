use actix_web::{get, web, HttpResponse, Responder};
use blob_store::Gateway;
use serde::{Deserialize, Serialize};

use crate::errors::ApiErr;
use crate::feed_client::FeedClient;

#[cfg(test)]
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state)
                .service($crate::services::health)
                .service(actix_web::web::scope("/api/s4").configure($crate::services::configure)),
        )
        .await
    };
}

pub mod aircraft_service;
pub mod storage_service;

pub const APP_TYPE_JSON: &str = "application/json";

pub struct AppState {
    pub(crate) gateway: Gateway,
    pub(crate) feed: FeedClient,
}

#[derive(Serialize, Deserialize)]
struct Health {}

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok()
        .content_type(APP_TYPE_JSON)
        .json(Health {})
}

/// Routes served under `/api/s4`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let query_config = web::QueryConfig::default()
        .error_handler(|err, _req| ApiErr::InvalidQuery(err.to_string()).into());

    cfg.app_data(query_config)
        .service(storage_service::upload_file)
        .service(storage_service::download_file)
        .service(aircraft_service::download_aircraft_data)
        .service(aircraft_service::prepare_aircraft_data);
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use actix_web::dev::ServiceResponse;
    use actix_web::{test, web};
    use blob_store::memory_store::InMemoryBlobStore;
    use blob_store::{Gateway, GatewayConfig};
    use url::Url;

    use super::*;

    pub const BUCKET: &str = "bdi-aircraft-test";

    pub fn state(store: Arc<InMemoryBlobStore>, feed_url: &str) -> web::Data<AppState> {
        web::Data::new(AppState {
            gateway: Gateway::new(GatewayConfig::new(BUCKET).unwrap(), store),
            feed: FeedClient::new(Url::parse(feed_url).unwrap()),
        })
    }

    pub async fn detail(resp: ServiceResponse) -> String {
        let body: serde_json::Value = test::read_body_json(resp).await;
        body["detail"].as_str().unwrap_or_default().to_string()
    }
}
