use actix_multipart::Multipart;
use actix_web::http::header::{
    self, Charset, ContentDisposition, DispositionParam, DispositionType, ExtendedValue,
};
use actix_web::{get, post, web, HttpResponse, HttpResponseBuilder};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::errors::ApiErr;
use crate::services::{AppState, APP_TYPE_JSON};

#[derive(Serialize, Deserialize)]
struct UploadResponse {
    message: String,
    filename: String,
}

/// Reads the first multipart field that carries a filename.
async fn read_file_field(payload: &mut Multipart) -> Result<(String, Vec<u8>), ApiErr> {
    while let Some(mut field) = payload.try_next().await? {
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        let Some(filename) = filename else {
            continue;
        };

        let mut content = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            content.extend_from_slice(&chunk);
        }
        return Ok((filename, content));
    }
    Err(ApiErr::MissingFile)
}

#[post("/storage/upload")]
pub async fn upload_file(
    mut payload: Multipart,
    shared_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiErr> {
    if !shared_state.gateway.ensure_bucket().await {
        return Err(ApiErr::BucketUnavailable);
    }

    let (filename, content) = read_file_field(&mut payload).await?;
    tracing::debug!(filename = filename.as_str(), len = content.len(), "uploading file");
    if !shared_state.gateway.put(&filename, &content).await {
        return Err(ApiErr::UploadFailed);
    }

    let resp = UploadResponse {
        message: "File uploaded successfully".to_string(),
        filename,
    };
    Ok(HttpResponse::Ok().content_type(APP_TYPE_JSON).json(resp))
}

/// Names the download. Keys that cannot go into a header verbatim are sent as an
/// RFC 5987 `filename*` instead.
fn set_attachment(resp: &mut HttpResponseBuilder, file_key: &str) {
    if file_key.chars().any(char::is_control) {
        resp.insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::FilenameExt(ExtendedValue {
                charset: Charset::Ext("UTF-8".to_string()),
                language_tag: None,
                value: file_key.as_bytes().to_vec(),
            })],
        });
    } else {
        resp.insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={file_key}"),
        ));
    }
}

#[get("/storage/download/{file_key:.*}")]
pub async fn download_file(
    file_key: web::Path<String>,
    shared_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiErr> {
    let file_key = file_key.into_inner();
    if !shared_state.gateway.ensure_bucket().await {
        return Err(ApiErr::BucketUnavailable);
    }

    match shared_state.gateway.get(&file_key).await {
        // an empty blob is reported the same way as a missing one
        Some(content) if !content.is_empty() => {
            let mut resp = HttpResponse::Ok();
            resp.content_type("application/octet-stream");
            set_attachment(&mut resp, &file_key);
            Ok(resp.body(content))
        }
        _ => Err(ApiErr::FileNotFound(file_key)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::{header, StatusCode};
    use actix_web::test;
    use blob_store::memory_store::{Faults, InMemoryBlobStore};

    use crate::services::test_support::{self, BUCKET};

    const BOUNDARY: &str = "----aircraftboundary";
    const UNUSED_FEED: &str = "http://127.0.0.1:9/api/states/all";

    fn multipart_body(filename: Option<&str>, content: &str) -> String {
        let disposition = match filename {
            Some(name) => format!("form-data; name=\"file\"; filename=\"{name}\""),
            None => "form-data; name=\"note\"".to_string(),
        };
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\nContent-Type: text/plain\r\n\r\n{content}\r\n--{BOUNDARY}--\r\n"
        )
    }

    fn upload_request(body: String) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/s4/storage/upload")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(body)
    }

    #[actix_web::test]
    async fn test_upload_success() {
        let store = Arc::new(InMemoryBlobStore::new());
        let app = test_app!(test_support::state(store.clone(), UNUSED_FEED));

        let req = upload_request(multipart_body(Some("hello.txt"), "hello world")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "File uploaded successfully");
        assert_eq!(body["filename"], "hello.txt");
        assert_eq!(store.calls().put, 1);
    }

    #[actix_web::test]
    async fn test_upload_bucket_error_skips_write() {
        let store = Arc::new(InMemoryBlobStore::with_faults(Faults {
            create_bucket: true,
            ..Faults::default()
        }));
        let app = test_app!(test_support::state(store.clone(), UNUSED_FEED));

        let req = upload_request(multipart_body(Some("hello.txt"), "hello world")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(test_support::detail(resp).await.contains("Failed to ensure S3 bucket exists"));
        assert_eq!(store.calls().put, 0);
    }

    #[actix_web::test]
    async fn test_upload_put_failure() {
        let store = Arc::new(
            InMemoryBlobStore::with_faults(Faults { put: true, ..Faults::default() })
                .with_bucket(BUCKET),
        );
        let app = test_app!(test_support::state(store, UNUSED_FEED));

        let req = upload_request(multipart_body(Some("hello.txt"), "hello world")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(test_support::detail(resp).await, "Failed to upload file to S3");
    }

    #[actix_web::test]
    async fn test_upload_without_file_field() {
        let store = Arc::new(InMemoryBlobStore::new());
        let app = test_app!(test_support::state(store.clone(), UNUSED_FEED));

        let req = upload_request(multipart_body(None, "just a note")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.calls().put, 0);
    }

    #[actix_web::test]
    async fn test_download_success() {
        let store = Arc::new(InMemoryBlobStore::new().with_blob(
            BUCKET,
            "prepared/aircraft_data.json",
            &b"[1,2,3]"[..],
        ));
        let app = test_app!(test_support::state(store, UNUSED_FEED));

        let req = test::TestRequest::get()
            .uri("/api/s4/storage/download/prepared/aircraft_data.json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=prepared/aircraft_data.json"
        );
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/octet-stream"
        );
        assert_eq!(test::read_body(resp).await, "[1,2,3]");
    }

    #[actix_web::test]
    async fn test_download_missing_key_is_404() {
        let store = Arc::new(InMemoryBlobStore::new().with_bucket(BUCKET));
        let app = test_app!(test_support::state(store, UNUSED_FEED));

        let req = test::TestRequest::get()
            .uri("/api/s4/storage/download/missing.txt")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(test_support::detail(resp).await, "File missing.txt not found");
    }

    #[actix_web::test]
    async fn test_download_empty_blob_is_404() {
        let store = Arc::new(InMemoryBlobStore::new().with_blob(BUCKET, "empty.txt", &b""[..]));
        let app = test_app!(test_support::state(store, UNUSED_FEED));

        let req = test::TestRequest::get()
            .uri("/api/s4/storage/download/empty.txt")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(test_support::detail(resp).await, "File empty.txt not found");
    }

    #[actix_web::test]
    async fn test_download_key_with_control_character() {
        let store = Arc::new(InMemoryBlobStore::new().with_blob(
            BUCKET,
            "bad\u{1}name.txt",
            &b"payload"[..],
        ));
        let app = test_app!(test_support::state(store, UNUSED_FEED));

        let req = test::TestRequest::get()
            .uri("/api/s4/storage/download/bad%01name.txt")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp.headers().get(header::CONTENT_DISPOSITION).unwrap();
        assert_eq!(disposition, "attachment; filename*=UTF-8''bad%01name.txt");
        assert_eq!(test::read_body(resp).await, "payload");
    }

    #[actix_web::test]
    async fn test_download_bucket_error() {
        let store = Arc::new(InMemoryBlobStore::with_faults(Faults {
            create_bucket: true,
            ..Faults::default()
        }));
        let app = test_app!(test_support::state(store.clone(), UNUSED_FEED));

        let req = test::TestRequest::get()
            .uri("/api/s4/storage/download/anything.txt")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.calls().get, 0);
    }

    #[actix_web::test]
    async fn test_upload_then_download_round_trip() {
        let store = Arc::new(InMemoryBlobStore::new());
        let app = test_app!(test_support::state(store, UNUSED_FEED));

        let req = upload_request(multipart_body(Some("notes.txt"), "line one")).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/s4/storage/download/notes.txt")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "line one");
    }
}
