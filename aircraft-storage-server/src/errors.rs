use actix_multipart::MultipartError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use blob_store::aggregate::PrepareError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiErr {
    #[error("Failed to ensure S3 bucket exists")]
    BucketUnavailable,

    #[error("Failed to upload file to S3")]
    UploadFailed,

    #[error("File {0} not found")]
    FileNotFound(String),

    #[error("No file provided")]
    MissingFile,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Failed to fetch data from API")]
    Feed(#[from] reqwest::Error),

    #[error("Failed to upload raw data")]
    RawUploadFailed,

    #[error(transparent)]
    Prepare(#[from] PrepareError),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ResponseError for ApiErr {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiErr::MissingFile | ApiErr::InvalidQuery(_) | ApiErr::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiErr::FileNotFound(_)
            | ApiErr::Prepare(PrepareError::NoSourceData | PrepareError::NoValidData) => {
                StatusCode::NOT_FOUND
            }
            ApiErr::BucketUnavailable
            | ApiErr::UploadFailed
            | ApiErr::Feed(_)
            | ApiErr::RawUploadFailed
            | ApiErr::Prepare(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            match std::error::Error::source(self) {
                Some(cause) => tracing::error!("{}: {}", self, cause),
                None => tracing::error!("{}", self),
            }
        }
        HttpResponse::build(status).json(ErrorBody { detail: self.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_not_found_conditions_map_to_404() {
        for err in [
            ApiErr::FileNotFound("missing.txt".to_string()),
            ApiErr::Prepare(PrepareError::NoSourceData),
            ApiErr::Prepare(PrepareError::NoValidData),
        ] {
            assert_eq!(err.status_code(), StatusCode::NOT_FOUND, "{err}");
        }
        assert_eq!(
            ApiErr::Prepare(PrepareError::WriteFailed).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn test_invalid_query_is_bad_request() {
        let err = ApiErr::InvalidQuery("file_limit out of range".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid query: file_limit out of range");
    }

    #[actix_web::test]
    async fn test_error_body_carries_detail() {
        let resp = ApiErr::BucketUnavailable.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["detail"], "Failed to ensure S3 bucket exists");
    }
}
