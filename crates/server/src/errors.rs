use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use models::errors::ModelError;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::error;

/// Error body shared by every handler: `{"error": title, "detail": message}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: &'static str,
    pub detail: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &'static str, detail: Option<String>) -> Self {
        Self { status, title, detail }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(detail.into()))
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        let detail = Some(e.detail());
        match e {
            ServiceError::Validation(_) | ServiceError::Model(ModelError::Validation(_)) => {
                Self::new(StatusCode::BAD_REQUEST, "Validation Error", detail)
            }
            ServiceError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Not Found", detail),
            ServiceError::Db(_) => {
                error!(err = %e, "database error");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Database Error", detail)
            }
            ServiceError::Ingest(_) => {
                error!(err = %e, "ingest error");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", detail)
            }
        }
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.title, "detail": self.detail });
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unreachable: {0}")]
    Database(String),
    #[error("initial ingest failed: {0}")]
    Ingest(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
