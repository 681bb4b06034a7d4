use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Operation failures surfaced to callers. Following the frontend contract,
/// every variant renders as HTTP 200 with an error-shaped JSON payload; only
/// the auth middleware speaks in HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ApiError {
    pub fn missing_fields(fields: &[&str]) -> Self {
        ApiError::Validation(format!("missing required fields: {}", fields.join(", ")))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Storage(e) => {
                error!("storage error: {e:#}");
                "internal storage error".to_string()
            }
            other => other.to_string(),
        };

        (
            StatusCode::OK,
            Json(json!({ "status": "error", "message": message })),
        )
            .into_response()
    }
}
