use axum::extract::rejection::{BytesRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::errors::ServiceError;
use tracing::{error, warn};

/// Error response rendered as `{"error": <title>, "message": <detail>}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub error: &'static str,
    pub message: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, error: &'static str, message: Option<String>) -> Self {
        Self { status, error, message }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Bad Request", Some(message.into()))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", Some(message.into()))
    }

    /// Keep axum's status for an extractor rejection but render it as JSON.
    fn from_rejection(status: StatusCode, message: String) -> Self {
        Self::new(status, status.canonical_reason().unwrap_or("Bad Request"), Some(message))
    }
}

impl From<BytesRejection> for JsonApiError {
    fn from(r: BytesRejection) -> Self { Self::from_rejection(r.status(), r.body_text()) }
}

impl From<PathRejection> for JsonApiError {
    fn from(r: PathRejection) -> Self { Self::from_rejection(r.status(), r.body_text()) }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(msg) => Self::bad_request(msg),
            ServiceError::Store(_) | ServiceError::Timeout(_) => Self::internal(e.to_string()),
        }
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let msg = self.message.as_deref().unwrap_or_default();
        if self.status.is_server_error() {
            error!(status = %self.status, error = %msg, "request failed");
        } else {
            warn!(status = %self.status, error = %msg, "request rejected");
        }
        let body = serde_json::json!({"error": self.error, "message": self.message});
        (self.status, Json(body)).into_response()
    }
}
