//! Error handling for the API gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error information
    pub error: ErrorInfo,
    /// Request ID for tracing
    pub request_id: String,
}

/// Detailed error information
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    /// String identifier for the error type
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Common(#[from] common::error::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        tracing::error!("API error [{}]: {:?}", request_id, &self);

        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Common(e) => match e {
                common::error::Error::FeedUnavailable => {
                    (StatusCode::SERVICE_UNAVAILABLE, "feed_unavailable")
                }
                common::error::Error::FeedAuth(_) => (StatusCode::BAD_GATEWAY, "feed_auth"),
                common::error::Error::SymbolUnsupported(_) => {
                    (StatusCode::NOT_FOUND, "symbol_unsupported")
                }
                common::error::Error::Transport(_) => (StatusCode::BAD_GATEWAY, "transport_error"),
                common::error::Error::Configuration(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error")
                }
                common::error::Error::Serialization(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error")
                }
                common::error::Error::Internal(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
                }
            },
        };

        let body = ErrorResponse {
            error: ErrorInfo {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}
