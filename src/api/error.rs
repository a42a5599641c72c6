//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.
//!
//! Every failure renders the same body shape:
//! `{"error": <kind>, "message": <human text>, "details"?: <context>}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::query::QueryError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Validation or query-service error
    #[error(transparent)]
    Query(#[from] QueryError),

    /// No route matched the request path
    #[error("Route not found.")]
    RouteNotFound { path: String },

    /// IO error (listener binding)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message, details) = match &self {
            ApiError::Query(QueryError::Store(err)) => {
                tracing::error!(error = %err, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    "Internal Server Error".to_string(),
                    None,
                )
            }
            ApiError::Query(err) => {
                let status = match err {
                    QueryError::NoData { .. } => StatusCode::NOT_FOUND,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, err.kind(), err.to_string(), err.details())
            }
            ApiError::RouteNotFound { path } => (
                StatusCode::NOT_FOUND,
                "NotFound",
                "Route not found.".to_string(),
                Some(json!({ "path": path })),
            ),
            ApiError::Io(_) | ApiError::Internal(_) => {
                tracing::error!(error = %self, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    "Internal Server Error".to_string(),
                    None,
                )
            }
        };

        let request_id = uuid::Uuid::new_v4().to_string();
        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_kind = kind,
                "API error occurred"
            );
        } else {
            // client-input errors (including NoData) are routine
            tracing::debug!(
                request_id = %request_id,
                error_kind = kind,
                message = %message,
                "request rejected"
            );
        }

        let body = ErrorResponse {
            error: kind.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
