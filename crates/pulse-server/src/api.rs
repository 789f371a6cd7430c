//! Response envelope and error mapping shared by the HTTP handlers.
//!
//! Every response body has the shape `{ok, message, data}` and carries
//! permissive CORS headers, error responses included.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use pulse_history::QueryError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Headers attached to every API response.
pub(crate) const CORS_HEADERS: [(header::HeaderName, &str); 2] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "*"),
];

/// Public message for every 500. Details go to the log only.
const INTERNAL_MESSAGE: &str = "internal server error";

/// The fixed JSON response envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub ok: bool,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            message: "success".to_string(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, CORS_HEADERS, Json(self)).into_response()
    }
}

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The caller sent something invalid. The message is returned as-is.
    #[error("invalid input: {0}")]
    BadRequest(String),

    /// Something failed server-side. The detail is logged, never returned.
    #[error("internal server error: {0}")]
    Internal(String),
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Validation(v) => ApiError::BadRequest(v.to_string()),
            QueryError::Internal(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
        };

        let body = Envelope {
            ok: false,
            message,
            data: json!({}),
        };

        (status, CORS_HEADERS, Json(body)).into_response()
    }
}
