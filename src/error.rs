use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::constants::ERR_INTERNAL;

/// Every failure a handler can produce. The response body is always
/// `{"error": "<message>"}`.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ApiError {
    /// Missing, malformed or expired bearer token, or the token's user is gone.
    #[error("{0}")]
    Unauthenticated(String),
    /// Bad login credentials.
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    /// Holds the underlying cause for the log; callers only see a generic message.
    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message sent to the client.
    pub fn public_message(&self) -> &str {
        match self {
            ApiError::Internal(_) => ERR_INTERNAL,
            ApiError::Unauthenticated(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Conflict(msg)
            | ApiError::Validation(msg)
            | ApiError::NotFound(msg) => msg,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal(context: impl Into<String>) -> Self {
        ApiError::Internal(context.into())
    }
}

impl From<libsql::Error> for ApiError {
    fn from(err: libsql::Error) -> Self {
        ApiError::Internal(format!("database error: {}", err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(cause) = &self {
            tracing::error!("request failed: {}", cause);
        }
        let status = self.status_code();
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// `Json` extractor whose rejections become [`ApiError::Validation`], keeping
/// error bodies in the `{"error": ...}` shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ValidatedJson<T>(pub T);
