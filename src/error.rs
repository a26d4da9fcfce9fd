//! Error types for mustwatch-server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced to HTTP callers, tagged with their status code.
///
/// Every catalog operation is a single linear sequence; all of these are
/// terminal for the current request and none are retried.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Table outside the allow-list, or an id-scoped operation on a table
    /// with no recognized primary-key column.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Missing or unusable payload for insert/update.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Query matched no rows.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any database failure; the original message is preserved as detail.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status code this error renders as.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            ApiError::Forbidden(msg)
            | ApiError::BadRequest(msg)
            | ApiError::NotFound(msg) => msg.clone(),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                msg.clone()
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
