//! Error types for stocksim-server
//!
//! Error bodies use the `{"detail": "..."}` shape so existing dashboard
//! clients can display `detail` directly.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Upstream market data missing (503)
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// stocksim-common error
    #[error(transparent)]
    Common(#[from] stocksim_common::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Common(stocksim_common::Error::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Common(stocksim_common::Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Common(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the `detail` field
    fn detail(&self) -> String {
        match self {
            ApiError::Common(stocksim_common::Error::NotFound(msg))
            | ApiError::Common(stocksim_common::Error::InvalidInput(msg)) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "Request failed: {}", self);
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_errors_map_to_client_statuses() {
        let not_found = ApiError::from(stocksim_common::Error::NotFound(
            "Transaction not found".to_string(),
        ));
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.detail(), "Transaction not found");

        let invalid = ApiError::from(stocksim_common::Error::InvalidInput("bad".to_string()));
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

        let io = ApiError::from(stocksim_common::Error::Internal("boom".to_string()));
        assert_eq!(io.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_market_unavailable_is_503() {
        let err = ApiError::ServiceUnavailable("Market data unavailable".to_string());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.detail(), "Market data unavailable");
    }
}
