//! Error types for the storefront cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::{ErrorCode, StoreError};

// == Gateway Error Enum ==
/// Unified error type for document access and the HTTP API.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Document or route target not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Local rate limit exceeded and no cached data to fall back on
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Store error that retrying cannot fix
    #[error("Store rejected {operation}: {source}")]
    Fatal {
        operation: String,
        #[source]
        source: StoreError,
    },

    /// Every attempt failed
    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        #[source]
        source: StoreError,
    },
}

impl GatewayError {
    /// Store error code behind this error, if it came from the store.
    pub fn store_code(&self) -> Option<ErrorCode> {
        match self {
            GatewayError::Fatal { source, .. } | GatewayError::RetriesExhausted { source, .. } => {
                Some(source.code)
            }
            _ => None,
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Fatal { source, .. } => match source.code {
                ErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
                ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
                ErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
                ErrorCode::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            GatewayError::RetriesExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

// == Body Rejections ==
/// Malformed or mistyped JSON bodies are invalid requests.
impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        GatewayError::InvalidRequest(rejection.body_text())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));

        (self.status(), body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the storefront cache.
pub type Result<T> = std::result::Result<T, GatewayError>;
