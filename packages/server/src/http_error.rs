//! HTTP error handling
//!
//! Provides consistent `{ message, code, details? }` error bodies and maps
//! hierarchy errors onto them.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use orgchart_core::services::{ErrorKind, HierarchyError};
use serde::{Deserialize, Serialize};

/// HTTP error response body
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// Optional detailed error information for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    /// Create a new HTTP error
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Create a new HTTP error with details
    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(message, "INVALID_INPUT")
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "INVALID_INPUT" => StatusCode::BAD_REQUEST,
            "NODE_NOT_FOUND" => StatusCode::NOT_FOUND,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<HierarchyError> for HttpError {
    fn from(err: HierarchyError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::InvalidRequest => HttpError::new(message, "INVALID_INPUT"),
            ErrorKind::NotFound => HttpError::new(message, "NODE_NOT_FOUND"),
            ErrorKind::Conflict => HttpError::new(message, "CONFLICT"),
            ErrorKind::InternalInconsistency => {
                tracing::error!("Hierarchy data is inconsistent: {}", message);
                HttpError::new(message, "INTERNAL_INCONSISTENCY")
            }
            ErrorKind::Storage => {
                tracing::error!("Storage failure: {:?}", err);
                HttpError::with_details("Storage operation failed", "DATABASE_ERROR", message)
            }
        }
    }
}
