//! Error type returned by HTTP handlers.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use maplead_scraper::ControllerError;
use serde::Serialize;

/// JSON error body: `{ "error": { "code", "message" } }`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Error payload
    pub error: ErrorBody,
}

/// Machine-readable code plus a human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Error code for client handling (e.g. `"conflict"`)
    pub code: String,
    /// User-facing message
    pub message: String,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    /// HTTP status for this error's code.
    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ControllerError> for ApiError {
    fn from(err: ControllerError) -> Self {
        match err {
            ControllerError::AlreadyRunning => Self::new("conflict", "Scraping already in progress"),
            ControllerError::InvalidParameters(msg) => Self::new("validation_error", msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new("validation_error", rejection.body_text())
    }
}
