//! Registry error types and their HTTP mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use contracts::{
    ErrorResponse, ERR_BUS_NOT_FOUND, ERR_INTERNAL, ERR_INVALID_COORDINATES,
    ERR_INVALID_LINE_CODE, ERR_LINE_NOT_FOUND, ERR_MISSING_DATA,
};

/// Registry-specific errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Client sent a missing, null, malformed or out-of-range field (400)
    #[error("validation failed: {detail}")]
    Validation {
        /// Public error text returned to the client
        reason: &'static str,
        /// Offending field, when one can be named
        field: Option<String>,
        /// Diagnostic detail (logged, not returned)
        detail: String,
    },

    /// No record for this bus number (404)
    #[error("bus '{bus_number}' not found")]
    NotFound { bus_number: String },

    /// No line geometry with this code (404)
    #[error("line {code} not found")]
    LineNotFound { code: i64 },

    /// Unexpected server-side fault, including a panicking handler (500)
    #[error("internal error: {0}")]
    Internal(String),
}

impl RegistryError {
    /// Required field absent or null
    pub fn missing(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::Validation {
            reason: ERR_MISSING_DATA,
            detail: format!("missing field '{field}'"),
            field: Some(field),
        }
    }

    /// Coordinate non-finite or out of range
    pub fn invalid_coordinate(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Validation {
            reason: ERR_INVALID_COORDINATES,
            field: Some(field.into()),
            detail: detail.into(),
        }
    }

    /// Body could not be decoded (bad JSON, wrong content type, wrong field type)
    pub fn malformed_body(reason: &'static str, detail: impl Into<String>) -> Self {
        Self::Validation {
            reason,
            field: None,
            detail: detail.into(),
        }
    }

    /// Line code is not an integer
    pub fn invalid_line_code(code: &str) -> Self {
        Self::Validation {
            reason: ERR_INVALID_LINE_CODE,
            field: None,
            detail: format!("line code must be an integer, got '{code}'"),
        }
    }

    pub fn not_found(bus_number: impl Into<String>) -> Self {
        Self::NotFound {
            bus_number: bus_number.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } | Self::LineNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            Self::Validation {
                reason,
                field: Some(field),
                ..
            } => ErrorResponse::with_field(*reason, field.clone()),
            Self::Validation { reason, .. } => ErrorResponse::new(*reason),
            Self::NotFound { .. } => ErrorResponse::new(ERR_BUS_NOT_FOUND),
            Self::LineNotFound { .. } => ErrorResponse::new(ERR_LINE_NOT_FOUND),
            // never leak internal detail
            Self::Internal(_) => ErrorResponse::new(ERR_INTERNAL),
        }
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        if let Self::Internal(ref message) = self {
            error!(error = %message, "Registry request failed");
        }
        (self.status(), Json(self.body())).into_response()
    }
}
