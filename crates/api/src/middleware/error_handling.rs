//! # Error Handling Middleware
//!
//! Maps engine errors to HTTP status codes and a consistent JSON error
//! body. Every failure response carries a human-readable `error` message
//! and a stable machine-readable `code` that clients can branch on
//! (retry on `slot_conflict`, refetch on `stale_booking`, and so on).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mentorbook_core::errors::EngineError;
use serde_json::json;

/// Application error wrapper that provides HTTP status code mapping.
///
/// `AppError` wraps domain-specific `EngineError` instances and implements
/// `IntoResponse` to convert them into HTTP responses with appropriate
/// status codes and JSON payloads.
#[derive(Debug)]
pub struct AppError(pub EngineError);

impl AppError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Validation { .. } => StatusCode::BAD_REQUEST,
            EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
            EngineError::SlotUnavailable(_)
            | EngineError::SlotConflict(_)
            | EngineError::ProfileInactive
            | EngineError::StaleBooking { .. }
            | EngineError::InvalidTransition(_) => StatusCode::CONFLICT,
            EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match &self.0 {
            EngineError::NotFound(_) => "not_found",
            EngineError::Validation { .. } => "validation",
            EngineError::Forbidden(_) => "forbidden",
            EngineError::SlotUnavailable(_) => "slot_unavailable",
            EngineError::SlotConflict(_) => "slot_conflict",
            EngineError::ProfileInactive => "profile_inactive",
            EngineError::StaleBooking { .. } => "stale_booking",
            EngineError::InvalidTransition(_) => "invalid_transition",
            EngineError::Database(_) => "internal",
        }
    }
}

/// Converts application errors to HTTP responses.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal error: {}", self.0);
        }

        let body = Json(json!({
            "error": self.0.to_string(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

/// Allows using `?` with functions that return `Result<T, EngineError>`
/// in handlers that return `Result<T, AppError>`.
impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError(err)
    }
}

/// Allows using `?` with functions that return `Result<T, eyre::Report>`;
/// the report is surfaced as an internal error.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(EngineError::Database(err))
    }
}
