// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to the API's JSON error shape:
/// `{"success": false, "error": "...", "isFormError": true?}`.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request (flagged as a form error for the clients)
    BadRequest(String),

    // 401 Unauthorized (unknown acting user, bad credentials)
    AuthError(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., duplicate username, racing upvote insert)
    Conflict(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Validation, auth and conflict failures originate from form submissions,
/// so they carry `isFormError` the way the clients expect. Internal errors
/// are logged in full and redacted on the wire.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, is_form_error) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    false,
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, true),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg, true),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, false),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, true),
        };

        let body = if is_form_error {
            Json(json!({
                "success": false,
                "error": error_message,
                "isFormError": true,
            }))
        } else {
            Json(json!({
                "success": false,
                "error": error_message,
            }))
        };

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into an `AppError`.
/// Unique violations (23505) become retryable conflicts — the backstop for
/// two concurrent upvote toggles from one user both seeing "absent".
/// Foreign-key violations (23503) mean a referenced row is gone.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some("23505") => return AppError::Conflict("Resource already exists".to_string()),
                Some("23503") => return AppError::NotFound("Referenced row not found".to_string()),
                _ => {}
            }
        }
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
