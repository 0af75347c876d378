//! Error types shared by the booking core and the HTTP layer.
//!
//! `BookingError` is what the scheduler and the reservation authority return.
//! `AppError` turns any of the crate's errors into a JSON response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::repository::StoreError;
use crate::services::auth::AuthError;

#[derive(Debug, Error)]
pub enum BookingError {
    /// Malformed input: bad timestamp, bad seat label, missing field.
    #[error("{0}")]
    Validation(String),
    /// A referenced film, area, session or spot does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The request clashes with current state: duplicate session, film not playing,
    /// seat already reserved.
    #[error("{0}")]
    Conflict(String),
    /// Storage failed; any multi-step unit was rolled back before this surfaced.
    #[error("storage failure: {0}")]
    Persistence(#[from] StoreError),
}

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "CONFLICT", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(message) => AppError::bad_request(message),
            BookingError::NotFound(message) => AppError::not_found(message),
            BookingError::Conflict(message) => AppError::conflict(message),
            BookingError::Persistence(source) => AppError::from(source),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(what) => AppError::conflict(format!("{what} already exists")),
            StoreError::InUse(what) => {
                AppError::conflict(format!("{what} is still in use and cannot be removed"))
            }
            other => {
                tracing::error!(error = %other, "storage failure");
                AppError::internal("internal storage error")
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::from(StoreError::Database(err))
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(_) | AuthError::Expired => {
                AppError::unauthorized("invalid or expired token")
            }
            AuthError::Hashing(_) | AuthError::Signing(_) | AuthError::Task(_) => {
                tracing::error!(error = %err, "authentication backend failure");
                AppError::internal("authentication failure")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, code = self.code, message = %self.message, "request failed");
        } else {
            tracing::debug!(status = %self.status, code = self.code, message = %self.message, "request rejected");
        }

        let body = json!({
            "success": false,
            "code": self.code,
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_errors_map_to_client_statuses() {
        let cases = [
            (BookingError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (BookingError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (BookingError::Conflict("taken".into()), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn storage_failures_hide_their_cause() {
        let err = AppError::from(BookingError::Persistence(StoreError::Unavailable(
            "disk on fire".into(),
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message().contains("disk"));
    }

    #[test]
    fn duplicates_are_conflicts() {
        let err = AppError::from(StoreError::Duplicate("area 'Studio 1'".into()));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.message(), "area 'Studio 1' already exists");
    }

    #[test]
    fn removing_referenced_rows_is_a_conflict() {
        let err = AppError::from(StoreError::InUse("film 'dune'".into()));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.message(), "film 'dune' is still in use and cannot be removed");
    }
}
