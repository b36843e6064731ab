use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::repositories::RepositoryError;
use crate::services::auth_service::AuthServiceError;
use crate::services::user_service::UserServiceError;

// Type alias for Result with our AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Errors surfaced by services and HTTP handlers.
///
/// Every variant carries a stable machine-readable tag (see [`AppError::tag`])
/// that is returned to clients alongside a human-readable message. Store and
/// identity failures are logged where they happen and collapse into
/// [`AppError::Upstream`], whose detail never reaches the response body.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Administrator role required")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Workshop has no QR check-in configured")]
    NoQrConfigured,

    #[error("Already checked in to this workshop")]
    AlreadyCheckedIn,

    #[error("Already registered for this workshop")]
    AlreadyRegistered,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Workshop is full")]
    CapacityExceeded,

    #[error("Check-in is only open on the day of the workshop")]
    OutsideCheckInWindow,

    #[error("Invalid check-in token")]
    InvalidToken,

    #[error("Check-in token is invalid or has expired")]
    InvalidOrExpiredToken,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(what.to_string())
    }

    pub fn tag(&self) -> &'static str {
        match self {
            AppError::Unauthorized | AppError::InvalidCredentials => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::NoQrConfigured => "no_qr_configured",
            AppError::AlreadyCheckedIn => "already_checked_in",
            AppError::AlreadyRegistered => "already_registered",
            AppError::EmailTaken => "email_taken",
            AppError::CapacityExceeded => "capacity_exceeded",
            AppError::OutsideCheckInWindow => "outside_check_in_window",
            AppError::InvalidToken => "invalid_token",
            AppError::InvalidOrExpiredToken => "invalid_or_expired_token",
            AppError::Validation(_) => "validation_failed",
            AppError::Upstream(_) => "upstream_failure",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::NoQrConfigured => StatusCode::NOT_FOUND,
            AppError::AlreadyCheckedIn
            | AppError::AlreadyRegistered
            | AppError::EmailTaken
            | AppError::CapacityExceeded => StatusCode::CONFLICT,
            AppError::OutsideCheckInWindow
            | AppError::InvalidToken
            | AppError::InvalidOrExpiredToken => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = %err, "database operation failed");
        AppError::Upstream(err.to_string())
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(e) => e.into(),
            RepositoryError::NotFound => AppError::not_found("Record"),
            RepositoryError::AlreadyExists => {
                AppError::Validation("Record already exists".to_string())
            }
        }
    }
}

impl From<UserServiceError> for AppError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::InvalidEmail
            | UserServiceError::WeakPassword
            | UserServiceError::PasswordMismatch => AppError::Validation(err.to_string()),
            UserServiceError::UserNotFound => AppError::not_found("User"),
            UserServiceError::EmailTaken => AppError::EmailTaken,
            UserServiceError::HashingError(detail) => {
                tracing::error!(error = %detail, "password hashing failed");
                AppError::Upstream(detail)
            }
            UserServiceError::RepositoryError(e) => e.into(),
        }
    }
}

impl From<AuthServiceError> for AppError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::InvalidCredentials => AppError::InvalidCredentials,
            AuthServiceError::UserNotFound => AppError::Unauthorized,
            AuthServiceError::RepositoryError(e) => e.into(),
        }
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        tracing::error!(error = %err, "session store failure");
        AppError::Upstream(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Upstream(_) => "The service is temporarily unavailable".to_string(),
            other => other.to_string(),
        };

        let body = json!({
            "error": self.tag(),
            "message": message,
        });

        (self.status(), Json(body)).into_response()
    }
}
