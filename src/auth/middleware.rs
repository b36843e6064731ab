use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::config::session::SESSION_USER_ID;
use crate::error::AppError;

/// Rejects requests without a logged-in session with a 401 JSON body.
///
/// Only presence of a session user is checked here; handlers still load the
/// user through the access guard.
pub async fn require_auth(session: Session, request: Request, next: Next) -> Response {
    match session.get::<i64>(SESSION_USER_ID).await {
        Ok(Some(_user_id)) => next.run(request).await,
        Ok(None) => AppError::Unauthorized.into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
