use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::{AppError, Result};
use crate::handlers::extract::CurrentUser;
use crate::models::Notification;
use crate::repositories::RepositoryError;
use crate::AppState;

pub async fn list_notifications_handler(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Notification>>> {
    Ok(Json(
        app_state
            .reward_repository
            .list_notifications(user.id)
            .await?,
    ))
}

pub async fn mark_notification_read_handler(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    match app_state
        .reward_repository
        .mark_notification_read(user.id, id)
        .await
    {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(RepositoryError::NotFound) => Err(AppError::not_found("Notification")),
        Err(err) => Err(err.into()),
    }
}
