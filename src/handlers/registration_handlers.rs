use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::error::Result;
use crate::handlers::extract::CurrentUser;
use crate::models::Registration;
use crate::AppState;

pub async fn register_handler(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(workshop_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let registration = app_state
        .registration_service
        .register(&user, workshop_id)
        .await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

pub async fn my_registrations_handler(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Registration>>> {
    Ok(Json(
        app_state
            .registration_service
            .list_user_registrations(&user)
            .await?,
    ))
}
