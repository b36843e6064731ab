use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::error::Result;
use crate::handlers::extract::{ApiJson, CurrentUser};
use crate::models::TokenVerification;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct QrCheckInBody {
    pub token: String,
    pub workshop_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ManualCheckInBody {
    pub user_id: i64,
}

/// Read-only token lookup used by the scan page before the user confirms.
pub async fn verify_token_handler(
    State(app_state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<TokenVerification>> {
    Ok(Json(
        app_state
            .checkin_service
            .verify_token(&token, Utc::now())
            .await?,
    ))
}

pub async fn qr_check_in_handler(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<QrCheckInBody>,
) -> Result<impl IntoResponse> {
    let attendance = app_state
        .checkin_service
        .check_in_with_qr(&user, body.workshop_id, &body.token, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(attendance)))
}

pub async fn manual_check_in_handler(
    State(app_state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(workshop_id): Path<i64>,
    ApiJson(body): ApiJson<ManualCheckInBody>,
) -> Result<impl IntoResponse> {
    let attendance = app_state
        .checkin_service
        .manual_check_in(&actor, workshop_id, body.user_id, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(attendance)))
}
