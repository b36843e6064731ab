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
use crate::models::{
    AttendanceWithUser, CreateWorkshopRequest, QrTokenIssued, Registration,
    UpdateWorkshopRequest, Workshop, WorkshopStats,
};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct IssueQrBody {
    /// Token lifetime in minutes. Omit for the configured default, 0 for none.
    pub ttl_minutes: Option<i64>,
}

pub async fn list_workshops_handler(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<Workshop>>> {
    Ok(Json(app_state.workshop_service.list_workshops().await?))
}

pub async fn get_workshop_handler(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Workshop>> {
    Ok(Json(app_state.workshop_service.get_workshop(id).await?))
}

pub async fn create_workshop_handler(
    State(app_state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiJson(body): ApiJson<CreateWorkshopRequest>,
) -> Result<impl IntoResponse> {
    let workshop = app_state
        .workshop_service
        .create_workshop(&actor, body)
        .await?;
    Ok((StatusCode::CREATED, Json(workshop)))
}

pub async fn update_workshop_handler(
    State(app_state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<UpdateWorkshopRequest>,
) -> Result<Json<Workshop>> {
    let workshop = app_state
        .workshop_service
        .update_workshop(&actor, id, body)
        .await?;
    Ok(Json(workshop))
}

pub async fn delete_workshop_handler(
    State(app_state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    app_state.workshop_service.delete_workshop(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rotates the workshop's check-in token. The body is optional.
pub async fn issue_qr_handler(
    State(app_state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    body: Option<ApiJson<IssueQrBody>>,
) -> Result<Json<QrTokenIssued>> {
    let ttl_minutes = body.and_then(|ApiJson(body)| body.ttl_minutes);
    let issued = app_state
        .workshop_service
        .issue_qr_token(&actor, id, ttl_minutes, Utc::now())
        .await?;
    Ok(Json(issued))
}

pub async fn workshop_stats_handler(
    State(app_state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<WorkshopStats>> {
    Ok(Json(
        app_state.workshop_service.workshop_stats(&actor, id).await?,
    ))
}

pub async fn attendance_roster_handler(
    State(app_state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<AttendanceWithUser>>> {
    Ok(Json(
        app_state.checkin_service.list_attendance(&actor, id).await?,
    ))
}

pub async fn workshop_registrations_handler(
    State(app_state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Registration>>> {
    Ok(Json(
        app_state
            .registration_service
            .list_registrations(&actor, id)
            .await?,
    ))
}
