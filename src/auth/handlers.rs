use crate::config::session::SESSION_USER_ID;
use crate::error::Result;
use crate::handlers::extract::ApiJson;
use crate::models::{Role, User};
use crate::services::{auth_service::LoginRequest, user_service::CreateUserRequest};
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use tower_sessions::Session;

#[derive(Deserialize)]
pub struct SignupBody {
    pub email: String,
    pub password: String,
    pub password_confirm: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
    pub remember_me: Option<bool>,
}

pub async fn signup_handler(
    State(app_state): State<AppState>,
    ApiJson(body): ApiJson<SignupBody>,
) -> Result<impl IntoResponse> {
    let request = CreateUserRequest {
        email: body.email,
        password: body.password,
        password_confirm: body.password_confirm,
        display_name: body.display_name,
    };

    let user = app_state.user_service.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login_handler(
    State(app_state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<LoginBody>,
) -> Result<Json<User>> {
    let request = LoginRequest {
        email: body.email,
        password: body.password,
    };

    let user = app_state.auth_service.authenticate(request).await?;

    session.cycle_id().await?;
    session.insert(SESSION_USER_ID, user.id).await?;
    session
        .insert("auth_timestamp", chrono::Utc::now().timestamp())
        .await?;

    if body.remember_me.unwrap_or(false) {
        session.set_expiry(Some(tower_sessions::Expiry::OnInactivity(
            time::Duration::days(30),
        )));
    }

    tracing::info!(user_id = user.id, "User logged in");
    Ok(Json(user))
}

pub async fn logout_handler(session: Session) -> Result<StatusCode> {
    session.flush().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Current user with XP total. `is_admin` reflects role grants as well as
/// the profile flag.
pub async fn me_handler(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Json<User>> {
    let mut user = app_state.access_guard.authenticate(&session).await?;
    user.is_admin = app_state.access_guard.has_role(&user, Role::Admin).await?;

    Ok(Json(user))
}
