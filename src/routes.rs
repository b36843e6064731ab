use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth;
use crate::config::session::SessionLayer;
use crate::handlers;
use crate::middleware::add_security_headers;
use crate::AppState;

/// Full `/api` router. Session-backed routes need `session_layer`.
pub fn app_router(app_state: AppState, session_layer: SessionLayer) -> Router {
    let protected_routes = Router::new()
        .route("/api/me", get(auth::handlers::me_handler))
        .route(
            "/api/me/notifications",
            get(handlers::list_notifications_handler),
        )
        .route(
            "/api/me/notifications/{id}/read",
            post(handlers::mark_notification_read_handler),
        )
        .route(
            "/api/me/registrations",
            get(handlers::my_registrations_handler),
        )
        .route("/api/checkin", post(handlers::qr_check_in_handler))
        .route(
            "/api/workshops",
            post(handlers::create_workshop_handler),
        )
        .route(
            "/api/workshops/{id}",
            axum::routing::put(handlers::update_workshop_handler)
                .delete(handlers::delete_workshop_handler),
        )
        .route("/api/workshops/{id}/qr", post(handlers::issue_qr_handler))
        .route(
            "/api/workshops/{id}/attendance",
            get(handlers::attendance_roster_handler),
        )
        .route(
            "/api/workshops/{id}/attendance/manual",
            post(handlers::manual_check_in_handler),
        )
        .route(
            "/api/workshops/{id}/stats",
            get(handlers::workshop_stats_handler),
        )
        .route(
            "/api/workshops/{id}/registrations",
            get(handlers::workshop_registrations_handler),
        )
        .route(
            "/api/workshops/{id}/register",
            post(handlers::register_handler),
        )
        .layer(middleware::from_fn(auth::middleware::require_auth));

    let public_routes = Router::new()
        .route("/api/health", get(handlers::health_handler))
        .route("/api/auth/signup", post(auth::handlers::signup_handler))
        .route("/api/auth/login", post(auth::handlers::login_handler))
        .route("/api/auth/logout", post(auth::handlers::logout_handler))
        .route("/api/workshops", get(handlers::list_workshops_handler))
        .route("/api/workshops/{id}", get(handlers::get_workshop_handler))
        .route(
            "/api/checkin/verify/{token}",
            get(handlers::verify_token_handler),
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(session_layer)
        .layer(middleware::from_fn(add_security_headers))
        .with_state(app_state)
}
