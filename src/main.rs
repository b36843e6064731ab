use workshop_attendance::{
    config::{
        session::{validate_production_config, SessionConfig},
        AppConfig,
    },
    db,
    routes::app_router,
    AppState,
};

use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "workshop_attendance=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    validate_production_config()?;

    // Database connection
    let pool = db::create_pool().await?;
    db::migrate(&pool).await?;

    let config = AppConfig::from_env();
    tracing::info!(
        xp_reward = config.xp_reward,
        reward_queue_capacity = config.reward_queue_capacity,
        reward_max_retries = config.reward_retry.max_retries,
        emergency_admins = config.emergency_admin_emails.len(),
        "Loaded configuration"
    );

    let (app_state, reward_worker) = AppState::with_reward_worker(pool.clone(), config);

    // Session store
    let session_store = SqliteStore::new(pool.clone()).with_table_name("sessions")?;
    session_store.migrate().await?;
    let session_layer = SessionConfig::from_env().create_layer(session_store);

    let app = app_router(app_state, session_layer).layer(TraceLayer::new_for_http());

    // Start server
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()?;

    let addr = SocketAddr::from((host.parse::<std::net::IpAddr>()?, port));

    tracing::info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Dropping the router drops the last reward dispatcher; wait for the queue to drain.
    if let Err(err) = reward_worker.await {
        tracing::error!(error = %err, "Reward worker ended abnormally");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
