pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::task::JoinHandle;

use config::AppConfig;
use repositories::{
    RewardRepository, SqliteAttendanceStore, SqliteRegistrationRepository, SqliteRewardRepository,
    SqliteRoleRepository, SqliteUserRepository, SqliteWorkshopRepository,
};
use services::{
    AccessGuard, AuthService, CheckInService, RegistrationService, RewardDispatcher, RewardSink,
    UserService, WorkshopService,
};

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub auth_service: Arc<AuthService>,
    pub access_guard: Arc<AccessGuard>,
    pub workshop_service: Arc<WorkshopService>,
    pub registration_service: Arc<RegistrationService>,
    pub checkin_service: Arc<CheckInService>,
    pub reward_repository: Arc<dyn RewardRepository>,
}

impl AppState {
    /// Wires the SQLite repositories and services. Check-in rewards go to `rewards`.
    pub fn new(pool: SqlitePool, config: AppConfig, rewards: Arc<dyn RewardSink>) -> Self {
        let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
        let role_repository = Arc::new(SqliteRoleRepository::new(pool.clone()));
        let workshop_repository = Arc::new(SqliteWorkshopRepository::new(pool.clone()));
        let registration_repository = Arc::new(SqliteRegistrationRepository::new(pool.clone()));
        let attendance_store = Arc::new(SqliteAttendanceStore::new(pool.clone()));
        let reward_repository = Arc::new(SqliteRewardRepository::new(pool.clone()));

        let access_guard = Arc::new(AccessGuard::new(
            user_repository.clone(),
            role_repository.clone(),
            config.emergency_admin_emails.clone(),
        ));

        let user_service = Arc::new(UserService::new(
            user_repository.clone(),
            role_repository,
        ));
        let auth_service = Arc::new(AuthService::new(user_repository.clone()));

        let workshop_service = Arc::new(WorkshopService::new(
            access_guard.clone(),
            workshop_repository.clone(),
            registration_repository.clone(),
            attendance_store.clone(),
            config.qr_token_ttl,
        ));

        let registration_service = Arc::new(RegistrationService::new(
            access_guard.clone(),
            workshop_repository.clone(),
            registration_repository,
        ));

        let checkin_service = Arc::new(CheckInService::new(
            access_guard.clone(),
            workshop_repository,
            user_repository,
            attendance_store,
            rewards,
        ));

        AppState {
            user_service,
            auth_service,
            access_guard,
            workshop_service,
            registration_service,
            checkin_service,
            reward_repository,
        }
    }

    /// Like [`AppState::new`], with rewards applied by a background worker
    /// spawned on the current runtime.
    pub fn with_reward_worker(pool: SqlitePool, config: AppConfig) -> (Self, JoinHandle<()>) {
        let (dispatcher, worker) = RewardDispatcher::spawn(
            Arc::new(SqliteRewardRepository::new(pool.clone())),
            config.reward_retry.clone(),
            config.reward_queue_capacity,
            config.xp_reward,
        );

        (Self::new(pool, config, Arc::new(dispatcher)), worker)
    }
}
