pub mod attendance_repository;
pub mod registration_repository;
pub mod reward_repository;
pub mod role_repository;
pub mod user_repository;
pub mod workshop_repository;

pub use attendance_repository::{AttendanceStore, SqliteAttendanceStore};
pub use registration_repository::{RegistrationRepository, SqliteRegistrationRepository};
pub use reward_repository::{RewardRepository, SqliteRewardRepository};
pub use role_repository::{RoleRepository, SqliteRoleRepository};
pub use user_repository::{SqliteUserRepository, UserRepository};
pub use workshop_repository::{SqliteWorkshopRepository, WorkshopRepository};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Record already exists")]
    AlreadyExists,
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Turns a UNIQUE/PRIMARY KEY violation into `AlreadyExists`.
pub(crate) fn map_insert_error(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db_err)
            if db_err.is_unique_violation()
                || db_err.message().contains("UNIQUE constraint failed") =>
        {
            RepositoryError::AlreadyExists
        }
        _ => RepositoryError::Database(err),
    }
}
