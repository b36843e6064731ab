use super::{map_insert_error, RepositoryResult};
use crate::models::Registration;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait RegistrationRepository: Send + Sync {
    /// Inserts a registration unless the workshop already holds `capacity`
    /// registrations. Returns `Ok(None)` when full and `AlreadyExists` for a
    /// duplicate (workshop, user) pair.
    async fn create_within_capacity(
        &self,
        workshop_id: i64,
        user_id: i64,
        capacity: Option<i64>,
    ) -> RepositoryResult<Option<Registration>>;
    async fn count_for_workshop(&self, workshop_id: i64) -> RepositoryResult<i64>;
    async fn list_for_workshop(&self, workshop_id: i64) -> RepositoryResult<Vec<Registration>>;
    async fn list_for_user(&self, user_id: i64) -> RepositoryResult<Vec<Registration>>;
}

pub struct SqliteRegistrationRepository {
    pool: SqlitePool,
}

impl SqliteRegistrationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistrationRepository for SqliteRegistrationRepository {
    async fn create_within_capacity(
        &self,
        workshop_id: i64,
        user_id: i64,
        capacity: Option<i64>,
    ) -> RepositoryResult<Option<Registration>> {
        // Single statement so the capacity check and the insert cannot interleave
        // with another registration.
        let registration = sqlx::query_as::<_, Registration>(
            r#"
            INSERT INTO registrations (workshop_id, user_id, registered_at)
            SELECT ?, ?, ?
            WHERE ? IS NULL
               OR (SELECT COUNT(*) FROM registrations WHERE workshop_id = ?) < ?
            RETURNING id, workshop_id, user_id, registered_at
            "#,
        )
        .bind(workshop_id)
        .bind(user_id)
        .bind(Utc::now())
        .bind(capacity)
        .bind(workshop_id)
        .bind(capacity)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(registration)
    }

    async fn count_for_workshop(&self, workshop_id: i64) -> RepositoryResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM registrations WHERE workshop_id = ?")
                .bind(workshop_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn list_for_workshop(&self, workshop_id: i64) -> RepositoryResult<Vec<Registration>> {
        let registrations = sqlx::query_as::<_, Registration>(
            r#"
            SELECT id, workshop_id, user_id, registered_at
            FROM registrations
            WHERE workshop_id = ?
            ORDER BY registered_at ASC, id ASC
            "#,
        )
        .bind(workshop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(registrations)
    }

    async fn list_for_user(&self, user_id: i64) -> RepositoryResult<Vec<Registration>> {
        let registrations = sqlx::query_as::<_, Registration>(
            r#"
            SELECT id, workshop_id, user_id, registered_at
            FROM registrations
            WHERE user_id = ?
            ORDER BY registered_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(registrations)
    }
}
