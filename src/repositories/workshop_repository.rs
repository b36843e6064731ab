use super::{RepositoryError, RepositoryResult};
use crate::models::{Workshop, WorkshopFields};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub(crate) const WORKSHOP_COLUMNS: &str = "id, title, description, scheduled_at, location_mode, \
     venue, meeting_url, capacity, qr_token, qr_expires_at, created_by, created_at, updated_at";

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait WorkshopRepository: Send + Sync {
    async fn create(&self, fields: WorkshopFields, created_by: i64) -> RepositoryResult<Workshop>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Workshop>>;
    async fn list(&self) -> RepositoryResult<Vec<Workshop>>;
    async fn update(&self, id: i64, fields: WorkshopFields) -> RepositoryResult<Workshop>;
    async fn delete(&self, id: i64) -> RepositoryResult<()>;
    /// Overwrites the active token; the previous one stops matching immediately.
    async fn set_qr_token(
        &self,
        id: i64,
        token: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> RepositoryResult<Workshop>;
}

pub struct SqliteWorkshopRepository {
    pool: SqlitePool,
}

impl SqliteWorkshopRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkshopRepository for SqliteWorkshopRepository {
    async fn create(&self, fields: WorkshopFields, created_by: i64) -> RepositoryResult<Workshop> {
        let now = Utc::now();
        let workshop = sqlx::query_as::<_, Workshop>(&format!(
            r#"
            INSERT INTO workshops
                (title, description, scheduled_at, location_mode, venue, meeting_url,
                 capacity, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {WORKSHOP_COLUMNS}
            "#
        ))
        .bind(fields.title)
        .bind(fields.description)
        .bind(fields.scheduled_at)
        .bind(fields.location_mode)
        .bind(fields.venue)
        .bind(fields.meeting_url)
        .bind(fields.capacity)
        .bind(created_by)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(workshop)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Workshop>> {
        let workshop = sqlx::query_as::<_, Workshop>(&format!(
            "SELECT {WORKSHOP_COLUMNS} FROM workshops WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(workshop)
    }

    async fn list(&self) -> RepositoryResult<Vec<Workshop>> {
        let workshops = sqlx::query_as::<_, Workshop>(&format!(
            "SELECT {WORKSHOP_COLUMNS} FROM workshops ORDER BY scheduled_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(workshops)
    }

    async fn update(&self, id: i64, fields: WorkshopFields) -> RepositoryResult<Workshop> {
        sqlx::query_as::<_, Workshop>(&format!(
            r#"
            UPDATE workshops
            SET title = ?, description = ?, scheduled_at = ?, location_mode = ?,
                venue = ?, meeting_url = ?, capacity = ?, updated_at = ?
            WHERE id = ?
            RETURNING {WORKSHOP_COLUMNS}
            "#
        ))
        .bind(fields.title)
        .bind(fields.description)
        .bind(fields.scheduled_at)
        .bind(fields.location_mode)
        .bind(fields.venue)
        .bind(fields.meeting_url)
        .bind(fields.capacity)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM workshops WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn set_qr_token(
        &self,
        id: i64,
        token: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> RepositoryResult<Workshop> {
        sqlx::query_as::<_, Workshop>(&format!(
            r#"
            UPDATE workshops
            SET qr_token = ?, qr_expires_at = ?, updated_at = ?
            WHERE id = ?
            RETURNING {WORKSHOP_COLUMNS}
            "#
        ))
        .bind(token)
        .bind(expires_at)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}
