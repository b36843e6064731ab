use super::workshop_repository::WORKSHOP_COLUMNS;
use super::{map_insert_error, RepositoryResult};
use crate::models::{Attendance, AttendanceWithUser, CheckInMethod, Workshop};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Durable record of who checked into which workshop.
///
/// Every operation is a single statement; callers must not assume that two
/// calls observe a consistent snapshot. Duplicate attendance is rejected by the
/// UNIQUE(workshop_id, user_id) constraint and reported as
/// [`RepositoryError::AlreadyExists`](super::RepositoryError::AlreadyExists).
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait AttendanceStore: Send + Sync {
    async fn find_workshop_by_token(&self, token: &str) -> RepositoryResult<Option<Workshop>>;
    async fn has_attended(&self, workshop_id: i64, user_id: i64) -> RepositoryResult<bool>;
    async fn insert_attendance(
        &self,
        workshop_id: i64,
        user_id: i64,
        method: CheckInMethod,
        checked_in_by: Option<i64>,
        checked_in_at: DateTime<Utc>,
    ) -> RepositoryResult<Attendance>;
    async fn list_attendance(&self, workshop_id: i64) -> RepositoryResult<Vec<AttendanceWithUser>>;
    async fn count_for_workshop(&self, workshop_id: i64) -> RepositoryResult<i64>;
}

pub struct SqliteAttendanceStore {
    pool: SqlitePool,
}

impl SqliteAttendanceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for SqliteAttendanceStore {
    async fn find_workshop_by_token(&self, token: &str) -> RepositoryResult<Option<Workshop>> {
        let workshop = sqlx::query_as::<_, Workshop>(&format!(
            "SELECT {WORKSHOP_COLUMNS} FROM workshops WHERE qr_token = ?"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(workshop)
    }

    async fn has_attended(&self, workshop_id: i64, user_id: i64) -> RepositoryResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM attendance WHERE workshop_id = ? AND user_id = ?",
        )
        .bind(workshop_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn insert_attendance(
        &self,
        workshop_id: i64,
        user_id: i64,
        method: CheckInMethod,
        checked_in_by: Option<i64>,
        checked_in_at: DateTime<Utc>,
    ) -> RepositoryResult<Attendance> {
        let attendance = sqlx::query_as::<_, Attendance>(
            r#"
            INSERT INTO attendance (workshop_id, user_id, checked_in_at, method, checked_in_by)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, workshop_id, user_id, checked_in_at, method, checked_in_by
            "#,
        )
        .bind(workshop_id)
        .bind(user_id)
        .bind(checked_in_at)
        .bind(method)
        .bind(checked_in_by)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(attendance)
    }

    async fn list_attendance(&self, workshop_id: i64) -> RepositoryResult<Vec<AttendanceWithUser>> {
        let roster = sqlx::query_as::<_, AttendanceWithUser>(
            r#"
            SELECT
                a.id,
                a.workshop_id,
                a.user_id,
                u.email,
                u.display_name,
                a.checked_in_at,
                a.method,
                a.checked_in_by,
                EXISTS(
                    SELECT 1 FROM registrations r
                    WHERE r.workshop_id = a.workshop_id AND r.user_id = a.user_id
                ) AS registered
            FROM attendance a
            JOIN users u ON u.id = a.user_id
            WHERE a.workshop_id = ?
            ORDER BY a.checked_in_at ASC, a.id ASC
            "#,
        )
        .bind(workshop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roster)
    }

    async fn count_for_workshop(&self, workshop_id: i64) -> RepositoryResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance WHERE workshop_id = ?")
            .bind(workshop_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
