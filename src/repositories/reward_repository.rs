use super::{RepositoryError, RepositoryResult};
use crate::models::{Notification, RewardJob, KIND_XP_AWARDED};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

/// XP totals and the notification inbox.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait RewardRepository: Send + Sync {
    /// Credits XP and writes the award notification. Returns `false` when the
    /// reward for this (user, workshop) was already recorded, in which case
    /// nothing is written.
    async fn record_reward(&self, job: &RewardJob) -> RepositoryResult<bool>;
    async fn xp_total(&self, user_id: i64) -> RepositoryResult<i64>;
    async fn list_notifications(&self, user_id: i64) -> RepositoryResult<Vec<Notification>>;
    async fn mark_notification_read(&self, user_id: i64, notification_id: i64)
        -> RepositoryResult<()>;
}

pub struct SqliteRewardRepository {
    pool: SqlitePool,
}

impl SqliteRewardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RewardRepository for SqliteRewardRepository {
    async fn record_reward(&self, job: &RewardJob) -> RepositoryResult<bool> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO reward_ledger (user_id, workshop_id, amount, awarded_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (user_id, workshop_id) DO NOTHING
            "#,
        )
        .bind(job.user_id)
        .bind(job.workshop_id)
        .bind(job.amount)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let updated = sqlx::query("UPDATE users SET xp_total = xp_total + ? WHERE id = ?")
            .bind(job.amount)
            .bind(job.user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, kind, title, body, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(job.user_id)
        .bind(KIND_XP_AWARDED)
        .bind(job.notification_title())
        .bind(job.notification_body())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn xp_total(&self, user_id: i64) -> RepositoryResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT xp_total FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_notifications(&self, user_id: i64) -> RepositoryResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, kind, title, body, is_read, created_at
            FROM notifications
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        user_id: i64,
        notification_id: i64,
    ) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?")
            .bind(notification_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
