use super::{map_insert_error, RepositoryError, RepositoryResult};
use crate::models::{Role, RoleGrant};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

/// Stored role grants. Every grant row records who granted it and when.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait RoleRepository: Send + Sync {
    async fn grant(
        &self,
        user_id: i64,
        role: Role,
        granted_by: Option<i64>,
    ) -> RepositoryResult<RoleGrant>;
    async fn revoke(&self, user_id: i64, role: Role) -> RepositoryResult<()>;
    async fn has_role(&self, user_id: i64, role: Role) -> RepositoryResult<bool>;
    async fn list_grants(&self, role: Role) -> RepositoryResult<Vec<RoleGrant>>;
}

pub struct SqliteRoleRepository {
    pool: SqlitePool,
}

impl SqliteRoleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for SqliteRoleRepository {
    async fn grant(
        &self,
        user_id: i64,
        role: Role,
        granted_by: Option<i64>,
    ) -> RepositoryResult<RoleGrant> {
        let grant = sqlx::query_as::<_, RoleGrant>(
            r#"
            INSERT INTO role_grants (user_id, role, granted_by, granted_at)
            VALUES (?, ?, ?, ?)
            RETURNING user_id, role, granted_by, granted_at
            "#,
        )
        .bind(user_id)
        .bind(role)
        .bind(granted_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(grant)
    }

    async fn revoke(&self, user_id: i64, role: Role) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM role_grants WHERE user_id = ? AND role = ?")
            .bind(user_id)
            .bind(role)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn has_role(&self, user_id: i64, role: Role) -> RepositoryResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM role_grants WHERE user_id = ? AND role = ?")
                .bind(user_id)
                .bind(role)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    async fn list_grants(&self, role: Role) -> RepositoryResult<Vec<RoleGrant>> {
        let grants = sqlx::query_as::<_, RoleGrant>(
            r#"
            SELECT user_id, role, granted_by, granted_at
            FROM role_grants
            WHERE role = ?
            ORDER BY granted_at ASC
            "#,
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(grants)
    }
}
