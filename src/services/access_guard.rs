use crate::config::session::SESSION_USER_ID;
use crate::error::{AppError, Result};
use crate::models::{Role, User};
use crate::repositories::{RoleRepository, UserRepository};
use std::sync::Arc;
use tower_sessions::Session;

/// Decides who the caller is and what they may do.
///
/// Privileged operations call [`AccessGuard::authenticate`] first and
/// [`AccessGuard::authorize`] second, so a caller without a session is always
/// told `Unauthorized` before any role is evaluated.
///
/// A user is an administrator when their profile flag is set or a stored role
/// grant exists. Emails listed in `EMERGENCY_ADMIN_EMAILS` are also let through,
/// on a separate path that writes an audit warning every time it is taken.
pub struct AccessGuard {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
    emergency_admin_emails: Vec<String>,
}

impl AccessGuard {
    pub fn new(
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        emergency_admin_emails: Vec<String>,
    ) -> Self {
        Self {
            users,
            roles,
            emergency_admin_emails,
        }
    }

    pub async fn authenticate(&self, session: &Session) -> Result<User> {
        let user_id = session.get::<i64>(SESSION_USER_ID).await?;
        self.authenticate_user_id(user_id).await
    }

    pub async fn authenticate_user_id(&self, user_id: Option<i64>) -> Result<User> {
        let user_id = user_id.ok_or(AppError::Unauthorized)?;

        match self.users.find_by_id(user_id).await? {
            Some(user) => Ok(user),
            None => {
                tracing::warn!(user_id, "Session references a user that no longer exists");
                Err(AppError::Unauthorized)
            }
        }
    }

    pub async fn authorize(&self, user: &User, role: Role) -> Result<()> {
        if self.has_role(user, role).await? {
            return Ok(());
        }

        if self.emergency_override(user, role) {
            return Ok(());
        }

        tracing::warn!(
            user_id = user.id,
            role = role.as_str(),
            "Denied privileged operation"
        );
        Err(AppError::Forbidden)
    }

    /// Role check from stored state only. The emergency override is not consulted.
    pub async fn has_role(&self, user: &User, role: Role) -> Result<bool> {
        match role {
            Role::Admin if user.is_admin => Ok(true),
            Role::Admin => Ok(self.roles.has_role(user.id, role).await?),
        }
    }

    fn emergency_override(&self, user: &User, role: Role) -> bool {
        let email = user.email.to_ascii_lowercase();
        if !self.emergency_admin_emails.contains(&email) {
            return false;
        }

        tracing::warn!(
            target: "audit",
            user_id = user.id,
            email = %user.email,
            role = role.as_str(),
            "Emergency admin override granted access"
        );
        true
    }
}
