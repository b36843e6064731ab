use crate::models::{Role, RoleGrant, User};
use crate::repositories::{RepositoryError, RoleRepository, UserRepository};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};
use std::sync::Arc;

pub const MAX_EMAIL_LEN: usize = 255;
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Password too weak (minimum 8 characters)")]
    WeakPassword,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("User not found")]
    UserNotFound,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Password hashing failed: {0}")]
    HashingError(String),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub password_confirm: Option<String>,
    pub display_name: Option<String>,
}

pub struct UpdatePasswordRequest {
    pub user_id: i64,
    pub new_password: String,
    pub new_password_confirm: Option<String>,
}

/// Local accounts and administrator grants.
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>, roles: Arc<dyn RoleRepository>) -> Self {
        Self { repository, roles }
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User, UserServiceError> {
        let email = normalize_email(&request.email);
        validate_email(&email)?;

        if let Some(ref confirm) = request.password_confirm {
            if request.password != *confirm {
                return Err(UserServiceError::PasswordMismatch);
            }
        }

        validate_password(&request.password)?;

        let password_hash = self.hash_password(&request.password)?;
        let display_name = request
            .display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        match self
            .repository
            .create_user(&email, &password_hash, display_name)
            .await
        {
            Ok(user) => {
                tracing::info!(user_id = user.id, "User account created");
                Ok(user)
            }
            Err(RepositoryError::AlreadyExists) => Err(UserServiceError::EmailTaken),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self.repository.find_by_email(&normalize_email(email)).await?)
    }

    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self.repository.find_by_id(id).await?)
    }

    pub async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<User>, UserServiceError> {
        Ok(self.repository.list_users(limit, offset).await?)
    }

    pub async fn update_password(
        &self,
        request: UpdatePasswordRequest,
    ) -> Result<(), UserServiceError> {
        if let Some(ref confirm) = request.new_password_confirm {
            if request.new_password != *confirm {
                return Err(UserServiceError::PasswordMismatch);
            }
        }

        validate_password(&request.new_password)?;

        let password_hash = self.hash_password(&request.new_password)?;

        match self
            .repository
            .update_password(request.user_id, &password_hash)
            .await
        {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    /// Records an admin role grant. Granting twice is a no-op that returns the
    /// existing state.
    pub async fn grant_admin(
        &self,
        user_id: i64,
        granted_by: Option<i64>,
    ) -> Result<Option<RoleGrant>, UserServiceError> {
        if self.repository.find_by_id(user_id).await?.is_none() {
            return Err(UserServiceError::UserNotFound);
        }

        match self.roles.grant(user_id, Role::Admin, granted_by).await {
            Ok(grant) => {
                tracing::info!(user_id, granted_by = ?granted_by, "Admin role granted");
                Ok(Some(grant))
            }
            Err(RepositoryError::AlreadyExists) => Ok(None),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    /// Removes the admin grant and clears the profile flag.
    pub async fn revoke_admin(&self, user_id: i64) -> Result<(), UserServiceError> {
        match self.repository.set_admin_flag(user_id, false).await {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => return Err(UserServiceError::UserNotFound),
            Err(e) => return Err(UserServiceError::RepositoryError(e)),
        }

        match self.roles.revoke(user_id, Role::Admin).await {
            Ok(()) | Err(RepositoryError::NotFound) => {
                tracing::info!(user_id, "Admin role revoked");
                Ok(())
            }
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    fn hash_password(&self, password: &str) -> Result<String, UserServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserServiceError::HashingError(e.to_string()))
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        if let Ok(parsed_hash) = PasswordHash::new(password_hash) {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
        } else {
            false
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn validate_email(email: &str) -> Result<(), UserServiceError> {
    if email.is_empty() || !email.contains('@') || email.len() > MAX_EMAIL_LEN {
        return Err(UserServiceError::InvalidEmail);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), UserServiceError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserServiceError::WeakPassword);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::role_repository::MockRoleRepository;
    use crate::repositories::user_repository::MockUserRepository;
    use chrono::Utc;
    use mockall::predicate::*;

    fn sample_user(email: &str) -> User {
        User {
            id: 1,
            email: email.to_string(),
            password_hash: "hash".to_string(),
            display_name: Some("Test".to_string()),
            is_admin: false,
            xp_total: 0,
            created_at: Utc::now(),
        }
    }

    fn request(email: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            password: password.to_string(),
            password_confirm: None,
            display_name: Some("  Test ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_user_success() {
        let mut mock_repo = MockUserRepository::new();

        let user_clone = sample_user("test@example.com");
        mock_repo
            .expect_create_user()
            .with(eq("test@example.com"), always(), eq(Some("Test".to_string())))
            .times(1)
            .returning(move |_, _, _| {
                let user = user_clone.clone();
                Box::pin(async move { Ok(user) })
            });

        let service = UserService::new(Arc::new(mock_repo), Arc::new(MockRoleRepository::new()));

        let user = service
            .create_user(request(" Test@Example.com ", "password123"))
            .await
            .expect("Expected Ok result");
        assert_eq!(user.email, "test@example.com");
    }

    #[tokio::test]
    async fn test_create_user_weak_password() {
        let service = UserService::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(MockRoleRepository::new()),
        );

        let result = service.create_user(request("test@example.com", "short")).await;
        assert!(matches!(result, Err(UserServiceError::WeakPassword)));
    }

    #[tokio::test]
    async fn test_create_user_invalid_email() {
        let service = UserService::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(MockRoleRepository::new()),
        );

        let result = service.create_user(request("invalid-email", "password123")).await;
        assert!(matches!(result, Err(UserServiceError::InvalidEmail)));
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_create_user()
            .returning(|_, _, _| Box::pin(async move { Err(RepositoryError::AlreadyExists) }));

        let service = UserService::new(Arc::new(mock_repo), Arc::new(MockRoleRepository::new()));

        let result = service
            .create_user(request("test@example.com", "password123"))
            .await;
        assert!(matches!(result, Err(UserServiceError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_grant_admin_unknown_user() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_find_by_id()
            .with(eq(42))
            .returning(|_| Box::pin(async move { Ok(None) }));
        let mut roles = MockRoleRepository::new();
        roles.expect_grant().never();

        let service = UserService::new(Arc::new(mock_repo), Arc::new(roles));

        let result = service.grant_admin(42, Some(1)).await;
        assert!(matches!(result, Err(UserServiceError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_grant_admin_twice_is_noop() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_find_by_id().returning(|_| {
            Box::pin(async move { Ok(Some(sample_user("lead@example.com"))) })
        });
        let mut roles = MockRoleRepository::new();
        roles
            .expect_grant()
            .with(eq(1), eq(Role::Admin), eq(None))
            .returning(|_, _, _| Box::pin(async move { Err(RepositoryError::AlreadyExists) }));

        let service = UserService::new(Arc::new(mock_repo), Arc::new(roles));

        let result = service.grant_admin(1, None).await.expect("grant succeeds");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_revoke_admin_without_grant_clears_flag() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_set_admin_flag()
            .with(eq(1), eq(false))
            .times(1)
            .returning(|_, _| Box::pin(async move { Ok(()) }));
        let mut roles = MockRoleRepository::new();
        roles
            .expect_revoke()
            .returning(|_, _| Box::pin(async move { Err(RepositoryError::NotFound) }));

        let service = UserService::new(Arc::new(mock_repo), Arc::new(roles));

        assert!(service.revoke_admin(1).await.is_ok());
    }

    #[test]
    fn test_password_round_trip() {
        let service = UserService::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(MockRoleRepository::new()),
        );
        let hash = service.hash_password("correct horse").expect("hash");

        assert!(service.verify_password("correct horse", &hash));
        assert!(!service.verify_password("wrong horse", &hash));
        assert!(!service.verify_password("correct horse", "not-a-hash"));
    }
}
