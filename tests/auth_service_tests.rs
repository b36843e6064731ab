use std::sync::Arc;
use workshop_attendance::{
    repositories::{SqliteRoleRepository, SqliteUserRepository},
    services::{
        auth_service::{AuthService, AuthServiceError, LoginRequest},
        user_service::{CreateUserRequest, UserService},
    },
    test_utils::test_helpers,
};

async fn services() -> (UserService, AuthService) {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let roles = Arc::new(SqliteRoleRepository::new(pool));
    (
        UserService::new(repository.clone(), roles),
        AuthService::new(repository),
    )
}

fn create_request(email: &str, password: &str) -> CreateUserRequest {
    CreateUserRequest {
        email: email.to_string(),
        password: password.to_string(),
        password_confirm: None,
        display_name: None,
    }
}

#[tokio::test]
async fn test_authenticate_success() {
    let (user_service, auth_service) = services().await;

    let created_user = user_service
        .create_user(create_request("auth@example.com", "correctpassword"))
        .await
        .unwrap();

    let login_request = LoginRequest {
        email: "auth@example.com".to_string(),
        password: "correctpassword".to_string(),
    };

    let authenticated_user = auth_service.authenticate(login_request).await.unwrap();
    assert_eq!(authenticated_user.id, created_user.id);
    assert_eq!(authenticated_user.email, "auth@example.com");
}

#[tokio::test]
async fn test_authenticate_is_case_insensitive_on_email() {
    let (user_service, auth_service) = services().await;

    user_service
        .create_user(create_request("Mixed@Example.com", "correctpassword"))
        .await
        .unwrap();

    let login_request = LoginRequest {
        email: "MIXED@example.com".to_string(),
        password: "correctpassword".to_string(),
    };

    assert!(auth_service.authenticate(login_request).await.is_ok());
}

#[tokio::test]
async fn test_authenticate_wrong_password() {
    let (user_service, auth_service) = services().await;

    user_service
        .create_user(create_request("wrongpass@example.com", "correctpassword"))
        .await
        .unwrap();

    let login_request = LoginRequest {
        email: "wrongpass@example.com".to_string(),
        password: "wrongpassword".to_string(),
    };

    let result = auth_service.authenticate(login_request).await;
    assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
}

#[tokio::test]
async fn test_authenticate_nonexistent_user() {
    let (_, auth_service) = services().await;

    let login_request = LoginRequest {
        email: "nobody@example.com".to_string(),
        password: "whatever123".to_string(),
    };

    let result = auth_service.authenticate(login_request).await;
    assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
}

#[tokio::test]
async fn test_get_user_by_id() {
    let (user_service, auth_service) = services().await;

    let created_user = user_service
        .create_user(create_request("byid@example.com", "password123"))
        .await
        .unwrap();

    let user = auth_service.get_user_by_id(created_user.id).await.unwrap();
    assert_eq!(user.email, "byid@example.com");
    assert_eq!(user.xp_total, 0);
}

#[tokio::test]
async fn test_get_user_by_id_not_found() {
    let (_, auth_service) = services().await;

    let result = auth_service.get_user_by_id(99999).await;
    assert!(matches!(result, Err(AuthServiceError::UserNotFound)));
}
