use crate::core::errors::CofundError;
use crate::core::models::audit::AuditQuery;
use crate::core::models::user::User;
use crate::tests::{add_test_user, create_test_service};

fn new_user(id: &str, email: &str) -> User {
    User {
        id: id.to_string(),
        name: "Test User".to_string(),
        email: email.to_string(),
        password: "password123".to_string(),
    }
}

#[tokio::test]
async fn test_add_user() {
    let service = create_test_service();
    let added_user = service.add_user(new_user("u1", "test@example.com"), None).await.unwrap();
    assert_eq!(added_user.id, "u1");
    assert_eq!(added_user.email, "test@example.com");
    assert_ne!(added_user.password, "password123");

    let fetched = service.get_user("u1").await.unwrap().unwrap();
    assert_eq!(fetched.name, "Test User");
}

#[tokio::test]
async fn test_add_user_duplicate_email() {
    let service = create_test_service();
    service.add_user(new_user("u1", "test@example.com"), None).await.unwrap();
    let result = service.add_user(new_user("u2", "test@example.com"), None).await;
    assert!(matches!(result, Err(CofundError::EmailAlreadyRegistered(_))));
}

#[tokio::test]
async fn test_add_user_invalid_email() {
    let service = create_test_service();
    let result = service.add_user(new_user("u1", "invalid"), None).await;
    assert!(matches!(result, Err(CofundError::InvalidEmail(_))));

    let result = service.add_user(new_user("u1", ""), None).await;
    assert!(matches!(result, Err(CofundError::MissingEmail)));
}

#[tokio::test]
async fn test_add_user_rejects_markup_in_name() {
    let service = create_test_service();
    let mut user = new_user("u1", "test@example.com");
    user.name = "<script>".to_string();
    let result = service.add_user(user, None).await;
    assert!(matches!(result, Err(CofundError::InvalidInput(field, _)) if field == "name"));
}

#[tokio::test]
async fn test_authenticate() {
    let service = create_test_service();
    add_test_user(&service, "alice").await;

    let token = service.authenticate("alice@example.com", "password123").await.unwrap();
    let claims = service.validate_token(&token).unwrap();
    assert_eq!(claims.sub, "alice");

    let result = service.authenticate("alice@example.com", "wrong").await;
    assert!(matches!(result, Err(CofundError::InvalidCredentials)));

    let result = service.authenticate("nobody@example.com", "password123").await;
    assert!(matches!(result, Err(CofundError::InvalidCredentials)));
}

#[tokio::test]
async fn test_add_user_is_logged() {
    let service = create_test_service();
    add_test_user(&service, "alice").await;
    let logs = service.get_app_logs(&AuditQuery::default()).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, crate::constants::USER_ADDED);
}
