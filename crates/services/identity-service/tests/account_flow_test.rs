//! Login, token and policy-gated account management over in-memory doubles.

mod support;

use common::AppError;
use domain::{RegisterUser, RoleCode, UpdateContact};
use identity_service_lib::client::RoleDirectoryClient;
use identity_service_lib::service::IdentityService;

async fn register(h: &support::TestHarness, username: &str) -> uuid::Uuid {
    h.service
        .register(
            RegisterUser {
                username: username.to_string(),
                password: "secret1".to_string(),
                email: None,
                phone: None,
            },
            "127.0.0.1",
        )
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_login_after_registration_yields_valid_token() {
    let h = support::harness();
    let alice = register(&h, "alice").await;

    let token = h.service.login("alice", "secret1", "127.0.0.1").await.unwrap();
    assert_eq!(token.token_type, "Bearer");

    let claims = h.service.validate_token(&token.access_token).unwrap();
    assert_eq!(claims.sub, alice);
    assert_eq!(claims.username, "alice");
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let h = support::harness();
    register(&h, "alice").await;

    let err = h.service.login("alice", "wrong99", "::1").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));
}

#[tokio::test]
async fn test_user_reads_self_but_not_others() {
    let h = support::harness();
    let alice = register(&h, "alice").await;
    let bob = register(&h, "bob").await;

    assert!(h.service.get_user(alice, alice).await.is_ok());

    let err = h.service.get_user(alice, bob).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
}

#[tokio::test]
async fn test_admin_updates_plain_user() {
    let h = support::harness();
    let admin = register(&h, "admin").await;
    let bob = register(&h, "bob").await;
    h.roles.assign(admin, RoleCode::Admin);

    let changes = UpdateContact {
        email: Some("bob@example.com".to_string()),
        phone: None,
    };
    let updated = h
        .service
        .update_user(admin, bob, changes, "::1")
        .await
        .unwrap();

    assert_eq!(updated.email.as_deref(), Some("bob@example.com"));
}

#[tokio::test]
async fn test_admin_cannot_touch_another_admin() {
    let h = support::harness();
    let admin = register(&h, "admin").await;
    let other = register(&h, "other").await;
    h.roles.assign(admin, RoleCode::Admin);
    h.roles.assign(other, RoleCode::Admin);

    let err = h.service.get_user(admin, other).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
}

#[tokio::test]
async fn test_degraded_directory_still_allows_self_access() {
    let h = support::harness();
    let alice = register(&h, "alice").await;

    h.roles.set_unavailable(true);

    // Self-access needs no role lookup at all
    assert!(h.service.get_user(alice, alice).await.is_ok());
}

#[tokio::test]
async fn test_reset_password_invalidates_old_credential() {
    let h = support::harness();
    let alice = register(&h, "alice").await;

    h.service
        .reset_password(alice, alice, "newpass9", "::1")
        .await
        .unwrap();

    assert!(h.service.login("alice", "secret1", "::1").await.is_err());
    assert!(h.service.login("alice", "newpass9", "::1").await.is_ok());
}

#[tokio::test]
async fn test_super_admin_promotes_and_demotes() {
    let h = support::harness();
    let root = register(&h, "root").await;
    let bob = register(&h, "bob").await;
    h.roles.assign(root, RoleCode::SuperAdmin);

    let role = h.service.promote(root, bob, "::1").await.unwrap();
    assert_eq!(role, RoleCode::Admin);
    assert_eq!(h.roles.find_role(bob).await.unwrap(), Some(RoleCode::Admin));

    let role = h.service.demote(root, bob, "::1").await.unwrap();
    assert_eq!(role, RoleCode::User);
}

#[tokio::test]
async fn test_admin_cannot_change_roles() {
    let h = support::harness();
    let admin = register(&h, "admin").await;
    let bob = register(&h, "bob").await;
    h.roles.assign(admin, RoleCode::Admin);

    let err = h.service.promote(admin, bob, "::1").await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    assert_eq!(h.roles.find_role(bob).await.unwrap(), Some(RoleCode::User));
}
