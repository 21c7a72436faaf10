mod common;

use common::{
    FakeAuthApi, TEST_PROFILE_TIMEOUT, admin_store, admin_user, auth_response, memory_storage,
    session_store, user,
};
use townhall_portal::auth::{
    AdminGuardState, AdminRouteGuard, AdminVerification, FailureKind, GuardDecision,
};
use townhall_portal::constants::{ADMIN_TOKEN_KEY, ADMIN_USER_KEY, AUTH_TOKEN_KEY};
use townhall_portal::error::AppError;
use townhall_portal::models::Role;
use townhall_portal::storage::KeyValueStore;

#[tokio::test]
async fn test_guard_without_admin_token_redirects_without_network() {
    let api = FakeAuthApi::new();
    let storage = memory_storage();
    let admin = admin_store(&api, &storage);
    let mut guard = AdminRouteGuard::new();

    assert_eq!(guard.state(), AdminGuardState::Unknown);
    assert_eq!(guard.decision(), GuardDecision::Pending);

    let decision = guard.mount(&admin).await;

    assert_eq!(decision, GuardDecision::Redirect("/admin".into()));
    assert_eq!(guard.state(), AdminGuardState::Unauthenticated);
    assert_eq!(api.total_calls(), 0);
}

#[tokio::test]
async fn test_guard_requires_both_entries() {
    let api = FakeAuthApi::new();
    let storage = memory_storage();
    storage.set_item(ADMIN_TOKEN_KEY, "admin-tok").await.unwrap();
    let admin = admin_store(&api, &storage);

    let decision = AdminRouteGuard::new().mount(&admin).await;

    assert_eq!(decision, GuardDecision::Redirect("/admin".into()));
}

#[tokio::test]
async fn test_admin_login_stores_token_and_profile() {
    let api = FakeAuthApi::new();
    let storage = memory_storage();
    api.on_admin_login(Ok(auth_response(
        Some("admin-tok"),
        admin_user(1, "root@example.org"),
    )));
    let admin = admin_store(&api, &storage);

    let signed_in = admin.login("root@example.org", "pw").await.unwrap();

    assert!(signed_in.is_superuser());
    assert_eq!(
        storage.get_item(ADMIN_TOKEN_KEY).await.unwrap().as_deref(),
        Some("admin-tok")
    );
    let credentials = admin.credentials().await.unwrap();
    assert_eq!(credentials.user.email, "root@example.org");
    assert_eq!(storage.get_item(AUTH_TOKEN_KEY).await.unwrap(), None);

    let mut guard = AdminRouteGuard::new();
    assert_eq!(guard.mount(&admin).await, GuardDecision::Authorized);
    assert_eq!(FakeAuthApi::calls(&api.profile_calls), 0);
}

#[tokio::test]
async fn test_admin_login_refuses_regular_accounts() {
    let api = FakeAuthApi::new();
    let storage = memory_storage();
    api.on_admin_login(Ok(auth_response(
        Some("tok"),
        user(2, "citizen@example.org", Role::Citizen),
    )));
    let admin = admin_store(&api, &storage);

    let failure = admin.login("citizen@example.org", "pw").await.unwrap_err();

    assert_eq!(failure.kind, FailureKind::Forbidden);
    assert!(storage.is_empty().await);
}

#[tokio::test]
async fn test_guard_decision_is_fixed_per_mount() {
    let api = FakeAuthApi::new();
    let storage = memory_storage();
    api.on_admin_login(Ok(auth_response(
        Some("admin-tok"),
        admin_user(1, "root@example.org"),
    )));
    let admin = admin_store(&api, &storage);

    let mut mounted = AdminRouteGuard::new();
    assert_eq!(mounted.mount(&admin).await, GuardDecision::Redirect("/admin".into()));

    admin.login("root@example.org", "pw").await.unwrap();

    assert_eq!(mounted.mount(&admin).await, GuardDecision::Redirect("/admin".into()));
    assert_eq!(AdminRouteGuard::new().mount(&admin).await, GuardDecision::Authorized);
}

#[tokio::test]
async fn test_verify_clears_rejected_admin_token() {
    let api = FakeAuthApi::new();
    let storage = memory_storage();
    api.on_admin_login(Ok(auth_response(
        Some("admin-tok"),
        admin_user(1, "root@example.org"),
    )));
    let admin = admin_store(&api, &storage);
    admin.login("root@example.org", "pw").await.unwrap();

    api.push_profile(Err(AppError::AuthError("Invalid token.".into())));
    assert_eq!(admin.verify().await, AdminVerification::Revoked);

    assert!(!admin.has_credentials().await);
    assert!(storage.is_empty().await);
}

#[tokio::test]
async fn test_verify_keeps_session_on_network_error() {
    let api = FakeAuthApi::new();
    let storage = memory_storage();
    api.on_admin_login(Ok(auth_response(
        Some("admin-tok"),
        admin_user(1, "root@example.org"),
    )));
    let admin = admin_store(&api, &storage);
    admin.login("root@example.org", "pw").await.unwrap();

    api.push_profile(Err(AppError::NetworkError("refused".into())));
    assert!(matches!(
        admin.verify().await,
        AdminVerification::Unavailable(AppError::NetworkError(_))
    ));
    assert!(admin.has_credentials().await);

    api.push_profile(Ok(admin_user(1, "root@example.org")));
    assert!(matches!(admin.verify().await, AdminVerification::Verified(_)));
}

#[tokio::test]
async fn test_verify_revokes_demoted_account() {
    let api = FakeAuthApi::new();
    let storage = memory_storage();
    api.on_admin_login(Ok(auth_response(
        Some("admin-tok"),
        admin_user(1, "root@example.org"),
    )));
    let admin = admin_store(&api, &storage);
    admin.login("root@example.org", "pw").await.unwrap();

    let mut demoted = user(1, "root@example.org", Role::Government);
    demoted.is_superuser = Some(false);
    api.push_profile(Ok(demoted));

    assert_eq!(admin.verify().await, AdminVerification::Revoked);
    assert!(!admin.has_credentials().await);
}

#[tokio::test]
async fn test_verify_accepts_profile_without_superuser_flag() {
    let api = FakeAuthApi::new();
    let storage = memory_storage();
    api.on_admin_login(Ok(auth_response(
        Some("admin-tok"),
        admin_user(1, "root@example.org"),
    )));
    let admin = admin_store(&api, &storage);
    admin.login("root@example.org", "pw").await.unwrap();

    // Regular profile shape: role set, flag absent
    api.push_profile(Ok(user(1, "root@example.org", Role::Government)));

    match admin.verify().await {
        AdminVerification::Verified(verified) => {
            assert!(verified.is_superuser());
            assert_eq!(verified.role, Some(Role::Government));
        }
        other => panic!("unexpected {other:?}"),
    }
    let credentials = admin.credentials().await.unwrap();
    assert_eq!(credentials.token, "admin-tok");
    assert_eq!(credentials.user.is_superuser, Some(true));

    api.push_profile(Ok(user(1, "root@example.org", Role::Government)));
    assert!(matches!(admin.verify().await, AdminVerification::Verified(_)));
}

#[tokio::test]
async fn test_verify_without_session() {
    let api = FakeAuthApi::new();
    let storage = memory_storage();
    let admin = admin_store(&api, &storage);

    assert_eq!(admin.verify().await, AdminVerification::NotSignedIn);
    assert_eq!(api.total_calls(), 0);
}

#[tokio::test]
async fn test_admin_and_primary_sessions_are_independent() {
    let api = FakeAuthApi::new();
    let storage = memory_storage();
    api.on_admin_login(Ok(auth_response(
        Some("admin-tok"),
        admin_user(1, "root@example.org"),
    )));
    api.on_login(Ok(auth_response(
        Some("citizen-tok"),
        user(2, "ana@example.org", Role::Citizen),
    )));
    let admin = admin_store(&api, &storage);
    let session = session_store(&api, &storage, TEST_PROFILE_TIMEOUT);
    session.initialize().await;

    admin.login("root@example.org", "pw").await.unwrap();
    session.login("ana@example.org", "pw", Role::Citizen).await.unwrap();

    session.logout().await;
    assert!(admin.has_credentials().await);

    admin.logout().await;
    admin.logout().await;
    assert_eq!(storage.get_item(ADMIN_TOKEN_KEY).await.unwrap(), None);
    assert_eq!(storage.get_item(ADMIN_USER_KEY).await.unwrap(), None);
    assert_eq!(FakeAuthApi::calls(&api.logout_calls), 2);
}
