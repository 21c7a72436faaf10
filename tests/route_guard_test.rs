mod common;

use std::sync::Arc;

use common::{
    FakeAuthApi, TEST_PROFILE_TIMEOUT, admin_user, auth_response, memory_storage, session_store,
    until, user,
};
use townhall_portal::auth::{GuardDecision, RouteGuard, SessionSnapshot};
use townhall_portal::constants::AUTH_TOKEN_KEY;
use townhall_portal::models::Role;
use townhall_portal::storage::KeyValueStore;

fn signed_in(role: Role) -> SessionSnapshot {
    SessionSnapshot::authenticated("tok".into(), user(1, "someone@example.org", role))
}

#[test]
fn test_allowed_role_is_authorized() {
    let guard = RouteGuard::new([Role::Citizen, Role::Business]);

    assert_eq!(guard.evaluate(&signed_in(Role::Citizen)), GuardDecision::Authorized);
    assert_eq!(guard.evaluate(&signed_in(Role::Business)), GuardDecision::Authorized);
}

#[test]
fn test_wrong_role_goes_to_own_portal() {
    let guard = RouteGuard::new([Role::Government]);

    assert_eq!(
        guard.evaluate(&signed_in(Role::Citizen)),
        GuardDecision::Redirect("/citizen".into())
    );
    assert_eq!(
        guard.evaluate(&signed_in(Role::Business)),
        GuardDecision::Redirect("/business".into())
    );

    let mut roleless = user(2, "norole@example.org", Role::Citizen);
    roleless.role = None;
    let snapshot = SessionSnapshot::authenticated("tok".into(), roleless);
    assert_eq!(guard.evaluate(&snapshot), GuardDecision::Redirect("/".into()));
}

#[test]
fn test_superuser_passes_every_guard() {
    let snapshot = SessionSnapshot::authenticated("tok".into(), admin_user(3, "root@example.org"));

    for role in [Role::Citizen, Role::Business, Role::Government] {
        assert_eq!(RouteGuard::new([role]).evaluate(&snapshot), GuardDecision::Authorized);
    }
}

#[test]
fn test_anonymous_goes_to_login() {
    let anonymous = SessionSnapshot::anonymous();

    assert_eq!(
        RouteGuard::any_authenticated().evaluate(&anonymous),
        GuardDecision::Redirect("/login".into())
    );
    assert_eq!(
        RouteGuard::new([Role::Business])
            .with_redirect("/business/login")
            .evaluate(&anonymous),
        GuardDecision::Redirect("/business/login".into())
    );
}

#[tokio::test]
async fn test_resolve_waits_for_initialization() {
    let api = FakeAuthApi::new();
    let storage = memory_storage();
    storage.set_item(AUTH_TOKEN_KEY, "tok").await.unwrap();
    api.gate_profiles();
    api.push_profile(Ok(user(4, "jo@example.org", Role::Citizen)));
    let store = Arc::new(session_store(&api, &storage, TEST_PROFILE_TIMEOUT));
    let guard = RouteGuard::new([Role::Citizen]);

    let init = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.initialize().await }
    });
    until(|| FakeAuthApi::calls(&api.profile_calls) == 1).await;
    assert_eq!(guard.evaluate(&store.snapshot()), GuardDecision::Pending);

    let waiting = tokio::spawn({
        let guard = guard.clone();
        let mut updates = store.subscribe();
        async move { guard.resolve(&mut updates).await }
    });
    api.release_profile();

    assert_eq!(waiting.await.unwrap(), GuardDecision::Authorized);
    init.await.unwrap();
}

#[tokio::test]
async fn test_guard_follows_logout() {
    let api = FakeAuthApi::new();
    let storage = memory_storage();
    api.on_login(Ok(auth_response(
        Some("tok"),
        user(5, "kim@example.org", Role::Business),
    )));
    let store = session_store(&api, &storage, TEST_PROFILE_TIMEOUT);
    store.initialize().await;
    let guard = RouteGuard::new([Role::Business]);
    let mut updates = store.subscribe();

    store.login("kim@example.org", "pw", Role::Business).await.unwrap();
    assert_eq!(guard.resolve(&mut updates).await, GuardDecision::Authorized);

    store.logout().await;
    assert_eq!(
        guard.resolve(&mut updates).await,
        GuardDecision::Redirect("/login".into())
    );
}
