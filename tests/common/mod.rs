#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Map;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

use townhall_portal::api_clients::AuthApi;
use townhall_portal::auth::{AdminSessionStore, SessionStore};
use townhall_portal::error::{AppError, AppResult};
use townhall_portal::models::{AuthResponse, ProfileUpdate, Role, SignupRequest, User};
use townhall_portal::storage::{KeyValueStore, MemoryStore};

pub const TEST_PROFILE_TIMEOUT: Duration = Duration::from_secs(5);

pub fn user(id: i64, email: &str, role: Role) -> User {
    User {
        id,
        email: email.to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        role: Some(role),
        phone_number: None,
        is_superuser: None,
        extra: Map::new(),
    }
}

pub fn admin_user(id: i64, email: &str) -> User {
    User {
        role: None,
        is_superuser: Some(true),
        ..user(id, email, Role::Government)
    }
}

pub fn auth_response(token: Option<&str>, user: User) -> AuthResponse {
    AuthResponse {
        token: token.map(str::to_string),
        user,
        message: None,
    }
}

/// Scripted `AuthApi`. Profile answers are queued; when gated, each
/// profile call waits for a permit before answering.
#[derive(Default)]
pub struct FakeAuthApi {
    login: Mutex<Option<AppResult<AuthResponse>>>,
    signup: Mutex<Option<AppResult<AuthResponse>>>,
    admin_login: Mutex<Option<AppResult<AuthResponse>>>,
    profiles: Mutex<VecDeque<AppResult<User>>>,
    logout_error: Mutex<Option<AppError>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    pub login_calls: AtomicUsize,
    pub signup_calls: AtomicUsize,
    pub admin_login_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
}

impl FakeAuthApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on_login(&self, result: AppResult<AuthResponse>) {
        *self.login.lock().unwrap() = Some(result);
    }

    pub fn on_signup(&self, result: AppResult<AuthResponse>) {
        *self.signup.lock().unwrap() = Some(result);
    }

    pub fn on_admin_login(&self, result: AppResult<AuthResponse>) {
        *self.admin_login.lock().unwrap() = Some(result);
    }

    pub fn push_profile(&self, result: AppResult<User>) {
        self.profiles.lock().unwrap().push_back(result);
    }

    pub fn fail_logout(&self, error: AppError) {
        *self.logout_error.lock().unwrap() = Some(error);
    }

    /// Holds every following profile call until `release_profile` is
    /// called once per call.
    pub fn gate_profiles(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_profile(&self) {
        if let Some(gate) = self.gate.lock().unwrap().as_ref() {
            gate.add_permits(1);
        }
    }

    pub fn total_calls(&self) -> usize {
        [
            &self.login_calls,
            &self.signup_calls,
            &self.admin_login_calls,
            &self.profile_calls,
            &self.update_calls,
            &self.logout_calls,
        ]
        .iter()
        .map(|counter| counter.load(Ordering::SeqCst))
        .sum()
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

fn unscripted(endpoint: &str) -> AppError {
    AppError::InternalError(format!("no scripted answer for {endpoint}"))
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn login(&self, _email: &str, _password: &str, _user_type: Role) -> AppResult<AuthResponse> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.login
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(unscripted("login")))
    }

    async fn signup(&self, _request: &SignupRequest) -> AppResult<AuthResponse> {
        self.signup_calls.fetch_add(1, Ordering::SeqCst);
        self.signup
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(unscripted("signup")))
    }

    async fn fetch_profile(&self, _token: &str) -> AppResult<User> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
        self.profiles
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("profile")))
    }

    async fn update_profile(&self, _token: &str, update: &ProfileUpdate) -> AppResult<User> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut updated = self
            .profiles
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("update_profile")))?;
        if let Some(first_name) = &update.first_name {
            updated.first_name.clone_from(first_name);
        }
        Ok(updated)
    }

    async fn logout(&self, _token: &str) -> AppResult<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        match self.logout_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn admin_login(&self, _email: &str, _password: &str) -> AppResult<AuthResponse> {
        self.admin_login_calls.fetch_add(1, Ordering::SeqCst);
        self.admin_login
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(unscripted("admin_login")))
    }
}

pub fn memory_storage() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

pub fn session_store(
    api: &Arc<FakeAuthApi>,
    storage: &Arc<MemoryStore>,
    profile_timeout: Duration,
) -> SessionStore {
    SessionStore::new(
        Arc::clone(api) as Arc<dyn AuthApi>,
        Arc::clone(storage) as Arc<dyn KeyValueStore>,
        profile_timeout,
    )
}

pub fn admin_store(api: &Arc<FakeAuthApi>, storage: &Arc<MemoryStore>) -> AdminSessionStore {
    AdminSessionStore::new(
        Arc::clone(api) as Arc<dyn AuthApi>,
        Arc::clone(storage) as Arc<dyn KeyValueStore>,
        TEST_PROFILE_TIMEOUT,
    )
}

/// Lets spawned tasks run until `condition` holds.
pub async fn until(condition: impl Fn() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached");
}
