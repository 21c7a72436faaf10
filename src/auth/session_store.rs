use log::{debug, info, warn};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, Notify, watch};

use super::session::{AuthFailure, ProfileFetchOutcome, SessionSnapshot, SignupOutcome};
use crate::api_clients::AuthApi;
use crate::constants::AUTH_TOKEN_KEY;
use crate::error::{AppError, AppResult};
use crate::models::{ProfileUpdate, Role, SignupRequest, User};
use crate::storage::KeyValueStore;

struct SessionState {
    snapshot: SessionSnapshot,
    // Bumped by every login, logout and invalidation. Profile responses
    // only commit when it still matches the value read at request time.
    generation: u64,
}

/// Single source of truth for the signed-in identity.
///
/// All mutations go through this type; consumers observe the result via
/// [`SessionStore::subscribe`] or [`SessionStore::snapshot`].
pub struct SessionStore {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn KeyValueStore>,
    profile_timeout: Duration,
    state: Mutex<SessionState>,
    persist_lock: AsyncMutex<()>,
    cancel_fetch: Notify,
    publisher: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    pub fn new(
        api: Arc<dyn AuthApi>,
        storage: Arc<dyn KeyValueStore>,
        profile_timeout: Duration,
    ) -> Self {
        let (publisher, _) = watch::channel(SessionSnapshot::initializing());
        Self {
            api,
            storage,
            profile_timeout,
            state: Mutex::new(SessionState {
                snapshot: SessionSnapshot::initializing(),
                generation: 0,
            }),
            persist_lock: AsyncMutex::new(()),
            cancel_fetch: Notify::new(),
            publisher,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.with_state(|state| state.snapshot.clone())
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.publisher.subscribe()
    }

    pub fn token(&self) -> Option<String> {
        self.with_state(|state| state.snapshot.token.clone())
    }

    pub fn current_user(&self) -> Option<User> {
        self.with_state(|state| state.snapshot.user.clone())
    }

    /// Restores the persisted session. Without a stored token the session
    /// resolves to anonymous right away; otherwise the token is held
    /// optimistically and validated with a profile fetch.
    pub async fn initialize(&self) -> SessionSnapshot {
        if let Some(token) = self.restore_token().await {
            self.fetch_profile(&token).await;
        }
        self.snapshot()
    }

    /// Loads the persisted token into the session without asking the
    /// server. The session stays unverified until a profile fetch; enough
    /// for logout, which must not wait on the network.
    pub async fn restore_token(&self) -> Option<String> {
        let generation = self.generation();

        let stored = match self.storage.get_item(AUTH_TOKEN_KEY).await {
            Ok(token) => token.filter(|token| !token.trim().is_empty()),
            Err(e) => {
                warn!("Failed to read persisted session token: {}. Starting signed out.", e);
                None
            }
        };

        match stored {
            None => {
                debug!("No persisted session token");
                self.commit_if_current(generation, |snapshot| {
                    *snapshot = SessionSnapshot::anonymous();
                });
                None
            }
            Some(token) => {
                info!("Restoring persisted session");
                let accepted = self.commit_if_current(generation, |snapshot| {
                    *snapshot = SessionSnapshot::unverified(token.clone());
                });
                accepted.then_some(token)
            }
        }
    }

    /// Exchanges `token` for the current profile.
    ///
    /// Bounded by the profile timeout and aborted by any logout or new
    /// credential exchange. A rejection (401/403) clears the session and
    /// the persisted token; any other failure keeps them.
    pub async fn fetch_profile(&self, token: &str) -> ProfileFetchOutcome {
        let generation = self.generation();
        let cancelled = self.cancel_fetch.notified();

        let result = tokio::select! {
            result = tokio::time::timeout(self.profile_timeout, self.api.fetch_profile(token)) => {
                result.unwrap_or_else(|_| {
                    Err(AppError::Timeout(format!(
                        "Profile check did not finish within {}s",
                        self.profile_timeout.as_secs_f32()
                    )))
                })
            }
            () = cancelled => {
                debug!("Profile fetch aborted by a newer session change");
                return ProfileFetchOutcome::Superseded;
            }
        };

        match result {
            Ok(user) => {
                let committed = self.commit_if_current(generation, |snapshot| {
                    *snapshot = SessionSnapshot::authenticated(token.to_string(), user.clone());
                });
                if committed {
                    info!("Session validated for {}", user.email);
                    ProfileFetchOutcome::Validated(user)
                } else {
                    debug!("Discarding stale profile response");
                    ProfileFetchOutcome::Superseded
                }
            }
            Err(e) if e.is_auth_rejection() => {
                if self.invalidate(generation, &e).await {
                    ProfileFetchOutcome::Invalidated
                } else {
                    ProfileFetchOutcome::Superseded
                }
            }
            Err(e) => {
                let message = e.to_string();
                let committed = self.commit_if_current(generation, |snapshot| {
                    snapshot.loading = false;
                    snapshot.last_error = Some(message);
                });
                if committed {
                    if e.is_transient() {
                        warn!("Server unreachable, keeping token for retry: {}", e);
                    } else {
                        warn!("Could not validate session, keeping token: {}", e);
                    }
                    ProfileFetchOutcome::Unavailable(e)
                } else {
                    ProfileFetchOutcome::Superseded
                }
            }
        }
    }

    /// Re-runs the profile check for the held token, typically after a
    /// transient failure.
    pub async fn retry_profile(&self) -> ProfileFetchOutcome {
        let token = self.with_state(|state| {
            let token = state.snapshot.token.clone();
            if token.is_some() {
                state.snapshot.loading = true;
            }
            token
        });

        match token {
            Some(token) => self.fetch_profile(&token).await,
            None => ProfileFetchOutcome::NoSession,
        }
    }

    /// Signs in with a claimed role. Expected failures come back as
    /// [`AuthFailure`] and leave the session untouched.
    pub async fn login(&self, email: &str, password: &str, role: Role) -> Result<User, AuthFailure> {
        info!("Signing in {} as {}", email, role);

        let response = self
            .api
            .login(email, password, role)
            .await
            .map_err(|e| {
                warn!("Login failed: {}", e);
                AuthFailure::from(e)
            })?;

        let token = response
            .token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                AuthFailure::from(AppError::InvalidResponse(
                    "Login response did not include a token".to_string(),
                ))
            })?;

        self.establish(token, response.user.clone()).await;
        Ok(response.user)
    }

    /// Registers a new account. A token in the response signs the user in
    /// like [`SessionStore::login`]; without one the account awaits
    /// approval and the session is left as it was.
    pub async fn signup(&self, request: &SignupRequest) -> Result<SignupOutcome, AuthFailure> {
        info!("Registering {}", request.email);

        let response = self.api.signup(request).await.map_err(|e| {
            warn!("Signup failed: {}", e);
            AuthFailure::from(e)
        })?;

        match response.token.filter(|token| !token.trim().is_empty()) {
            Some(token) => {
                self.establish(token, response.user.clone()).await;
                Ok(SignupOutcome::SignedIn(response.user))
            }
            None => {
                info!("Account {} created, awaiting approval", response.user.email);
                Ok(SignupOutcome::PendingApproval {
                    message: response.message.unwrap_or_else(|| {
                        "Registration successful. Your account is pending approval.".to_string()
                    }),
                    user: response.user,
                })
            }
        }
    }

    /// Clears the session locally and in storage, then tells the server.
    /// The server call is best-effort and never fails the logout. Calling
    /// it on an anonymous session is a no-op.
    pub async fn logout(&self) {
        let (token, generation) = self.with_state(|state| {
            let token = state.snapshot.token.take();
            state.generation += 1;
            state.snapshot = SessionSnapshot::anonymous();
            (token, state.generation)
        });
        self.cancel_fetch.notify_waiters();
        self.forget_token(generation).await;

        if let Some(token) = token {
            match self.api.logout(&token).await {
                Ok(()) => info!("Signed out"),
                Err(e) => warn!("Server-side logout failed (ignored): {}", e),
            }
        }
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> AppResult<User> {
        let (token, generation) =
            self.with_state(|state| (state.snapshot.token.clone(), state.generation));
        let token = token.ok_or_else(|| AppError::AuthError("Not signed in".to_string()))?;

        match self.api.update_profile(&token, update).await {
            Ok(user) => {
                self.commit_if_current(generation, |snapshot| {
                    *snapshot = SessionSnapshot::authenticated(token.clone(), user.clone());
                });
                Ok(user)
            }
            Err(e) if e.is_auth_rejection() => {
                self.invalidate(generation, &e).await;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let before = state.snapshot.clone();
        let result = f(&mut state);
        if state.snapshot != before {
            self.publisher.send_replace(state.snapshot.clone());
        }
        result
    }

    fn generation(&self) -> u64 {
        self.with_state(|state| state.generation)
    }

    fn commit_if_current(&self, generation: u64, f: impl FnOnce(&mut SessionSnapshot)) -> bool {
        self.with_state(|state| {
            if state.generation != generation {
                return false;
            }
            f(&mut state.snapshot);
            true
        })
    }

    async fn establish(&self, token: String, user: User) {
        let generation = self.with_state(|state| {
            state.generation += 1;
            state.snapshot = SessionSnapshot::authenticated(token.clone(), user);
            state.generation
        });
        self.cancel_fetch.notify_waiters();
        self.persist_token(generation, &token).await;
    }

    /// Drops a session the server refused. Returns false when a newer
    /// session change already replaced it.
    async fn invalidate(&self, generation: u64, reason: &AppError) -> bool {
        let cleared = self.with_state(|state| {
            if state.generation != generation {
                return None;
            }
            state.generation += 1;
            state.snapshot = SessionSnapshot::anonymous();
            Some(state.generation)
        });

        match cleared {
            Some(generation) => {
                warn!("Session token rejected by server: {}", reason);
                self.forget_token(generation).await;
                true
            }
            None => false,
        }
    }

    // Storage writes are serialized and skipped once a newer session
    // change happened, so storage always ends up matching the latest state.
    async fn persist_token(&self, generation: u64, token: &str) {
        let _guard = self.persist_lock.lock().await;
        if self.generation() != generation {
            debug!("Skipping token persistence for a superseded session");
            return;
        }
        if let Err(e) = self.storage.set_item(AUTH_TOKEN_KEY, token).await {
            warn!("Failed to persist session token: {}. Token only kept in memory.", e);
        }
    }

    async fn forget_token(&self, generation: u64) {
        let _guard = self.persist_lock.lock().await;
        if self.generation() != generation {
            return;
        }
        if let Err(e) = self.storage.remove_item(AUTH_TOKEN_KEY).await {
            warn!("Failed to remove persisted session token: {}", e);
        }
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("snapshot", &self.snapshot())
            .field("profile_timeout", &self.profile_timeout)
            .finish_non_exhaustive()
    }
}
