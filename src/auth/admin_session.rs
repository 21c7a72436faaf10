use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::session::{AuthFailure, FailureKind};
use crate::api_clients::AuthApi;
use crate::constants::{ADMIN_TOKEN_KEY, ADMIN_USER_KEY};
use crate::error::AppError;
use crate::models::{Role, User};
use crate::storage::KeyValueStore;

/// Admin token and profile as persisted by a successful admin login.
#[derive(Clone, PartialEq)]
pub struct AdminCredentials {
    pub token: String,
    pub user: User,
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("token", &"<redacted>")
            .field("user", &self.user.email)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdminVerification {
    Verified(User),
    /// Server refused the token or explicitly reported lost superuser rights;
    /// stored admin credentials were cleared.
    Revoked,
    /// Could not reach a verdict; credentials kept.
    Unavailable(AppError),
    NotSignedIn,
}

/// Admin credentials, kept apart from the primary session under their
/// own storage keys.
///
/// State lives only in storage, so every reader (route guard, CLI
/// command) sees what the last login or logout wrote.
pub struct AdminSessionStore {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn KeyValueStore>,
    profile_timeout: Duration,
}

impl AdminSessionStore {
    pub fn new(
        api: Arc<dyn AuthApi>,
        storage: Arc<dyn KeyValueStore>,
        profile_timeout: Duration,
    ) -> Self {
        Self {
            api,
            storage,
            profile_timeout,
        }
    }

    /// Signs in at the admin endpoint and stores token and profile. Only
    /// superuser accounts are accepted.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthFailure> {
        info!("Admin sign-in for {}", email);

        let response = self.api.admin_login(email, password).await.map_err(|e| {
            warn!("Admin login failed: {}", e);
            AuthFailure::from(e)
        })?;

        let token = response
            .token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                AuthFailure::from(AppError::InvalidResponse(
                    "Admin login response did not include a token".to_string(),
                ))
            })?;

        if !response.user.is_superuser() {
            warn!("Admin login refused for non-superuser {}", response.user.email);
            return Err(AuthFailure::new(
                FailureKind::Forbidden,
                "Access denied. Admin access required.",
            ));
        }

        let user_json = serde_json::to_string(&response.user).map_err(AppError::from)?;

        self.storage.set_item(ADMIN_TOKEN_KEY, &token).await?;
        if let Err(e) = self.storage.set_item(ADMIN_USER_KEY, &user_json).await {
            // Never leave a token without its profile
            self.clear().await;
            return Err(AuthFailure::from(e));
        }

        info!("Admin session stored for {}", response.user.email);
        Ok(response.user)
    }

    /// Both admin entries are present. Reads storage only.
    pub async fn has_credentials(&self) -> bool {
        self.read(ADMIN_TOKEN_KEY).await.is_some() && self.read(ADMIN_USER_KEY).await.is_some()
    }

    pub async fn credentials(&self) -> Option<AdminCredentials> {
        let token = self.read(ADMIN_TOKEN_KEY).await?;
        let user_json = self.read(ADMIN_USER_KEY).await?;

        match serde_json::from_str::<User>(&user_json) {
            Ok(user) => Some(AdminCredentials { token, user }),
            Err(e) => {
                warn!("Stored admin profile is unreadable: {}", e);
                None
            }
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.read(ADMIN_TOKEN_KEY).await
    }

    /// Checks the stored admin token against the profile endpoint, with the
    /// same timeout and rejection handling as the primary session. A 2xx
    /// profile proves the token; the superuser flag recorded at admin login
    /// is kept unless the server explicitly reports it as false.
    pub async fn verify(&self) -> AdminVerification {
        let Some(credentials) = self.credentials().await else {
            return AdminVerification::NotSignedIn;
        };

        let result = tokio::time::timeout(
            self.profile_timeout,
            self.api.fetch_profile(&credentials.token),
        )
        .await
        .unwrap_or_else(|_| {
            Err(AppError::Timeout(format!(
                "Admin verification did not finish within {}s",
                self.profile_timeout.as_secs_f32()
            )))
        });

        match result {
            Ok(user)
                if user.is_superuser == Some(false) && user.role != Some(Role::Superuser) =>
            {
                warn!("{} no longer holds admin rights, clearing admin session", user.email);
                self.clear().await;
                AdminVerification::Revoked
            }
            Ok(mut user) => {
                user.is_superuser = user.is_superuser.or(credentials.user.is_superuser);
                match serde_json::to_string(&user) {
                    Ok(user_json) => {
                        if let Err(e) = self.storage.set_item(ADMIN_USER_KEY, &user_json).await {
                            warn!("Failed to refresh stored admin profile: {}", e);
                        }
                    }
                    Err(e) => warn!("Failed to encode admin profile: {}", e),
                }
                debug!("Admin session verified for {}", user.email);
                AdminVerification::Verified(user)
            }
            Err(e) if e.is_auth_rejection() => {
                warn!("Admin token rejected by server: {}", e);
                self.clear().await;
                AdminVerification::Revoked
            }
            Err(e) => {
                warn!("Could not verify admin session: {}", e);
                AdminVerification::Unavailable(e)
            }
        }
    }

    /// Clears both admin entries, then notifies the server best-effort.
    pub async fn logout(&self) {
        let token = self.token().await;
        self.clear().await;

        if let Some(token) = token {
            match self.api.logout(&token).await {
                Ok(()) => info!("Admin signed out"),
                Err(e) => warn!("Server-side admin logout failed (ignored): {}", e),
            }
        }
    }

    async fn clear(&self) {
        for key in [ADMIN_TOKEN_KEY, ADMIN_USER_KEY] {
            if let Err(e) = self.storage.remove_item(key).await {
                warn!("Failed to remove {} from storage: {}", key, e);
            }
        }
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.storage.get_item(key).await {
            Ok(value) => value.filter(|value| !value.trim().is_empty()),
            Err(e) => {
                warn!("Failed to read {} from storage: {}", key, e);
                None
            }
        }
    }
}

impl fmt::Debug for AdminSessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSessionStore")
            .field("storage", &self.storage)
            .field("profile_timeout", &self.profile_timeout)
            .finish_non_exhaustive()
    }
}
