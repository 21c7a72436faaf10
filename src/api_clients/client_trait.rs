use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{AuthResponse, ProfileUpdate, Role, SignupRequest, User};

/// Auth endpoints the session stores depend on.
///
/// `PortalApiClient` is the production implementation; the stores only
/// see this trait so their lifecycle can be driven without a server.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login/` with the claimed role.
    async fn login(&self, email: &str, password: &str, user_type: Role) -> AppResult<AuthResponse>;

    /// `POST /auth/signup/`. The response carries a token only when the
    /// account is usable immediately.
    async fn signup(&self, request: &SignupRequest) -> AppResult<AuthResponse>;

    /// `GET /auth/users/me/`. 401/403 surface as auth-rejection errors.
    async fn fetch_profile(&self, token: &str) -> AppResult<User>;

    /// `PATCH /auth/users/me/`.
    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> AppResult<User>;

    /// `POST /auth/logout/`. Callers treat failures as best-effort.
    async fn logout(&self, token: &str) -> AppResult<()>;

    /// `POST /auth/admin-login/`.
    async fn admin_login(&self, email: &str, password: &str) -> AppResult<AuthResponse>;
}
