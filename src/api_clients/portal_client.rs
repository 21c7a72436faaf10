use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::client_trait::AuthApi;
use super::error_handling::map_portal_error;
use crate::auth::header_utils;
use crate::error::{AppError, AppResult};
use crate::models::{
    Acknowledgement, AdminLoginRequest, AuthResponse, Complaint, GovernmentOfficial, LoginRequest,
    NewTown, NotificationFilter, NotificationList, OfficialPermissions, PasswordChange,
    ProfileResponse, ProfileUpdate, Role, SignupRequest, Town, TownChangeReceipt,
    TownChangeRequest, TownChangeSubmission, User, UserSummary,
};

/// Result of the backend reachability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Online,
    Offline,
}

/// Typed client for the portal REST API: one method per endpoint, with
/// transport, status and body handling written once.
#[derive(Debug, Clone)]
pub struct PortalApiClient {
    http: Client,
    base_url: String,
}

impl PortalApiClient {
    pub fn new(http: Client, base_url: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn transport_error(&self, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::Timeout(format!("No response from {} in time", self.base_url))
        } else if err.is_connect() {
            AppError::NetworkError(format!(
                "Cannot connect to the server at {}. Please ensure the backend is running.",
                self.base_url
            ))
        } else {
            AppError::from(err)
        }
    }

    fn build(
        &self,
        method: Method,
        endpoint: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> AppResult<RequestBuilder> {
        let mut request_builder = self.http.request(method, self.url(endpoint));

        if let Some(token) = token {
            request_builder = header_utils::apply_auth_headers(request_builder, token)?;
        }

        if let Some(body_data) = body {
            request_builder = request_builder.json(&body_data);
        }

        Ok(request_builder)
    }

    async fn execute(&self, request_builder: RequestBuilder) -> AppResult<(StatusCode, String)> {
        let response = request_builder
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                AppError::InvalidResponse(format!("Failed to read response body: {e}"))
            }
        })?;

        if !status.is_success() {
            return Err(map_portal_error(status.as_u16(), &text));
        }
        Ok((status, text))
    }

    /// Internal helper for requests that answer with a JSON body.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> AppResult<T> {
        debug!("{} {}", method, endpoint);
        let request_builder = self.build(method, endpoint, token, body)?;
        let (_, text) = self.execute(request_builder).await?;

        if text.trim().is_empty() {
            return Err(AppError::InvalidResponse("Empty response from server".to_string()));
        }
        serde_json::from_str(&text).map_err(|e| {
            warn!("Unparseable response from {}: {}", endpoint, e);
            AppError::InvalidResponse(format!("Invalid response from server: {e}"))
        })
    }

    /// Internal helper for requests whose body is irrelevant.
    async fn request_no_content(
        &self,
        method: Method,
        endpoint: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> AppResult<()> {
        debug!("{} {}", method, endpoint);
        let request_builder = self.build(method, endpoint, token, body)?;
        self.execute(request_builder).await?;
        Ok(())
    }

    fn to_body<B: Serialize>(body: &B) -> AppResult<Value> {
        serde_json::to_value(body)
            .map_err(|e| AppError::InvalidArgument(format!("Failed to encode request body: {e}")))
    }

    // ------------------------------------------------------------------
    // Connectivity
    // ------------------------------------------------------------------

    /// Probes the admin login endpoint with `OPTIONS`. 200 or 405 means the
    /// API answered; anything else, or no answer, is offline.
    pub async fn check_connection(&self) -> BackendStatus {
        let result = self
            .http
            .request(Method::OPTIONS, self.url("/auth/admin-login/"))
            .send()
            .await;

        match result {
            Ok(response)
                if response.status() == StatusCode::OK
                    || response.status() == StatusCode::METHOD_NOT_ALLOWED =>
            {
                info!("Backend API is reachable at {}", self.base_url);
                BackendStatus::Online
            }
            Ok(response) => {
                warn!("Backend probe answered {}", response.status());
                BackendStatus::Offline
            }
            Err(e) => {
                warn!("Backend API may not be running at {}: {}", self.base_url, e);
                BackendStatus::Offline
            }
        }
    }

    // ------------------------------------------------------------------
    // Account
    // ------------------------------------------------------------------

    /// Changes the password of the signed-in user. The form is checked
    /// locally before anything is sent.
    pub async fn change_password(
        &self,
        token: &str,
        change: &PasswordChange,
    ) -> AppResult<Acknowledgement> {
        change.validate()?;
        info!("Changing account password");
        self.request(
            Method::POST,
            "/auth/change-password/",
            Some(token),
            Some(Self::to_body(change)?),
        )
        .await
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    pub async fn list_all_users(&self, token: &str) -> AppResult<Vec<UserSummary>> {
        self.request(Method::GET, "/auth/all-users/", Some(token), None).await
    }

    pub async fn list_pending_users(&self, token: &str) -> AppResult<Vec<UserSummary>> {
        self.request(Method::GET, "/auth/pending-users/", Some(token), None).await
    }

    pub async fn approve_user(&self, token: &str, user_id: i64) -> AppResult<Acknowledgement> {
        info!("Approving user {}", user_id);
        self.request(Method::POST, &format!("/auth/approve-user/{user_id}/"), Some(token), None)
            .await
    }

    pub async fn reject_user(&self, token: &str, user_id: i64) -> AppResult<Acknowledgement> {
        info!("Rejecting user {}", user_id);
        self.request(Method::POST, &format!("/auth/reject-user/{user_id}/"), Some(token), None)
            .await
    }

    pub async fn list_officials(&self, token: &str) -> AppResult<Vec<GovernmentOfficial>> {
        self.request(Method::GET, "/government/officials/", Some(token), None).await
    }

    pub async fn update_official_permissions(
        &self,
        token: &str,
        official_id: i64,
        permissions: OfficialPermissions,
    ) -> AppResult<()> {
        self.request_no_content(
            Method::PUT,
            &format!("/government/officials/{official_id}/permissions/"),
            Some(token),
            Some(Self::to_body(&permissions)?),
        )
        .await
    }

    // ------------------------------------------------------------------
    // Towns
    // ------------------------------------------------------------------

    /// Public listing, no credential needed.
    pub async fn active_towns(&self) -> AppResult<Vec<Town>> {
        self.request(Method::GET, "/towns/active/", None, None).await
    }

    pub async fn create_town(&self, token: &str, town: &NewTown) -> AppResult<()> {
        if town.name.is_empty() || town.state.is_empty() {
            return Err(AppError::ValidationError(
                "Town name and state are required".to_string(),
            ));
        }
        self.request_no_content(
            Method::POST,
            "/towns/active/",
            Some(token),
            Some(Self::to_body(town)?),
        )
        .await
    }

    pub async fn submit_town_change(
        &self,
        token: &str,
        submission: &TownChangeSubmission,
    ) -> AppResult<TownChangeReceipt> {
        if submission.billing_address.trim().is_empty() {
            return Err(AppError::ValidationError(
                "New town and billing address are required".to_string(),
            ));
        }
        info!("Requesting move to town {}", submission.requested_town_id);
        self.request(
            Method::POST,
            "/towns/change-request/",
            Some(token),
            Some(Self::to_body(submission)?),
        )
        .await
    }

    pub async fn town_change_requests(&self, token: &str) -> AppResult<Vec<TownChangeRequest>> {
        self.request(Method::GET, "/towns/change-requests/", Some(token), None).await
    }

    pub async fn approve_town_change(&self, token: &str, request_id: i64) -> AppResult<()> {
        self.request_no_content(
            Method::POST,
            &format!("/towns/change-request/{request_id}/approve/"),
            Some(token),
            None,
        )
        .await
    }

    pub async fn reject_town_change(&self, token: &str, request_id: i64, reason: &str) -> AppResult<()> {
        self.request_no_content(
            Method::POST,
            &format!("/towns/change-request/{request_id}/reject/"),
            Some(token),
            Some(json!({ "reason": reason })),
        )
        .await
    }

    // ------------------------------------------------------------------
    // Citizen portal
    // ------------------------------------------------------------------

    pub async fn notifications(
        &self,
        token: &str,
        filter: NotificationFilter,
    ) -> AppResult<NotificationList> {
        let endpoint = match filter.is_read {
            Some(is_read) => format!("/citizen/notifications/?is_read={is_read}"),
            None => "/citizen/notifications/".to_string(),
        };
        self.request(Method::GET, &endpoint, Some(token), None).await
    }

    pub async fn mark_notification_read(&self, token: &str, notification_id: i64) -> AppResult<()> {
        self.request_no_content(
            Method::PATCH,
            &format!("/citizen/notifications/{notification_id}/"),
            Some(token),
            Some(json!({ "is_read": true })),
        )
        .await
    }

    pub async fn complaints(&self, token: &str) -> AppResult<Vec<Complaint>> {
        self.request(Method::GET, "/citizen/complaints/", Some(token), None).await
    }
}

#[async_trait]
impl AuthApi for PortalApiClient {
    async fn login(&self, email: &str, password: &str, user_type: Role) -> AppResult<AuthResponse> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            user_type,
        };
        self.request(Method::POST, "/auth/login/", None, Some(Self::to_body(&body)?))
            .await
    }

    async fn signup(&self, request: &SignupRequest) -> AppResult<AuthResponse> {
        self.request(Method::POST, "/auth/signup/", None, Some(Self::to_body(request)?))
            .await
    }

    async fn fetch_profile(&self, token: &str) -> AppResult<User> {
        let profile: ProfileResponse =
            self.request(Method::GET, "/auth/users/me/", Some(token), None).await?;
        Ok(profile.user)
    }

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> AppResult<User> {
        let profile: ProfileResponse = self
            .request(
                Method::PATCH,
                "/auth/users/me/",
                Some(token),
                Some(Self::to_body(update)?),
            )
            .await?;
        Ok(profile.user)
    }

    async fn logout(&self, token: &str) -> AppResult<()> {
        self.request_no_content(Method::POST, "/auth/logout/", Some(token), None)
            .await
    }

    async fn admin_login(&self, email: &str, password: &str) -> AppResult<AuthResponse> {
        let body = AdminLoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.request(Method::POST, "/auth/admin-login/", None, Some(Self::to_body(&body)?))
            .await
    }
}
