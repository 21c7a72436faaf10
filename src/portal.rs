use log::info;
use std::sync::Arc;

use crate::api_clients::{AuthApi, PortalApiClient, create_portal_client};
use crate::auth::{
    AdminRouteGuard, AdminSessionStore, GuardDecision, RouteAccess, SessionStore, route_access,
};
use crate::config::RuntimeConfig;
use crate::error::{AppError, AppResult};
use crate::storage::{KeyValueStore, open_store};

/// Application-level state handed to every consumer: one client, one
/// session store, one admin store, all sharing the same durable storage.
#[derive(Debug)]
pub struct PortalState {
    pub config: RuntimeConfig,
    pub client: Arc<PortalApiClient>,
    pub session: Arc<SessionStore>,
    pub admin: Arc<AdminSessionStore>,
    pub storage: Arc<dyn KeyValueStore>,
}

impl PortalState {
    pub fn from_config(config: RuntimeConfig) -> AppResult<Self> {
        let client = Arc::new(create_portal_client(&config)?);
        let storage = open_store(&config)?;
        Ok(Self::with_parts(config, client, storage))
    }

    pub fn with_parts(
        config: RuntimeConfig,
        client: Arc<PortalApiClient>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let api: Arc<dyn AuthApi> = Arc::clone(&client) as Arc<dyn AuthApi>;
        let session = Arc::new(SessionStore::new(
            Arc::clone(&api),
            Arc::clone(&storage),
            config.profile_timeout,
        ));
        let admin = Arc::new(AdminSessionStore::new(
            api,
            Arc::clone(&storage),
            config.profile_timeout,
        ));
        info!("Portal state ready for {}", client.base_url());

        Self {
            config,
            client,
            session,
            admin,
            storage,
        }
    }

    /// Decision for navigating to `path`, waiting for the session to resolve
    /// when the route needs it. Admin routes get a fresh guard, i.e. a
    /// fresh read of storage.
    pub async fn visit(&self, path: &str) -> GuardDecision {
        match route_access(path) {
            RouteAccess::Public => GuardDecision::Authorized,
            RouteAccess::Session(guard) => guard.resolve(&mut self.session.subscribe()).await,
            RouteAccess::Admin => AdminRouteGuard::new().mount(&self.admin).await,
        }
    }

    /// Token of the primary session, or an auth error for commands that
    /// need one.
    pub fn require_token(&self) -> AppResult<String> {
        self.session
            .token()
            .ok_or_else(|| AppError::AuthError("Not signed in. Run `login` first.".to_string()))
    }
}
