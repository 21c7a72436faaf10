use log::info;
use reqwest::Client;

use crate::config::RuntimeConfig;
use crate::error::{AppError, AppResult};

use super::portal_client::PortalApiClient;

/// Shared reqwest client with the configured connect and request timeouts.
pub fn create_http_client(config: &RuntimeConfig) -> AppResult<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(concat!("townhall-portal/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::InitializationError(format!("Failed to build HTTP client: {e}")))
}

/// Create the typed portal API client for the configured base URL.
pub fn create_portal_client(config: &RuntimeConfig) -> AppResult<PortalApiClient> {
    info!("Creating PortalApiClient for {}", config.api_base_url);
    let http = create_http_client(config)?;
    Ok(PortalApiClient::new(http, config.api_base_url.clone()))
}
