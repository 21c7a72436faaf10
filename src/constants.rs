use std::time::Duration;

// Default fallback URL for the portal API. Prefer environment variables.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

// Environment variables
pub const ENV_API_URL: &str = "TOWNHALL_API_URL";
pub const ENV_API_URL_COMPAT: &str = "NEXT_PUBLIC_API_URL";
pub const ENV_PROFILE_TIMEOUT_SECS: &str = "TOWNHALL_PROFILE_TIMEOUT_SECS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "TOWNHALL_REQUEST_TIMEOUT_SECS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "TOWNHALL_CONNECT_TIMEOUT_SECS";
pub const ENV_STORAGE_BACKEND: &str = "TOWNHALL_STORAGE";
pub const ENV_STORAGE_DIR: &str = "TOWNHALL_STORAGE_DIR";

// Timeouts
pub const DEFAULT_PROFILE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// Persisted key/value entries. Primary and admin credentials never share a key.
pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const ADMIN_TOKEN_KEY: &str = "admin_token";
pub const ADMIN_USER_KEY: &str = "admin_user";

// Durable storage locations
pub const STORAGE_DIR_NAME: &str = "townhall-portal";
pub const STORAGE_FILE_NAME: &str = "portal_store.json";
pub const KEYRING_SERVICE_NAME: &str = "townhall-portal";

// Authorization header scheme used by the backend's token authentication
pub const AUTH_SCHEME: &str = "Token";
pub const MIN_PASSWORD_LENGTH: usize = 8;

// Portal routes
pub const LOGIN_ROUTE: &str = "/login";
pub const ADMIN_ENTRY_ROUTE: &str = "/admin";
pub const HOME_ROUTE: &str = "/";
pub const CITIZEN_ROUTE: &str = "/citizen";
pub const BUSINESS_ROUTE: &str = "/business";
pub const GOVERNMENT_ROUTE: &str = "/government";
