use log::info;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PROFILE_TIMEOUT,
    DEFAULT_REQUEST_TIMEOUT, ENV_API_URL, ENV_API_URL_COMPAT, ENV_CONNECT_TIMEOUT_SECS,
    ENV_PROFILE_TIMEOUT_SECS, ENV_REQUEST_TIMEOUT_SECS, ENV_STORAGE_BACKEND, ENV_STORAGE_DIR,
    STORAGE_DIR_NAME,
};
use crate::error::{AppError, AppResult};
use crate::utils::env_utils::{first_set, process_env, read_env, read_env_secs};

/// Where session credentials are persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Keyring,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "keyring" => Ok(Self::Keyring),
            "memory" => Ok(Self::Memory),
            other => Err(AppError::ConfigError(format!(
                "Unknown storage backend '{other}' (expected file, keyring or memory)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub api_base_url: String,
    pub profile_timeout: Duration,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub storage_backend: StorageBackend,
    pub storage_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            profile_timeout: DEFAULT_PROFILE_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            storage_backend: StorageBackend::File,
            storage_dir: None,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup<F>(lookup: &F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = normalize_base_url(&read_env(
            lookup,
            &[ENV_API_URL, ENV_API_URL_COMPAT],
            DEFAULT_API_BASE_URL,
        ))?;

        let storage_backend = match first_set(lookup, &[ENV_STORAGE_BACKEND]) {
            Some(raw) => raw.parse()?,
            None => StorageBackend::File,
        };

        let config = Self {
            api_base_url,
            profile_timeout: read_env_secs(lookup, ENV_PROFILE_TIMEOUT_SECS, DEFAULT_PROFILE_TIMEOUT)?,
            request_timeout: read_env_secs(lookup, ENV_REQUEST_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT)?,
            connect_timeout: read_env_secs(lookup, ENV_CONNECT_TIMEOUT_SECS, DEFAULT_CONNECT_TIMEOUT)?,
            storage_backend,
            storage_dir: first_set(lookup, &[ENV_STORAGE_DIR]).map(PathBuf::from),
        };

        info!(
            "Portal API base URL: {} (storage: {:?})",
            config.api_base_url, config.storage_backend
        );
        Ok(config)
    }

    /// Directory for the file store: explicit override, else the platform
    /// local data directory.
    pub fn resolve_storage_dir(&self) -> AppResult<PathBuf> {
        if let Some(dir) = &self.storage_dir {
            return Ok(dir.clone());
        }
        dirs::data_local_dir()
            .map(|dir| dir.join(STORAGE_DIR_NAME))
            .ok_or_else(|| {
                AppError::ConfigError(format!(
                    "No local data directory on this platform; set {ENV_STORAGE_DIR}"
                ))
            })
    }
}

/// Validates an http(s) base URL and strips trailing slashes so endpoint
/// paths can be appended verbatim.
pub fn normalize_base_url(raw: &str) -> AppResult<String> {
    let parsed = Url::parse(raw.trim())?;
    match parsed.scheme() {
        "http" | "https" => Ok(raw.trim().trim_end_matches('/').to_string()),
        other => Err(AppError::ConfigError(format!(
            "API base URL must use http or https, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppResult<RuntimeConfig> {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        RuntimeConfig::from_lookup(&|key: &str| map.get(key).map(|v| (*v).to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8000/api");
        assert_eq!(config.profile_timeout, Duration::from_secs(10));
        assert_eq!(config.storage_backend, StorageBackend::File);
    }

    #[test]
    fn test_compat_variable_and_trailing_slash() {
        let config = config_from(&[("NEXT_PUBLIC_API_URL", "https://town.example.org/api/")]).unwrap();
        assert_eq!(config.api_base_url, "https://town.example.org/api");

        let config = config_from(&[
            ("TOWNHALL_API_URL", "http://primary:9000/api"),
            ("NEXT_PUBLIC_API_URL", "http://ignored/api"),
        ])
        .unwrap();
        assert_eq!(config.api_base_url, "http://primary:9000/api");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config_from(&[("TOWNHALL_API_URL", "ftp://files")]),
            Err(AppError::ConfigError(_))
        ));
        assert!(matches!(
            config_from(&[("TOWNHALL_STORAGE", "cloud")]),
            Err(AppError::ConfigError(_))
        ));
        assert!(matches!(
            config_from(&[("TOWNHALL_PROFILE_TIMEOUT_SECS", "soon")]),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn test_storage_dir_override() {
        let config = config_from(&[("TOWNHALL_STORAGE", "memory"), ("TOWNHALL_STORAGE_DIR", "/tmp/x")]).unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.resolve_storage_dir().unwrap(), PathBuf::from("/tmp/x"));
    }
}
