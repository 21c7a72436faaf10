use log::debug;
use std::env;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Process environment lookup, the default source for `RuntimeConfig`.
pub fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Resolve the first of `keys` that is set to a non-blank value.
///
/// Arguments:
/// * `lookup` - Source of variables (the process environment outside tests)
/// * `keys` - Variable names in priority order
pub fn first_set<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter().find_map(|key| {
        let value = lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(value) = &value {
            debug!("Environment variable {} resolved to: {}", key, value);
        }
        value
    })
}

/// Read a variable with fallback to a default value.
pub fn read_env<F>(lookup: &F, keys: &[&str], default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    first_set(lookup, keys).unwrap_or_else(|| default.to_string())
}

/// Read a whole number of seconds. Unparsable or zero values are a
/// configuration error rather than a silent fallback.
pub fn read_env_secs<F>(lookup: &F, key: &str, default: Duration) -> AppResult<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match first_set(lookup, &[key]) {
        None => Ok(default),
        Some(raw) => match raw.parse::<u64>() {
            Ok(0) => Err(AppError::ConfigError(format!("{key} must be greater than zero"))),
            Ok(secs) => Ok(Duration::from_secs(secs)),
            Err(e) => Err(AppError::ConfigError(format!(
                "{key} must be a whole number of seconds, got '{raw}': {e}"
            ))),
        },
    }
}
