use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::FieldErrors;

#[derive(Error, Debug, Serialize, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serde JSON error: {0}")]
    SerdeError(String),

    #[error("HTTP client error: {0}")]
    HttpError(String),

    #[error("Keyring error: {0}")]
    KeyringError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String, details: FieldErrors },

    #[error("Not found: {0}")]
    NotFoundError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Account pending approval: {0}")]
    PendingApproval(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl AppError {
    /// The server refused the credential itself (401/403 class).
    pub const fn is_auth_rejection(&self) -> bool {
        matches!(
            self,
            Self::AuthError(_) | Self::AccessDenied(_) | Self::PendingApproval(_)
        )
    }

    /// Connectivity problems and unreadable responses. These never
    /// invalidate a session.
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NetworkError(_) | Self::Timeout(_) | Self::InvalidResponse(_) | Self::HttpError(_)
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerdeError(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            Self::NetworkError(err.to_string())
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<keyring::Error> for AppError {
    fn from(err: keyring::Error) -> Self {
        Self::KeyringError(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

// A serializable version of AppError for UI surfaces
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SerializableError {
    pub code: String,
    pub message: String,
    pub details: Option<FieldErrors>,
}

impl From<AppError> for SerializableError {
    fn from(error: AppError) -> Self {
        let code = match &error {
            AppError::IoError(_) => "IO_ERROR",
            AppError::SerdeError(_) => "SERDE_ERROR",
            AppError::HttpError(_) => "HTTP_ERROR",
            AppError::KeyringError(_) => "KEYRING_ERROR",
            AppError::ConfigError(_) => "CONFIG_ERROR",
            AppError::ValidationError(_) | AppError::ValidationFailed { .. } => "VALIDATION_ERROR",
            AppError::NotFoundError(_) => "NOT_FOUND_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::AccessDenied(_) => "ACCESS_DENIED_ERROR",
            AppError::PendingApproval(_) => "PENDING_APPROVAL",
            AppError::RateLimited(_) => "RATE_LIMITED",
            AppError::InternalError(_) => "INTERNAL_ERROR",
            AppError::InitializationError(_) => "INITIALIZATION_ERROR",
            AppError::InvalidArgument(_) => "INVALID_ARGUMENT_ERROR",
            AppError::NetworkError(_) => "NETWORK_ERROR",
            AppError::Timeout(_) => "TIMEOUT_ERROR",
            AppError::ExternalServiceError(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::InvalidResponse(_) => "INVALID_RESPONSE_ERROR",
            AppError::StorageError(_) => "STORAGE_ERROR",
        }
        .to_string();

        let details = match &error {
            AppError::ValidationFailed { details, .. } => Some(details.clone()),
            _ => None,
        };

        Self {
            code,
            message: error.to_string(),
            details,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(AppError::AuthError("expired".into()).is_auth_rejection());
        assert!(AppError::AccessDenied("nope".into()).is_auth_rejection());
        assert!(!AppError::NetworkError("refused".into()).is_auth_rejection());
        assert!(AppError::Timeout("10s".into()).is_transient());
        assert!(AppError::InvalidResponse("html".into()).is_transient());
        assert!(!AppError::ValidationError("bad".into()).is_transient());
    }

    #[test]
    fn test_serializable_error_keeps_details() {
        let details: FieldErrors =
            serde_json::from_str(r#"{"email": ["Email already registered"]}"#).unwrap();
        let err = AppError::ValidationFailed {
            message: "Validation failed".into(),
            details: details.clone(),
        };

        let serializable = SerializableError::from(err);
        assert_eq!(serializable.code, "VALIDATION_ERROR");
        assert_eq!(serializable.details, Some(details));
    }
}
