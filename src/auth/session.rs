use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::error::AppError;
use crate::models::{FieldErrors, User};

/// Where the session stands in its lifecycle.
///
/// `Pending` is the optimistic window: a token is held but no profile has
/// confirmed it yet (still loading, or the last check could not reach the
/// server).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Authenticated,
    Anonymous,
}

/// Immutable view of the session published to every subscriber.
#[derive(Clone, PartialEq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub token: Option<String>,
    pub user: Option<User>,
    /// An initialization, profile check or credential exchange is in flight.
    pub loading: bool,
    pub validated_at: Option<DateTime<Utc>>,
    /// Message of the last transient failure, cleared on success.
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    /// State before the persisted token has been looked at.
    pub const fn initializing() -> Self {
        Self {
            status: SessionStatus::Pending,
            token: None,
            user: None,
            loading: true,
            validated_at: None,
            last_error: None,
        }
    }

    pub const fn anonymous() -> Self {
        Self {
            status: SessionStatus::Anonymous,
            token: None,
            user: None,
            loading: false,
            validated_at: None,
            last_error: None,
        }
    }

    pub fn authenticated(token: String, user: User) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            token: Some(token),
            user: Some(user),
            loading: false,
            validated_at: Some(Utc::now()),
            last_error: None,
        }
    }

    pub const fn unverified(token: String) -> Self {
        Self {
            status: SessionStatus::Pending,
            token: Some(token),
            user: None,
            loading: true,
            validated_at: None,
            last_error: None,
        }
    }

    pub const fn is_authenticated(&self) -> bool {
        matches!(self.status, SessionStatus::Authenticated)
    }

    pub const fn is_resolved(&self) -> bool {
        !self.loading
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::initializing()
    }
}

// Tokens never reach logs
impl fmt::Debug for SessionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSnapshot")
            .field("status", &self.status)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user.as_ref().map(|u| &u.email))
            .field("loading", &self.loading)
            .field("validated_at", &self.validated_at)
            .field("last_error", &self.last_error)
            .finish()
    }
}

/// Result of exchanging a token for the current profile.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileFetchOutcome {
    /// Token confirmed, profile stored.
    Validated(User),
    /// Server rejected the token; session and persisted token cleared.
    Invalidated,
    /// Transient failure; token and profile kept for a later retry.
    Unavailable(AppError),
    /// A logout or newer credential exchange overtook this fetch; its
    /// result was discarded.
    Superseded,
    /// There was no token to check.
    NoSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidCredentials,
    RoleMismatch,
    PendingApproval,
    Forbidden,
    Validation,
    Unreachable,
    InvalidResponse,
    Storage,
    Server,
}

/// Expected failure of a login or signup, ready to show next to the form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthFailure {
    pub kind: FailureKind,
    pub message: String,
    pub details: Option<FieldErrors>,
}

impl AuthFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn field_messages(&self, field: &str) -> Vec<String> {
        self.details
            .as_ref()
            .map(|details| details.messages(field))
            .unwrap_or_default()
    }

    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind, FailureKind::Unreachable | FailureKind::InvalidResponse)
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<AppError> for AuthFailure {
    fn from(error: AppError) -> Self {
        match error {
            AppError::AuthError(message) => Self::new(FailureKind::InvalidCredentials, message),
            AppError::AccessDenied(message) if message.starts_with("Invalid account type") => {
                Self::new(FailureKind::RoleMismatch, message)
            }
            AppError::AccessDenied(message) => Self::new(FailureKind::Forbidden, message),
            AppError::PendingApproval(message) => Self::new(FailureKind::PendingApproval, message),
            AppError::ValidationFailed { message, details } => Self {
                kind: FailureKind::Validation,
                message,
                details: Some(details),
            },
            AppError::ValidationError(message) | AppError::InvalidArgument(message) => {
                Self::new(FailureKind::Validation, message)
            }
            AppError::NetworkError(_) | AppError::Timeout(_) | AppError::HttpError(_) => Self::new(
                FailureKind::Unreachable,
                "Cannot reach the server. Check your connection and try again.",
            ),
            AppError::InvalidResponse(_) | AppError::SerdeError(_) => Self::new(
                FailureKind::InvalidResponse,
                "Invalid response from server. Please try again later.",
            ),
            AppError::StorageError(message) | AppError::KeyringError(message) | AppError::IoError(message) => {
                Self::new(FailureKind::Storage, message)
            }
            other => Self::new(FailureKind::Server, other.to_string()),
        }
    }
}

/// Successful signup. The backend usually holds new accounts for approval
/// and issues no token until then.
#[derive(Debug, Clone, PartialEq)]
pub enum SignupOutcome {
    SignedIn(User),
    PendingApproval { message: String, user: User },
}
