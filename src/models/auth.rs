use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use std::fmt;

use super::user::{Role, User};
use crate::constants::MIN_PASSWORD_LENGTH;
use crate::error::AppError;

/// Per-field validation messages as returned by the signup endpoint.
///
/// Keys are kept exactly as the server sent them so the UI can map each
/// message onto its input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Value>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Flattened messages for one field. Handles the `["msg", ...]` and
    /// `"msg"` shapes; nested objects are rendered as JSON.
    pub fn messages(&self, field: &str) -> Vec<String> {
        match self.0.get(field) {
            None => Vec::new(),
            Some(Value::String(message)) => vec![message.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(message) => message.clone(),
                    other => other.to_string(),
                })
                .collect(),
            Some(other) => vec![other.to_string()],
        }
    }
}

impl From<BTreeMap<String, Value>> for FieldErrors {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "userType")]
    pub user_type: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

/// Full registration payload. Role-specific fields are optional and only
/// sent when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub town_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apt_suite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_registration_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub office_address: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of a successful login, admin login or signup.
///
/// Signup answers without a token while the account awaits approval.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    pub user: User,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    pub user: User,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[derive(Clone, Default, Serialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordChange {
    /// Checks the form locally; the server applies its own password rules
    /// on top.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.old_password.is_empty() || self.new_password.is_empty() {
            return Err(AppError::ValidationError(
                "Current and new password are required".to_string(),
            ));
        }
        if self.new_password != self.confirm_password {
            return Err(AppError::ValidationError(
                "New password and confirmation do not match".to_string(),
            ));
        }
        if self.new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::ValidationError(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
            )));
        }
        if self.new_password == self.old_password {
            return Err(AppError::ValidationError(
                "New password must be different from current password".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordChange { .. }")
    }
}

/// Error body shared by every endpoint of the portal API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    // Framework-level errors (bad token, throttling) use `detail`
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub details: Option<ErrorDetails>,
    #[serde(default)]
    pub pending_approval: bool,
}

/// `details` is keyed by field on signup and a plain list on password
/// validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetails {
    Fields(FieldErrors),
    Messages(Vec<String>),
}

impl ApiErrorBody {
    /// Most specific human-readable text available.
    pub fn best_message(&self) -> Option<String> {
        match (&self.error, &self.message) {
            (Some(error), Some(message)) if self.pending_approval => {
                Some(format!("{error}. {message}"))
            }
            (Some(error), _) => match &self.details {
                Some(ErrorDetails::Messages(messages)) if !messages.is_empty() => {
                    Some(format!("{error}: {}", messages.join(", ")))
                }
                _ => Some(error.clone()),
            },
            (None, Some(message)) => Some(message.clone()),
            (None, None) => self.detail.clone(),
        }
    }
}
