use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::constants::{BUSINESS_ROUTE, CITIZEN_ROUTE, GOVERNMENT_ROUTE};
use crate::error::AppError;

/// Closed set of account kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Citizen,
    Business,
    Government,
    #[serde(alias = "admin")]
    Superuser,
}

impl Role {
    pub const ALL: [Self; 4] = [Self::Citizen, Self::Business, Self::Government, Self::Superuser];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Citizen => "citizen",
            Self::Business => "business",
            Self::Government => "government",
            Self::Superuser => "superuser",
        }
    }

    /// Landing route of the portal this role belongs to. Superusers land on
    /// the government portal.
    pub const fn landing_route(self) -> &'static str {
        match self {
            Self::Citizen => CITIZEN_ROUTE,
            Self::Business => BUSINESS_ROUTE,
            Self::Government | Self::Superuser => GOVERNMENT_ROUTE,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        if name == "admin" {
            return Ok(Self::Superuser);
        }
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == name)
            .ok_or_else(|| AppError::InvalidArgument(format!("Unknown role: {name}")))
    }
}

/// Profile snapshot returned by the auth endpoints.
///
/// Role-specific fields (citizen id, business name, department, ...) are
/// kept verbatim in `extra`. The admin login response carries no `role`,
/// only the superuser flag; the regular profile endpoint omits the flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "lastName", default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(rename = "phoneNumber", default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_superuser: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn is_superuser(&self) -> bool {
        self.is_superuser == Some(true) || self.role == Some(Role::Superuser)
    }

    pub fn effective_role(&self) -> Option<Role> {
        if self.is_superuser == Some(true) && self.role.is_none() {
            Some(Role::Superuser)
        } else {
            self.role
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_with_role_specific_fields() {
        let raw = r#"{
            "id": 7,
            "email": "ana@example.org",
            "firstName": "Ana",
            "lastName": "Ruiz",
            "role": "business",
            "phoneNumber": "555-0100",
            "is_superuser": false,
            "businessName": "Ruiz Bakery",
            "website": ""
        }"#;

        let user: User = serde_json::from_str(raw).unwrap();
        assert_eq!(user.role, Some(Role::Business));
        assert_eq!(user.phone_number.as_deref(), Some("555-0100"));
        assert_eq!(user.extra["businessName"], "Ruiz Bakery");
        assert_eq!(user.full_name(), "Ana Ruiz");
        assert!(!user.is_superuser());
    }

    #[test]
    fn test_profile_without_superuser_flag() {
        let raw = r#"{"id": 1, "email": "root@example.org", "firstName": "", "lastName": "", "role": "government", "phoneNumber": ""}"#;

        let user: User = serde_json::from_str(raw).unwrap();
        assert_eq!(user.is_superuser, None);
        assert!(!user.is_superuser());
        assert!(!serde_json::to_string(&user).unwrap().contains("is_superuser"));
    }

    #[test]
    fn test_admin_profile_without_role() {
        let raw = r#"{"id": 1, "email": "root@example.org", "firstName": "", "lastName": "", "is_superuser": true}"#;

        let user: User = serde_json::from_str(raw).unwrap();
        assert_eq!(user.role, None);
        assert_eq!(user.effective_role(), Some(Role::Superuser));
        assert!(user.is_superuser());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Citizen".parse::<Role>().unwrap(), Role::Citizen);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Superuser);
        assert!("mayor".parse::<Role>().is_err());
        assert_eq!(Role::Superuser.landing_route(), "/government");
    }
}
