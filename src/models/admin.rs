use serde::{Deserialize, Serialize};

/// Row of the administrative user listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: i64,
    pub email: String,
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "lastName", default)]
    pub last_name: String,
    pub role: String,
    #[serde(default)]
    pub is_approved: bool,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub approved_at: Option<String>,
    #[serde(default)]
    pub approved_by: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficialTown {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernmentOfficial {
    pub id: i64,
    pub user_id: i64,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub employee_id: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub office_address: String,
    #[serde(default)]
    pub town: Option<OfficialTown>,
    #[serde(default)]
    pub can_view_users: bool,
    #[serde(default)]
    pub can_approve_users: bool,
    #[serde(default)]
    pub is_approved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficialPermissions {
    pub can_view_users: bool,
    pub can_approve_users: bool,
}

/// Generic `{message}` acknowledgement returned by mutating endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: Option<String>,
}
