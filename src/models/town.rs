use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Town {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub zip_codes: Vec<String>,
}

const fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTown {
    pub name: String,
    pub state: String,
    pub zip_codes: Vec<String>,
}

impl NewTown {
    /// Builds a town from form input; zip codes may be comma separated.
    pub fn from_input(name: &str, state: &str, zip_codes: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            state: state.trim().to_string(),
            zip_codes: zip_codes
                .split(',')
                .map(str::trim)
                .filter(|zip| !zip.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TownChangeRequest {
    pub id: i64,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub current_town: Option<String>,
    #[serde(default)]
    pub requested_town: Option<String>,
    pub status: String,
    #[serde(default)]
    pub requested_at: Option<String>,
}

/// Citizen request to move to another town. The billing address is
/// mandatory on the server side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TownChangeSubmission {
    pub requested_town_id: i64,
    pub billing_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TownChangeReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub request_id: Option<i64>,
}
