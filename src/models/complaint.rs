use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintComment {
    pub id: i64,
    pub text: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub is_notification: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Complaint {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub comments: Vec<ComplaintComment>,
}
