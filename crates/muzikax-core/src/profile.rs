//! User profile returned by the login and `/api/auth/me` endpoints.

use serde::{Deserialize, Serialize};

/// The account fields the client cares about.
///
/// Unknown fields in the API payload are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub creator_type: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub followers_count: u64,
}

impl UserProfile {
    /// Returns true if the account has been upgraded to a creator.
    pub fn is_creator(&self) -> bool {
        self.role.as_deref() == Some("creator")
    }
}
