//! MuzikaX API endpoint paths and wire types.

use serde::{Deserialize, Serialize};

use muzikax_core::{Credentials, UserProfile};

// ============================================================================
// Endpoint Paths
// ============================================================================

/// Exchanges a refresh token for a new token pair.
pub const REFRESH_TOKEN: &str = "/api/auth/refresh-token";

/// Email/password login.
pub const LOGIN: &str = "/api/auth/login";

/// Profile of the authenticated user.
pub const ME: &str = "/api/auth/me";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for the refresh endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Response from the refresh endpoint.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl RefreshResponse {
    /// Returns the token pair, or `None` if either token is empty.
    pub fn into_credentials(self) -> Option<Credentials> {
        if self.access_token.is_empty() || self.refresh_token.is_empty() {
            return None;
        }
        Some(Credentials::new(self.access_token, self.refresh_token))
    }
}

/// Request body for login.
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response from login: the profile with both tokens alongside.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}
