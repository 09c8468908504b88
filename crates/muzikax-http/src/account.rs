//! Account operations: login, profile lookup, logout.

use reqwest::StatusCode;
use tracing::{debug, info, instrument};

use muzikax_core::{AuthKind, Credentials, LoginCredentials, Result, UserProfile};

use crate::client::AuthenticatedClient;
use crate::endpoints::{LOGIN, LoginRequest, LoginResponse, ME};
use crate::transport;

/// Account endpoints of the MuzikaX API.
///
/// Login is the only unauthenticated call; it seeds the token store the
/// wrapped [`AuthenticatedClient`] reads from.
#[derive(Debug, Clone)]
pub struct AccountApi {
    client: AuthenticatedClient,
}

impl AccountApi {
    pub fn new(client: AuthenticatedClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    /// Log in with email and password and persist the returned tokens.
    ///
    /// # Errors
    ///
    /// Returns [`AuthKind::InvalidCredentials`] when the API rejects the
    /// email/password pair.
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<UserProfile> {
        info!("Logging in");

        let url = self.client.api_url().endpoint(LOGIN);
        let request = LoginRequest {
            email: credentials.email(),
            password: credentials.password(),
        };

        let response = self.client.transport().post_json(&url, &request).await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(AuthKind::InvalidCredentials.into());
        }
        if !status.is_success() {
            return Err(transport::upstream_error(response).await);
        }

        let body: LoginResponse = transport::read_json(response).await?;
        self.client
            .store()
            .set_credentials(&Credentials::new(body.access_token, body.refresh_token))
            .await?;

        debug!(user = %body.profile.id, "Login succeeded, tokens stored");
        Ok(body.profile)
    }

    /// Fetch the profile of the logged-in user.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<UserProfile> {
        self.client.get_json(ME).await
    }

    /// Forget the stored tokens. The API has no logout route, so this is
    /// purely local.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        self.client.store().clear().await?;
        info!("Logged out, tokens cleared");
        Ok(())
    }
}
