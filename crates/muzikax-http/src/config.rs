//! Client configuration.

use std::time::Duration;

use muzikax_core::ApiUrl;

use crate::endpoints::REFRESH_TOKEN;

/// Default per-dispatch timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by every request an [`AuthenticatedClient`] makes.
///
/// [`AuthenticatedClient`]: crate::AuthenticatedClient
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the MuzikaX backend.
    pub api_url: ApiUrl,
    /// Path of the refresh endpoint, relative to `api_url`.
    pub refresh_path: String,
    /// Timeout applied to each dispatch (primary, refresh, retry).
    pub timeout: Duration,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl ClientConfig {
    /// Configuration with default paths and timeout for `api_url`.
    pub fn new(api_url: ApiUrl) -> Self {
        Self {
            api_url,
            refresh_path: REFRESH_TOKEN.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("muzikax-http/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Absolute URL of the refresh endpoint.
    pub fn refresh_url(&self) -> String {
        self.api_url.endpoint(&self.refresh_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_refresh_token_route() {
        let config = ClientConfig::new(ApiUrl::new("https://api.muzikax.com").unwrap());
        assert_eq!(
            config.refresh_url(),
            "https://api.muzikax.com/api/auth/refresh-token"
        );
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.user_agent.starts_with("muzikax-http/"));
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::new(ApiUrl::new("http://localhost:5000").unwrap())
            .with_refresh_path("/auth/refresh")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.refresh_url(), "http://localhost:5000/auth/refresh");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
