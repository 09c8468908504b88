//! muzikax-http - Authenticated HTTP client for the MuzikaX API.
//!
//! Every request goes through [`AuthenticatedClient`], which attaches the
//! stored access token, and on a 401 refreshes the token pair exactly once
//! (shared between all concurrent requests) and retries exactly once.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use muzikax_core::{ApiUrl, LoginCredentials, MemoryTokenStore};
//! use muzikax_http::{AccountApi, AuthenticatedClient, ClientConfig};
//!
//! # async fn example() -> Result<(), muzikax_core::Error> {
//! let config = ClientConfig::new(ApiUrl::new("https://api.muzikax.com")?);
//! let client = AuthenticatedClient::new(config, Arc::new(MemoryTokenStore::new()))?;
//! let account = AccountApi::new(client.clone());
//!
//! account
//!     .login(&LoginCredentials::new("kato@muzikax.com", "password"))
//!     .await?;
//! let me = account.me().await?;
//! println!("Logged in as {}", me.name);
//! # Ok(())
//! # }
//! ```

mod account;
mod client;
mod config;
pub mod endpoints;
mod refresh;
mod request;
mod transport;

pub use account::AccountApi;
pub use client::{Attempt, AuthenticatedClient, Exchange, RequestState};
pub use config::{ClientConfig, DEFAULT_TIMEOUT};
pub use refresh::RefreshOutcome;
pub use request::PendingRequest;
pub use transport::HttpTransport;

pub use reqwest::{Method, Response, StatusCode};
