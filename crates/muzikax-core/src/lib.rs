//! muzikax-core - Core types and traits for the MuzikaX API client.
//!
//! This crate holds the pieces shared by every MuzikaX client crate: the
//! credential types, the [`TokenStore`] seam through which tokens are read
//! and persisted, the error taxonomy, and the validated [`ApiUrl`].

pub mod error;
pub mod login;
pub mod profile;
pub mod store;
pub mod tokens;
pub mod types;

pub use error::{AuthKind, Error, RefreshFailure};
pub use login::LoginCredentials;
pub use profile::UserProfile;
pub use store::{ACCESS_TOKEN_KEY, MemoryTokenStore, REFRESH_TOKEN_KEY, TokenStore};
pub use tokens::{AccessToken, Credentials, RefreshToken};
pub use types::ApiUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
