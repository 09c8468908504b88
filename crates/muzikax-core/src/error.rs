//! Error types for the MuzikaX client crates.
//!
//! One unified error type with explicit variants for transport,
//! authentication, upstream, storage and input validation failures.

use std::fmt;
use thiserror::Error;

/// The unified error type for MuzikaX client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout, body decoding).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (missing credentials, failed refresh).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthKind),

    /// Non-2xx responses other than 401 from the API.
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Token store failures.
    #[error("token store error: {0}")]
    Store(#[from] StoreError),

    /// Input validation errors (URL, header, method).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns true if the caller should send the user back to login.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Error::Auth(
                AuthKind::NoCredentials | AuthKind::AuthFailed { .. } | AuthKind::Unauthorized { .. }
            )
        )
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// Response body could not be decoded.
    #[error("failed to decode response: {message}")]
    Decode { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication failures reported to the caller.
#[derive(Debug, Error)]
pub enum AuthKind {
    /// No access token is available; the user must log in.
    #[error("no credentials available")]
    NoCredentials,

    /// The request was rejected with 401 and the refresh cycle failed.
    #[error("session is no longer valid: {reason}")]
    AuthFailed { reason: RefreshFailure },

    /// The request was still rejected with 401 after a successful refresh.
    #[error("request unauthorized after refreshing credentials")]
    Unauthorized { message: Option<String> },

    /// Login was rejected by the API.
    #[error("invalid email or password")]
    InvalidCredentials,
}

/// Why a refresh exchange did not produce new credentials.
///
/// This type is `Clone` so that a single refresh outcome can be handed to
/// every request waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshFailure {
    /// The store holds no refresh token; no exchange was attempted.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The refresh endpoint answered with a non-2xx status.
    #[error("refresh rejected with HTTP {status}")]
    Rejected { status: u16 },

    /// The refresh endpoint answered 2xx without a usable token pair.
    #[error("malformed refresh response: {message}")]
    Malformed { message: String },

    /// The refresh exchange failed at the network level.
    #[error("refresh transport failure: {message}")]
    Transport { message: String },

    /// The new credentials could not be persisted.
    #[error("failed to persist refreshed tokens: {message}")]
    Store { message: String },

    /// The background refresh task ended without an outcome.
    #[error("refresh task aborted")]
    Aborted,
}

/// A non-2xx, non-401 response from the API.
#[derive(Debug, Clone)]
pub struct UpstreamError {
    /// HTTP status code.
    pub status: u16,
    /// `message` field of the JSON error body, if any.
    pub message: Option<String>,
}

impl UpstreamError {
    /// Create a new upstream error.
    pub fn new(status: u16, message: Option<String>) -> Self {
        Self { status, message }
    }

    /// Returns true for 5xx statuses.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for UpstreamError {}

/// Token store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing storage failed.
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// The stored data could not be parsed.
    #[error("invalid token data: {message}")]
    Format { message: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Invalid header name or value.
    #[error("invalid header '{name}': {reason}")]
    Header { name: String, reason: String },

    /// Request URL outside the configured API origin.
    #[error("refusing to send credentials to '{url}': not the API origin")]
    ForeignOrigin { url: String },

    /// Unknown HTTP method.
    #[error("invalid HTTP method '{value}'")]
    Method { value: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
