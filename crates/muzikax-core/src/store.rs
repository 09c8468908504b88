//! Token storage.
//!
//! Tokens live behind the [`TokenStore`] trait so that each client instance
//! gets its own explicitly injected store instead of a process-wide global.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::tokens::{AccessToken, Credentials, RefreshToken};
use crate::Result;

/// Store key holding the access token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Store key holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// A key/value store for the current credentials.
///
/// Implementations must be safe to share across tasks. The provided pair
/// methods write key by key; stores that can do better should override
/// [`TokenStore::set_credentials`] and [`TokenStore::clear`] so that a reader
/// never observes a half-updated pair.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key` if present.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Returns the current access token, if any.
    async fn access_token(&self) -> Result<Option<AccessToken>> {
        Ok(self.get(ACCESS_TOKEN_KEY).await?.map(AccessToken::new))
    }

    /// Returns the current refresh token, if any.
    async fn refresh_token(&self) -> Result<Option<RefreshToken>> {
        Ok(self.get(REFRESH_TOKEN_KEY).await?.map(RefreshToken::new))
    }

    /// Returns the full pair when both tokens are present.
    async fn credentials(&self) -> Result<Option<Credentials>> {
        let access = self.get(ACCESS_TOKEN_KEY).await?;
        let refresh = self.get(REFRESH_TOKEN_KEY).await?;
        Ok(match (access, refresh) {
            (Some(access), Some(refresh)) => Some(Credentials::new(access, refresh)),
            _ => None,
        })
    }

    /// Persist a new token pair.
    async fn set_credentials(&self, credentials: &Credentials) -> Result<()> {
        self.set(ACCESS_TOKEN_KEY, credentials.access_token.as_str())
            .await?;
        self.set(REFRESH_TOKEN_KEY, credentials.refresh_token.as_str())
            .await
    }

    /// Remove both tokens.
    async fn clear(&self) -> Result<()> {
        self.remove(ACCESS_TOKEN_KEY).await?;
        self.remove(REFRESH_TOKEN_KEY).await
    }
}

/// In-memory token store.
///
/// Useful for tests and for short-lived processes that log in on startup.
#[derive(Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `credentials`.
    pub fn with_credentials(credentials: &Credentials) -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            ACCESS_TOKEN_KEY.to_string(),
            credentials.access_token.as_str().to_string(),
        );
        entries.insert(
            REFRESH_TOKEN_KEY.to_string(),
            credentials.refresh_token.as_str().to_string(),
        );
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn set_credentials(&self, credentials: &Credentials) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            ACCESS_TOKEN_KEY.to_string(),
            credentials.access_token.as_str().to_string(),
        );
        entries.insert(
            REFRESH_TOKEN_KEY.to_string(),
            credentials.refresh_token.as_str().to_string(),
        );
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(ACCESS_TOKEN_KEY);
        entries.remove(REFRESH_TOKEN_KEY);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTokenStore")
            .field("entries", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_store_has_no_tokens() {
        let store = MemoryTokenStore::new();
        assert!(store.access_token().await.unwrap().is_none());
        assert!(store.credentials().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_credentials_then_read_back() {
        let store = MemoryTokenStore::new();
        store
            .set_credentials(&Credentials::new("fresh-123", "fresh-456"))
            .await
            .unwrap();

        assert_eq!(
            store.get(ACCESS_TOKEN_KEY).await.unwrap().as_deref(),
            Some("fresh-123")
        );
        assert_eq!(
            store.get(REFRESH_TOKEN_KEY).await.unwrap().as_deref(),
            Some("fresh-456")
        );
    }

    #[tokio::test]
    async fn credentials_require_both_tokens() {
        let store = MemoryTokenStore::new();
        store.set(ACCESS_TOKEN_KEY, "only-access").await.unwrap();
        assert!(store.credentials().await.unwrap().is_none());
        assert!(store.refresh_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_removes_both_tokens() {
        let store = MemoryTokenStore::with_credentials(&Credentials::new("a", "r"));
        store.clear().await.unwrap();
        assert!(store.get(ACCESS_TOKEN_KEY).await.unwrap().is_none());
        assert!(store.get(REFRESH_TOKEN_KEY).await.unwrap().is_none());
    }

    #[test]
    fn debug_hides_tokens() {
        let store = MemoryTokenStore::with_credentials(&Credentials::new("secret-a", "secret-r"));
        let debug = format!("{:?}", store);
        assert!(!debug.contains("secret-a"));
    }
}
