//! JSON file token store.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use muzikax_core::error::{Error, StoreError};
use muzikax_core::{ACCESS_TOKEN_KEY, Credentials, REFRESH_TOKEN_KEY, Result, TokenStore};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

type Entries = BTreeMap<String, String>;

fn map_io(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |err| {
        Error::Store(StoreError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })
    }
}

/// Token store persisted as a JSON object on disk.
///
/// The file holds the same keys as every other store (`accessToken`,
/// `refreshToken`). Mutations take an exclusive lock on a sibling `.lock`
/// file, write a temp file and rename it over the original, so readers see
/// either the old or the new contents and never a partial write. A missing
/// file is an empty store.
pub struct FileTokenStore {
    path: PathBuf,
    // Serializes writers within this process; the file lock covers others.
    writer: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            writer: Mutex::new(()),
        }
    }

    /// Path of the token file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }

    fn read_entries(&self) -> Result<Entries> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(map_io(&self.path)(e)),
        };

        if json.trim().is_empty() {
            return Ok(Entries::new());
        }

        serde_json::from_str(&json).map_err(|e| {
            Error::Store(StoreError::Format {
                message: format!("{}: {}", self.path.display(), e),
            })
        })
    }

    fn write_entries(&self, entries: &Entries) -> Result<()> {
        let json = serde_json::to_string_pretty(entries).map_err(|e| {
            Error::Store(StoreError::Format {
                message: e.to_string(),
            })
        })?;

        let temp_path = self.temp_path();
        fs::write(&temp_path, json).map_err(map_io(&temp_path))?;

        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&temp_path)
                .map_err(map_io(&temp_path))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&temp_path, perms).map_err(map_io(&temp_path))?;
        }

        fs::rename(&temp_path, &self.path).map_err(map_io(&self.path))
    }

    fn lock_file(&self) -> Result<File> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(map_io(parent))?;
        }

        let lock_path = self.lock_path();
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(map_io(&lock_path))?;

        lock_file.lock_exclusive().map_err(map_io(&lock_path))?;
        Ok(lock_file)
    }

    /// Read-modify-write the token file under the lock.
    async fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Entries),
    {
        let _writer = self.writer.lock().await;
        let lock_file = self.lock_file()?;

        let mut entries = self.read_entries()?;
        apply(&mut entries);
        let written = self.write_entries(&entries);

        lock_file.unlock().map_err(map_io(&self.lock_path()))?;
        written
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_entries()?.remove(key))
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
        .await
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
        .await
    }

    #[instrument(skip(self, credentials), fields(path = %self.path.display()))]
    async fn set_credentials(&self, credentials: &Credentials) -> Result<()> {
        self.update(|entries| {
            entries.insert(
                ACCESS_TOKEN_KEY.to_string(),
                credentials.access_token.as_str().to_string(),
            );
            entries.insert(
                REFRESH_TOKEN_KEY.to_string(),
                credentials.refresh_token.as_str().to_string(),
            );
        })
        .await?;

        debug!("Token pair written");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn clear(&self) -> Result<()> {
        self.update(|entries| {
            entries.remove(ACCESS_TOKEN_KEY);
            entries.remove(REFRESH_TOKEN_KEY);
        })
        .await
    }
}

impl std::fmt::Debug for FileTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileTokenStore")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FileTokenStore {
        FileTokenStore::new(dir.path().join("tokens.json"))
    }

    #[tokio::test]
    async fn missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert!(store.access_token().await.unwrap().is_none());
        assert!(store.credentials().await.unwrap().is_none());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn set_credentials_persists_both_keys() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store
            .set_credentials(&Credentials::new("fresh-123", "fresh-456"))
            .await
            .unwrap();

        let json = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["accessToken"], "fresh-123");
        assert_eq!(value["refreshToken"], "fresh-456");

        // A second handle on the same file sees the pair.
        let reopened = store_in(&dir);
        let credentials = reopened.credentials().await.unwrap().unwrap();
        assert_eq!(credentials.access_token.as_str(), "fresh-123");
        assert_eq!(credentials.refresh_token.as_str(), "fresh-456");
    }

    #[tokio::test]
    async fn remove_leaves_other_key() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .set_credentials(&Credentials::new("a", "r"))
            .await
            .unwrap();

        store.remove(ACCESS_TOKEN_KEY).await.unwrap();

        assert!(store.get(ACCESS_TOKEN_KEY).await.unwrap().is_none());
        assert_eq!(
            store.get(REFRESH_TOKEN_KEY).await.unwrap().as_deref(),
            Some("r")
        );
    }

    #[tokio::test]
    async fn clear_removes_pair() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .set_credentials(&Credentials::new("a", "r"))
            .await
            .unwrap();
        store.set("theme", "dark").await.unwrap();

        store.clear().await.unwrap();

        assert!(store.credentials().await.unwrap().is_none());
        assert_eq!(store.get("theme").await.unwrap().as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested/deeper/tokens.json"));

        store.set(ACCESS_TOKEN_KEY, "abc").await.unwrap();

        assert!(store.path().exists());
        assert!(!dir.path().join("nested/deeper/tokens.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_format_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "not json").unwrap();

        let err = store.get(ACCESS_TOKEN_KEY).await.unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::Format { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn token_file_is_private() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set(ACCESS_TOKEN_KEY, "abc").await.unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_do_not_lose_keys() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(store_in(&dir));

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .set(&format!("key-{}", i), &format!("value-{}", i))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        for i in 0..8 {
            assert_eq!(
                store.get(&format!("key-{}", i)).await.unwrap(),
                Some(format!("value-{}", i))
            );
        }
    }
}
