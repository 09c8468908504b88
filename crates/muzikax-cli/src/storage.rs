//! Token file location and client construction.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use muzikax_core::ApiUrl;
use muzikax_file::FileTokenStore;
use muzikax_http::{AuthenticatedClient, ClientConfig};

use crate::cli::ApiArgs;

/// Environment variable overriding the token file location.
pub const TOKEN_FILE_ENV: &str = "MUZIKAX_TOKEN_FILE";

/// Get the token file path.
fn token_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(TOKEN_FILE_ENV) {
        return Ok(PathBuf::from(path));
    }

    let dirs =
        ProjectDirs::from("", "", "muzikax").context("Could not determine data directory")?;

    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;

    Ok(data_dir.join("tokens.json"))
}

/// Open the token store shared by every command.
pub fn open_store() -> Result<Arc<FileTokenStore>> {
    let path = token_path()?;
    tracing::debug!(path = %path.display(), "Using token file");
    Ok(Arc::new(FileTokenStore::new(path)))
}

/// Build an authenticated client backed by the token file.
pub fn client(api: &ApiArgs) -> Result<AuthenticatedClient> {
    let api_url = ApiUrl::new(&api.api_url).context("Invalid API URL")?;
    let config = ClientConfig::new(api_url).with_timeout(Duration::from_secs(api.timeout));

    AuthenticatedClient::new(config, open_store()?).context("Failed to create API client")
}
