//! Logout command implementation.

use anyhow::{Context, Result};
use clap::Args;

use muzikax_core::TokenStore;

use crate::output;
use crate::storage;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(_args: LogoutArgs) -> Result<()> {
    let store = storage::open_store()?;

    store.clear().await.context("Failed to clear stored tokens")?;

    output::success("Logged out");
    Ok(())
}
