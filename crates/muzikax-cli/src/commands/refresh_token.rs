//! Refresh token command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::cli::ApiArgs;
use crate::output;
use crate::storage;

#[derive(Args, Debug)]
pub struct RefreshTokenArgs {
    #[command(flatten)]
    pub api: ApiArgs,
}

pub async fn run(args: RefreshTokenArgs) -> Result<()> {
    let client = storage::client(&args.api)?;

    eprintln!("{}", "Refreshing tokens...".dimmed());

    client
        .refresh()
        .await
        .context("Failed to refresh tokens")?;

    output::success("Tokens refreshed successfully");
    Ok(())
}
