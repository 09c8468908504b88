//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use muzikax_core::LoginCredentials;
use muzikax_http::AccountApi;

use crate::cli::ApiArgs;
use crate::output;
use crate::storage;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long)]
    pub password: String,

    #[command(flatten)]
    pub api: ApiArgs,
}

pub async fn run(args: LoginArgs) -> Result<()> {
    let client = storage::client(&args.api)?;
    let account = AccountApi::new(client);
    let credentials = LoginCredentials::new(args.email, args.password);

    eprintln!("{}", "Logging in...".dimmed());

    let profile = account
        .login(&credentials)
        .await
        .context("Failed to login")?;

    output::success("Logged in successfully");
    println!();
    output::profile(&profile);

    Ok(())
}
