//! Whoami command implementation.

use anyhow::{Context, Result};
use clap::Args;

use muzikax_http::AccountApi;

use crate::cli::ApiArgs;
use crate::output;
use crate::storage;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the profile as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub api: ApiArgs,
}

pub async fn run(args: WhoamiArgs) -> Result<()> {
    let account = AccountApi::new(storage::client(&args.api)?);

    let profile = match account.me().await {
        Err(e) if e.requires_login() => {
            return Err(e).context("Not logged in. Run 'muzikax login' first.");
        }
        result => result.context("Failed to fetch profile")?,
    };

    if args.json {
        output::json_pretty(&profile)?;
    } else {
        output::profile(&profile);
    }

    Ok(())
}
