//! CLI argument definitions.

use clap::{Args, Parser, Subcommand};

use crate::commands::{login, logout, refresh_token, request, whoami};

/// Command-line client for the MuzikaX API.
#[derive(Parser, Debug)]
#[command(name = "muzikax")]
#[command(author, version = env!("MUZIKAX_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with email and password
    Login(login::LoginArgs),

    /// Forget the stored tokens
    Logout(logout::LogoutArgs),

    /// Display the logged-in account
    Whoami(whoami::WhoamiArgs),

    /// Exchange the refresh token for a new token pair
    RefreshToken(refresh_token::RefreshTokenArgs),

    /// Send an authenticated request to an API path
    Request(request::RequestArgs),
}

/// Where the API lives.
#[derive(Args, Debug, Clone)]
pub struct ApiArgs {
    /// MuzikaX API base URL
    #[arg(long, env = "MUZIKAX_API_URL", default_value = "http://localhost:5000")]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn request_collects_repeated_headers() {
        let cli = Cli::try_parse_from([
            "muzikax",
            "request",
            "PUT",
            "/api/upgrade/to-creator",
            "-H",
            "X-Trace: 1",
            "-H",
            "Accept: application/json",
            "--data",
            r#"{"creatorType":"artist"}"#,
        ])
        .unwrap();

        let Commands::Request(args) = cli.command else {
            panic!("expected request command");
        };
        assert_eq!(args.method, "PUT");
        assert_eq!(args.headers.len(), 2);
        assert!(args.data.is_some());
    }

    #[test]
    fn verbosity_is_global() {
        let cli = Cli::try_parse_from(["muzikax", "whoami", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
