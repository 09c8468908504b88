//! Request command implementation.

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;

use muzikax_http::PendingRequest;

use crate::cli::ApiArgs;
use crate::output;
use crate::storage;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: String,

    /// API path, e.g. /api/creator/analytics
    pub path: String,

    /// JSON request body
    #[arg(long)]
    pub data: Option<String>,

    /// Extra header as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    #[command(flatten)]
    pub api: ApiArgs,
}

/// Split a `Name: value` header argument.
fn parse_header(raw: &str) -> Result<(&str, &str)> {
    let Some((name, value)) = raw.split_once(':') else {
        bail!("Header must be 'Name: value', got '{}'", raw);
    };
    Ok((name.trim(), value.trim()))
}

pub async fn run(args: RequestArgs) -> Result<()> {
    let client = storage::client(&args.api)?;

    let method = PendingRequest::parse_method(&args.method).context("Invalid method")?;
    let mut request = client.pending(method, &args.path);

    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        request = request.header(name, value).context("Invalid header")?;
    }

    if let Some(data) = &args.data {
        let body: serde_json::Value =
            serde_json::from_str(data).context("--data must be valid JSON")?;
        request = request.json(&body).context("Failed to encode request body")?;
    }

    let exchange = client.execute(request).await.context("Request failed")?;
    let status = exchange.response.status();

    if exchange.retried {
        eprintln!("{}", "Retried after refreshing tokens".dimmed());
    }
    if let Some(reason) = &exchange.refresh_failure {
        eprintln!("{} {}", "Token refresh failed:".yellow(), reason);
    }

    let text = exchange
        .response
        .text()
        .await
        .context("Failed to read response body")?;

    if status.is_success() {
        output::field("Status", &status.to_string());
    } else {
        eprintln!("{} {}", "Status:".red(), status);
    }

    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(json) => output::json_pretty(&json)?,
        Err(_) if !text.is_empty() => println!("{}", text),
        Err(_) => {}
    }

    if !status.is_success() {
        bail!("Request failed with {}", status);
    }

    Ok(())
}
