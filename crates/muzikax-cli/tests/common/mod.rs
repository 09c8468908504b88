use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Path of the token file used by an isolated CLI run.
pub fn token_file(home: &Path) -> PathBuf {
    home.join("tokens.json")
}

/// Run the CLI with an isolated token file and the given API URL.
pub fn run_cli_with_env(args: &[&str], home: &Path, api_url: &str) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_muzikax"));
    cmd.args(args);
    cmd.env("HOME", home);
    cmd.env("XDG_DATA_HOME", home.join("data"));
    cmd.env("MUZIKAX_TOKEN_FILE", token_file(home));
    cmd.env("MUZIKAX_API_URL", api_url);
    cmd.env_remove("RUST_LOG");
    cmd.output().expect("Failed to execute CLI")
}

/// Same as [`run_cli_with_env`], off the async runtime.
pub async fn run_cli_async(args: &[&str], home: &Path, api_url: &str) -> Output {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    let home = home.to_path_buf();
    let api_url = api_url.to_string();
    tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_cli_with_env(&args, &home, &api_url)
    })
    .await
    .expect("CLI task panicked")
}

/// Write a token pair the way the file store does.
pub fn seed_tokens(home: &Path, access: &str, refresh: &str) {
    let json = serde_json::json!({
        "accessToken": access,
        "refreshToken": refresh,
    });
    std::fs::write(token_file(home), json.to_string()).expect("Failed to seed tokens");
}

/// Read back the stored token file.
pub fn read_tokens(home: &Path) -> serde_json::Value {
    let json = std::fs::read_to_string(token_file(home)).expect("Failed to read tokens");
    serde_json::from_str(&json).expect("Token file is not JSON")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
