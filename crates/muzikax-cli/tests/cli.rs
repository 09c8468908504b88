//! CLI tests against a mock MuzikaX API.
//!
//! Each test gets its own temporary token file, so nothing touches the real
//! user data directory.

mod common;

use common::{read_tokens, run_cli_async, run_cli_with_env, seed_tokens, stderr, stdout};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UNREACHABLE: &str = "http://127.0.0.1:1";

fn profile_json() -> serde_json::Value {
    json!({
        "_id": "64f1c0ffee",
        "name": "Kato",
        "email": "kato@muzikax.com",
        "role": "creator",
        "creatorType": "artist",
        "followersCount": 7
    })
}

#[test]
fn test_help() {
    let home = TempDir::new().unwrap();
    let output = run_cli_with_env(&["--help"], home.path(), UNREACHABLE);
    assert!(output.status.success());
    assert!(stdout(&output).contains("refresh-token"));
}

#[test]
fn test_logout_without_tokens_succeeds() {
    let home = TempDir::new().unwrap();
    let output = run_cli_with_env(&["logout"], home.path(), UNREACHABLE);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

#[test]
fn test_whoami_without_tokens_asks_for_login() {
    let home = TempDir::new().unwrap();
    let output = run_cli_with_env(&["whoami"], home.path(), UNREACHABLE);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Not logged in"));
}

#[test]
fn test_invalid_api_url_is_rejected() {
    let home = TempDir::new().unwrap();
    seed_tokens(home.path(), "a", "r");
    let output = run_cli_with_env(&["whoami"], home.path(), "http://example.com");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid API URL"));
}

#[tokio::test]
async fn test_login_stores_tokens() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    let mut body = profile_json();
    body["accessToken"] = json!("access-1");
    body["refreshToken"] = json!("refresh-1");

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({
            "email": "kato@muzikax.com",
            "password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_cli_async(
        &[
            "login",
            "--email",
            "kato@muzikax.com",
            "--password",
            "hunter2",
        ],
        home.path(),
        &server.uri(),
    )
    .await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Kato"));

    let tokens = read_tokens(home.path());
    assert_eq!(tokens["accessToken"], "access-1");
    assert_eq!(tokens["refreshToken"], "refresh-1");
}

#[tokio::test]
async fn test_whoami_refreshes_expired_token() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();
    seed_tokens(home.path(), "expired-abc", "valid-xyz");

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer expired-abc"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Not authorized, token failed"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer fresh-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token"))
        .and(body_json(json!({ "refreshToken": "valid-xyz" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "fresh-123",
            "refreshToken": "fresh-456"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_cli_async(&["whoami", "--json"], home.path(), &server.uri()).await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let printed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(printed["name"], "Kato");

    let tokens = read_tokens(home.path());
    assert_eq!(tokens["accessToken"], "fresh-123");
    assert_eq!(tokens["refreshToken"], "fresh-456");
}

#[tokio::test]
async fn test_request_reports_original_401_when_refresh_fails() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();
    seed_tokens(home.path(), "expired-abc", "revoked");

    Mock::given(method("GET"))
        .and(path("/api/creator/analytics"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Not authorized, token failed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Invalid refresh token"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_cli_async(
        &["request", "GET", "/api/creator/analytics"],
        home.path(),
        &server.uri(),
    )
    .await;

    assert!(!output.status.success());
    assert!(stdout(&output).contains("Not authorized, token failed"));
    assert!(stderr(&output).contains("refresh rejected with HTTP 401"));
}

#[tokio::test]
async fn test_request_sends_body_and_headers() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();
    seed_tokens(home.path(), "good-token", "valid-xyz");

    Mock::given(method("PUT"))
        .and(path("/api/upgrade/to-creator"))
        .and(header("authorization", "Bearer good-token"))
        .and(header("x-client", "cli-test"))
        .and(body_json(json!({ "creatorType": "artist" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "role": "creator" })))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_cli_async(
        &[
            "request",
            "PUT",
            "/api/upgrade/to-creator",
            "-H",
            "X-Client: cli-test",
            "--data",
            r#"{"creatorType":"artist"}"#,
        ],
        home.path(),
        &server.uri(),
    )
    .await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("\"creator\""));
}

#[tokio::test]
async fn test_logout_clears_tokens() {
    let home = TempDir::new().unwrap();
    seed_tokens(home.path(), "a", "r");

    let output = run_cli_async(&["logout"], home.path(), UNREACHABLE).await;
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let tokens = read_tokens(home.path());
    assert!(tokens.get("accessToken").is_none());
    assert!(tokens.get("refreshToken").is_none());
}
