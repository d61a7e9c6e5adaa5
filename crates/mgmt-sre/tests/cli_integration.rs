//! CLI integration tests for the mgmt-sre command-line interface.
//!
//! These tests verify:
//! - Help text is displayed correctly
//! - Credentials are read from the environment and from config files
//! - Credential errors are reported before any network activity
//!
//! Each test uses its own service name so the environment variables it sets
//! never collide with a real configuration.

use assert_cmd::Command;
use predicates::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SERVICE: &str = "mgmt_sre_cli_test";

/// Get a command for the mgmt-sre binary with a clean credential environment.
fn mgmt_sre() -> Command {
    let mut cmd = Command::cargo_bin("mgmt-sre").unwrap();
    cmd.env_remove("MGMT_SRE_CONFIG")
        .env_remove("MGMT_SRE_URL")
        .args(["--service-name", SERVICE]);
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    mgmt_sre()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("management SRE API"));
}

#[test]
fn test_version_displays() {
    mgmt_sre()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mgmt-sre"));
}

#[test]
fn test_help_lists_subcommands() {
    mgmt_sre()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("token"))
        .stdout(predicate::str::contains("get"));
}

#[test]
fn test_get_requires_path() {
    mgmt_sre().arg("get").assert().failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Validate
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_validate_api_key_from_env() {
    mgmt_sre()
        .env("MGMT_SRE_CLI_TEST_APIKEY", "key-1")
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("api-key"));
}

#[test]
fn test_validate_json_output() {
    mgmt_sre()
        .env("MGMT_SRE_CLI_TEST_USERNAME", "u")
        .env("MGMT_SRE_CLI_TEST_PASSWORD", "p")
        .env("MGMT_SRE_CLI_TEST_AUTH_URL", "https://auth.example/token")
        .args(["--json", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"bearer-token\""))
        .stdout(predicate::str::contains("managementSreAuth"));
}

#[test]
fn test_validate_missing_credentials_fails() {
    mgmt_sre()
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("username"));
}

#[test]
fn test_validate_from_config_file() {
    let temp = tempfile::tempdir().unwrap();
    let file = temp.path().join("credentials.toml");
    std::fs::write(
        &file,
        "username = \"u\"\npassword = \"p\"\nauth_url = \"https://auth.example/token\"\n",
    )
    .unwrap();

    mgmt_sre()
        .args(["--config", file.to_str().unwrap(), "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bearer-token"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_token_rejects_api_key_mode() {
    mgmt_sre()
        .env("MGMT_SRE_CLI_TEST_APIKEY", "key-1")
        .arg("token")
        .assert()
        .failure()
        .stderr(predicate::str::contains("auth_url"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_token_against_mock_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "accessToken": "abc123" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let auth_url = format!("{}/token", server.uri());
    tokio::task::spawn_blocking(move || {
        mgmt_sre()
            .env("MGMT_SRE_CLI_TEST_USERNAME", "u")
            .env("MGMT_SRE_CLI_TEST_PASSWORD", "p")
            .env("MGMT_SRE_CLI_TEST_AUTH_URL", auth_url)
            .args(["--json", "token", "--show-token"])
            .assert()
            .success()
            .stdout(predicate::str::contains("abc123"))
            .stdout(predicate::str::contains("expires_in_secs"));
    })
    .await
    .unwrap();
}
