//! End-to-end tests of the `jwtbearer` binary
//!
//! Runs the compiled CLI against the keystore fixture and, for the `token`
//! and `discover` commands, a wiremock authorization server.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{config_yaml, temp_config_file};

fn jwtbearer() -> Command {
    let mut cmd = Command::cargo_bin("jwtbearer").expect("binary is built");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    jwtbearer()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("token"))
        .stdout(predicate::str::contains("discover"))
        .stdout(predicate::str::contains("assertions"));
}

#[test]
fn test_assertions_command_prints_and_verifies_both_tokens() {
    let (_dir, config_path) = temp_config_file(&config_yaml("https://idsvr.example", "changeit"));

    jwtbearer()
        .args(["--config", config_path.to_str().unwrap(), "assertions", "--verify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("assertion:"))
        .stdout(predicate::str::contains("client_assertion:"))
        .stdout(predicate::str::contains("assertion verified: iss=assertion-client sub=demo-user"))
        .stdout(predicate::str::contains(
            "client_assertion verified: iss=assertion-client sub=assertion-client",
        ));
}

#[test]
fn test_wrong_password_exits_with_key_access_error() {
    let (_dir, config_path) = temp_config_file(&config_yaml("https://idsvr.example", "wrong"));

    let output = jwtbearer()
        .args(["--config", config_path.to_str().unwrap(), "assertions"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(
        stderr.matches("Key access error").count(),
        1,
        "error must be reported once, got: {stderr}"
    );
}

#[test]
fn test_invalid_issuer_is_rejected_by_validation() {
    let (_dir, config_path) = temp_config_file(&config_yaml("not-a-url", "changeit"));

    jwtbearer()
        .args(["--config", config_path.to_str().unwrap(), "assertions"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_token_command_prints_json_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_endpoint": format!("{}/token", server.uri())
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "abc123",
            "token_type": "bearer",
            "expires_in": 300
        })))
        .mount(&server)
        .await;

    let (_dir, config_path) = temp_config_file(&config_yaml(&server.uri(), "changeit"));
    let config_arg = config_path.to_str().unwrap().to_string();

    let assert = tokio::task::spawn_blocking(move || {
        jwtbearer()
            .args(["--config", &config_arg, "token", "--json"])
            .assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains(r#""access_token": "abc123""#))
        .stdout(predicate::str::contains(r#""expires_in": 300"#));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_discover_command_prints_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_endpoint": "https://idsvr.example/token"
        })))
        .mount(&server)
        .await;

    let (_dir, config_path) = temp_config_file(&config_yaml(&server.uri(), "changeit"));
    let config_arg = config_path.to_str().unwrap().to_string();

    let assert = tokio::task::spawn_blocking(move || {
        jwtbearer()
            .args(["--config", &config_arg, "discover"])
            .assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("https://idsvr.example/token"));
}
