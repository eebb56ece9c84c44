use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use jwtbearer::config::{Config, KeystoreConfig};

pub const CLIENT_ID: &str = "assertion-client";
pub const FIXTURE_PASSWORD: &str = "changeit";

#[allow(dead_code)]
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[allow(dead_code)]
pub fn keystore_config() -> KeystoreConfig {
    KeystoreConfig {
        path: fixture_path("signer.p12"),
        password: FIXTURE_PASSWORD.to_string(),
        alias: "signer".to_string(),
    }
}

/// Configuration pointing at `issuer` and signing with the RSA fixture.
#[allow(dead_code)]
pub fn test_config(issuer: &str) -> Config {
    let mut config = Config::default();
    config.oauth.issuer = issuer.to_string();
    config.oauth.client_id = CLIENT_ID.to_string();
    config.oauth.timeout_seconds = 5;
    config.keystore = keystore_config();
    config
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// YAML configuration for the CLI tests.
#[allow(dead_code)]
pub fn config_yaml(issuer: &str, password: &str) -> String {
    format!(
        r#"oauth:
  issuer: {issuer}
  client_id: {CLIENT_ID}
  timeout_seconds: 5
assertion:
  subject: demo-user
  claims:
    my_claim: my_value
keystore:
  path: {path}
  password: {password}
  alias: signer
"#,
        path = fixture_path("signer.p12").display()
    )
}
