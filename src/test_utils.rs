//! Test utilities for jwtbearer
//!
//! This module provides temporary directory management, test file creation,
//! and the keystore fixtures shared by the unit tests.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::config::{KeystoreConfig, UserAssertionConfig};

/// Password of both keystore fixtures
pub const FIXTURE_PASSWORD: &str = "changeit";

/// Create a temporary directory for testing
///
/// # Returns
///
/// Returns a TempDir that will be cleaned up when dropped
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Path of a file under `tests/fixtures`
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Keystore settings for the RSA fixture (`signer.p12`, alias `signer`)
pub fn keystore_config() -> KeystoreConfig {
    KeystoreConfig {
        path: fixture_path("signer.p12"),
        password: FIXTURE_PASSWORD.to_string(),
        alias: "signer".to_string(),
    }
}

/// Keystore settings for the EC fixture, which the signer must reject
pub fn ec_keystore_config() -> KeystoreConfig {
    KeystoreConfig {
        path: fixture_path("ec-signer.p12"),
        password: FIXTURE_PASSWORD.to_string(),
        alias: "signer".to_string(),
    }
}

/// User assertion settings matching the defaults
pub fn user_config() -> UserAssertionConfig {
    UserAssertionConfig {
        subject: "demo-user".to_string(),
        claims: BTreeMap::from([("my_claim".to_string(), "my_value".to_string())]),
    }
}
