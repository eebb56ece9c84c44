//! Configuration management for jwtbearer
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! The core modules never read the environment themselves; they receive the
//! sections of [`Config`] they need.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{JwtBearerError, Result};

/// RFC 7523 §2.1 grant type.
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// RFC 7523 §2.2 client assertion type.
pub const JWT_BEARER_CLIENT_ASSERTION_TYPE: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Main configuration structure for jwtbearer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Authorization server and grant parameters
    pub oauth: GrantConfig,
    /// End-user assertion settings
    #[serde(default)]
    pub assertion: UserAssertionConfig,
    /// Credential store holding the signing key
    pub keystore: KeystoreConfig,
}

/// Parameters of the JWT-Bearer grant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantConfig {
    /// Issuer URL of the authorization server; also the assertion audience
    pub issuer: String,

    /// Client identifier registered with the authorization server
    pub client_id: String,

    /// `grant_type` form value
    #[serde(default = "default_grant_type")]
    pub grant_type: String,

    /// `client_assertion_type` form value
    #[serde(default = "default_client_assertion_type")]
    pub client_assertion_type: String,

    /// `scope` form value
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Timeout for the metadata fetch and the token request (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_grant_type() -> String {
    JWT_BEARER_GRANT_TYPE.to_string()
}

fn default_client_assertion_type() -> String {
    JWT_BEARER_CLIENT_ASSERTION_TYPE.to_string()
}

fn default_scope() -> String {
    "email".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for GrantConfig {
    fn default() -> Self {
        Self {
            issuer: "https://localhost:8443/oauth/v2/oauth-anonymous".to_string(),
            client_id: "assertion-client".to_string(),
            grant_type: default_grant_type(),
            client_assertion_type: default_client_assertion_type(),
            scope: default_scope(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// End-user assertion settings
///
/// The subject is supplied from outside; it is not derived from any live
/// authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAssertionConfig {
    /// End-user identifier placed in `sub`
    #[serde(default = "default_subject")]
    pub subject: String,

    /// Custom claims added to the user assertion, for the server's claim
    /// mapping to copy into the access token
    #[serde(default = "default_user_claims")]
    pub claims: BTreeMap<String, String>,
}

fn default_subject() -> String {
    "demo-user".to_string()
}

fn default_user_claims() -> BTreeMap<String, String> {
    BTreeMap::from([("my_claim".to_string(), "my_value".to_string())])
}

impl Default for UserAssertionConfig {
    fn default() -> Self {
        Self {
            subject: default_subject(),
            claims: default_user_claims(),
        }
    }
}

/// PKCS#12 credential store settings
///
/// One password opens the store and unlocks the key entry.
#[derive(Clone, Serialize, Deserialize)]
pub struct KeystoreConfig {
    /// Path to the `.p12` file
    pub path: PathBuf,

    /// Store (and key) password
    #[serde(default)]
    pub password: String,

    /// Alias of the private key entry
    #[serde(default = "default_alias")]
    pub alias: String,
}

fn default_alias() -> String {
    "signer".to_string()
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("keystore/signer.p12"),
            password: String::new(),
            alias: default_alias(),
        }
    }
}

impl fmt::Debug for KeystoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeystoreConfig")
            .field("path", &self.path)
            .field("password", &"<redacted>")
            .field("alias", &self.alias)
            .finish()
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(JwtBearerError::from)?;
        let config = serde_yaml::from_str(&contents).map_err(JwtBearerError::from)?;
        Ok(config)
    }

    fn apply_env_vars(&mut self) {
        if let Ok(issuer) = std::env::var("JWTBEARER_ISSUER") {
            self.oauth.issuer = issuer;
        }
        if let Ok(client_id) = std::env::var("JWTBEARER_CLIENT_ID") {
            self.oauth.client_id = client_id;
        }
        if let Ok(grant_type) = std::env::var("JWTBEARER_GRANT_TYPE") {
            self.oauth.grant_type = grant_type;
        }
        if let Ok(assertion_type) = std::env::var("JWTBEARER_CLIENT_ASSERTION_TYPE") {
            self.oauth.client_assertion_type = assertion_type;
        }
        if let Ok(scope) = std::env::var("JWTBEARER_SCOPE") {
            self.oauth.scope = scope;
        }
        if let Ok(timeout) = std::env::var("JWTBEARER_TIMEOUT_SECONDS") {
            match timeout.parse() {
                Ok(seconds) => self.oauth.timeout_seconds = seconds,
                Err(_) => tracing::warn!("Ignoring invalid JWTBEARER_TIMEOUT_SECONDS: {}", timeout),
            }
        }

        if let Ok(subject) = std::env::var("JWTBEARER_SUBJECT") {
            self.assertion.subject = subject;
        }

        if let Ok(path) = std::env::var("JWTBEARER_KEYSTORE_PATH") {
            self.keystore.path = PathBuf::from(path);
        }
        if let Ok(password) = std::env::var("JWTBEARER_KEYSTORE_PASSWORD") {
            self.keystore.password = password;
        }
        if let Ok(alias) = std::env::var("JWTBEARER_KEY_ALIAS") {
            self.keystore.alias = alias;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(issuer) = &cli.issuer {
            self.oauth.issuer = issuer.clone();
        }
        if let Some(client_id) = &cli.client_id {
            self.oauth.client_id = client_id.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("oauth.issuer", self.oauth.issuer.as_str()),
            ("oauth.client_id", self.oauth.client_id.as_str()),
            ("oauth.grant_type", self.oauth.grant_type.as_str()),
            (
                "oauth.client_assertion_type",
                self.oauth.client_assertion_type.as_str(),
            ),
            ("assertion.subject", self.assertion.subject.as_str()),
            ("keystore.alias", self.keystore.alias.as_str()),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(JwtBearerError::Config(format!("{name} cannot be empty")).into());
            }
        }

        if self.keystore.path.as_os_str().is_empty() {
            return Err(JwtBearerError::Config("keystore.path cannot be empty".to_string()).into());
        }

        let issuer = Url::parse(&self.oauth.issuer).map_err(|e| {
            JwtBearerError::Config(format!(
                "oauth.issuer '{}' is not a valid URL: {}",
                self.oauth.issuer, e
            ))
        })?;
        if !matches!(issuer.scheme(), "http" | "https") {
            return Err(JwtBearerError::Config(format!(
                "oauth.issuer must use http or https, got '{}'",
                issuer.scheme()
            ))
            .into());
        }

        if self.oauth.timeout_seconds == 0 {
            return Err(JwtBearerError::Config(
                "oauth.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.oauth.client_assertion_type != JWT_BEARER_CLIENT_ASSERTION_TYPE {
            tracing::warn!(
                "Unexpected client_assertion_type '{}'; RFC 7523 expects '{}'",
                self.oauth.client_assertion_type,
                JWT_BEARER_CLIENT_ASSERTION_TYPE
            );
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            oauth: GrantConfig::default(),
            assertion: UserAssertionConfig::default(),
            keystore: KeystoreConfig::default(),
        }
    }
}
