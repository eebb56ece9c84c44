//! Error types for jwtbearer
//!
//! This module defines the error taxonomy of the JWT-Bearer grant client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for jwtbearer operations
///
/// The first four variants map one-to-one onto the stages of the grant:
/// loading the signing key, signing assertions, discovering the token
/// endpoint, and exchanging the assertions for an access token. The rest
/// cover configuration and ambient I/O.
#[derive(Error, Debug)]
pub enum JwtBearerError {
    /// Credential store or key unreachable, wrong password, missing alias,
    /// or unsupported key algorithm
    #[error("Key access error: {0}")]
    KeyAccess(String),

    /// Cryptographic signing failure
    #[error("Signing error: {0}")]
    Signing(String),

    /// Discovery document missing, malformed, or lacking `token_endpoint`
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Network failure, timeout, non-success status, or unparseable token
    /// response
    #[error("Token exchange error: {0}")]
    TokenExchange(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for jwtbearer operations
///
/// Uses `anyhow::Error` so call sites can add context; the grant stages
/// always produce a [`JwtBearerError`] that callers can recover with
/// `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;
