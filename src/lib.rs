//! jwtbearer - OAuth 2.0 JWT-Bearer assertion grant client library
//!
//! This library implements the client side of the RFC 7523 grant: a client
//! signs an assertion about the end user and an assertion about itself with
//! one RSA key and exchanges both for an access token.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: keystore, assertion building, discovery, and token exchange
//! - `commands`: handlers behind the CLI subcommands
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use jwtbearer::{commands, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let exchanger = commands::build_exchanger(&config)?;
//!     let token = exchanger.fetch_access_token(&config.oauth).await?;
//!     println!("{}", token.access_token);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use auth::exchange::{AccessTokenResult, TokenExchanger};
pub use config::Config;
pub use error::{JwtBearerError, Result};

#[cfg(test)]
pub mod test_utils;
