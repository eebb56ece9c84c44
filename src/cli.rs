//! Command-line interface definition for jwtbearer
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for the token grant, endpoint discovery, and
//! assertion inspection.

use clap::{Parser, Subcommand};

/// jwtbearer - OAuth 2.0 JWT-Bearer assertion grant client
///
/// Signs a user assertion and a client assertion with a key from a PKCS#12
/// keystore and exchanges them for an access token (RFC 7523).
#[derive(Parser, Debug, Clone)]
#[command(name = "jwtbearer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the authorization server issuer URL
    #[arg(long)]
    pub issuer: Option<String>,

    /// Override the client identifier
    #[arg(long)]
    pub client_id: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for jwtbearer
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the JWT-Bearer grant and print the access token
    Token {
        /// Print the token response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the token endpoint discovered from the issuer metadata
    Discover,

    /// Build and print the user and client assertions without sending them
    Assertions {
        /// Verify both assertions against the keystore's public key
        #[arg(long)]
        verify: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
