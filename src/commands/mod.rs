/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `token`: run the JWT-Bearer grant
- `discover`: resolve the token endpoint from issuer metadata
- `assertions`: build (and optionally verify) the two assertions

Each handler composes the library pieces explicitly: keystore provider into
assertion builder into token exchanger.
*/

use std::sync::Arc;
use std::time::Duration;

use crate::auth::assertion::AssertionBuilder;
use crate::auth::exchange::{build_http_client, TokenExchanger};
use crate::auth::keystore::Pkcs12KeyProvider;
use crate::config::Config;
use crate::error::{JwtBearerError, Result};

/// Builds the assertion builder for `config`, backed by its keystore.
pub fn build_assertion_builder(config: &Config) -> AssertionBuilder {
    let keys = Arc::new(Pkcs12KeyProvider::new(config.keystore.clone()));
    AssertionBuilder::new(keys, config.assertion.clone())
}

/// Builds a token exchanger for `config`.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn build_exchanger(config: &Config) -> Result<TokenExchanger> {
    let http = build_http_client(Duration::from_secs(config.oauth.timeout_seconds))?;
    Ok(TokenExchanger::new(http, build_assertion_builder(config)))
}

// Token command handler
pub mod token {
    //! Runs the grant and reports the issued token.

    use super::*;
    use crate::auth::exchange::AccessTokenResult;

    /// Renders a token result for the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn format_token(token: &AccessTokenResult, json: bool) -> Result<String> {
        if json {
            return serde_json::to_string_pretty(token).map_err(|e| JwtBearerError::from(e).into());
        }
        Ok(format!(
            "access_token: {}\ntoken_type:   {}\nexpires_in:   {}",
            token.access_token, token.token_type, token.expires_in
        ))
    }

    /// Fetch an access token and print it
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `json` - Print the token response as JSON
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any stage of the grant.
    pub async fn run_token(config: &Config, json: bool) -> Result<AccessTokenResult> {
        tracing::info!("**** Starting the JWT assertion based user authentication ****");

        let exchanger = build_exchanger(config)?;
        let token = exchanger.fetch_access_token(&config.oauth).await?;

        println!("{}", format_token(&token, json)?);
        Ok(token)
    }
}

// Discover command handler
pub mod discover {
    //! Prints the token endpoint advertised by the issuer.

    use super::*;
    use crate::auth::discovery::discover_token_endpoint;

    /// Discover and print the token endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata cannot be fetched or lacks a
    /// `token_endpoint`.
    pub async fn run_discover(config: &Config) -> Result<url::Url> {
        let http = build_http_client(Duration::from_secs(config.oauth.timeout_seconds))?;
        let endpoint = discover_token_endpoint(&http, &config.oauth.issuer).await?;
        println!("{endpoint}");
        Ok(endpoint)
    }
}

// Assertions command handler
pub mod assertions {
    //! Builds the two assertions without contacting the authorization server.

    use super::*;
    use crate::auth::assertion::{AssertionClaims, ClientAssertion, UserAssertion};

    /// The pair of assertions a token request would carry.
    #[derive(Debug, Clone)]
    pub struct AssertionPair {
        pub assertion: UserAssertion,
        pub client_assertion: ClientAssertion,
    }

    fn describe(label: &str, claims: &AssertionClaims) -> String {
        format!(
            "{label} verified: iss={} sub={} aud={} jti={} exp={}",
            claims.issuer(),
            claims.subject(),
            claims.audience(),
            claims.jwt_id(),
            claims.expires_at()
        )
    }

    /// Build and print both assertions
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `verify` - Also verify each assertion against the public key
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be loaded or an assertion fails
    /// to sign or verify.
    pub fn run_assertions(config: &Config, verify: bool) -> Result<AssertionPair> {
        let builder = build_assertion_builder(config);
        let grant = &config.oauth;

        let pair = AssertionPair {
            assertion: builder.build_user_assertion(&grant.client_id, &grant.issuer)?,
            client_assertion: builder.build_client_assertion(&grant.client_id, &grant.issuer)?,
        };

        println!("assertion:        {}", pair.assertion.as_str());
        println!("client_assertion: {}", pair.client_assertion.as_str());

        if verify {
            let identity = builder.signing_identity()?;
            let user = identity.verify(pair.assertion.as_str(), &grant.issuer)?;
            let client = identity.verify(pair.client_assertion.as_str(), &grant.issuer)?;
            println!("{}", describe("assertion", &user));
            println!("{}", describe("client_assertion", &client));
        }

        Ok(pair)
    }
}
