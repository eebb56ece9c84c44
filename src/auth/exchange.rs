//! JWT-Bearer token exchange (RFC 7523)
//!
//! Runs the grant as a linear pipeline:
//!
//! 1. Resolve the signing identity, so an unusable keystore fails before any
//!    request is sent.
//! 2. Discover the token endpoint from the issuer's OIDC metadata.
//! 3. Build the user assertion (`assertion`).
//! 4. Build the client assertion (`client_assertion`).
//! 5. POST the form to the token endpoint and parse the JSON response.
//!
//! Any failing stage aborts the call. Nothing is cached or retried.
//!
//! # References
//!
//! - RFC 7523 §2.1 and §2.2 <https://www.rfc-editor.org/rfc/rfc7523>
//! - RFC 6749 §5.1 and §5.2 <https://www.rfc-editor.org/rfc/rfc6749>

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::assertion::{AssertionBuilder, ClientAssertion, UserAssertion};
use crate::auth::discovery::discover_token_endpoint;
use crate::config::GrantConfig;
use crate::error::{JwtBearerError, Result};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Form body of the token request.
///
/// Serialized as `application/x-www-form-urlencoded` with the fields in
/// declaration order.
#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest {
    pub scope: String,
    pub assertion: UserAssertion,
    pub grant_type: String,
    pub client_assertion_type: String,
    pub client_assertion: ClientAssertion,
}

impl TokenRequest {
    /// Assembles the request for `grant` from the two signed assertions.
    pub fn new(grant: &GrantConfig, assertion: UserAssertion, client_assertion: ClientAssertion) -> Self {
        Self {
            scope: grant.scope.clone(),
            assertion,
            grant_type: grant.grant_type.clone(),
            client_assertion_type: grant.client_assertion_type.clone(),
            client_assertion,
        }
    }
}

/// Access token issued by the authorization server.
///
/// # Examples
///
/// ```
/// use jwtbearer::auth::exchange::AccessTokenResult;
///
/// let json = r#"{"access_token":"abc123","token_type":"bearer","expires_in":300}"#;
/// let token: AccessTokenResult = serde_json::from_str(json).unwrap();
/// assert_eq!(token.access_token, "abc123");
/// assert_eq!(token.expires_in, 300);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenResult {
    /// Opaque bearer token.
    pub access_token: String,

    /// Token type, typically `bearer`.
    pub token_type: String,

    /// Lifetime of the token in seconds.
    pub expires_in: u64,
}

/// OAuth error response body (RFC 6749 §5.2).
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<OAuthErrorResponse>(body) {
        Ok(OAuthErrorResponse {
            error,
            error_description: Some(description),
        }) => format!("{error}: {description}"),
        Ok(OAuthErrorResponse { error, .. }) => error,
        Err(_) => body.to_string(),
    }
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Builds the HTTP client shared by discovery and the token request.
///
/// # Errors
///
/// Returns [`JwtBearerError::Config`] if the TLS backend cannot be
/// initialized.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("jwtbearer/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| JwtBearerError::Config(format!("failed to build HTTP client: {e}")).into())
}

// ---------------------------------------------------------------------------
// TokenExchanger
// ---------------------------------------------------------------------------

/// Exchanges a pair of assertions for an access token.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use jwtbearer::auth::assertion::AssertionBuilder;
/// use jwtbearer::auth::exchange::{build_http_client, TokenExchanger};
/// use jwtbearer::auth::keystore::Pkcs12KeyProvider;
/// use jwtbearer::config::Config;
///
/// # async fn example() -> jwtbearer::error::Result<()> {
/// let config = Config::default();
/// let keys = Arc::new(Pkcs12KeyProvider::new(config.keystore.clone()));
/// let assertions = AssertionBuilder::new(keys, config.assertion.clone());
/// let http = build_http_client(Duration::from_secs(config.oauth.timeout_seconds))?;
///
/// let exchanger = TokenExchanger::new(http, assertions);
/// let token = exchanger.fetch_access_token(&config.oauth).await?;
/// println!("{} token, expires in {}s", token.token_type, token.expires_in);
/// # Ok(())
/// # }
/// ```
pub struct TokenExchanger {
    http: reqwest::Client,
    assertions: AssertionBuilder,
}

impl TokenExchanger {
    /// Creates an exchanger from an HTTP client and an assertion builder.
    pub fn new(http: reqwest::Client, assertions: AssertionBuilder) -> Self {
        Self { http, assertions }
    }

    /// Runs the full JWT-Bearer grant and returns the issued access token.
    ///
    /// Both assertions use `grant.client_id` as issuer and `grant.issuer` as
    /// audience.
    ///
    /// # Errors
    ///
    /// - [`JwtBearerError::KeyAccess`] if the signing key cannot be loaded.
    /// - [`JwtBearerError::Metadata`] if discovery yields no token endpoint.
    /// - [`JwtBearerError::Signing`] if an assertion cannot be signed.
    /// - [`JwtBearerError::TokenExchange`] on transport failures, timeouts,
    ///   non-success statuses, or an unparseable token response.
    pub async fn fetch_access_token(&self, grant: &GrantConfig) -> Result<AccessTokenResult> {
        self.assertions.signing_identity()?;

        let token_endpoint = discover_token_endpoint(&self.http, &grant.issuer).await?;

        let assertion = self
            .assertions
            .build_user_assertion(&grant.client_id, &grant.issuer)?;
        let client_assertion = self
            .assertions
            .build_client_assertion(&grant.client_id, &grant.issuer)?;

        let request = TokenRequest::new(grant, assertion, client_assertion);
        self.exchange(&token_endpoint, &request).await
    }

    /// POSTs a prepared token request to `token_endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`JwtBearerError::TokenExchange`] if the request fails, the
    /// server answers with a non-success status, or the body is not a token
    /// response.
    pub async fn exchange(&self, token_endpoint: &Url, request: &TokenRequest) -> Result<AccessTokenResult> {
        tracing::debug!(
            token_endpoint = %token_endpoint,
            grant_type = %request.grant_type,
            scope = %request.scope,
            "Sending token request"
        );

        let resp = self
            .http
            .post(token_endpoint.clone())
            .form(request)
            .send()
            .await
            .map_err(|e| JwtBearerError::TokenExchange(format!("token request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(JwtBearerError::TokenExchange(format!(
                "token endpoint returned {status}: {}",
                describe_error_body(&body)
            ))
            .into());
        }

        let token: AccessTokenResult = resp.json().await.map_err(|e| {
            JwtBearerError::TokenExchange(format!("failed to parse token response: {e}"))
        })?;

        tracing::info!(
            token_type = %token.token_type,
            expires_in = token.expires_in,
            "Access token issued"
        );
        Ok(token)
    }
}
