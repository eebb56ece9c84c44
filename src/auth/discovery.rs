//! OpenID Connect discovery of the token endpoint
//!
//! The client only needs one value from the authorization server metadata:
//! the URL of the token endpoint. It is read from the OpenID Connect
//! Discovery document at `<issuer>/.well-known/openid-configuration`.
//!
//! # References
//!
//! - OpenID Connect Discovery 1.0 <https://openid.net/specs/openid-connect-discovery-1_0.html>
//! - RFC 8414 <https://www.rfc-editor.org/rfc/rfc8414>

use serde_json::{Map, Value};
use url::Url;

use crate::error::{JwtBearerError, Result};

/// Path appended to the issuer to locate the discovery document.
pub const OPENID_CONFIGURATION_PATH: &str = "/.well-known/openid-configuration";

const TOKEN_ENDPOINT_KEY: &str = "token_endpoint";

/// Returns the discovery document URL for an issuer.
///
/// The path is appended to the issuer as-is (path appending, not path
/// insertion); a single trailing slash on the issuer is dropped first.
///
/// # Examples
///
/// ```
/// use jwtbearer::auth::discovery::openid_configuration_url;
///
/// assert_eq!(
///     openid_configuration_url("https://idsvr.example/oauth/v2/oauth-anonymous/"),
///     "https://idsvr.example/oauth/v2/oauth-anonymous/.well-known/openid-configuration"
/// );
/// ```
pub fn openid_configuration_url(issuer: &str) -> String {
    let base = issuer.strip_suffix('/').unwrap_or(issuer);
    format!("{base}{OPENID_CONFIGURATION_PATH}")
}

/// Extracts the token endpoint from a parsed discovery document.
///
/// The key is matched case-insensitively; an exact `token_endpoint` key is
/// preferred when several keys match.
///
/// # Errors
///
/// Returns [`JwtBearerError::Metadata`] if the document is not a non-empty
/// JSON object, the key is absent, or the value is not an absolute URL.
///
/// # Examples
///
/// ```
/// use jwtbearer::auth::discovery::token_endpoint_from_document;
///
/// let doc = serde_json::json!({"Token_Endpoint": "https://idsvr.example/token"});
/// let url = token_endpoint_from_document(&doc).unwrap();
/// assert_eq!(url.as_str(), "https://idsvr.example/token");
///
/// assert!(token_endpoint_from_document(&serde_json::json!({})).is_err());
/// ```
pub fn token_endpoint_from_document(document: &Value) -> Result<Url> {
    let map = match document {
        Value::Object(map) => map,
        Value::Null => {
            return Err(JwtBearerError::Metadata("OIDC metadata document is empty".to_string()).into())
        }
        other => {
            return Err(JwtBearerError::Metadata(format!(
                "OIDC metadata document is not a JSON object: {other}"
            ))
            .into())
        }
    };

    let value = find_token_endpoint(map).ok_or_else(|| {
        JwtBearerError::Metadata(
            "token_endpoint is not found in the OIDC metadata response".to_string(),
        )
    })?;

    let raw = value.as_str().ok_or_else(|| {
        JwtBearerError::Metadata(format!("token_endpoint is not a string: {value}"))
    })?;

    let url = Url::parse(raw).map_err(|e| {
        JwtBearerError::Metadata(format!("token_endpoint '{raw}' is not a valid URL: {e}"))
    })?;

    Ok(url)
}

fn find_token_endpoint(map: &Map<String, Value>) -> Option<&Value> {
    map.get(TOKEN_ENDPOINT_KEY).or_else(|| {
        map.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(TOKEN_ENDPOINT_KEY))
            .map(|(_, value)| value)
    })
}

/// Discovers the token endpoint of an authorization server.
///
/// Issues `GET <issuer>/.well-known/openid-configuration` and extracts the
/// `token_endpoint` value. The request timeout is the one configured on
/// `http`.
///
/// # Arguments
///
/// * `http` - Shared [`reqwest::Client`] used to issue the discovery request.
/// * `issuer` - The authorization server issuer URL.
///
/// # Errors
///
/// Returns [`JwtBearerError::TokenExchange`] if the request cannot be sent or
/// times out, and [`JwtBearerError::Metadata`] if the server answers with a
/// non-success status or a document without a usable `token_endpoint`.
///
/// # Examples
///
/// ```no_run
/// use jwtbearer::auth::discovery::discover_token_endpoint;
///
/// # async fn example() -> jwtbearer::error::Result<()> {
/// let http = reqwest::Client::new();
/// let endpoint = discover_token_endpoint(&http, "https://idsvr.example").await?;
/// println!("token endpoint: {endpoint}");
/// # Ok(())
/// # }
/// ```
pub async fn discover_token_endpoint(http: &reqwest::Client, issuer: &str) -> Result<Url> {
    let metadata_url = openid_configuration_url(issuer);
    tracing::debug!(url = %metadata_url, "Fetching OIDC metadata");

    let resp = http
        .get(&metadata_url)
        .send()
        .await
        .map_err(|e| JwtBearerError::TokenExchange(format!("metadata fetch failed: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(JwtBearerError::Metadata(format!(
            "metadata endpoint {metadata_url} returned {status}"
        ))
        .into());
    }

    let body = resp.bytes().await.map_err(|e| {
        JwtBearerError::TokenExchange(format!("failed to read metadata response: {e}"))
    })?;

    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(JwtBearerError::Metadata("OIDC metadata document is empty".to_string()).into());
    }

    let document: Value = serde_json::from_slice(&body).map_err(|e| {
        JwtBearerError::Metadata(format!("failed to parse OIDC metadata document: {e}"))
    })?;

    let endpoint = token_endpoint_from_document(&document)?;
    tracing::info!(token_endpoint = %endpoint, "Discovered token endpoint");
    Ok(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata_message(result: Result<Url>) -> String {
        let err = result.expect_err("expected a metadata failure");
        match err.downcast_ref::<JwtBearerError>() {
            Some(JwtBearerError::Metadata(msg)) => msg.clone(),
            other => panic!("expected Metadata, got {other:?}"),
        }
    }

    #[test]
    fn test_openid_configuration_url_appends_path() {
        assert_eq!(
            openid_configuration_url("https://idsvr.example"),
            "https://idsvr.example/.well-known/openid-configuration"
        );
    }

    #[test]
    fn test_openid_configuration_url_keeps_issuer_path() {
        assert_eq!(
            openid_configuration_url("https://idsvr.example/oauth/v2/oauth-anonymous"),
            "https://idsvr.example/oauth/v2/oauth-anonymous/.well-known/openid-configuration"
        );
    }

    #[test]
    fn test_token_endpoint_exact_key() {
        let doc = json!({"token_endpoint": "https://example.com/token"});
        let url = token_endpoint_from_document(&doc).unwrap();
        assert_eq!(url.as_str(), "https://example.com/token");
    }

    #[test]
    fn test_token_endpoint_key_is_case_insensitive() {
        let doc = json!({"TOKEN_ENDPOINT": "https://example.com/token"});
        let url = token_endpoint_from_document(&doc).unwrap();
        assert_eq!(url.as_str(), "https://example.com/token");
    }

    #[test]
    fn test_exact_key_wins_over_case_variant() {
        let doc = json!({
            "TOKEN_ENDPOINT": "https://example.com/upper",
            "token_endpoint": "https://example.com/token"
        });
        let url = token_endpoint_from_document(&doc).unwrap();
        assert_eq!(url.as_str(), "https://example.com/token");
    }

    #[test]
    fn test_empty_object_is_metadata_error() {
        let msg = metadata_message(token_endpoint_from_document(&json!({})));
        assert!(msg.contains("token_endpoint is not found"), "got: {msg}");
    }

    #[test]
    fn test_null_document_is_metadata_error() {
        let msg = metadata_message(token_endpoint_from_document(&Value::Null));
        assert!(msg.contains("empty"), "got: {msg}");
    }

    #[test]
    fn test_array_document_is_metadata_error() {
        let msg = metadata_message(token_endpoint_from_document(&json!(["token_endpoint"])));
        assert!(msg.contains("not a JSON object"), "got: {msg}");
    }

    #[test]
    fn test_non_string_token_endpoint_is_metadata_error() {
        let msg = metadata_message(token_endpoint_from_document(&json!({"token_endpoint": 42})));
        assert!(msg.contains("not a string"), "got: {msg}");
    }

    #[test]
    fn test_relative_token_endpoint_is_metadata_error() {
        let msg =
            metadata_message(token_endpoint_from_document(&json!({"token_endpoint": "/token"})));
        assert!(msg.contains("not a valid URL"), "got: {msg}");
    }

    #[test]
    fn test_only_token_endpoint_is_inspected() {
        // Other keys are irrelevant, whatever their case.
        let doc = json!({
            "ISSUER": "https://example.com",
            "token_endpoint": "https://example.com/token",
            "jwks_uri": 17
        });
        assert!(token_endpoint_from_document(&doc).is_ok());
    }

    // Wiremock integration tests are in tests/discovery_test.rs
}
