//! RFC 7523 assertion construction and signing
//!
//! The JWT-Bearer grant sends two self-signed tokens to the token endpoint:
//!
//! - the **user assertion** (`assertion` parameter, RFC 7523 §2.1) names the
//!   end user as `sub` and is the authorization grant itself;
//! - the **client assertion** (`client_assertion` parameter, RFC 7523 §2.2)
//!   names the client as both `iss` and `sub` and authenticates the client.
//!
//! Both carry the same registered claims and are signed RS256 with the same
//! key, so they are wrapped in distinct types ([`UserAssertion`] and
//! [`ClientAssertion`]) that cannot be passed in each other's place.
//!
//! # References
//!
//! - RFC 7523 <https://www.rfc-editor.org/rfc/rfc7523>
//! - RFC 7519 <https://www.rfc-editor.org/rfc/rfc7519>

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, Header};
use serde::{Deserialize, Serialize};

use crate::auth::keystore::{KeyProvider, SigningIdentity};
use crate::config::UserAssertionConfig;
use crate::error::{JwtBearerError, Result};

/// Lifetime of every assertion, in seconds.
pub const ASSERTION_LIFETIME_SECONDS: i64 = 300;

/// Claim names owned by [`AssertionClaims`]; extra claims may not shadow them.
const REGISTERED_CLAIMS: [&str; 7] = ["iss", "sub", "aud", "iat", "nbf", "exp", "jti"];

// ---------------------------------------------------------------------------
// AssertionClaims
// ---------------------------------------------------------------------------

/// The claim set of one assertion.
///
/// Constructed with [`AssertionClaims::new`], which fixes the validity window
/// to `issued_at..issued_at + 5 min` with `not_before == issued_at` and draws
/// a fresh random `jti`.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use jwtbearer::auth::assertion::AssertionClaims;
///
/// let claims = AssertionClaims::new("my-client", "my-client", "https://idsvr.example", Utc::now());
/// assert_eq!(claims.expires_at() - claims.issued_at(), 300);
/// assert_eq!(claims.not_before(), claims.issued_at());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    #[serde(rename = "iss")]
    issuer: String,
    #[serde(rename = "sub")]
    subject: String,
    #[serde(rename = "aud")]
    audience: String,
    #[serde(rename = "iat")]
    issued_at: i64,
    #[serde(rename = "nbf")]
    not_before: i64,
    #[serde(rename = "exp")]
    expires_at: i64,
    #[serde(rename = "jti")]
    jwt_id: String,
    #[serde(flatten)]
    extra: BTreeMap<String, String>,
}

impl AssertionClaims {
    /// Creates a claim set valid from `now` for five minutes.
    pub fn new(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        audience: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let issued_at = now.timestamp();
        Self {
            issuer: issuer.into(),
            subject: subject.into(),
            audience: audience.into(),
            issued_at,
            not_before: issued_at,
            expires_at: issued_at + ASSERTION_LIFETIME_SECONDS,
            jwt_id: uuid::Uuid::new_v4().to_string(),
            extra: BTreeMap::new(),
        }
    }

    /// Returns a copy of these claims with additional string-valued claims.
    ///
    /// Names that collide with a registered claim are skipped.
    pub fn with_extra_claims<'a, I>(mut self, claims: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (name, value) in claims {
            if REGISTERED_CLAIMS.contains(&name.as_str()) {
                tracing::warn!(claim = %name, "Ignoring custom claim that shadows a registered claim");
                continue;
            }
            self.extra.insert(name.clone(), value.clone());
        }
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// `iat`, seconds since the Unix epoch.
    pub fn issued_at(&self) -> i64 {
        self.issued_at
    }

    /// `nbf`, seconds since the Unix epoch.
    pub fn not_before(&self) -> i64 {
        self.not_before
    }

    /// `exp`, seconds since the Unix epoch.
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    pub fn jwt_id(&self) -> &str {
        &self.jwt_id
    }

    /// Custom claims beyond the registered set.
    pub fn extra_claims(&self) -> &BTreeMap<String, String> {
        &self.extra
    }
}

// ---------------------------------------------------------------------------
// Signed assertions
// ---------------------------------------------------------------------------

/// A JWS compact serialization (`header.payload.signature`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SignedAssertion(String);

impl SignedAssertion {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignedAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signed assertion identifying the end user; sent as `assertion`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UserAssertion(SignedAssertion);

impl UserAssertion {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Signed assertion authenticating the client; sent as `client_assertion`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClientAssertion(SignedAssertion);

impl ClientAssertion {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Signs a claim set with RS256.
///
/// Pure apart from the signature computation: the same claims and key always
/// produce the same token.
///
/// # Errors
///
/// Returns [`JwtBearerError::Signing`] if serialization or signing fails.
pub fn sign(claims: &AssertionClaims, identity: &SigningIdentity) -> Result<SignedAssertion> {
    let header = Header::new(Algorithm::RS256);
    let token = jsonwebtoken::encode(&header, claims, identity.encoding_key()).map_err(|e| {
        JwtBearerError::Signing(format!(
            "failed to sign assertion with key '{}': {e}",
            identity.alias()
        ))
    })?;
    Ok(SignedAssertion(token))
}

// ---------------------------------------------------------------------------
// AssertionBuilder
// ---------------------------------------------------------------------------

/// Builds and signs the two assertions of the grant.
///
/// Every call takes a fresh timestamp and `jti`; nothing is memoized.
pub struct AssertionBuilder {
    keys: Arc<dyn KeyProvider>,
    user: UserAssertionConfig,
}

impl AssertionBuilder {
    /// Creates a builder signing with `keys` on behalf of the user described
    /// by `user`.
    pub fn new(keys: Arc<dyn KeyProvider>, user: UserAssertionConfig) -> Self {
        Self { keys, user }
    }

    /// Resolves the signing identity without building anything.
    ///
    /// # Errors
    ///
    /// Returns [`JwtBearerError::KeyAccess`] if the key cannot be loaded.
    pub fn signing_identity(&self) -> Result<Arc<SigningIdentity>> {
        self.keys.signing_identity()
    }

    /// Claim set for the user assertion.
    pub fn user_claims(&self, client_id: &str, audience: &str, now: DateTime<Utc>) -> AssertionClaims {
        AssertionClaims::new(client_id, &self.user.subject, audience, now)
            .with_extra_claims(&self.user.claims)
    }

    /// Claim set for the client assertion: `iss == sub == client_id`.
    pub fn client_claims(client_id: &str, audience: &str, now: DateTime<Utc>) -> AssertionClaims {
        AssertionClaims::new(client_id, client_id, audience, now)
    }

    /// Builds the signed user assertion.
    ///
    /// # Errors
    ///
    /// Returns [`JwtBearerError::KeyAccess`] if the key cannot be loaded and
    /// [`JwtBearerError::Signing`] if signing fails.
    pub fn build_user_assertion(&self, client_id: &str, audience: &str) -> Result<UserAssertion> {
        let identity = self.keys.signing_identity()?;
        let claims = self.user_claims(client_id, audience, Utc::now());
        let jws = sign(&claims, &identity)?;

        tracing::debug!(
            jti = %claims.jwt_id(),
            subject = %claims.subject(),
            "User assertion built for user authentication: {}",
            jws
        );
        Ok(UserAssertion(jws))
    }

    /// Builds the signed client assertion.
    ///
    /// # Errors
    ///
    /// Returns [`JwtBearerError::KeyAccess`] if the key cannot be loaded and
    /// [`JwtBearerError::Signing`] if signing fails.
    pub fn build_client_assertion(&self, client_id: &str, audience: &str) -> Result<ClientAssertion> {
        let identity = self.keys.signing_identity()?;
        let claims = Self::client_claims(client_id, audience, Utc::now());
        let jws = sign(&claims, &identity)?;

        tracing::debug!(
            jti = %claims.jwt_id(),
            "Client assertion built for client authentication: {}",
            jws
        );
        Ok(ClientAssertion(jws))
    }
}
