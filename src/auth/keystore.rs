//! Signing identity backed by a PKCS#12 credential store
//!
//! The grant needs exactly one RSA key pair: the private half signs both
//! assertions, the public half lets tests and the `assertions --verify`
//! command check them. The pair is read from a `.p12` container by alias and
//! cached for the life of the provider.
//!
//! # Examples
//!
//! ```no_run
//! use jwtbearer::auth::keystore::{KeyProvider, Pkcs12KeyProvider};
//! use jwtbearer::config::KeystoreConfig;
//!
//! # fn example() -> jwtbearer::error::Result<()> {
//! let provider = Pkcs12KeyProvider::new(KeystoreConfig {
//!     path: "keystore/signer.p12".into(),
//!     password: "changeit".to_string(),
//!     alias: "signer".to_string(),
//! });
//! let identity = provider.signing_identity()?;
//! println!("signing with alias {}", identity.alias());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, OnceLock};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Validation};
use p12_keystore::{KeyStore, KeyStoreEntry};
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;

use crate::auth::assertion::AssertionClaims;
use crate::config::KeystoreConfig;
use crate::error::{JwtBearerError, Result};

// ---------------------------------------------------------------------------
// KeyProvider
// ---------------------------------------------------------------------------

/// Source of the key pair used to sign assertions.
///
/// Implementations must be cheap to call repeatedly; the assertion builder
/// asks for the identity once per signed token.
pub trait KeyProvider: Send + Sync {
    /// Returns the signing identity, loading it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`JwtBearerError::KeyAccess`] when the credential store or the
    /// key inside it cannot be read.
    fn signing_identity(&self) -> Result<Arc<SigningIdentity>>;
}

// ---------------------------------------------------------------------------
// SigningIdentity
// ---------------------------------------------------------------------------

/// An RSA key pair bound to one alias of a credential store.
///
/// Immutable once constructed and safe to share across tasks.
pub struct SigningIdentity {
    alias: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SigningIdentity {
    /// Builds an identity from a PKCS#8 DER-encoded private key.
    ///
    /// The public key is derived from the private key, so the pair always
    /// matches.
    ///
    /// # Errors
    ///
    /// Returns [`JwtBearerError::KeyAccess`] if the key is not an RSA key or
    /// cannot be re-encoded for signing.
    pub fn from_pkcs8_der(alias: impl Into<String>, der: &[u8]) -> Result<Self> {
        let alias = alias.into();
        let private_key = RsaPrivateKey::from_pkcs8_der(der).map_err(|e| {
            JwtBearerError::KeyAccess(format!(
                "unsupported key for alias '{alias}': expected an RSA private key ({e})"
            ))
        })?;

        let private_der = private_key.to_pkcs1_der().map_err(|e| {
            JwtBearerError::KeyAccess(format!("failed to encode private key: {e}"))
        })?;
        let public_der = private_key.to_public_key().to_pkcs1_der().map_err(|e| {
            JwtBearerError::KeyAccess(format!("failed to encode public key: {e}"))
        })?;

        Ok(Self {
            alias,
            encoding_key: EncodingKey::from_rsa_der(private_der.as_bytes()),
            decoding_key: DecodingKey::from_rsa_der(public_der.as_bytes()),
        })
    }

    /// The credential store alias this identity was loaded from.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// Verifies an RS256 compact token against the public key.
    ///
    /// Checks the signature, `aud`, `exp` and `nbf`, and requires all of the
    /// registered claims an assertion carries.
    ///
    /// # Errors
    ///
    /// Returns [`JwtBearerError::Signing`] if the token does not verify.
    pub fn verify(&self, token: &str, audience: &str) -> Result<AssertionClaims> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[audience]);
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["iss", "sub", "aud", "exp", "nbf", "iat"]);

        let data = jsonwebtoken::decode::<AssertionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                JwtBearerError::Signing(format!("assertion verification failed: {e}"))
            })?;

        Ok(data.claims)
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("alias", &self.alias)
            .field("algorithm", &"RS256")
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Pkcs12KeyProvider
// ---------------------------------------------------------------------------

/// [`KeyProvider`] that reads the key pair from a PKCS#12 file.
///
/// The file is opened on the first call to
/// [`signing_identity`](KeyProvider::signing_identity); later calls return
/// the cached identity without touching the file again. The store password
/// also unlocks the key entry.
pub struct Pkcs12KeyProvider {
    config: KeystoreConfig,
    identity: OnceLock<Arc<SigningIdentity>>,
}

impl Pkcs12KeyProvider {
    /// Creates a provider for the given keystore; nothing is read yet.
    pub fn new(config: KeystoreConfig) -> Self {
        Self {
            config,
            identity: OnceLock::new(),
        }
    }

    fn load(&self) -> Result<SigningIdentity> {
        let path = &self.config.path;
        let data = std::fs::read(path).map_err(|e| {
            JwtBearerError::KeyAccess(format!(
                "failed to read keystore {}: {e}",
                path.display()
            ))
        })?;

        let store = KeyStore::from_pkcs12(&data, &self.config.password).map_err(|e| {
            JwtBearerError::KeyAccess(format!(
                "failed to open keystore {} (wrong password or not PKCS#12): {e}",
                path.display()
            ))
        })?;

        match store.entry(&self.config.alias) {
            Some(KeyStoreEntry::PrivateKeyChain(chain)) => {
                SigningIdentity::from_pkcs8_der(self.config.alias.clone(), chain.key())
            }
            Some(_) => Err(JwtBearerError::KeyAccess(format!(
                "keystore entry '{}' does not hold a private key",
                self.config.alias
            ))
            .into()),
            None => Err(JwtBearerError::KeyAccess(format!(
                "alias '{}' not found in keystore {}",
                self.config.alias,
                path.display()
            ))
            .into()),
        }
    }
}

impl KeyProvider for Pkcs12KeyProvider {
    fn signing_identity(&self) -> Result<Arc<SigningIdentity>> {
        if let Some(identity) = self.identity.get() {
            return Ok(Arc::clone(identity));
        }

        let loaded = Arc::new(self.load()?);
        tracing::info!(
            alias = %self.config.alias,
            path = %self.config.path.display(),
            "Loaded signing identity from keystore"
        );

        // A concurrent first call may have won the race; both loaded the same key.
        Ok(Arc::clone(self.identity.get_or_init(|| loaded)))
    }
}
