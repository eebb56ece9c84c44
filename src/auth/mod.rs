//! RFC 7523 JWT-Bearer grant
//!
//! # Module Layout
//!
//! - [`keystore`]  -- PKCS#12-backed signing identity
//! - [`assertion`] -- user and client assertion claims and RS256 signing
//! - [`discovery`] -- OIDC discovery of the token endpoint
//! - [`exchange`]  -- token request and response handling

pub mod assertion;
pub mod discovery;
pub mod exchange;
pub mod keystore;
