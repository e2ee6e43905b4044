//! Token issuance and verification.
//!
//! The [`TokenAuthority`] signs [`Claims`] with a key chosen by id and embeds
//! that id in the token header. Verification reads the `kid` back out of the
//! header and checks the signature with the matching public key, so tokens
//! signed before a key rotation keep verifying for as long as their key stays
//! in the [`KeyStore`].
//!
//! # Example
//!
//! ```ignore
//! use drop_auth::{Claims, KeyStore, TokenAuthority};
//!
//! let keys = KeyStore::from_dir("scripts/keys/")?;
//! let authority = TokenAuthority::new("EdDSA", keys)?;
//!
//! let token = authority.issue(&claims, "k1")?;
//! let verified = authority.parse(&token)?;
//! assert_eq!(verified, claims);
//! ```

use std::str::FromStr;

use jsonwebtoken::{Algorithm, Header, Validation, decode, decode_header, encode};
use thiserror::Error;
use tracing::warn;

use crate::claims::Claims;
use crate::error::AuthError;
use crate::keystore::KeyStore;

/// Why a token was rejected. Logged, never returned to callers.
#[derive(Debug, Error)]
enum Rejection {
    #[error("malformed token header: {0}")]
    Malformed(jsonwebtoken::errors::Error),
    #[error("token declares algorithm {declared:?}, expected {expected:?}")]
    AlgorithmMismatch {
        declared: Algorithm,
        expected: Algorithm,
    },
    #[error("token header has no kid")]
    MissingKid,
    #[error("unknown kid {0:?}")]
    UnknownKid(String),
    #[error("verification failed: {0}")]
    Invalid(jsonwebtoken::errors::Error),
}

/// Issues and parses signed tokens. Read-only after construction.
#[derive(Debug, Clone)]
pub struct TokenAuthority {
    algorithm: Algorithm,
    keys: KeyStore,
    validation: Validation,
}

impl TokenAuthority {
    /// Fixes the signing algorithm for the lifetime of the authority.
    ///
    /// Keys are Ed25519, so `EdDSA` is the only algorithm accepted.
    pub fn new(algorithm: &str, keys: KeyStore) -> Result<Self, AuthError> {
        let algorithm = Algorithm::from_str(algorithm)
            .ok()
            .filter(|alg| *alg == Algorithm::EdDSA)
            .ok_or_else(|| AuthError::UnsupportedAlgorithm(algorithm.to_string()))?;

        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Ok(Self {
            algorithm,
            keys,
            validation,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn keys(&self) -> &KeyStore {
        &self.keys
    }

    /// Signs `claims` with the private key registered under `signing_kid`.
    pub fn issue(&self, claims: &Claims, signing_kid: &str) -> Result<String, AuthError> {
        claims.validate()?;
        let key = self.keys.lookup(signing_kid)?;

        let mut header = Header::new(self.algorithm);
        header.typ = Some("JWT".to_string());
        header.kid = Some(key.kid().to_string());

        encode(&header, claims, key.encoding_key()).map_err(AuthError::Signing)
    }

    /// Verifies `token` and returns its claims.
    ///
    /// Malformed tokens, unknown or missing key ids, algorithm mismatches, bad
    /// signatures and expired tokens all yield
    /// [`AuthError::AuthenticationFailed`].
    pub fn parse(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token).map_err(|reason| {
            warn!(%reason, "token rejected");
            AuthError::AuthenticationFailed
        })
    }

    fn verify(&self, token: &str) -> Result<Claims, Rejection> {
        let header = decode_header(token).map_err(Rejection::Malformed)?;
        if header.alg != self.algorithm {
            return Err(Rejection::AlgorithmMismatch {
                declared: header.alg,
                expected: self.algorithm,
            });
        }

        let kid = header.kid.ok_or(Rejection::MissingKid)?;
        let key = self
            .keys
            .lookup(&kid)
            .map_err(|_| Rejection::UnknownKid(kid.clone()))?;

        decode::<Claims>(token, key.decoding_key(), &self.validation)
            .map(|data| data.claims)
            .map_err(Rejection::Invalid)
    }
}
