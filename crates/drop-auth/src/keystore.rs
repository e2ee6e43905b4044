//! Signing keys indexed by key id (`kid`).
//!
//! A [`KeyStore`] is built once at process start from a directory of
//! Ed25519 PKCS#8 PEM files. Each file's name without the `.pem` extension is
//! the key id that tokens carry in their header. The store is immutable after
//! construction, so it can be shared across request tasks without locking.
//!
//! Rotating keys means dropping a new `<kid>.pem` into the folder, signing new
//! tokens with it, and deleting the old file only once the longest-lived token
//! signed with it has expired.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ed25519_dalek::SigningKey;
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rand::rngs::OsRng;
use tracing::debug;

use crate::error::AuthError;

/// A key id paired with its private signing key and public verification key.
#[derive(Clone)]
pub struct Key {
    kid: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Key {
    /// Parses an Ed25519 private key in PKCS#8 PEM form. The verification key
    /// is derived from it.
    pub fn from_pkcs8_pem(kid: impl Into<String>, pem: &str) -> Result<Self, AuthError> {
        let kid = kid.into();
        let load_err = |reason: String| AuthError::KeyLoad {
            kid: kid.clone(),
            reason,
        };

        let signing_key = SigningKey::from_pkcs8_pem(pem).map_err(|e| load_err(e.to_string()))?;
        let der = signing_key
            .to_pkcs8_der()
            .map_err(|e| load_err(e.to_string()))?;
        let encoding = EncodingKey::from_ed_der(der.as_bytes());
        let public_x = URL_SAFE_NO_PAD.encode(signing_key.verifying_key().as_bytes());
        let decoding =
            DecodingKey::from_ed_components(&public_x).map_err(|e| load_err(e.to_string()))?;

        Ok(Self {
            kid,
            encoding,
            decoding,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("Key").field("kid", &self.kid).finish()
    }
}

/// Immutable mapping from key id to [`Key`].
#[derive(Clone, Default)]
pub struct KeyStore {
    keys: HashMap<String, Key>,
}

impl KeyStore {
    /// Loads every `*.pem` file in `dir`. Other entries are ignored; a single
    /// unparsable key file fails the whole load.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, AuthError> {
        let dir = dir.as_ref();
        let dir_err = |source| AuthError::KeyDir {
            path: dir.to_path_buf(),
            source,
        };

        let mut keys = HashMap::new();
        for entry in fs::read_dir(dir).map_err(dir_err)? {
            let path = entry.map_err(dir_err)?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("pem") {
                continue;
            }

            let kid = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| AuthError::KeyLoad {
                    kid: path.display().to_string(),
                    reason: "file name is not valid UTF-8".to_string(),
                })?
                .to_string();
            let pem = fs::read_to_string(&path).map_err(|e| AuthError::KeyLoad {
                kid: kid.clone(),
                reason: e.to_string(),
            })?;

            let key = Key::from_pkcs8_pem(kid.clone(), &pem)?;
            keys.insert(kid, key);
        }

        let store = Self { keys };
        debug!(dir = %dir.display(), kids = ?store.kids(), "key store loaded");
        Ok(store)
    }

    /// Builds a store from in-memory `(kid, pem)` pairs.
    pub fn from_pems<I, K, P>(pems: I) -> Result<Self, AuthError>
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: AsRef<str>,
    {
        let mut keys = HashMap::new();
        for (kid, pem) in pems {
            let key = Key::from_pkcs8_pem(kid, pem.as_ref())?;
            keys.insert(key.kid.clone(), key);
        }
        Ok(Self { keys })
    }

    /// Looks up a key by id. There is no default key.
    pub fn lookup(&self, kid: &str) -> Result<&Key, AuthError> {
        self.keys
            .get(kid)
            .ok_or_else(|| AuthError::UnknownKid(kid.to_string()))
    }

    /// Known key ids, sorted.
    pub fn kids(&self) -> Vec<&str> {
        let mut kids: Vec<&str> = self.keys.keys().map(String::as_str).collect();
        kids.sort_unstable();
        kids
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore")
            .field("kids", &self.kids())
            .finish()
    }
}

/// Generates a fresh Ed25519 private key encoded as PKCS#8 PEM.
pub fn generate_private_key_pem() -> Result<String, AuthError> {
    let signing_key = SigningKey::generate(&mut OsRng);
    let pem = signing_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| AuthError::KeyGen(e.to_string()))?;
    Ok(pem.as_str().to_owned())
}
