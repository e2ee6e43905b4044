//! # Drop CLI
//!
//! Key and token tooling for operators of the Drop API.
//!
//! ## Usage
//!
//! ```ignore
//! use drop_cli::{genkey, gentoken, TokenRequest};
//!
//! let path = genkey("scripts/keys/", None)?; // scripts/keys/<uuid>.pem
//! let token = gentoken("scripts/keys/", &TokenRequest { .. })?;
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use drop_auth::{Claims, KeyStore, TokenAuthority, generate_private_key_pem};
use uuid::Uuid;

/// Writes a fresh Ed25519 private key to `<folder>/<kid>.pem`.
///
/// The kid defaults to a random UUID. An existing file is never overwritten.
pub fn genkey(folder: impl AsRef<Path>, kid: Option<&str>) -> Result<PathBuf> {
    let folder = folder.as_ref();
    let kid = match kid {
        Some(kid) => kid.to_string(),
        None => Uuid::new_v4().to_string(),
    };
    if kid.is_empty() || kid.contains(['/', '\\']) || kid.starts_with('.') {
        bail!("invalid key id {kid:?}");
    }

    std::fs::create_dir_all(folder)
        .with_context(|| format!("creating key folder {}", folder.display()))?;

    let path = folder.join(format!("{kid}.pem"));
    let pem = generate_private_key_pem()?;

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    file.write_all(pem.as_bytes())
        .with_context(|| format!("writing {}", path.display()))?;

    Ok(path)
}

/// What to put in a token minted from the command line.
#[derive(Debug, Clone)]
pub struct TokenRequest {
    pub kid: String,
    pub subject: String,
    pub roles: Vec<String>,
    pub issuer: String,
    pub algorithm: String,
    /// Lifetime in seconds.
    pub ttl_secs: i64,
}

/// Loads the key folder and signs a token for `request.subject`.
pub fn gentoken(folder: impl AsRef<Path>, request: &TokenRequest) -> Result<String> {
    let folder = folder.as_ref();
    let keys = KeyStore::from_dir(folder)
        .with_context(|| format!("loading keys from {}", folder.display()))?;
    let authority = TokenAuthority::new(&request.algorithm, keys)?;

    let claims = Claims::new(
        request.subject.clone(),
        request.roles.clone(),
        request.issuer.clone(),
        Utc::now(),
        request.ttl_secs,
    )
    .with_context(|| format!("token lifetime of {} seconds", request.ttl_secs))?;

    authority
        .issue(&claims, &request.kid)
        .with_context(|| format!("signing token with kid {:?}", request.kid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn request(kid: &str) -> TokenRequest {
        TokenRequest {
            kid: kid.to_string(),
            subject: "u1".to_string(),
            roles: vec!["ADMIN".to_string()],
            issuer: "drop project".to_string(),
            algorithm: "EdDSA".to_string(),
            ttl_secs: 3600,
        }
    }

    #[test]
    fn test_genkey_defaults_kid_to_uuid() {
        let dir = TempDir::new().unwrap();

        let path = genkey(dir.path(), None).unwrap();

        let stem = path.file_stem().unwrap().to_str().unwrap();
        assert!(Uuid::parse_str(stem).is_ok());
        assert_eq!(path.extension().unwrap(), "pem");
    }

    #[cfg(unix)]
    #[test]
    fn test_genkey_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();

        let path = genkey(dir.path(), Some("k1")).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_genkey_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let first = genkey(dir.path(), Some("k1")).unwrap();
        let before = std::fs::read_to_string(&first).unwrap();

        assert!(genkey(dir.path(), Some("k1")).is_err());
        assert_eq!(std::fs::read_to_string(&first).unwrap(), before);
    }

    #[test]
    fn test_genkey_rejects_path_like_kid() {
        let dir = TempDir::new().unwrap();
        assert!(genkey(dir.path(), Some("../escape")).is_err());
        assert!(genkey(dir.path(), Some("")).is_err());
    }

    #[test]
    fn test_gentoken_verifies_against_same_folder() {
        let dir = TempDir::new().unwrap();
        genkey(dir.path(), Some("k1")).unwrap();

        let token = gentoken(dir.path(), &request("k1")).unwrap();

        let keys = KeyStore::from_dir(dir.path()).unwrap();
        let claims = TokenAuthority::new("EdDSA", keys)
            .unwrap()
            .parse(&token)
            .unwrap();
        assert_eq!(claims.sub, "u1");
        assert!(claims.authorized("ADMIN"));
    }

    #[test]
    fn test_gentoken_unknown_kid_fails() {
        let dir = TempDir::new().unwrap();
        genkey(dir.path(), Some("k1")).unwrap();

        assert!(gentoken(dir.path(), &request("k2")).is_err());
    }

    #[test]
    fn test_gentoken_out_of_range_ttl_fails() {
        let dir = TempDir::new().unwrap();
        genkey(dir.path(), Some("k1")).unwrap();

        let mut req = request("k1");
        req.ttl_secs = i64::MAX;

        assert!(gentoken(dir.path(), &req).is_err());
    }
}
