use std::path::PathBuf;

/// Longest token lifetime accepted from the environment: 30 days.
pub const MAX_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Token authority settings.
///
/// | Variable | Default |
/// |----------|---------|
/// | `DROP_AUTH_KEYS_FOLDER` | `scripts/keys/` |
/// | `DROP_AUTH_ALGORITHM` | `EdDSA` |
/// | `DROP_AUTH_ISSUER` | `drop project` |
/// | `DROP_AUTH_TOKEN_TTL_SECS` | `3600` (1 hour), at most [`MAX_TOKEN_TTL_SECS`] |
/// | `DROP_USERS_FILE` | unset (empty user store) |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthConfig {
    pub keys_folder: PathBuf,
    pub algorithm: String,
    pub issuer: String,
    pub token_ttl_secs: i64,
    pub users_file: Option<PathBuf>,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            keys_folder: lookup("DROP_AUTH_KEYS_FOLDER")
                .unwrap_or_else(|| "scripts/keys/".to_string())
                .into(),
            algorithm: lookup("DROP_AUTH_ALGORITHM").unwrap_or_else(|| "EdDSA".to_string()),
            issuer: lookup("DROP_AUTH_ISSUER").unwrap_or_else(|| "drop project".to_string()),
            token_ttl_secs: lookup("DROP_AUTH_TOKEN_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .filter(|ttl: &i64| *ttl > 0)
                .map(|ttl| ttl.min(MAX_TOKEN_TTL_SECS))
                .unwrap_or(3600), // 1 hour
            users_file: lookup("DROP_USERS_FILE")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}
