use std::path::PathBuf;

use drop_core::AppError;
use thiserror::Error;

/// Errors raised while loading keys, issuing or parsing tokens.
///
/// Every verification failure in [`TokenAuthority::parse`](crate::TokenAuthority::parse)
/// collapses into [`AuthError::AuthenticationFailed`]; the concrete reason is
/// only logged.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("reading key directory {}: {source}", path.display())]
    KeyDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("loading key {kid:?}: {reason}")]
    KeyLoad { kid: String, reason: String },

    #[error("generating key: {0}")]
    KeyGen(String),

    #[error("unknown key id {0:?}")]
    UnknownKid(String),

    #[error("unsupported signing algorithm {0:?}")]
    UnsupportedAlgorithm(String),

    #[error("invalid claims: {0}")]
    InvalidClaims(&'static str),

    #[error("signing token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("authentication failed")]
    AuthenticationFailed,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::UnknownKid(_) | AuthError::AuthenticationFailed => {
                AppError::AuthenticationFailed
            }
            other => AppError::Unrecognized(anyhow::Error::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kid_is_generic_authentication_failure() {
        let err: AppError = AuthError::UnknownKid("retired".to_string()).into();
        assert!(matches!(err, AppError::AuthenticationFailed));
    }

    #[test]
    fn test_configuration_errors_are_unrecognized() {
        let err: AppError = AuthError::InvalidClaims("expiry must follow issue time").into();
        assert!(matches!(err, AppError::Unrecognized(_)));
    }
}
