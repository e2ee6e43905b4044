//! Bearer token authentication.
//!
//! [`authenticate`] is the `Authenticate` stage: it verifies the token in the
//! `Authorization` header and stores the resulting [`Claims`] in the request
//! extensions. Handlers read them back with the [`AuthUser`] extractor.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use drop_auth::{Claims, TokenAuthority};
use drop_core::AppError;
use tracing::debug;

pub async fn authenticate(
    State(authority): State<Arc<TokenAuthority>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = {
        let token = bearer_token(req.headers())?;
        authority.parse(token)?
    };

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Extracts `<token>` from `Authorization: Bearer <token>`. The scheme is
/// case-insensitive.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            debug!("missing or unreadable authorization header");
            AppError::AuthenticationFailed
        })?;

    match value.split_once(' ') {
        Some((scheme, token))
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() && !token.contains(' ') =>
        {
            Ok(token)
        }
        _ => {
            debug!("expected authorization header format: bearer <token>");
            Err(AppError::AuthenticationFailed)
        }
    }
}

/// Claims of the caller, as stored by the `Authenticate` stage.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn subject(&self) -> &str {
        &self.0.sub
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.0.authorized(role)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::ContextMissing("claims"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extracts_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token(&headers("bearer abc")).unwrap(), "abc");
    }

    #[test]
    fn test_bearer_token_rejects_other_shapes() {
        for value in ["Basic dTpw", "Bearer", "Bearer ", "Bearer a b", "abc"] {
            assert!(
                matches!(bearer_token(&headers(value)), Err(AppError::AuthenticationFailed)),
                "{value:?} should be rejected"
            );
        }
        assert!(bearer_token(&HeaderMap::new()).is_err());
    }
}
