//! Role-based authorization.
//!
//! [`authorize`] is the `Authorize(role)` stage. Policies that depend on the
//! resource being accessed, like [`ensure_owner_or_admin`], are called from
//! handlers instead.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use drop_auth::Claims;
use drop_core::{AppError, roles};
use tracing::{debug, error};

/// The role a route's `Authorize` stage demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredRole(pub &'static str);

pub async fn authorize(
    State(RequiredRole(role)): State<RequiredRole>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(claims) = req.extensions().get::<Claims>() else {
        error!(role, "authorize ran without claims in the request context");
        return Err(AppError::ContextMissing("claims"));
    };

    require_role(claims, role)?;
    Ok(next.run(req).await)
}

pub fn require_role(claims: &Claims, role: &str) -> Result<(), AppError> {
    if claims.authorized(role) {
        return Ok(());
    }
    debug!(sub = %claims.sub, role, "caller lacks required role");
    Err(AppError::Forbidden)
}

/// Admins may act on anyone; everyone else only on themselves.
pub fn ensure_owner_or_admin(claims: &Claims, owner_id: &str) -> Result<(), AppError> {
    if claims.authorized(roles::ADMIN) || claims.sub == owner_id {
        return Ok(());
    }
    debug!(sub = %claims.sub, owner_id, "caller is neither owner nor admin");
    Err(AppError::Forbidden)
}
