use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
    typed_header::TypedHeaderRejection,
};
use drop_auth::Claims;
use drop_core::{AppError, FieldError};
use tracing::{debug, instrument};

use crate::middleware::auth::AuthUser;
use crate::middleware::role::ensure_owner_or_admin;
use crate::modules::users::model::{TokenResponse, UserInfo};
use crate::state::AppState;
use crate::web::RequestValues;

/// Exchanges HTTP Basic credentials for a token signed with key `kid`.
#[instrument(skip(state, values, credentials))]
pub async fn token(
    State(state): State<AppState>,
    values: RequestValues,
    Path(kid): Path<String>,
    credentials: Result<TypedHeader<Authorization<Basic>>, TypedHeaderRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let TypedHeader(Authorization(basic)) = credentials.map_err(|rejection| {
        debug!(%rejection, "missing or malformed basic credentials");
        AppError::AuthenticationFailed
    })?;

    let user = state
        .users
        .authenticate(basic.username(), basic.password())
        .await?;

    let claims = Claims::new(
        user.id,
        user.roles,
        state.auth_config.issuer.clone(),
        values.now,
        state.auth_config.token_ttl_secs,
    )?;
    let token = state.auth.issue(&claims, &kid)?;

    Ok(Json(TokenResponse { token }))
}

/// Returns one user. Callers may read themselves; admins may read anyone.
#[instrument(skip(state, auth_user), fields(sub = %auth_user.subject()))]
pub async fn query_by_id(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<UserInfo>, AppError> {
    ensure_owner_or_admin(&auth_user.0, &id)?;
    let user = state.users.query_by_id(&id).await?;
    Ok(Json(user))
}

/// Lists users a page at a time. Routed behind `Authorize(ADMIN)`.
#[instrument(skip(state))]
pub async fn query(
    State(state): State<AppState>,
    Path((page, rows)): Path<(String, String)>,
) -> Result<Json<Vec<UserInfo>>, AppError> {
    let page = parse_positive("page", &page)?;
    let rows = parse_positive("rows", &rows)?;

    let users = state.users.query(page, rows).await?;
    Ok(Json(users))
}

fn parse_positive(field: &str, raw: &str) -> Result<usize, AppError> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::validation_fields(
            format!("invalid {field} format: {raw}"),
            vec![FieldError {
                field: field.to_string(),
                error: "must be a positive integer".to_string(),
            }],
        )),
    }
}
