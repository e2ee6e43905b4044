use axum::routing::MethodFilter;
use drop_core::roles;

use crate::middleware::{ChainError, Stage};
use crate::modules::users::controller::{query, query_by_id, token};
use crate::web::App;

pub fn register_users_routes(app: App) -> Result<App, ChainError> {
    app.handle(MethodFilter::GET, "/v1/users/token/{kid}", token, &[])?
        .handle(
            MethodFilter::GET,
            "/v1/users/{id}",
            query_by_id,
            &[Stage::Authenticate],
        )?
        // The first segment is the page number here; the router allows only
        // one parameter name per position.
        .handle(
            MethodFilter::GET,
            "/v1/users/{id}/{rows}",
            query,
            &[Stage::Authenticate, Stage::Authorize(roles::ADMIN)],
        )
}
