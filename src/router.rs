use axum::Router;

use crate::middleware::{ChainError, Stage};
use crate::modules::users::router::register_users_routes;
use crate::state::AppState;
use crate::web::App;

/// Stages every API route runs, outermost first.
pub const GLOBAL_STAGES: [Stage; 4] = [Stage::Logger, Stage::Panics, Stage::Metrics, Stage::Errors];

pub fn init_router(state: AppState) -> Result<Router, ChainError> {
    let app = App::new(state, GLOBAL_STAGES)?;
    let app = register_users_routes(app)?;
    Ok(app.into_router())
}
