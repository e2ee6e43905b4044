use axum::Router;
use axum::handler::Handler;
use axum::routing::{MethodFilter, on};

use crate::middleware::{Chain, ChainError, Stage};
use crate::state::AppState;

/// Route registry. Every route gets the global stages followed by its own,
/// validated before the route is added.
pub struct App {
    router: Router<AppState>,
    state: AppState,
    global: Chain,
}

impl App {
    pub fn new(state: AppState, global: impl IntoIterator<Item = Stage>) -> Result<Self, ChainError> {
        Ok(Self {
            router: Router::new(),
            state,
            global: Chain::new(global)?,
        })
    }

    pub fn handle<H, T>(
        self,
        method: MethodFilter,
        path: &str,
        handler: H,
        stages: &[Stage],
    ) -> Result<Self, ChainError>
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        let chain = self.global.then(stages)?;
        let route = chain.wrap(on(method, handler), &self.state);

        Ok(Self {
            router: self.router.route(path, route),
            ..self
        })
    }

    pub fn into_router(self) -> Router {
        self.router.with_state(self.state)
    }
}
