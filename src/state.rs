use std::sync::Arc;

use drop_auth::TokenAuthority;
use drop_config::AuthConfig;

use crate::modules::users::store::UserStore;
use crate::web::Shutdown;

/// Shared, read-only application state handed to every chain and handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<TokenAuthority>,
    pub users: Arc<dyn UserStore>,
    pub auth_config: AuthConfig,
    pub shutdown: Shutdown,
}

impl AppState {
    pub fn new(
        auth: TokenAuthority,
        users: Arc<dyn UserStore>,
        auth_config: AuthConfig,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            auth: Arc::new(auth),
            users,
            auth_config,
            shutdown,
        }
    }
}
