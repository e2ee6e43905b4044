use std::sync::Arc;

use anyhow::Context;
use drop_api::debug::{DebugState, init_debug_router};
use drop_api::logging::init_tracing;
use drop_api::metrics::init_metrics;
use drop_api::middleware::panics::init_panic_hook;
use drop_api::modules::users::store::{MemoryUserStore, UserStore};
use drop_api::router::init_router;
use drop_api::state::AppState;
use drop_api::web::shutdown::listen_for_signals;
use drop_api::web::{Shutdown, serve_until_shutdown};
use drop_auth::{KeyStore, TokenAuthority};
use drop_config::{AuthConfig, WebConfig};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    drop_config::load_dotenv();
    init_tracing()?;
    init_panic_hook();

    let web_config = WebConfig::from_env();
    let auth_config = AuthConfig::from_env();
    info!(?web_config, ?auth_config, "starting drop-api");

    let keys = KeyStore::from_dir(&auth_config.keys_folder).with_context(|| {
        format!("loading signing keys from {}", auth_config.keys_folder.display())
    })?;
    if keys.is_empty() {
        warn!(folder = %auth_config.keys_folder.display(), "no signing keys found; every token will be rejected");
    }
    let authority = TokenAuthority::new(&auth_config.algorithm, keys)?;

    let users: Arc<dyn UserStore> = match &auth_config.users_file {
        Some(path) => {
            let store = MemoryUserStore::from_file(path)?;
            info!(users = store.len(), path = %path.display(), "user store seeded");
            Arc::new(store)
        }
        None => {
            warn!("DROP_USERS_FILE not set; token issuance will reject every login");
            Arc::new(MemoryUserStore::default())
        }
    };

    let metrics_handle = init_metrics()?;
    let shutdown = Shutdown::new();
    listen_for_signals(shutdown.clone());

    let state = AppState::new(authority, users, auth_config, shutdown.clone());

    let debug_router = init_debug_router(DebugState {
        build: web_config.build.clone(),
        shutdown: shutdown.clone(),
        auth: state.auth.clone(),
        metrics: metrics_handle,
    });
    let debug_listener = TcpListener::bind(&web_config.debug_host)
        .await
        .with_context(|| format!("binding debug listener on {}", web_config.debug_host))?;
    info!(addr = %web_config.debug_host, "debug listener started");
    // Probes keep answering during the drain; the process exit ends them.
    tokio::spawn(async move {
        if let Err(e) = axum::serve(debug_listener, debug_router).await {
            error!(error = %e, "debug listener closed");
        }
    });

    let api_router = init_router(state)?;
    let api_listener = TcpListener::bind(&web_config.api_host)
        .await
        .with_context(|| format!("binding api listener on {}", web_config.api_host))?;
    info!(addr = %web_config.api_host, "api listener started");

    serve_until_shutdown(api_listener, api_router, shutdown, web_config.shutdown_timeout).await?;

    info!("drop-api stopped");
    Ok(())
}
