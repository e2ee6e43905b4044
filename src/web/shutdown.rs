//! Graceful shutdown.
//!
//! A single [`Shutdown`] handle is cloned into everything that can end the
//! process: the OS signal listener, the error stage (for handler-raised
//! shutdown errors) and the readiness probe, which reports "not ready" as soon
//! as draining starts.
//!
//! [`serve_until_shutdown`] stops accepting connections once shutdown is
//! requested, lets in-flight requests finish, and gives up after the deadline.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not stop server gracefully within {0:?}")]
    DeadlineElapsed(Duration),
}

/// Cloneable shutdown signal. Requesting it more than once is harmless.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn request(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_draining(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once shutdown has been requested.
    pub async fn requested(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|draining| *draining).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves on SIGINT, or SIGTERM on unix.
pub async fn os_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Turns the first OS signal into a shutdown request.
pub fn listen_for_signals(shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = os_signal() => {
                info!("shutdown signal received");
                shutdown.request();
            }
            _ = shutdown.requested() => {}
        }
    })
}

/// Serves `router` until `shutdown` is requested, then drains for at most
/// `deadline`.
pub async fn serve_until_shutdown(
    listener: TcpListener,
    router: Router,
    shutdown: Shutdown,
    deadline: Duration,
) -> Result<(), ServeError> {
    let signal = {
        let shutdown = shutdown.clone();
        async move { shutdown.requested().await }
    };
    let server = axum::serve(listener, router)
        .with_graceful_shutdown(signal)
        .into_future();
    let mut server = std::pin::pin!(server);

    tokio::select! {
        result = &mut server => return result.map_err(ServeError::from),
        _ = shutdown.requested() => {}
    }

    info!(?deadline, "shutdown started, draining in-flight requests");
    match tokio::time::timeout(deadline, server).await {
        Ok(result) => {
            info!("shutdown complete");
            result.map_err(ServeError::from)
        }
        Err(_) => {
            error!(?deadline, "in-flight requests did not finish before the deadline");
            Err(ServeError::DeadlineElapsed(deadline))
        }
    }
}
