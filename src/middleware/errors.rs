//! The `Errors` stage.
//!
//! Handlers and inner stages return [`AppError`]s, which travel outward as a
//! bare 500 carrying an [`ErrorCarrier`]. This stage logs the error once,
//! renders the client response for its kind, and requests shutdown for
//! [`AppError::Shutdown`]. The carrier is kept on the rendered response so
//! the outer stages can see that the request failed.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use drop_core::ErrorCarrier;
use tracing::{error, warn};

use crate::web::{RequestValues, Shutdown};

pub async fn errors_middleware(
    State(shutdown): State<Shutdown>,
    req: Request,
    next: Next,
) -> Response {
    let trace_id = req
        .extensions()
        .get::<RequestValues>()
        .map(|values| values.trace_id);

    let mut response = next.run(req).await;
    let Some(carrier) = response.extensions_mut().remove::<ErrorCarrier>() else {
        return response;
    };

    let err = carrier.error();
    if err.is_trusted() {
        warn!(trace_id = ?trace_id, error = %err, "request failed");
    } else {
        error!(trace_id = ?trace_id, error = ?err, "request failed");
    }

    let mut rendered = err.to_response();
    if err.is_shutdown() {
        error!(trace_id = ?trace_id, "handler requested shutdown");
        shutdown.request();
    }

    rendered.extensions_mut().insert(carrier);
    rendered
}
