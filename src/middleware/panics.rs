//! The `Panics` stage: a panic inside the chain becomes a 500 for that
//! request only.

use std::any::Any;
use std::backtrace::Backtrace;

use anyhow::anyhow;
use axum::response::Response;
use drop_core::{AppError, ErrorCarrier};
use metrics::counter;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::error;

pub type PanicHandler = fn(Box<dyn Any + Send + 'static>) -> Response;

pub fn catch_panic_layer() -> CatchPanicLayer<PanicHandler> {
    CatchPanicLayer::custom(handle_panic as PanicHandler)
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "non-string panic payload".to_string()
    };

    error!(panic = %detail, "recovered from panic in request handler");
    if crate::metrics::is_observability_enabled() {
        counter!("panics_total").increment(1);
        // The unwind skipped the Metrics stage, so count the failure here.
        counter!("errors_total").increment(1);
    }

    let err = AppError::Unrecognized(anyhow!("panic: {detail}"));
    let mut response = err.to_response();
    response.extensions_mut().insert(ErrorCarrier::new(err));
    response
}

/// Logs every panic with its location and backtrace before unwinding starts.
pub fn init_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let backtrace = Backtrace::capture();
        error!(panic = %info, %backtrace, "panic");
        default_hook(info);
    }));
}
