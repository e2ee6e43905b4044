//! Logging setup and the `Logger` stage.
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `RUST_LOG` | Filter for console output (default `info`) |
//! | `LOG_FORMAT` | `json` for JSON console lines, compact text otherwise |
//! | `LOG_DIR` | Also write daily-rotated JSON logs to this directory |

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::web::RequestValues;

/// The `Logger` stage. The finished [`RequestValues`], status included, ride
/// back out on the response extensions.
pub async fn logging_middleware(mut req: Request, next: Next) -> Response {
    let start = Instant::now();
    let mut values = RequestValues::new();
    req.extensions_mut().insert(values.clone());

    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    info!(
        trace_id = %values.trace_id,
        method = %method,
        path = %path,
        "request started"
    );

    let mut response = next.run(req).await;
    let latency = start.elapsed();
    let status = response.status();
    values.status = Some(status);

    match status.as_u16() {
        500..=599 => {
            error!(
                trace_id = %values.trace_id,
                method = %method,
                path = %path,
                status = status.as_u16(),
                latency_ms = latency.as_millis() as u64,
                "request completed"
            );
        }
        400..=499 => {
            warn!(
                trace_id = %values.trace_id,
                method = %method,
                path = %path,
                status = status.as_u16(),
                latency_ms = latency.as_millis() as u64,
                "request completed"
            );
        }
        _ => {
            info!(
                trace_id = %values.trace_id,
                method = %method,
                path = %path,
                status = status.as_u16(),
                latency_ms = latency.as_millis() as u64,
                "request completed"
            );
        }
    }

    response.extensions_mut().insert(values);
    response
}

pub fn init_tracing() -> anyhow::Result<()> {
    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,tower_http=warn,hyper=warn")
    });

    let json_console = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let console_layer = if json_console {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_file(true)
            .with_line_number(true)
            .compact()
            .with_filter(console_filter)
            .boxed()
    };

    // JSON file logs for ingestion, only when a directory is configured
    let file_layer = match std::env::var("LOG_DIR") {
        Ok(dir) if !dir.trim().is_empty() => {
            std::fs::create_dir_all(&dir)?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("drop-api")
                .filename_suffix("json")
                .build(&dir)?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(appender)
                    .with_ansi(false)
                    .with_filter(EnvFilter::new("info")),
            )
        }
        _ => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}
