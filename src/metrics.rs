use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use drop_core::ErrorCarrier;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// How often the alive-tasks gauge is refreshed, in requests.
const TASK_SAMPLE_EVERY: u64 = 100;

static REQUESTS_SEEN: AtomicU64 = AtomicU64::new(0);

/// Check if observability is enabled via OBSERVABILITY_ENABLED env var
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true)
    })
}

/// Installs the Prometheus recorder and its upkeep task.
/// Returns `None` when observability is disabled.
pub fn init_metrics() -> anyhow::Result<Option<PrometheusHandle>> {
    if !is_observability_enabled() {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        )?
        .install_recorder()?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Ok(Some(handle))
}

/// Holds one slot of `http_requests_active` for as long as it lives, so the
/// gauge stays balanced when the request future is dropped or unwinds.
struct ActiveRequest;

impl ActiveRequest {
    fn start() -> Self {
        gauge!("http_requests_active").increment(1.0);
        Self
    }
}

impl Drop for ActiveRequest {
    fn drop(&mut self) {
        gauge!("http_requests_active").decrement(1.0);
    }
}

/// The `Metrics` stage.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    let _active = ActiveRequest::start();
    if REQUESTS_SEEN.fetch_add(1, Ordering::Relaxed) % TASK_SAMPLE_EVERY == 0 {
        let alive = tokio::runtime::Handle::current().metrics().num_alive_tasks();
        gauge!("alive_tasks").set(alive as f64);
    }

    let response = next.run(req).await;

    let status = response.status();
    counter!("requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status.as_u16().to_string()).increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path)
        .record(start.elapsed().as_secs_f64());

    if response.extensions().get::<ErrorCarrier>().is_some() || status.is_server_error() {
        counter!("errors_total").increment(1);
    }

    response
}
