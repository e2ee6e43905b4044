mod common;

use axum::http::StatusCode;
use axum::routing::MethodFilter;
use common::{get, test_state};
use drop_api::router::GLOBAL_STAGES;
use drop_api::web::App;
use drop_core::AppError;
use metrics_exporter_prometheus::PrometheusBuilder;
use tower::ServiceExt;

async fn ok() -> &'static str {
    "ok"
}

async fn missing() -> Result<&'static str, AppError> {
    Err(AppError::NotFound)
}

async fn boom() -> &'static str {
    panic!("handler exploded")
}

/// Sums every sample of `name` whose labels contain `label`.
fn sample(rendered: &str, name: &str, label: &str) -> f64 {
    rendered
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.rsplit_once(' '))
        .filter(|(key, _)| *key == name || key.starts_with(&format!("{name}{{")))
        .filter(|(key, _)| key.contains(label))
        .filter_map(|(_, value)| value.parse::<f64>().ok())
        .sum()
}

#[tokio::test]
async fn test_metrics_stage_counts_requests_and_failures() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    let _guard = metrics::set_default_local_recorder(&recorder);

    let router = App::new(test_state(), GLOBAL_STAGES)
        .unwrap()
        .handle(MethodFilter::GET, "/ok", ok, &[])
        .unwrap()
        .handle(MethodFilter::GET, "/missing", missing, &[])
        .unwrap()
        .handle(MethodFilter::GET, "/boom", boom, &[])
        .unwrap()
        .into_router();

    let ok_response = router.clone().oneshot(get("/ok")).await.unwrap();
    let missing_response = router.clone().oneshot(get("/missing")).await.unwrap();
    let panic_response = router.oneshot(get("/boom")).await.unwrap();

    assert_eq!(ok_response.status(), StatusCode::OK);
    assert_eq!(missing_response.status(), StatusCode::NOT_FOUND);
    assert_eq!(panic_response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let rendered = handle.render();
    assert_eq!(sample(&rendered, "requests_total", r#"path="/ok""#), 1.0);
    assert_eq!(
        sample(&rendered, "requests_total", r#"status="404""#),
        1.0
    );
    // One handler error plus one recovered panic.
    assert_eq!(sample(&rendered, "errors_total", ""), 2.0);
    assert_eq!(sample(&rendered, "panics_total", ""), 1.0);
    assert_eq!(sample(&rendered, "http_requests_active", ""), 0.0);
    assert!(rendered.contains("http_request_duration_seconds"));
}

#[tokio::test]
async fn test_active_gauge_returns_to_zero_after_panic() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    let _guard = metrics::set_default_local_recorder(&recorder);

    let router = App::new(test_state(), GLOBAL_STAGES)
        .unwrap()
        .handle(MethodFilter::GET, "/boom", boom, &[])
        .unwrap()
        .into_router();

    for _ in 0..3 {
        let response = router.clone().oneshot(get("/boom")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    let rendered = handle.render();
    assert!(rendered.contains("http_requests_active"));
    assert_eq!(sample(&rendered, "http_requests_active", ""), 0.0);
    assert_eq!(sample(&rendered, "errors_total", ""), 3.0);
}
