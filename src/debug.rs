//! The debug listener: probes for the orchestrator and the metrics scrape
//! endpoint. It runs on its own port and none of the API stages apply to it.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /readiness` | `200 {"status":"ok"}`, or `503 {"status":"not ready"}` while draining or without keys |
//! | `GET /liveness` | `200` with build and pod metadata |
//! | `GET /metrics` | Prometheus text format, `404` when observability is disabled |

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use drop_auth::TokenAuthority;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tracing::warn;

use crate::web::Shutdown;

const READINESS_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct DebugState {
    pub build: String,
    pub shutdown: Shutdown,
    pub auth: Arc<TokenAuthority>,
    pub metrics: Option<PrometheusHandle>,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
}

/// Reported when the machine's hostname cannot be read.
const HOST_UNAVAILABLE: &str = "unavailable";

/// Liveness payload. `host` is the machine's hostname; pod fields come from
/// the environment and are omitted when unset.
#[derive(Debug, Serialize)]
pub struct Liveness {
    pub status: &'static str,
    pub build: String,
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,
    #[serde(rename = "podIP", skip_serializing_if = "Option::is_none")]
    pub pod_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Liveness {
    pub fn from_lookup(
        build: &str,
        host: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            status: "up",
            build: build.to_string(),
            host: host
                .filter(|h| !h.is_empty())
                .unwrap_or_else(|| HOST_UNAVAILABLE.to_string()),
            pod: var("KUBERNETES_PODNAME"),
            pod_ip: var("KUBERNETES_NAMESPACE_POD_IP"),
            node: var("KUBERNETES_NODENAME"),
            namespace: var("KUBERNETES_NAMESPACE"),
        }
    }
}

pub fn init_debug_router(state: DebugState) -> Router {
    Router::new()
        .route("/readiness", get(readiness))
        .route("/liveness", get(liveness))
        .route("/metrics", get(metrics))
        .with_state(state)
}

async fn readiness(State(state): State<DebugState>) -> Response {
    let check = async {
        if state.shutdown.is_draining() {
            return Err("shutting down");
        }
        if state.auth.keys().is_empty() {
            return Err("no signing keys loaded");
        }
        Ok(())
    };

    let outcome = match tokio::time::timeout(READINESS_TIMEOUT, check).await {
        Ok(outcome) => outcome,
        Err(_) => Err("readiness check timed out"),
    };

    match outcome {
        Ok(()) => (StatusCode::OK, Json(Health { status: "ok" })).into_response(),
        Err(reason) => {
            warn!(reason, "readiness failure");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Health {
                    status: "not ready",
                }),
            )
                .into_response()
        }
    }
}

async fn liveness(State(state): State<DebugState>) -> Json<Liveness> {
    Json(Liveness::from_lookup(&state.build, current_host(), |key| {
        std::env::var(key).ok()
    }))
}

/// The kernel's hostname, if it is valid UTF-8.
pub fn current_host() -> Option<String> {
    gethostname::gethostname().into_string().ok()
}

async fn metrics(State(state): State<DebugState>) -> Response {
    match state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_liveness_omits_missing_fields() {
        let vars = HashMap::from([("KUBERNETES_PODNAME", "api-7d9"), ("KUBERNETES_NAMESPACE", "")]);
        let info = Liveness::from_lookup("1.2.3", Some("api-host".to_string()), |k| {
            vars.get(k).map(|v| v.to_string())
        });

        let json = serde_json::to_value(&info).unwrap();

        assert_eq!(json["status"], "up");
        assert_eq!(json["build"], "1.2.3");
        assert_eq!(json["pod"], "api-7d9");
        assert!(json.get("namespace").is_none());
        assert!(json.get("podIP").is_none());
        assert_eq!(json["host"], "api-host");
    }

    #[test]
    fn test_liveness_host_falls_back_when_unreadable() {
        let missing = Liveness::from_lookup("dev", None, |_| None);
        let empty = Liveness::from_lookup("dev", Some(String::new()), |_| None);

        assert_eq!(missing.host, "unavailable");
        assert_eq!(empty.host, "unavailable");
    }

    #[test]
    fn test_liveness_ignores_hostname_env_var() {
        let info = Liveness::from_lookup("dev", Some("real-host".to_string()), |k| {
            (k == "HOSTNAME").then(|| "from-env".to_string())
        });
        assert_eq!(info.host, "real-host");
    }

    #[test]
    fn test_current_host_is_not_empty() {
        if let Some(host) = current_host() {
            assert!(!host.is_empty());
        }
    }

    #[test]
    fn test_liveness_renames_pod_ip() {
        let info = Liveness::from_lookup("dev", None, |k| {
            (k == "KUBERNETES_NAMESPACE_POD_IP").then(|| "10.0.0.7".to_string())
        });
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["podIP"], "10.0.0.7");
    }
}
