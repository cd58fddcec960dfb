//! Liveness and readiness probes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// "ok" or "not_ready: <reason>".
    pub status: String,
    pub service: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_cache: Option<bool>,
}

impl HealthStatus {
    pub fn alive(service: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            graph_cache: None,
        }
    }

    pub fn ready(service: &str, version: &str, graph_cache: bool) -> Self {
        Self {
            graph_cache: Some(graph_cache),
            ..Self::alive(service, version)
        }
    }

    pub fn not_ready(service: &str, version: &str, reason: &str) -> Self {
        Self {
            status: format!("not_ready: {reason}"),
            ..Self::alive(service, version)
        }
    }
}

/// `GET /health/live`
pub async fn health_live() -> impl IntoResponse {
    let status = HealthStatus::alive(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    (StatusCode::OK, Json(status))
}

/// `GET /health/ready`
///
/// Not ready when a cache directory is configured but has disappeared.
pub async fn health_ready(State(state): State<AppState>) -> Response {
    let service = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    match state.cache_dir() {
        Some(dir) if !dir.is_dir() => {
            let status = HealthStatus::not_ready(service, version, "graph cache directory missing");
            (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response()
        }
        cache => {
            let status = HealthStatus::ready(service, version, cache.is_some());
            (StatusCode::OK, Json(status)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alive_status_omits_cache_flag() {
        let status = HealthStatus::alive("sensorpath-service", "0.1.0");
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(!json.contains("graph_cache"));
    }

    #[test]
    fn not_ready_keeps_reason() {
        let status = HealthStatus::not_ready("svc", "1.0.0", "no cache");
        assert_eq!(status.status, "not_ready: no cache");
        assert!(status.graph_cache.is_none());
    }
}
