//! Prometheus metrics for the service.
//!
//! - [`MetricsConfig`] reads `METRICS_ENABLED` / `METRICS_PATH`
//! - [`init_metrics`] installs the Prometheus recorder
//! - [`metrics_handler`] renders the exposition text for `/metrics`
//! - `record_*` helpers for planning outcomes

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Path the exposition endpoint is mounted on.
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl MetricsConfig {
    /// - `METRICS_ENABLED`: anything but "false" enables metrics (default: true)
    /// - `METRICS_PATH`: endpoint path (default: "/metrics")
    pub fn from_env() -> Self {
        let enabled = std::env::var("METRICS_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);
        let path = std::env::var("METRICS_PATH").unwrap_or_else(|_| "/metrics".to_string());

        Self { enabled, path }
    }
}

/// Install the Prometheus recorder. Only the first successful call takes
/// effect.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Err(MetricsError::Disabled);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)
}

/// Axum handler for the metrics endpoint.
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# Metrics not initialized\n".to_string())
}

#[derive(Debug, Clone)]
pub enum MetricsError {
    Disabled,
    AlreadyInitialized,
    InstallFailed(String),
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::Disabled => write!(f, "metrics are disabled"),
            MetricsError::AlreadyInitialized => write!(f, "metrics recorder already initialized"),
            MetricsError::InstallFailed(e) => write!(f, "failed to install metrics recorder: {e}"),
        }
    }
}

impl std::error::Error for MetricsError {}

// =============================================================================
// Planning metrics
// =============================================================================

/// Increments `sensorpath_plans_calculated_total`. `kind` is "path" or "tour".
pub fn record_plan_calculated(kind: &str) {
    metrics::counter!(
        "sensorpath_plans_calculated_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Increments `sensorpath_plans_failed_total`.
pub fn record_plan_failed(kind: &str, reason: &str) {
    metrics::counter!(
        "sensorpath_plans_failed_total",
        "kind" => kind.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Records the number of sensors in a plan to `sensorpath_plan_sensors`.
pub fn record_plan_sensors(count: usize, kind: &str) {
    metrics::histogram!(
        "sensorpath_plan_sensors",
        "kind" => kind.to_string()
    )
    .record(count as f64);
}

/// Records the size of the submitted floorplan to `sensorpath_floorplan_sensors`.
pub fn record_floorplan_size(sensors: usize) {
    metrics::histogram!("sensorpath_floorplan_sensors").record(sensors as f64);
}
