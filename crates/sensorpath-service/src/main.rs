//! Sensorpath HTTP microservice.
//!
//! # Configuration
//!
//! - `SERVICE_PORT` - HTTP port (default: 8001)
//! - `SENSORPATH_CACHE_DIR` - graph cache directory (optional)
//! - `CORS_ALLOWED_ORIGINS` - comma-separated origins (default: the local gateway)
//! - `RUST_LOG` - log level (default: info)
//! - `LOG_FORMAT` - json (default) or text
//! - `METRICS_ENABLED` / `METRICS_PATH` - Prometheus endpoint

use std::env;
use std::net::SocketAddr;

use tracing::{error, info, warn};

use sensorpath_service::{
    init_logging, init_metrics, router, AppState, CorsConfig, LoggingConfig, MetricsConfig,
};

const DEFAULT_PORT: u16 = 8001;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_config = LoggingConfig::from_env().with_service("pathfinding");
    init_logging(&logging_config);

    let metrics_config = MetricsConfig::from_env();
    if metrics_config.enabled {
        if let Err(e) = init_metrics(&metrics_config) {
            warn!(error = %e, "failed to initialize metrics, continuing without metrics");
        }
    }

    let port: u16 = env::var("SERVICE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let state = AppState::from_env().map_err(|e| {
        error!(error = %e, "failed to initialize application state");
        e
    })?;
    info!(port, cache_dir = ?state.cache_dir(), "starting pathfinding service");

    let app = router(state, &metrics_config, &CorsConfig::from_env());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(addr = %addr, "listening on");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
