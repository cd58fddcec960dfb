//! HTTP service for indoor sensor pathfinding.
//!
//! Each request carries its own rooms and sensors; the handlers are thin
//! wrappers around `sensorpath-lib`:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  axum Handler                                               │
//! │  - Parse request JSON                                       │
//! │  - Validate ids                                             │
//! │  - Build floorplan and plan (blocking pool)                 │
//! │  - Map errors to RFC 9457 problems                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Endpoints
//!
//! - `POST /pathfinding/fastest-path`
//! - `POST /pathfinding/tour`
//! - `GET|POST /routing/test`
//! - `GET /health/live`, `GET /health/ready`
//! - `GET /metrics` (when enabled)

#![deny(warnings)]

pub mod cors;
pub mod handlers;
mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
mod problem;
mod request;
mod state;

use axum::{
    routing::{get, post},
    Router,
};

pub use cors::CorsConfig;
pub use health::{health_live, health_ready, HealthStatus};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{init_metrics, metrics_handler, MetricsConfig, MetricsError};
pub use middleware::{extract_or_generate_request_id, RequestId, TelemetryLayer, REQUEST_ID_HEADER};
pub use problem::{
    from_lib_error, ProblemDetails, PROBLEM_INTERNAL_ERROR, PROBLEM_INVALID_CONFIGURATION,
    PROBLEM_INVALID_REQUEST, PROBLEM_ROUTE_NOT_FOUND, PROBLEM_UNKNOWN_LOCATION,
};
pub use request::{EchoRequest, FastestPathRequest, TourPlanRequest, Validate};
pub use state::{AppState, AppStateError};

/// Assemble the application router.
pub fn router(state: AppState, metrics: &MetricsConfig, cors: &CorsConfig) -> Router {
    let mut app = Router::new()
        .route("/pathfinding/fastest-path", post(handlers::fastest_path_handler))
        .route("/pathfinding/tour", post(handlers::tour_handler))
        .route(
            "/routing/test",
            get(handlers::routing_test).post(handlers::routing_echo),
        )
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready));

    if metrics.enabled {
        app = app.route(&metrics.path, get(metrics_handler));
    }

    app.layer(cors.layer())
        .layer(TelemetryLayer)
        .with_state(state)
}
