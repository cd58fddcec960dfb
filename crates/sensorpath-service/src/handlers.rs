//! Endpoint handlers.
//!
//! Handlers validate the body, hand the CPU-bound graph work to the blocking
//! pool and translate library errors into problem responses.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use sensorpath_lib::{plan_path, plan_tour, Error as LibError, PathPlan, TourPlan};

use crate::metrics::{
    record_floorplan_size, record_plan_calculated, record_plan_failed, record_plan_sensors,
};
use crate::problem::{failure_reason, from_lib_error};
use crate::request::{EchoRequest, FastestPathRequest, TourPlanRequest, Validate};
use crate::{AppState, ProblemDetails, RequestId};

type HandlerResult<T> = Result<Json<T>, ProblemDetails>;

/// Body of the `/routing/test` responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `POST /pathfinding/fastest-path`
pub async fn fastest_path_handler(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<FastestPathRequest>,
) -> HandlerResult<PathPlan> {
    const KIND: &str = "path";

    if let Err(problem) = request.validate(request_id.as_str()) {
        record_plan_failed(KIND, "validation_error");
        return Err(*problem);
    }

    let source = request.source_room.clone();
    let (payload, path_request) = request.into_parts();
    record_floorplan_size(payload.sensors.len());

    let result = run_blocking(&request_id, move || {
        let floorplan = payload.into_floorplan()?;
        plan_path(&floorplan, state.graph_store(), &path_request)
    })
    .await?;

    match result {
        Ok(plan) => {
            record_plan_calculated(KIND);
            record_plan_sensors(plan.fastest_path.len(), KIND);
            info!(
                request_id = %request_id,
                sensors = plan.fastest_path.len(),
                distance = plan.distance,
                "fastest path computed"
            );
            Ok(Json(plan))
        }
        Err(error) => Err(plan_failed(KIND, &error, &source, &request_id)),
    }
}

/// `POST /pathfinding/tour`
pub async fn tour_handler(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<TourPlanRequest>,
) -> HandlerResult<TourPlan> {
    const KIND: &str = "tour";

    if let Err(problem) = request.validate(request_id.as_str()) {
        record_plan_failed(KIND, "validation_error");
        return Err(*problem);
    }

    let source = request.source_room.clone();
    let (payload, tour_request) = request.into_parts();
    record_floorplan_size(payload.sensors.len());

    let result = run_blocking(&request_id, move || {
        let floorplan = payload.into_floorplan()?;
        plan_tour(&floorplan, state.graph_store(), &tour_request)
    })
    .await?;

    match result {
        Ok(plan) => {
            record_plan_calculated(KIND);
            record_plan_sensors(plan.path.len(), KIND);
            info!(
                request_id = %request_id,
                stops = plan.visited.len(),
                distance = plan.distance,
                "tour computed"
            );
            Ok(Json(plan))
        }
        Err(error) => Err(plan_failed(KIND, &error, &source, &request_id)),
    }
}

/// `GET /routing/test`
pub async fn routing_test() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "API is working!".to_string(),
    })
}

/// `POST /routing/test`
pub async fn routing_echo(Json(request): Json<EchoRequest>) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: format!("Received: {}", request.msg),
    })
}

async fn run_blocking<T, F>(
    request_id: &RequestId,
    work: F,
) -> Result<Result<T, LibError>, ProblemDetails>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, LibError> + Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|error| {
        warn!(request_id = %request_id, error = %error, "planning task aborted");
        ProblemDetails::internal_error("planning task aborted", request_id.as_str())
    })
}

fn plan_failed(kind: &str, error: &LibError, source: &str, request_id: &RequestId) -> ProblemDetails {
    let reason = failure_reason(error);
    record_plan_failed(kind, reason);
    warn!(request_id = %request_id, reason, error = %error, "planning failed");
    from_lib_error(error, source, request_id.as_str())
}
