//! RFC 9457 Problem Details for HTTP APIs.
//!
//! See: <https://www.rfc-editor.org/rfc/rfc9457.html>

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use sensorpath_lib::{Error as LibError, ErrorKind};

/// Problem type URI for rooms or sensors missing from the graph.
pub const PROBLEM_UNKNOWN_LOCATION: &str = "/problems/unknown-location";

/// Problem type URI for endpoints that exist but are not connected.
pub const PROBLEM_ROUTE_NOT_FOUND: &str = "/problems/route-not-found";

/// Problem type URI for invalid request parameters.
pub const PROBLEM_INVALID_REQUEST: &str = "/problems/invalid-request";

/// Problem type URI for room records that make weights undefined.
pub const PROBLEM_INVALID_CONFIGURATION: &str = "/problems/invalid-configuration";

/// Problem type URI for internal server errors.
pub const PROBLEM_INTERNAL_ERROR: &str = "/problems/internal-error";

/// RFC 9457 Problem Details response body.
///
/// ```
/// use sensorpath_service::{ProblemDetails, PROBLEM_UNKNOWN_LOCATION};
/// use axum::http::StatusCode;
///
/// let problem = ProblemDetails::new(
///     PROBLEM_UNKNOWN_LOCATION,
///     "Unknown Location",
///     StatusCode::NOT_FOUND,
/// )
/// .with_detail("Source room 'ghost' is not valid.")
/// .with_request_id("req-12345");
/// assert_eq!(problem.status, 404);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type (relative).
    #[serde(rename = "type")]
    pub type_uri: String,

    pub title: String,

    pub status: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Request identifier of this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl ProblemDetails {
    pub fn new(type_uri: impl Into<String>, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.instance = Some(request_id.into());
        self
    }

    /// 400 Bad Request for invalid input.
    pub fn bad_request(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INVALID_REQUEST,
            "Invalid Request",
            StatusCode::BAD_REQUEST,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// 404 Not Found for a room or sensor the graph does not contain.
    ///
    /// `role` is "Source" or "Target".
    pub fn unknown_location(role: &str, id: &str, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_UNKNOWN_LOCATION,
            "Unknown Location",
            StatusCode::NOT_FOUND,
        )
        .with_detail(format!("{role} room '{id}' is not valid."))
        .with_request_id(request_id)
    }

    /// 404 Not Found for endpoints with no connecting path.
    pub fn route_not_found(request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_ROUTE_NOT_FOUND,
            "Route Not Found",
            StatusCode::NOT_FOUND,
        )
        .with_detail("No path found between the given rooms.")
        .with_request_id(request_id)
    }

    /// 422 Unprocessable Entity for room records that cannot be weighted.
    pub fn invalid_configuration(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INVALID_CONFIGURATION,
            "Invalid Configuration",
            StatusCode::UNPROCESSABLE_ENTITY,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// 500 Internal Server Error.
    pub fn internal_error(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }
}

impl std::fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.detail.as_deref().unwrap_or(""))
    }
}

impl std::error::Error for ProblemDetails {}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = Json(&self).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        *response.status_mut() = status;
        response
    }
}

/// Convert a library error into a problem.
///
/// `source` is the id the caller started from; an unknown node matching it is
/// reported as the source room, any other unknown node as a target room.
pub fn from_lib_error(error: &LibError, source: &str, request_id: &str) -> ProblemDetails {
    match error {
        LibError::UnknownNode { id } | LibError::UnknownRoom { id } => {
            let role = if id == source { "Source" } else { "Target" };
            ProblemDetails::unknown_location(role, id, request_id)
        }
        LibError::RouteNotFound { .. } => ProblemDetails::route_not_found(request_id),
        _ => match error.kind() {
            ErrorKind::Validation => ProblemDetails::bad_request(error.to_string(), request_id),
            ErrorKind::Configuration => {
                ProblemDetails::invalid_configuration(error.to_string(), request_id)
            }
            _ => ProblemDetails::internal_error(error.to_string(), request_id),
        },
    }
}

/// Short label for the failure metric.
pub fn failure_reason(error: &LibError) -> &'static str {
    match error.kind() {
        ErrorKind::Lookup => "unknown_location",
        ErrorKind::Routing => "no_path",
        ErrorKind::Validation => "validation_error",
        ErrorKind::Configuration => "invalid_configuration",
        ErrorKind::Collaborator => "internal_error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_carries_request_id() {
        let problem = ProblemDetails::bad_request("Invalid JSON", "req-123");
        assert_eq!(problem.status, 400);
        assert_eq!(problem.instance.as_deref(), Some("req-123"));
    }

    #[test]
    fn serialization_uses_rfc_field_names() {
        let problem = ProblemDetails::bad_request("Test error", "req-test");
        let json = serde_json::to_string(&problem).unwrap();

        assert!(json.contains("\"type\":\"/problems/invalid-request\""));
        assert!(json.contains("\"title\":\"Invalid Request\""));
        assert!(json.contains("\"status\":400"));
        assert!(json.contains("\"instance\":\"req-test\""));
    }

    #[test]
    fn unknown_node_names_its_role() {
        let source = LibError::UnknownNode {
            id: "ghost".to_string(),
        };
        let problem = from_lib_error(&source, "ghost", "req");
        assert_eq!(problem.type_uri, PROBLEM_UNKNOWN_LOCATION);
        assert_eq!(
            problem.detail.as_deref(),
            Some("Source room 'ghost' is not valid.")
        );

        let problem = from_lib_error(&source, "lobby", "req");
        assert_eq!(
            problem.detail.as_deref(),
            Some("Target room 'ghost' is not valid.")
        );
    }

    #[test]
    fn route_not_found_is_404() {
        let error = LibError::RouteNotFound {
            start: "A".to_string(),
            goal: "B".to_string(),
        };
        let problem = from_lib_error(&error, "A", "req");
        assert_eq!(problem.status, 404);
        assert_eq!(problem.type_uri, PROBLEM_ROUTE_NOT_FOUND);
        assert_eq!(failure_reason(&error), "no_path");
    }

    #[test]
    fn validation_errors_are_400() {
        let problem = from_lib_error(&LibError::EmptyTargets, "A", "req");
        assert_eq!(problem.status, 400);
    }
}
