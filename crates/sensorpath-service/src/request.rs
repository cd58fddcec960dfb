//! Request bodies and their validation.

use serde::{Deserialize, Serialize};

use sensorpath_lib::{PathRequest, Payload, RoomRecord, SensorRecord, TourRequest};

use crate::ProblemDetails;

/// Validation run before any graph work.
pub trait Validate {
    /// `request_id` populates the `instance` of the returned problem.
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>>;
}

fn require_id(field: &str, value: &str, request_id: &str) -> Result<(), Box<ProblemDetails>> {
    if value.trim().is_empty() {
        return Err(Box::new(ProblemDetails::bad_request(
            format!("The '{field}' field is required and cannot be empty"),
            request_id,
        )));
    }
    Ok(())
}

/// Body of `POST /pathfinding/fastest-path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FastestPathRequest {
    pub rooms: Vec<RoomRecord>,
    pub sensors: Vec<SensorRecord>,
    pub source_room: String,
    pub target_room: String,
}

impl FastestPathRequest {
    pub fn into_parts(self) -> (Payload, PathRequest) {
        (
            Payload {
                rooms: self.rooms,
                sensors: self.sensors,
            },
            PathRequest::new(self.source_room, self.target_room),
        )
    }
}

impl Validate for FastestPathRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_id("source_room", &self.source_room, request_id)?;
        require_id("target_room", &self.target_room, request_id)
    }
}

/// Body of `POST /pathfinding/tour`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourPlanRequest {
    pub rooms: Vec<RoomRecord>,
    pub sensors: Vec<SensorRecord>,
    pub source_room: String,
    pub target_rooms: Vec<String>,
}

impl TourPlanRequest {
    pub fn into_parts(self) -> (Payload, TourRequest) {
        (
            Payload {
                rooms: self.rooms,
                sensors: self.sensors,
            },
            TourRequest::new(self.source_room, self.target_rooms),
        )
    }
}

impl Validate for TourPlanRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_id("source_room", &self.source_room, request_id)?;
        if self.target_rooms.is_empty() {
            return Err(Box::new(ProblemDetails::bad_request(
                "The 'target_rooms' field must list at least one room",
                request_id,
            )));
        }
        for target in &self.target_rooms {
            require_id("target_rooms", target, request_id)?;
        }
        Ok(())
    }
}

/// Body of `POST /routing/test`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EchoRequest {
    pub msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_request(source: &str, target: &str) -> FastestPathRequest {
        FastestPathRequest {
            rooms: Vec::new(),
            sensors: Vec::new(),
            source_room: source.to_string(),
            target_room: target.to_string(),
        }
    }

    #[test]
    fn blank_source_is_rejected() {
        let problem = path_request("  ", "lab").validate("req-1").unwrap_err();
        assert_eq!(problem.status, 400);
        assert!(problem.detail.as_deref().unwrap().contains("source_room"));
    }

    #[test]
    fn valid_path_request_passes() {
        assert!(path_request("lobby", "lab").validate("req-2").is_ok());
    }

    #[test]
    fn tour_needs_targets() {
        let request = TourPlanRequest {
            rooms: Vec::new(),
            sensors: Vec::new(),
            source_room: "lobby".to_string(),
            target_rooms: Vec::new(),
        };
        let problem = request.validate("req-3").unwrap_err();
        assert!(problem.detail.as_deref().unwrap().contains("target_rooms"));
    }

    #[test]
    fn tour_rejects_blank_target() {
        let request = TourPlanRequest {
            rooms: Vec::new(),
            sensors: Vec::new(),
            source_room: "lobby".to_string(),
            target_rooms: vec!["lab".to_string(), String::new()],
        };
        assert!(request.validate("req-4").is_err());
    }

    #[test]
    fn missing_fields_fail_to_deserialize() {
        let result: Result<FastestPathRequest, _> =
            serde_json::from_str(r#"{ "rooms": [], "sensors": [], "source_room": "a" }"#);
        assert!(result.is_err());
    }
}
