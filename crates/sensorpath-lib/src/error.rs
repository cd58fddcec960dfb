use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the sensorpath library.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of library errors.
///
/// Callers at a request boundary use this to pick a response without
/// matching on individual variants or error strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input data that makes weight computation undefined. Never retryable.
    Configuration,
    /// A referenced location is absent from the graph or floorplan.
    Lookup,
    /// Both endpoints exist but nothing connects them.
    Routing,
    /// Malformed or incomplete input collections.
    Validation,
    /// Failures raised by external collaborators (files, HTTP, cache).
    Collaborator,
}

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Room attributes make the congestion weight undefined.
    #[error("invalid room {id}: {reason}")]
    InvalidRoom { id: String, reason: String },

    /// A node identifier was not present in the graph.
    #[error("unknown location: {id}")]
    UnknownNode { id: String },

    /// A room identifier was not present in the floorplan.
    #[error("unknown room: {id}")]
    UnknownRoom { id: String },

    /// Both endpoints exist but no path connects them.
    #[error("no route found between {start} and {goal}")]
    RouteNotFound { start: String, goal: String },

    /// A tour request had no targets left once the source was removed.
    #[error("tour requires at least one target room distinct from the source")]
    EmptyTargets,

    /// Two sensor records share the same identifier.
    #[error("duplicate sensor id: {id}")]
    DuplicateSensor { id: String },

    /// A room or sensor record carried an empty identifier.
    #[error("{kind} record has an empty id")]
    EmptyId { kind: &'static str },

    /// A room node would reuse the identifier of an existing sensor node.
    #[error("room id {id} collides with a sensor id")]
    NodeIdConflict { id: String },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON decoding errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Wrapper for HTTP client errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Raised when encoding a graph for the cache fails.
    #[error("failed to serialize graph cache entry: {message}")]
    GraphCacheSerialize { message: String },

    /// Raised when a cached graph cannot be read back.
    #[error("failed to load graph cache entry from {path}: {message}")]
    GraphCacheLoad { path: PathBuf, message: String },
}

impl Error {
    /// Classify this error for boundary handling.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidRoom { .. } => ErrorKind::Configuration,
            Error::UnknownNode { .. } | Error::UnknownRoom { .. } => ErrorKind::Lookup,
            Error::RouteNotFound { .. } => ErrorKind::Routing,
            Error::EmptyTargets
            | Error::DuplicateSensor { .. }
            | Error::EmptyId { .. }
            | Error::NodeIdConflict { .. } => ErrorKind::Validation,
            Error::Io(_)
            | Error::Json(_)
            | Error::Http(_)
            | Error::GraphCacheSerialize { .. }
            | Error::GraphCacheLoad { .. } => ErrorKind::Collaborator,
        }
    }

    pub(crate) fn invalid_room(id: &str, reason: impl Into<String>) -> Self {
        Error::InvalidRoom {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn route_not_found(start: &str, goal: &str) -> Self {
        Error::RouteNotFound {
            start: start.to_string(),
            goal: goal.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_and_routing_are_distinct_kinds() {
        let lookup = Error::UnknownNode {
            id: "s9".to_string(),
        };
        let routing = Error::route_not_found("s1", "s2");

        assert_eq!(lookup.kind(), ErrorKind::Lookup);
        assert_eq!(routing.kind(), ErrorKind::Routing);
        assert_ne!(lookup.kind(), routing.kind());
    }

    #[test]
    fn invalid_room_is_a_configuration_error() {
        let error = Error::invalid_room("r1", "area must be positive");
        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert_eq!(error.to_string(), "invalid room r1: area must be positive");
    }

    #[test]
    fn empty_targets_is_a_validation_error() {
        assert_eq!(Error::EmptyTargets.kind(), ErrorKind::Validation);
    }
}
