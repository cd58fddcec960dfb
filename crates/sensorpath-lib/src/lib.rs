//! Sensorpath library entry points.
//!
//! This crate turns room and sensor records into a weighted sensor graph and
//! answers fastest-path and multi-stop tour queries over it. Higher-level
//! consumers (CLI, HTTP service) should only depend on the functions exported
//! here instead of reimplementing behavior.
//!
//! The usual flow is [`Floorplan::from_records`] → [`build_graph`] (or
//! [`load_or_build`] with a [`GraphStore`]) → optional
//! [`GraphBuilder::attach_rooms`] → [`fastest_path`] / [`tour`]. The
//! [`plan_path`] and [`plan_tour`] helpers run that whole sequence for one
//! request.

#![deny(warnings)]

pub mod cache;
pub mod error;
pub mod floorplan;
pub mod graph;
pub mod output;
pub mod path;
pub mod room;
pub mod routing;
pub mod sensor;
pub mod source;
pub mod tour;

pub use cache::{load_or_build, FileGraphStore, GraphKey, GraphStore};
pub use error::{Error, ErrorKind, Result};
pub use floorplan::Floorplan;
pub use graph::{build_graph, EdgeKind, Graph, GraphBuilder, Node, NodeKind};
pub use output::{GraphSummary, PathPlan, RenderMode, SensorStep, TourPlan};
pub use path::{fastest_path, shortest_path, Route};
pub use room::{Room, RoomId, RoomRecord};
pub use routing::{plan_path, plan_tour, PathRequest, TourRequest};
pub use sensor::{haversine_km, GeoPosition, Sensor, SensorId, SensorRecord};
pub use source::{FloorplanSource, HttpSource, Payload, PayloadFile, DEFAULT_BASE_URL};
pub use tour::tour;
