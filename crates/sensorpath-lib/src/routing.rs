//! Request-level planning.
//!
//! Ties the pieces together the way a caller at a request boundary needs
//! them: fetch or build the base graph, expose the rooms named by the
//! request as nodes, then run the query.

use tracing::{debug, info};

use crate::cache::{load_or_build, GraphStore};
use crate::error::{Error, Result};
use crate::floorplan::Floorplan;
use crate::graph::Graph;
use crate::output::{PathPlan, TourPlan};
use crate::path::fastest_path;
use crate::tour::tour;

/// Single-pair query between two rooms or sensors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRequest {
    pub source: String,
    pub target: String,
}

impl PathRequest {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Multi-stop query starting from one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TourRequest {
    pub source: String,
    pub targets: Vec<String>,
}

impl TourRequest {
    pub fn new<I, S>(source: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source: source.into(),
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }
}

/// How a request endpoint maps onto the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Needs a room node attached before querying.
    Room,
    /// Already a node of the base graph.
    Sensor,
}

/// Classify an endpoint id. Room ids take precedence over sensor ids.
pub fn resolve_endpoint(floorplan: &Floorplan, id: &str) -> Result<Endpoint> {
    if floorplan.contains_room(id) {
        Ok(Endpoint::Room)
    } else if floorplan.contains_sensor(id) {
        Ok(Endpoint::Sensor)
    } else {
        Err(Error::UnknownNode { id: id.to_string() })
    }
}

/// Compute the fastest path for a request.
pub fn plan_path(
    floorplan: &Floorplan,
    store: Option<&dyn GraphStore>,
    request: &PathRequest,
) -> Result<PathPlan> {
    let endpoints = [request.source.as_str(), request.target.as_str()];
    let graph = prepare_graph(floorplan, store, &endpoints)?;

    let plan = fastest_path(&graph, &request.source, &request.target)?;
    info!(
        source = %request.source,
        target = %request.target,
        sensors = plan.fastest_path.len(),
        distance = plan.distance,
        "planned path"
    );
    Ok(plan)
}

/// Compute a nearest-neighbour tour for a request.
///
/// Fails with [`Error::EmptyTargets`] before any graph work when every
/// target equals the source.
pub fn plan_tour(
    floorplan: &Floorplan,
    store: Option<&dyn GraphStore>,
    request: &TourRequest,
) -> Result<TourPlan> {
    if request.targets.iter().all(|target| *target == request.source) {
        return Err(Error::EmptyTargets);
    }

    let endpoints: Vec<&str> = std::iter::once(request.source.as_str())
        .chain(request.targets.iter().map(String::as_str))
        .collect();
    let graph = prepare_graph(floorplan, store, &endpoints)?;

    let plan = tour(&graph, &request.source, &request.targets)?;
    info!(
        source = %request.source,
        stops = plan.visited.len(),
        distance = plan.distance,
        "planned tour"
    );
    Ok(plan)
}

fn prepare_graph(
    floorplan: &Floorplan,
    store: Option<&dyn GraphStore>,
    endpoints: &[&str],
) -> Result<Graph> {
    let mut rooms: Vec<&str> = Vec::new();
    for &id in endpoints {
        if resolve_endpoint(floorplan, id)? == Endpoint::Room && !rooms.contains(&id) {
            rooms.push(id);
        }
    }

    let graph = load_or_build(store, floorplan);
    if rooms.is_empty() {
        return Ok(graph);
    }

    debug!(rooms = ?rooms, "attaching endpoint rooms");
    let mut builder = graph.to_builder();
    builder.attach_rooms(floorplan, &rooms)?;
    Ok(builder.freeze())
}
