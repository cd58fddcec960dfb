use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::graph::{EdgeKind, Graph, Node, NodeKind};

/// Presentation style for turning a plan into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    PlainText,
    RichText,
}

/// Sensor traversed by a plan, with the coordinates needed to draw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorStep {
    pub id: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl SensorStep {
    /// Build a step from a sensor node. Room nodes have no coordinates and
    /// yield `None`.
    pub fn from_node(node: &Node) -> Option<Self> {
        node.position().map(|position| SensorStep {
            id: node.id.clone(),
            longitude: position.longitude,
            latitude: position.latitude,
        })
    }
}

/// Result of a single-pair query.
///
/// `fastest_path` lists only the intermediate sensors; the endpoints and any
/// room nodes are left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPlan {
    pub fastest_path: Vec<SensorStep>,
    pub distance: f64,
}

/// Result of a multi-stop tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourPlan {
    /// Source room followed by targets in the order they were reached.
    pub visited: Vec<String>,
    pub path: Vec<SensorStep>,
    pub distance: f64,
}

/// Node and edge counts of a built graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSummary {
    pub sensors: usize,
    pub vertical_sensors: usize,
    pub rooms: usize,
    pub shared_edges: usize,
    pub room_links: usize,
    pub isolated_sensors: usize,
}

impl GraphSummary {
    pub fn from_graph(graph: &Graph) -> Self {
        let mut summary = GraphSummary {
            sensors: 0,
            vertical_sensors: 0,
            rooms: 0,
            shared_edges: 0,
            room_links: 0,
            isolated_sensors: 0,
        };

        for (index, node) in graph.nodes().iter().enumerate() {
            match node.kind {
                NodeKind::Sensor { is_vertical, .. } => {
                    summary.sensors += 1;
                    if is_vertical {
                        summary.vertical_sensors += 1;
                    }
                    if graph.neighbours_at(index).is_empty() {
                        summary.isolated_sensors += 1;
                    }
                }
                NodeKind::Room => summary.rooms += 1,
            }
        }

        for edge in graph.edges() {
            match edge.kind {
                EdgeKind::Shared => summary.shared_edges += 1,
                EdgeKind::RoomLink => summary.room_links += 1,
            }
        }

        summary
    }

    pub fn render(&self) -> String {
        let mut buffer = String::new();
        let _ = writeln!(
            buffer,
            "Graph: {} sensors ({} vertical, {} isolated), {} room nodes",
            self.sensors, self.vertical_sensors, self.isolated_sensors, self.rooms
        );
        let _ = writeln!(
            buffer,
            "Edges: {} shared, {} room links",
            self.shared_edges, self.room_links
        );
        buffer
    }
}

impl PathPlan {
    /// Render the plan using the requested textual mode.
    pub fn render(&self, from: &str, to: &str, mode: RenderMode) -> String {
        let mut buffer = String::new();
        match mode {
            RenderMode::PlainText => {
                let _ = writeln!(
                    buffer,
                    "Path: {from} -> {to} ({} sensors, distance {:.6})",
                    self.fastest_path.len(),
                    self.distance
                );
                render_steps_plain(&mut buffer, &self.fastest_path);
            }
            RenderMode::RichText => {
                let _ = writeln!(
                    buffer,
                    "**Path** _{from} to {to}_ (distance `{:.6}`)",
                    self.distance
                );
                render_steps_rich(&mut buffer, &self.fastest_path);
            }
        }
        buffer
    }
}

impl TourPlan {
    /// Render the plan using the requested textual mode.
    pub fn render(&self, mode: RenderMode) -> String {
        let mut buffer = String::new();
        let order = self.visited.join(" -> ");
        match mode {
            RenderMode::PlainText => {
                let _ = writeln!(
                    buffer,
                    "Tour: {order} ({} sensors, distance {:.6})",
                    self.path.len(),
                    self.distance
                );
                render_steps_plain(&mut buffer, &self.path);
            }
            RenderMode::RichText => {
                let _ = writeln!(
                    buffer,
                    "**Tour** _{order}_ (distance `{:.6}`)",
                    self.distance
                );
                render_steps_rich(&mut buffer, &self.path);
            }
        }
        buffer
    }
}

fn render_steps_plain(buffer: &mut String, steps: &[SensorStep]) {
    for (index, step) in steps.iter().enumerate() {
        let _ = writeln!(
            buffer,
            "{:>3}: {} ({:.6}, {:.6})",
            index + 1,
            step.id,
            step.longitude,
            step.latitude
        );
    }
}

fn render_steps_rich(buffer: &mut String, steps: &[SensorStep]) {
    for (index, step) in steps.iter().enumerate() {
        let _ = writeln!(
            buffer,
            "* {:>2}. **{}** (`{:.6}`, `{:.6}`)",
            index + 1,
            step.id,
            step.longitude,
            step.latitude
        );
    }
}
