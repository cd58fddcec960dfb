use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::floorplan::Floorplan;
use crate::room::RoomId;
use crate::sensor::{haversine_km, GeoPosition};

/// Multiplier applied to a room's edges when its floor differs from the
/// floor of the room processed just before it.
pub const FLOOR_CHANGE_PENALTY: f64 = 2.0;

/// Position of a node in the graph's node table.
pub type NodeIndex = usize;

/// What a graph node stands for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Sensor {
        position: GeoPosition,
        is_vertical: bool,
    },
    /// Injected so a room can be used as a path endpoint.
    Room,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_room(&self) -> bool {
        matches!(self.kind, NodeKind::Room)
    }

    /// Coordinates of a sensor node; `None` for room nodes.
    pub fn position(&self) -> Option<GeoPosition> {
        match self.kind {
            NodeKind::Sensor { position, .. } => Some(position),
            NodeKind::Room => None,
        }
    }
}

/// Classification for the edge used in the routing graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Two sensors bordering the same room.
    Shared,
    /// Zero-weight link between a room node and one of its sensors.
    RoomLink,
}

/// Directed half of an undirected edge, stored in the adjacency list of its
/// source node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub target: NodeIndex,
    pub kind: EdgeKind,
    pub weight: f64,
    /// Room that produced this edge.
    pub room: RoomId,
}

/// Borrowed view of an undirected edge as returned by [`Graph::edges`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRef<'a> {
    pub a: &'a str,
    pub b: &'a str,
    pub kind: EdgeKind,
    pub weight: f64,
    pub room: &'a str,
}

#[derive(Debug, Default)]
struct GraphData {
    nodes: Vec<Node>,
    index: HashMap<String, NodeIndex>,
    adjacency: Vec<Vec<Edge>>,
}

impl GraphData {
    fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }
}

/// Mutable phase of graph construction.
///
/// A builder is created from a floorplan (or re-opened from a frozen
/// [`Graph`]), optionally extended with room nodes, and then frozen. Queries
/// only ever run against the frozen graph.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    data: GraphData,
    pairs: HashSet<(NodeIndex, NodeIndex)>,
}

impl GraphBuilder {
    /// Build sensor nodes and shared-room edges.
    ///
    /// Rooms are grouped in the order they are first referenced while walking
    /// sensors and then each sensor's rooms. Every unordered pair of sensors in
    /// a group gets one edge weighted `distance * room weight * floor
    /// multiplier`, unless an earlier room already linked the pair. The floor
    /// multiplier compares each group's floor with the previous group's, so
    /// the result depends on that walk order.
    pub fn from_floorplan(floorplan: &Floorplan) -> Self {
        let mut builder = GraphBuilder::default();

        for sensor in floorplan.sensors() {
            builder.push_node(Node {
                id: sensor.id.clone(),
                kind: NodeKind::Sensor {
                    position: sensor.position,
                    is_vertical: sensor.is_vertical,
                },
            });
        }

        // Sensor node indices line up with the floorplan's sensor table.
        let mut groups: Vec<(usize, Vec<NodeIndex>)> = Vec::new();
        let mut group_of: HashMap<usize, usize> = HashMap::new();
        for (node, sensor) in floorplan.sensors().iter().enumerate() {
            for &room in &sensor.rooms {
                let slot = *group_of.entry(room).or_insert_with(|| {
                    groups.push((room, Vec::new()));
                    groups.len() - 1
                });
                groups[slot].1.push(node);
            }
        }

        let mut previous_floor: Option<i32> = None;
        for (room_index, members) in &groups {
            let Some(room) = floorplan.room_at(*room_index) else {
                continue;
            };

            let multiplier = match previous_floor {
                Some(floor) if floor != room.floor => FLOOR_CHANGE_PENALTY,
                _ => 1.0,
            };
            previous_floor = Some(room.floor);

            let room_weight = room.congestion_weight();
            for (offset, &a) in members.iter().enumerate() {
                for &b in &members[offset + 1..] {
                    if builder.has_edge(a, b) {
                        continue;
                    }
                    let distance = match (builder.position(a), builder.position(b)) {
                        (Some(pa), Some(pb)) => haversine_km(&pa, &pb),
                        _ => continue,
                    };
                    builder.push_edge(
                        a,
                        b,
                        EdgeKind::Shared,
                        distance * room_weight * multiplier,
                        &room.id,
                    );
                }
            }
        }

        debug!(
            nodes = builder.data.nodes.len(),
            edges = builder.data.edge_count(),
            room_groups = groups.len(),
            "built sensor graph"
        );

        builder
    }

    /// Expose rooms as addressable nodes.
    ///
    /// Each room gets one node named after its id, linked with a zero-weight
    /// edge to every sensor bordering it. A room with no bordering sensors
    /// gets no node. Attaching a room twice changes nothing. Ids are checked
    /// before anything is added, so a failed call leaves the builder as it was.
    pub fn attach_rooms<S: AsRef<str>>(
        &mut self,
        floorplan: &Floorplan,
        rooms: &[S],
    ) -> Result<()> {
        for room_id in rooms {
            let room_id = room_id.as_ref();
            if !floorplan.contains_room(room_id) {
                return Err(Error::UnknownRoom {
                    id: room_id.to_string(),
                });
            }
            if let Some(&existing) = self.data.index.get(room_id) {
                if !self.data.nodes[existing].is_room() {
                    return Err(Error::NodeIdConflict {
                        id: room_id.to_string(),
                    });
                }
            }
        }

        for room_id in rooms {
            let room_id = room_id.as_ref();
            let bordering: Vec<NodeIndex> = floorplan
                .sensors_in_room(room_id)
                .into_iter()
                .filter_map(|sensor| self.data.index.get(&sensor.id).copied())
                .collect();
            if bordering.is_empty() {
                debug!(room = %room_id, "room has no bordering sensors; not attached");
                continue;
            }

            let room_node = match self.data.index.get(room_id) {
                Some(&index) => index,
                None => self.push_node(Node {
                    id: room_id.to_string(),
                    kind: NodeKind::Room,
                }),
            };

            for sensor in bordering {
                if !self.has_edge(room_node, sensor) {
                    self.push_edge(room_node, sensor, EdgeKind::RoomLink, 0.0, room_id);
                }
            }
            debug!(room = %room_id, edges = self.data.adjacency[room_node].len(), "attached room");
        }

        Ok(())
    }

    /// Finish construction and hand out a shareable read-only graph.
    pub fn freeze(self) -> Graph {
        Graph {
            inner: Arc::new(self.data),
        }
    }

    pub(crate) fn push_node(&mut self, node: Node) -> NodeIndex {
        let index = self.data.nodes.len();
        self.data.index.insert(node.id.clone(), index);
        self.data.nodes.push(node);
        self.data.adjacency.push(Vec::new());
        index
    }

    pub(crate) fn push_edge(
        &mut self,
        a: NodeIndex,
        b: NodeIndex,
        kind: EdgeKind,
        weight: f64,
        room: &str,
    ) {
        self.pairs.insert(pair_key(a, b));
        self.data.adjacency[a].push(Edge {
            target: b,
            kind,
            weight,
            room: room.to_string(),
        });
        self.data.adjacency[b].push(Edge {
            target: a,
            kind,
            weight,
            room: room.to_string(),
        });
    }

    fn has_edge(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.pairs.contains(&pair_key(a, b))
    }

    fn position(&self, node: NodeIndex) -> Option<GeoPosition> {
        self.data.nodes.get(node).and_then(Node::position)
    }
}

fn pair_key(a: NodeIndex, b: NodeIndex) -> (NodeIndex, NodeIndex) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Frozen, undirected, weighted sensor graph.
///
/// Cloning is cheap and the graph can be shared across threads; nothing
/// mutates it after [`GraphBuilder::freeze`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "GraphRepr", into = "GraphRepr")]
pub struct Graph {
    inner: Arc<GraphData>,
}

impl Graph {
    /// Re-open the graph for attaching rooms. The frozen graph is untouched.
    pub fn to_builder(&self) -> GraphBuilder {
        let data = GraphData {
            nodes: self.inner.nodes.clone(),
            index: self.inner.index.clone(),
            adjacency: self.inner.adjacency.clone(),
        };
        let pairs = data
            .adjacency
            .iter()
            .enumerate()
            .flat_map(|(source, edges)| {
                edges
                    .iter()
                    .map(move |edge| pair_key(source, edge.target))
            })
            .collect();
        GraphBuilder { data, pairs }
    }

    pub fn node_count(&self) -> usize {
        self.inner.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.index.contains_key(id)
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.inner.index.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index_of(id).map(|index| &self.inner.nodes[index])
    }

    pub fn node_at(&self, index: NodeIndex) -> Option<&Node> {
        self.inner.nodes.get(index)
    }

    /// Nodes in insertion order: sensors first, then attached rooms.
    pub fn nodes(&self) -> &[Node] {
        &self.inner.nodes
    }

    /// Return the neighbours for a given node identifier.
    pub fn neighbours(&self, id: &str) -> &[Edge] {
        self.index_of(id)
            .map(|index| self.neighbours_at(index))
            .unwrap_or(&[])
    }

    pub fn neighbours_at(&self, index: NodeIndex) -> &[Edge] {
        self.inner
            .adjacency
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Edge between two nodes, in either direction.
    pub fn edge(&self, a: &str, b: &str) -> Option<&Edge> {
        let a = self.index_of(a)?;
        let b = self.index_of(b)?;
        self.neighbours_at(a).iter().find(|edge| edge.target == b)
    }

    /// Every undirected edge once, ordered by the insertion index of its
    /// endpoints.
    pub fn edges(&self) -> Vec<EdgeRef<'_>> {
        let mut edges: Vec<(NodeIndex, NodeIndex, &Edge)> = self
            .inner
            .adjacency
            .iter()
            .enumerate()
            .flat_map(|(source, list)| {
                list.iter()
                    .filter(move |edge| source < edge.target)
                    .map(move |edge| (source, edge.target, edge))
            })
            .collect();
        edges.sort_by_key(|(a, b, _)| (*a, *b));

        edges
            .into_iter()
            .map(|(a, b, edge)| EdgeRef {
                a: &self.inner.nodes[a].id,
                b: &self.inner.nodes[b].id,
                kind: edge.kind,
                weight: edge.weight,
                room: &edge.room,
            })
            .collect()
    }
}

impl Default for Graph {
    fn default() -> Self {
        GraphBuilder::default().freeze()
    }
}

/// Build the sensor graph for a floorplan without any room nodes.
pub fn build_graph(floorplan: &Floorplan) -> Graph {
    GraphBuilder::from_floorplan(floorplan).freeze()
}

/// Serialized form of a [`Graph`]; the id index is rebuilt on load.
#[derive(Serialize, Deserialize)]
struct GraphRepr {
    nodes: Vec<Node>,
    adjacency: Vec<Vec<Edge>>,
}

impl From<Graph> for GraphRepr {
    fn from(graph: Graph) -> Self {
        GraphRepr {
            nodes: graph.inner.nodes.clone(),
            adjacency: graph.inner.adjacency.clone(),
        }
    }
}

impl TryFrom<GraphRepr> for Graph {
    type Error = String;

    fn try_from(repr: GraphRepr) -> std::result::Result<Self, Self::Error> {
        if repr.nodes.len() != repr.adjacency.len() {
            return Err(format!(
                "adjacency table has {} rows for {} nodes",
                repr.adjacency.len(),
                repr.nodes.len()
            ));
        }

        let mut index = HashMap::with_capacity(repr.nodes.len());
        for (position, node) in repr.nodes.iter().enumerate() {
            if index.insert(node.id.clone(), position).is_some() {
                return Err(format!("duplicate node id {}", node.id));
            }
        }

        for edges in &repr.adjacency {
            for edge in edges {
                if edge.target >= repr.nodes.len() {
                    return Err(format!("edge target {} out of range", edge.target));
                }
                if !edge.weight.is_finite() || edge.weight < 0.0 {
                    return Err(format!("edge weight {} is not a valid cost", edge.weight));
                }
            }
        }

        Ok(Graph {
            inner: Arc::new(GraphData {
                nodes: repr.nodes,
                index,
                adjacency: repr.adjacency,
            }),
        })
    }
}
