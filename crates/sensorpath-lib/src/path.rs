use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{Error, Result};
use crate::graph::{Graph, NodeIndex};
use crate::output::{PathPlan, SensorStep};

/// Lowest-cost node sequence between two nodes, endpoints included.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub nodes: Vec<NodeIndex>,
    pub distance: f64,
}

impl Route {
    /// Node identifiers along the route.
    pub fn ids<'a>(&self, graph: &'a Graph) -> Vec<&'a str> {
        self.nodes
            .iter()
            .filter_map(|&index| graph.node_at(index))
            .map(|node| node.id.as_str())
            .collect()
    }
}

/// Costs and parents from one source to every node it reaches.
///
/// Produced by a single Dijkstra run; several targets can be read from it
/// without searching again.
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    start: NodeIndex,
    distances: Vec<f64>,
    parents: Vec<Option<NodeIndex>>,
}

impl ShortestPaths {
    pub fn start(&self) -> NodeIndex {
        self.start
    }

    /// Cost to reach `goal`, or `None` when it is unreachable.
    pub fn distance_to(&self, goal: NodeIndex) -> Option<f64> {
        self.distances
            .get(goal)
            .copied()
            .filter(|distance| distance.is_finite())
    }

    pub fn route_to(&self, goal: NodeIndex) -> Option<Route> {
        let distance = self.distance_to(goal)?;
        Some(Route {
            nodes: reconstruct_path(&self.parents, self.start, goal),
            distance,
        })
    }
}

/// Run Dijkstra's algorithm from `start` over the whole reachable component.
///
/// Equal-cost entries leave the queue in node insertion order and a node's
/// parent only changes on a strictly cheaper path, so the same graph always
/// yields the same routes.
pub fn shortest_paths_from(graph: &Graph, start: NodeIndex) -> ShortestPaths {
    dijkstra(graph, start, None)
}

/// Lowest-cost route between two node identifiers.
///
/// Fails with [`Error::UnknownNode`] when either id is absent and with
/// [`Error::RouteNotFound`] when both exist but are not connected.
pub fn shortest_path(graph: &Graph, from: &str, to: &str) -> Result<Route> {
    let start = lookup(graph, from)?;
    let goal = lookup(graph, to)?;

    dijkstra(graph, start, Some(goal))
        .route_to(goal)
        .ok_or_else(|| Error::route_not_found(from, to))
}

/// Fastest path between two nodes as returned to callers.
///
/// The sensor list holds the intermediate sensors only: the endpoints and
/// any room node on the way are dropped. The distance is the sum of the
/// stored edge weights.
pub fn fastest_path(graph: &Graph, from: &str, to: &str) -> Result<PathPlan> {
    let route = shortest_path(graph, from, to)?;

    let interior: &[NodeIndex] = if route.nodes.len() > 2 {
        &route.nodes[1..route.nodes.len() - 1]
    } else {
        &[]
    };
    let fastest_path = interior
        .iter()
        .filter_map(|&index| graph.node_at(index))
        .filter_map(SensorStep::from_node)
        .collect();

    Ok(PathPlan {
        fastest_path,
        distance: route.distance,
    })
}

pub(crate) fn lookup(graph: &Graph, id: &str) -> Result<NodeIndex> {
    graph
        .index_of(id)
        .ok_or_else(|| Error::UnknownNode { id: id.to_string() })
}

fn dijkstra(graph: &Graph, start: NodeIndex, goal: Option<NodeIndex>) -> ShortestPaths {
    let node_count = graph.node_count();
    let mut distances = vec![f64::INFINITY; node_count];
    let mut parents: Vec<Option<NodeIndex>> = vec![None; node_count];
    let mut settled = vec![false; node_count];
    let mut queue = BinaryHeap::new();

    if start < node_count {
        distances[start] = 0.0;
        queue.push(QueueEntry::new(start, 0.0));
    }

    while let Some(entry) = queue.pop() {
        if settled[entry.node] {
            continue;
        }
        settled[entry.node] = true;

        if Some(entry.node) == goal {
            break;
        }

        let current_distance = distances[entry.node];
        for edge in graph.neighbours_at(entry.node) {
            let next = edge.target;
            if settled[next] {
                continue;
            }

            let next_cost = current_distance + edge.weight;
            if next_cost < distances[next] {
                distances[next] = next_cost;
                parents[next] = Some(entry.node);
                queue.push(QueueEntry::new(next, next_cost));
            }
        }
    }

    ShortestPaths {
        start,
        distances,
        parents,
    }
}

fn reconstruct_path(
    parents: &[Option<NodeIndex>],
    start: NodeIndex,
    goal: NodeIndex,
) -> Vec<NodeIndex> {
    let mut path = Vec::new();
    let mut current = Some(goal);
    while let Some(node) = current {
        path.push(node);
        if node == start {
            break;
        }
        current = parents.get(node).copied().flatten();
    }
    path.reverse();
    path
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    node: NodeIndex,
    cost: FloatOrd,
}

impl QueueEntry {
    fn new(node: NodeIndex, cost: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by cost.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
