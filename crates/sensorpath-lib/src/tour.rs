use std::collections::HashSet;

use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::{Graph, NodeIndex};
use crate::output::{SensorStep, TourPlan};
use crate::path::{lookup, shortest_paths_from};

/// Visit every target room once, starting from `source_room`, by always
/// moving to the nearest unvisited target.
///
/// Targets are deduplicated keeping their first occurrence and the source is
/// removed from them. Equally near targets are taken in that order. This is a
/// greedy heuristic: the tour is feasible, not necessarily the shortest one.
///
/// Fails with [`Error::EmptyTargets`] before touching the graph when nothing
/// is left to visit, with [`Error::UnknownNode`] when any room is missing from
/// the graph, and with [`Error::RouteNotFound`] as soon as a remaining target
/// cannot be reached from the current position. No partial tour is returned.
pub fn tour<S: AsRef<str>>(
    graph: &Graph,
    source_room: &str,
    target_rooms: &[S],
) -> Result<TourPlan> {
    let mut seen = HashSet::new();
    let targets: Vec<&str> = target_rooms
        .iter()
        .map(|target| target.as_ref())
        .filter(|target| *target != source_room && seen.insert(*target))
        .collect();
    if targets.is_empty() {
        return Err(Error::EmptyTargets);
    }

    let source = lookup(graph, source_room)?;
    let mut remaining: Vec<(NodeIndex, &str)> = targets
        .iter()
        .map(|&target| lookup(graph, target).map(|index| (index, target)))
        .collect::<Result<_>>()?;

    let mut current = (source, source_room);
    let mut visited = vec![source];
    let mut nodes = vec![source];
    let mut distance = 0.0;

    while !remaining.is_empty() {
        let tree = shortest_paths_from(graph, current.0);

        let mut best: Option<(usize, f64)> = None;
        for (slot, &(index, id)) in remaining.iter().enumerate() {
            let Some(cost) = tree.distance_to(index) else {
                return Err(Error::route_not_found(current.1, id));
            };
            match best {
                Some((_, best_cost)) if cost >= best_cost => {}
                _ => best = Some((slot, cost)),
            }
        }
        let Some((slot, cost)) = best else {
            break;
        };

        let next = remaining.remove(slot);
        let Some(route) = tree.route_to(next.0) else {
            return Err(Error::route_not_found(current.1, next.1));
        };
        debug!(from = current.1, to = next.1, cost, "tour leg");

        nodes.extend(route.nodes.iter().skip(1));
        distance += cost;
        visited.push(next.0);
        current = next;
    }

    let stops: HashSet<NodeIndex> = visited.iter().copied().collect();
    let path = nodes
        .iter()
        .filter(|index| !stops.contains(index))
        .filter_map(|&index| graph.node_at(index))
        .filter_map(SensorStep::from_node)
        .collect();
    let visited = visited
        .iter()
        .filter_map(|&index| graph.node_at(index))
        .map(|node| node.id.clone())
        .collect();

    Ok(TourPlan {
        visited,
        path,
        distance,
    })
}
