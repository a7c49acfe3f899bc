//! Shortest paths and directions

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use thiserror::Error;

use super::Graph;

/// A shortest path between two nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Node ids from source to destination, inclusive
    pub path: Vec<u64>,
    /// Sum of road distances (km)
    pub total_distance: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("Graph is empty. Add locations first.")]
    EmptyGraph,

    #[error("Source location ID {0} does not exist.")]
    UnknownSource(u64),

    #[error("Destination location ID {0} does not exist.")]
    UnknownDestination(u64),

    #[error("No path found from {from} to {to}.")]
    Unreachable { from: String, to: String },
}

/// Heap entry ordered so that `BinaryHeap` pops the smallest distance first
#[derive(Debug, Clone, Copy)]
struct Frontier {
    distance: f64,
    node_id: u64,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.node_id.cmp(&self.node_id))
    }
}

/// Dijkstra's algorithm from `source_id` to `dest_id`
pub fn dijkstra(graph: &Graph, source_id: u64, dest_id: u64) -> Result<Route, NavigationError> {
    if graph.is_empty() {
        return Err(NavigationError::EmptyGraph);
    }
    if !graph.node_exists(source_id) {
        return Err(NavigationError::UnknownSource(source_id));
    }
    if !graph.node_exists(dest_id) {
        return Err(NavigationError::UnknownDestination(dest_id));
    }
    if source_id == dest_id {
        return Ok(Route {
            path: vec![source_id],
            total_distance: 0.0,
        });
    }

    let mut distances: HashMap<u64, f64> = HashMap::new();
    let mut previous: HashMap<u64, u64> = HashMap::new();
    let mut visited: HashSet<u64> = HashSet::new();
    let mut heap = BinaryHeap::new();

    distances.insert(source_id, 0.0);
    heap.push(Frontier {
        distance: 0.0,
        node_id: source_id,
    });

    while let Some(Frontier { distance, node_id }) = heap.pop() {
        if !visited.insert(node_id) {
            continue;
        }

        if node_id == dest_id {
            return Ok(Route {
                path: reconstruct_path(&previous, dest_id),
                total_distance: distance,
            });
        }

        for neighbor in graph.neighbors(node_id) {
            if visited.contains(&neighbor.node_id) {
                continue;
            }
            let candidate = distance + neighbor.distance;
            let best = distances.entry(neighbor.node_id).or_insert(f64::INFINITY);
            if candidate < *best {
                *best = candidate;
                previous.insert(neighbor.node_id, node_id);
                heap.push(Frontier {
                    distance: candidate,
                    node_id: neighbor.node_id,
                });
            }
        }
    }

    let name = |id: u64| graph.node(id).map(|l| l.name.clone()).unwrap_or_default();
    Err(NavigationError::Unreachable {
        from: name(source_id),
        to: name(dest_id),
    })
}

fn reconstruct_path(previous: &HashMap<u64, u64>, dest_id: u64) -> Vec<u64> {
    let mut path = vec![dest_id];
    let mut current = dest_id;
    while let Some(&prev) = previous.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Turn-by-turn directions for a route
pub fn directions(graph: &Graph, route: &Route) -> Vec<String> {
    let name = |id: u64| {
        graph
            .node(id)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| format!("#{}", id))
    };

    match route.path.as_slice() {
        [] => return vec!["No route available.".to_string()],
        [_] => return vec!["You are already at your destination.".to_string()],
        _ => {}
    }

    let mut steps = Vec::with_capacity(route.path.len() + 3);
    steps.push(format!("Start at: {}", name(route.path[0])));

    for (i, hop) in route.path.windows(2).enumerate() {
        let (from, to) = (hop[0], hop[1]);
        let segment = graph
            .neighbors(from)
            .iter()
            .find(|n| n.node_id == to)
            .map_or(0.0, |n| n.distance);
        steps.push(format!(
            "{}. Go from {} to {} ({:.2} km)",
            i + 1,
            name(from),
            name(to),
            segment
        ));
    }

    if let Some(&last) = route.path.last() {
        steps.push(format!("Arrive at: {}", name(last)));
    }
    steps.push(format!("Total distance: {:.2} km", route.total_distance));
    steps
}

/// Great-circle distance in kilometres between two coordinates
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}
