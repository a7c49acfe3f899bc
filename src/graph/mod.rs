//! Graph Module
//!
//! Road network used for route finding. The graph is derived state: the
//! database rebuilds it from the location and road indexes whenever they are
//! loaded, and keeps it in step on every insert.
//!
//! ## Interface used by the request handlers
//! - `Graph::node_exists(id)`
//! - `Graph::neighbors(id)` → `(neighbor_id, distance)` pairs
//! - `dijkstra(graph, source, dest)` → `Route` or `NavigationError`

mod adjacency;
mod navigation;

pub use adjacency::{Graph, Neighbor};
pub use navigation::{dijkstra, directions, haversine_distance, NavigationError, Route};
