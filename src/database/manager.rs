//! Database Manager
//!
//! Owns the two ordered indexes and keeps the road graph in step with them.
//!
//! ## Responsibilities
//! - Load both snapshots on startup (a broken snapshot starts that index empty)
//! - Assign ids for new locations and roads
//! - Validate records before they are stored
//! - Write both snapshots on `save()`

use std::fs;
use std::path::{Path, PathBuf};

use crate::btree::BTree;
use crate::error::{NavError, Result};
use crate::graph::{haversine_distance, Graph};
use crate::model::{Edge, Location};

/// Snapshot file holding the location index
pub const LOCATIONS_FILE: &str = "locations_btree.dat";

/// Snapshot file holding the road index
pub const EDGES_FILE: &str = "edges_btree.dat";

/// Location and road store
///
/// Not synchronized; the engine serializes access behind its store lock.
#[derive(Debug)]
pub struct Database {
    data_dir: PathBuf,

    /// location id → encoded `Location`
    locations: BTree,

    /// road id → encoded `Edge`
    edges: BTree,

    /// Derived from both indexes
    graph: Graph,

    next_location_id: u64,
    next_edge_id: u64,

    /// Set on every mutation, cleared by a successful save
    dirty: bool,
}

impl Database {
    /// Open or create a database in `data_dir`
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;

        let mut db = Self {
            locations: load_index(&data_dir.join(LOCATIONS_FILE)),
            edges: load_index(&data_dir.join(EDGES_FILE)),
            data_dir,
            graph: Graph::new(),
            next_location_id: 1,
            next_edge_id: 1,
            dirty: false,
        };
        db.reset_counters();
        db.rebuild_graph();

        tracing::info!(
            "Opened database at {} ({} locations, {} roads)",
            db.data_dir.display(),
            db.locations.len(),
            db.edges.len()
        );
        Ok(db)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // ========================================================================
    // Locations
    // ========================================================================

    /// Store a new location under the next free id
    pub fn add_location(
        &mut self,
        name: &str,
        latitude: f64,
        longitude: f64,
        kind: &str,
    ) -> Result<u64> {
        let id = self.next_location_id;
        self.insert_location(Location::new(id, name, latitude, longitude, kind))?;
        Ok(id)
    }

    /// Store a location with an explicit id, replacing any record under it
    pub fn insert_location(&mut self, location: Location) -> Result<()> {
        location.validate()?;

        let id = location.id;
        let after = next_id_after(id)?;
        self.locations.insert(id, location.encode());
        self.graph.add_node(location);
        self.next_location_id = self.next_location_id.max(after);
        self.dirty = true;

        tracing::debug!("Stored location {}", id);
        Ok(())
    }

    pub fn location(&self, id: u64) -> Result<Location> {
        let raw = self
            .locations
            .search(id)
            .ok_or_else(|| NavError::NotFound(format!("Location ID {} not found", id)))?;
        Location::decode(id, raw)
    }

    pub fn location_exists(&self, id: u64) -> bool {
        self.locations.exists(id)
    }

    /// All decodable locations in id order
    pub fn locations(&self) -> Vec<Location> {
        decode_all(&self.locations, Location::decode)
    }

    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    // ========================================================================
    // Roads
    // ========================================================================

    /// Store a new road between two existing locations
    ///
    /// Without a `distance` the great-circle distance between the endpoints
    /// is used.
    pub fn add_edge(
        &mut self,
        source_id: u64,
        destination_id: u64,
        distance: Option<f64>,
        road_name: &str,
        bidirectional: bool,
    ) -> Result<u64> {
        if source_id == 0 || destination_id == 0 {
            return Err(NavError::Validation(
                "Invalid source or destination ID".to_string(),
            ));
        }

        let distance = match distance {
            Some(d) => d,
            None => {
                let src = self.location(source_id)?;
                let dst = self.location(destination_id)?;
                haversine_distance(src.latitude, src.longitude, dst.latitude, dst.longitude)
            }
        };

        let id = self.next_edge_id;
        self.insert_edge(Edge::new(
            id,
            source_id,
            destination_id,
            distance,
            road_name,
            bidirectional,
        ))?;
        Ok(id)
    }

    /// Store a road with an explicit id; both endpoints must exist
    pub fn insert_edge(&mut self, edge: Edge) -> Result<()> {
        edge.validate()?;

        for endpoint in [edge.source_id, edge.destination_id] {
            if !self.location_exists(endpoint) {
                return Err(NavError::NotFound(format!(
                    "Location ID {} not found",
                    endpoint
                )));
            }
        }

        let id = edge.id;
        let after = next_id_after(id)?;
        self.edges.insert(id, edge.encode());
        self.graph.add_edge(
            edge.source_id,
            edge.destination_id,
            edge.distance,
            edge.bidirectional,
        );
        self.next_edge_id = self.next_edge_id.max(after);
        self.dirty = true;

        tracing::debug!("Stored road {} ({} -> {})", id, edge.source_id, edge.destination_id);
        Ok(())
    }

    pub fn edge(&self, id: u64) -> Result<Edge> {
        let raw = self
            .edges
            .search(id)
            .ok_or_else(|| NavError::NotFound(format!("Road ID {} not found", id)))?;
        Edge::decode(id, raw)
    }

    pub fn edge_exists(&self, id: u64) -> bool {
        self.edges.exists(id)
    }

    pub fn edges(&self) -> Vec<Edge> {
        decode_all(&self.edges, Edge::decode)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Write both snapshots
    ///
    /// The dirty flag is only cleared when both writes succeed.
    pub fn save(&mut self) -> Result<()> {
        self.locations.save_to(&self.data_dir.join(LOCATIONS_FILE))?;
        self.edges.save_to(&self.data_dir.join(EDGES_FILE))?;
        self.dirty = false;

        tracing::info!(
            "Saved {} locations and {} roads",
            self.locations.len(),
            self.edges.len()
        );
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Check the structural invariants of both indexes
    pub fn validate_indexes(&self) -> Result<()> {
        self.locations.validate()?;
        self.edges.validate()
    }

    /// Discard in-memory state and reload both snapshots from disk
    pub fn reload(&mut self) {
        self.locations = load_index(&self.data_dir.join(LOCATIONS_FILE));
        self.edges = load_index(&self.data_dir.join(EDGES_FILE));
        self.reset_counters();
        self.rebuild_graph();
        self.dirty = false;
    }

    /// Recreate the graph from the two indexes
    ///
    /// Roads whose endpoints are missing are skipped.
    pub fn rebuild_graph(&mut self) {
        self.graph.clear();

        for location in self.locations() {
            self.graph.add_node(location);
        }

        for edge in self.edges() {
            if !self.graph.node_exists(edge.source_id)
                || !self.graph.node_exists(edge.destination_id)
            {
                tracing::warn!("Road {} references a missing location; skipped", edge.id);
                continue;
            }
            self.graph.add_edge(
                edge.source_id,
                edge.destination_id,
                edge.distance,
                edge.bidirectional,
            );
        }

        tracing::debug!(
            "Rebuilt graph with {} nodes and {} arcs",
            self.graph.node_count(),
            self.graph.edge_count()
        );
    }

    /// Remove every location and road (in memory only until `save`)
    pub fn clear_all(&mut self) {
        self.locations.clear();
        self.edges.clear();
        self.graph.clear();
        self.next_location_id = 1;
        self.next_edge_id = 1;
        self.dirty = true;
    }

    /// Replace the contents with the built-in five-location sample map
    pub fn initialize_sample_data(&mut self) -> Result<()> {
        self.clear_all();

        for (name, lat, lon, kind) in SAMPLE_LOCATIONS {
            self.add_location(name, lat, lon, kind)?;
        }
        for (src, dst, distance, road) in SAMPLE_ROADS {
            self.add_edge(src, dst, Some(distance), road, true)?;
        }

        tracing::info!(
            "Loaded sample data: {} locations, {} roads",
            self.location_count(),
            self.edge_count()
        );
        Ok(())
    }

    /// Derive the next ids from the largest stored keys
    ///
    /// An index whose largest key leaves no room for another id is treated
    /// like an unreadable snapshot and dropped.
    fn reset_counters(&mut self) {
        self.next_location_id = match next_free_id(&self.locations) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Location index unusable ({}); starting empty", e);
                self.locations.clear();
                1
            }
        };
        self.next_edge_id = match next_free_id(&self.edges) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Road index unusable ({}); starting empty", e);
                self.edges.clear();
                1
            }
        };
    }
}

fn next_free_id(tree: &BTree) -> Result<u64> {
    next_id_after(tree.max_key().unwrap_or(0))
}

fn next_id_after(id: u64) -> Result<u64> {
    id.checked_add(1)
        .ok_or_else(|| NavError::Validation("id space exhausted".to_string()))
}

const SAMPLE_LOCATIONS: [(&str, f64, f64, &str); 5] = [
    ("Central Station", 40.7128, -74.0060, "station"),
    ("North Park", 40.7200, -74.0000, "park"),
    ("East Market", 40.7100, -73.9950, "market"),
    ("West Plaza", 40.7150, -74.0150, "plaza"),
    ("South Mall", 40.7050, -74.0100, "mall"),
];

const SAMPLE_ROADS: [(u64, u64, f64, &str); 7] = [
    (1, 2, 1.2, "North Street"),
    (1, 3, 1.5, "East Avenue"),
    (1, 4, 0.9, "West Road"),
    (2, 3, 1.8, "Park Lane"),
    (2, 4, 2.0, "Cross Street"),
    (3, 5, 1.3, "Market Road"),
    (4, 5, 1.1, "Plaza Way"),
];

/// Load a snapshot, falling back to an empty index
fn load_index(path: &Path) -> BTree {
    if !path.exists() {
        return BTree::new();
    }

    let mut tree = BTree::new();
    match tree.load_from(path) {
        Ok(()) => tree,
        Err(e) => {
            tracing::warn!("Snapshot {} unreadable ({}); starting empty", path.display(), e);
            BTree::new()
        }
    }
}

fn decode_all<T>(tree: &BTree, decode: fn(u64, &str) -> Result<T>) -> Vec<T> {
    tree.iter()
        .filter_map(|(id, raw)| match decode(id, raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping undecodable record {}: {}", id, e);
                None
            }
        })
        .collect()
}
