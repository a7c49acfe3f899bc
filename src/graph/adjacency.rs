//! Adjacency-list road graph

use std::collections::BTreeMap;

use crate::model::Location;

/// One outgoing road from a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub node_id: u64,
    pub distance: f64,
}

/// In-memory graph rebuilt from the location and road indexes
#[derive(Debug, Default, Clone)]
pub struct Graph {
    nodes: BTreeMap<u64, Location>,
    adjacency: BTreeMap<u64, Vec<Neighbor>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, location: Location) {
        self.adjacency.entry(location.id).or_default();
        self.nodes.insert(location.id, location);
    }

    /// Add a road; an existing entry for the same direction is kept
    pub fn add_edge(&mut self, source_id: u64, dest_id: u64, distance: f64, bidirectional: bool) {
        self.add_arc(source_id, dest_id, distance);
        if bidirectional {
            self.add_arc(dest_id, source_id, distance);
        }
    }

    fn add_arc(&mut self, from: u64, to: u64, distance: f64) {
        let neighbors = self.adjacency.entry(from).or_default();
        if !neighbors.iter().any(|n| n.node_id == to) {
            neighbors.push(Neighbor {
                node_id: to,
                distance,
            });
        }
    }

    pub fn node_exists(&self, node_id: u64) -> bool {
        self.nodes.contains_key(&node_id)
    }

    pub fn node(&self, node_id: u64) -> Option<&Location> {
        self.nodes.get(&node_id)
    }

    pub fn neighbors(&self, node_id: u64) -> &[Neighbor] {
        self.adjacency
            .get(&node_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All nodes in id order
    pub fn nodes(&self) -> impl Iterator<Item = &Location> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of directed adjacency entries (a two-way road counts twice)
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.adjacency.clear();
    }
}
