//! Database Module
//!
//! Facade over two `BTree` indexes (locations, roads) and the road graph
//! derived from them.
//!
//! ```text
//! <data_dir>/
//!   locations_btree.dat   id → name|lat|lon|type
//!   edges_btree.dat       id → src|dst|distance|road|bidirectional
//! ```

mod manager;

pub use manager::{Database, EDGES_FILE, LOCATIONS_FILE};
