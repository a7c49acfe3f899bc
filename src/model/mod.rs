//! Model Module
//!
//! Records stored in the two indexes. Each record is stored as a single
//! `|`-separated string; free-text fields go through the wire escaping so
//! they never contain a raw `|`.

mod edge;
mod location;

pub use edge::Edge;
pub use location::Location;

fn split_fields(value: &str) -> Vec<&str> {
    value.split('|').collect()
}
