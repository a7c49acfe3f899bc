//! B-Tree Module
//!
//! Ordered in-memory index of `u64` keys to opaque string values, with a
//! flat text snapshot format for persistence.
//!
//! ## Responsibilities
//! - O(log n) point lookups and in-place updates
//! - Insertion with proactive top-down splitting (no backtracking)
//! - Ascending in-order traversal
//! - Snapshot save/load (breadth-first node numbering)
//!
//! ## Shape
//! ```text
//!                 ┌──────────────┐
//!                 │  [10]        │   internal: keys + (keys+1) children
//!                 └──┬────────┬──┘
//!                    │        │
//!        ┌───────────▼─┐   ┌──▼──────────────┐
//!        │ [5, 6, 7]   │   │ [12, 17, 20, 30]│   leaves
//!        └─────────────┘   └─────────────────┘
//! ```
//!
//! ## Concurrency
//! `BTree` is not internally synchronized. Every call, including iteration,
//! must happen under one external exclusive lock.
//!
//! Deletion is not supported.

mod iter;
mod node;
mod snapshot;
mod tree;

pub use iter::Iter;
pub use tree::BTree;

// =============================================================================
// Shared Constants
// =============================================================================

/// Minimum degree `t` of the tree
pub const ORDER: usize = 3;

/// Maximum keys per node (`2t - 1`)
pub const MAX_KEYS: usize = 2 * ORDER - 1;

/// Minimum keys per non-root node (`t - 1`)
pub const MIN_KEYS: usize = ORDER - 1;
