//! # navdb
//!
//! A small navigation database server:
//! - B-tree indexes (order 3) for locations and roads, persisted as text snapshots
//! - Bounded request queue with fail-fast backpressure
//! - Fixed worker pool executing requests under a single store lock
//! - Line-oriented TCP protocol, one reader thread per client
//! - Shortest-path queries over the road graph
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │           (acceptor + one reader per connection)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ try_enqueue
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Request Queue                              │
//! │              (bounded, FIFO, closable)                       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ dequeue
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Worker Pool  ──▶  Engine                   │
//! │                               (store lock)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Locations  │          │    Roads    │
//!   │   (BTree)   │          │   (BTree)   │
//!   └──────┬──────┘          └──────┬──────┘
//!          └────────────┬───────────┘
//!                       ▼
//!               ┌─────────────┐
//!               │    Graph    │
//!               │ (Dijkstra)  │
//!               └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod btree;
pub mod database;
pub mod engine;
pub mod graph;
pub mod model;
pub mod network;
pub mod protocol;
pub mod queue;
pub mod worker;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use btree::BTree;
pub use config::Config;
pub use database::Database;
pub use engine::Engine;
pub use error::{NavError, Result};
pub use protocol::{Request, RequestType, Response, Status};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of navdb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
