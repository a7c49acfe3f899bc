//! Worker Module
//!
//! ```text
//!   RequestQueue ──dequeue──▶ worker N ──execute──▶ Engine
//!                                │
//!                                └──send_response──▶ originating connection
//! ```
//!
//! A worker blocks on `dequeue`, so an idle pool costs nothing. Closing the
//! queue lets the workers finish the buffered items and then exit.

mod pool;

pub use pool::WorkerPool;
