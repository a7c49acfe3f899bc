//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! ```text
//!   acceptor ──spawn──▶ connection N ──try_enqueue──▶ RequestQueue ──▶ workers
//!                             ▲                                          │
//!                             └──────────── ConnectionWriter ◀───────────┘
//! ```
//! - Single acceptor thread, polling a non-blocking listener
//! - One reader thread per connection
//! - Responses written by the workers through the connection's shared writer

mod client;
mod connection;
mod server;

pub use client::Client;
pub use connection::{Connection, ConnectionWriter};
pub use server::Server;
