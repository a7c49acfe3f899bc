//! TCP Server
//!
//! Accepts connections, runs one reader thread per client and owns the
//! request queue and worker pool for the lifetime of `run`.

use std::io::{BufWriter, ErrorKind};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{NavError, Result};
use crate::protocol::{write_response, Response};
use crate::queue::RequestQueue;
use crate::worker::WorkerPool;

use super::Connection;

/// How often the accept loop re-checks the shutdown flag
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A live client tracked until shutdown
struct TrackedConnection {
    client_id: u32,
    /// Clone of the socket, used to unblock the reader on shutdown
    stream: TcpStream,
    handle: JoinHandle<()>,
}

/// TCP server for navdb
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Bind the listen socket
    ///
    /// Validates the config first; a bind failure is reported as `NavError::Network`.
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            NavError::Network(format!("failed to bind {}: {}", config.listen_addr, e))
        })?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            config,
            engine,
            listener,
            local_addr,
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Signal the server to shutdown gracefully
    ///
    /// `run` notices within one poll interval.
    pub fn shutdown(&self) {
        self.engine.request_shutdown();
    }

    /// Serve until shutdown is requested (blocking)
    ///
    /// Shutdown order:
    /// 1. stop accepting
    /// 2. close the queue and join the workers (buffered requests are answered)
    /// 3. shut down every client socket and join the reader threads
    /// 4. save the database
    pub fn run(self) -> Result<()> {
        let queue = Arc::new(RequestQueue::new(self.config.queue_capacity));
        let workers = WorkerPool::spawn(
            self.config.worker_count,
            Arc::clone(&queue),
            Arc::clone(&self.engine),
        )?;

        self.listener.set_nonblocking(true)?;
        tracing::info!(
            "Server listening on {} ({} workers, queue capacity {})",
            self.local_addr,
            self.config.worker_count,
            self.config.queue_capacity
        );

        let mut connections: Vec<TrackedConnection> = Vec::new();
        let mut next_client_id: u32 = 1;

        while !self.engine.is_shutdown_requested() {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    connections.retain(|c| !c.handle.is_finished());

                    if connections.len() >= self.config.max_connections {
                        tracing::warn!(
                            "Rejecting {}: connection limit {} reached",
                            peer,
                            self.config.max_connections
                        );
                        reject(stream);
                        continue;
                    }

                    let client_id = next_client_id;
                    next_client_id = next_client_id.wrapping_add(1).max(1);

                    match self.spawn_connection(stream, client_id, &queue) {
                        Ok(tracked) => connections.push(tracked),
                        Err(e) => tracing::warn!("Failed to start connection for {}: {}", peer, e),
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        tracing::info!("Shutting down server");

        queue.close();
        let processed = workers.join();
        tracing::debug!("Workers drained after {} requests", processed);

        for conn in &connections {
            let _ = conn.stream.shutdown(Shutdown::Both);
        }
        for conn in connections {
            if conn.handle.join().is_err() {
                tracing::warn!("Connection thread for client {} panicked", conn.client_id);
            }
        }

        self.engine.close()?;
        tracing::info!("Server stopped");
        Ok(())
    }

    fn spawn_connection(
        &self,
        stream: TcpStream,
        client_id: u32,
        queue: &Arc<RequestQueue>,
    ) -> Result<TrackedConnection> {
        stream.set_nonblocking(false)?;
        let tracked_stream = stream.try_clone()?;

        let connection = Connection::new(stream, client_id, Arc::clone(queue))?;
        connection.set_timeouts(self.config.read_timeout_ms, self.config.write_timeout_ms)?;

        let handle = thread::Builder::new()
            .name(format!("navdb-conn-{}", client_id))
            .spawn(move || {
                let mut connection = connection;
                if let Err(e) = connection.handle() {
                    tracing::error!("Connection error for client {}: {}", client_id, e);
                }
            })?;

        Ok(TrackedConnection {
            client_id,
            stream: tracked_stream,
            handle,
        })
    }
}

/// Tell a client over the connection limit why it is being dropped
fn reject(stream: TcpStream) {
    let _ = stream.set_nonblocking(false);
    let mut writer = BufWriter::new(stream);
    let response = Response::failure(0, 0, "Server at connection limit, try again later");
    if let Err(e) = write_response(&mut writer, &response) {
        tracing::debug!("Rejection not delivered: {}", e);
    }
}
