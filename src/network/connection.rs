//! Connection Handler
//!
//! Reads requests from one client and feeds them into the request queue.
//! Responses are written back by whichever worker processed the request,
//! through the connection's shared [`ConnectionWriter`].

use std::io::{BufWriter, ErrorKind, Read};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use parking_lot::Mutex;

use crate::error::{NavError, Result};
use crate::protocol::{decode_request, write_response, Response, ResponseSink, MAX_LINE_LENGTH};
use crate::queue::{QueueItem, ReplyHandle, RequestQueue};

const READ_CHUNK: usize = 4096;

/// Write half of a client socket, shared by the reader and all workers
///
/// The mutex keeps each response line whole when several workers answer the
/// same client at once.
pub struct ConnectionWriter {
    writer: Mutex<BufWriter<TcpStream>>,
    peer_addr: String,
}

impl ConnectionWriter {
    pub fn new(stream: TcpStream, peer_addr: impl Into<String>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(stream)),
            peer_addr: peer_addr.into(),
        }
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

impl ResponseSink for ConnectionWriter {
    fn send_response(&self, response: &Response) -> Result<()> {
        let mut writer = self.writer.lock();
        write_response(&mut *writer, response)
    }
}

/// Handles a single client connection
pub struct Connection {
    /// Read half of the socket
    stream: TcpStream,

    /// Shared write half
    writer: Arc<ConnectionWriter>,

    /// Queue feeding the worker pool
    queue: Arc<RequestQueue>,

    /// Assigned by the server at accept time
    client_id: u32,

    /// Next request id stamped on an accepted line
    next_request_id: u32,

    /// Bytes received but not yet split into lines
    buffer: BytesMut,

    /// Set while skipping the rest of an oversized line
    discarding: bool,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream, client_id: u32, queue: Arc<RequestQueue>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let write_stream = stream.try_clone()?;

        Ok(Self {
            writer: Arc::new(ConnectionWriter::new(write_stream, peer_addr.clone())),
            stream,
            queue,
            client_id,
            next_request_id: 1,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            discarding: false,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 leaves a direction unbounded)
    pub fn set_timeouts(&self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.stream
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.stream
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Sends the welcome response, then reads request lines until the client
    /// disconnects or the server shuts the socket down.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Client {} connected from {}", self.client_id, self.peer_addr);

        let welcome = Response::success(
            self.client_id,
            0,
            format!("Welcome to navdb server. Client ID: {}", self.client_id),
            "",
        );
        self.writer.send_response(&welcome)?;

        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let n = match self.stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => match e.kind() {
                    ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::UnexpectedEof => {
                        tracing::debug!("Connection reset by client {}", self.client_id);
                        break;
                    }
                    ErrorKind::WouldBlock | ErrorKind::TimedOut => {
                        tracing::debug!("Read timeout for client {}", self.client_id);
                        break;
                    }
                    _ => {
                        tracing::warn!("Error reading from client {}: {}", self.client_id, e);
                        return Err(e.into());
                    }
                },
            };

            self.buffer.extend_from_slice(&chunk[..n]);
            self.drain_lines();
        }

        tracing::debug!("Client {} ({}) disconnected", self.client_id, self.peer_addr);
        Ok(())
    }

    /// Split every complete line out of the buffer and dispatch it
    fn drain_lines(&mut self) {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw = self.buffer.split_to(pos + 1);

            if self.discarding {
                self.discarding = false;
                continue;
            }

            let Ok(text) = std::str::from_utf8(&raw[..pos]) else {
                tracing::debug!(
                    "Malformed request dropped from client {}: invalid UTF-8",
                    self.client_id
                );
                continue;
            };
            let line = text.strip_suffix('\r').unwrap_or(text);
            if line.trim().is_empty() {
                continue;
            }
            if line.len() > MAX_LINE_LENGTH {
                tracing::debug!(
                    "Oversized line ({} bytes) dropped from client {}",
                    line.len(),
                    self.client_id
                );
                continue;
            }

            self.dispatch_line(line);
        }

        if self.buffer.len() > MAX_LINE_LENGTH {
            tracing::debug!(
                "Oversized line from client {}; discarding until newline",
                self.client_id
            );
            let len = self.buffer.len();
            self.buffer.advance(len);
            self.discarding = true;
        }
    }

    fn dispatch_line(&mut self, line: &str) {
        let mut request = match decode_request(line) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!("Malformed request dropped from client {}: {}", self.client_id, e);
                return;
            }
        };

        request.client_id = self.client_id;
        request.request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        tracing::trace!("Received request from client {}: {:?}", self.client_id, request);

        let request_id = request.request_id;
        let reply: ReplyHandle = self.writer.clone();
        let reason = match self.queue.try_enqueue(QueueItem::new(request, reply)) {
            Ok(()) => return,
            Err(e) => NavError::from(e),
        };
        let rejected = Response::failure(self.client_id, request_id, reason.to_string());

        tracing::debug!("Rejected request from client {}: {}", self.client_id, rejected.message);
        if let Err(e) = self.writer.send_response(&rejected) {
            tracing::debug!("Rejection not delivered to client {}: {}", self.client_id, e);
        }
    }

    pub fn client_id(&self) -> u32 {
        self.client_id
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
