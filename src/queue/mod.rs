//! Request Queue Module
//!
//! Bounded FIFO between connection readers (producers) and workers
//! (consumers).
//!
//! ## Responsibilities
//! - Fixed capacity, chosen at construction, never resized
//! - Blocking and non-blocking enqueue/dequeue
//! - Close: wakes all waiters, refuses new items, lets consumers drain
//!
//! ## Backpressure
//! Connection readers only ever call `try_enqueue`; a full queue is reported
//! to the client immediately instead of stalling the read loop.

mod bounded;

use std::sync::Arc;

pub use bounded::{BoundedQueue, Closed, TryDequeueError, TryEnqueueError};

use crate::error::NavError;
use crate::protocol::{Request, ResponseSink};

/// Handle back to the connection a request arrived on
pub type ReplyHandle = Arc<dyn ResponseSink>;

/// One unit of work: a decoded request plus where to send its response
pub struct QueueItem {
    pub request: Request,
    pub reply: ReplyHandle,
}

impl QueueItem {
    pub fn new(request: Request, reply: ReplyHandle) -> Self {
        Self { request, reply }
    }
}

impl std::fmt::Debug for QueueItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueItem")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl<T> From<TryEnqueueError<T>> for NavError {
    fn from(err: TryEnqueueError<T>) -> Self {
        match err {
            TryEnqueueError::Full(_) => NavError::QueueFull,
            TryEnqueueError::Closed(_) => NavError::QueueClosed,
        }
    }
}

/// The queue feeding the worker pool
pub type RequestQueue = BoundedQueue<QueueItem>;
