//! Worker pool
//!
//! Fixed set of named threads draining the request queue.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::engine::Engine;
use crate::error::{NavError, Result};
use crate::queue::{QueueItem, RequestQueue};

/// Handle to the running workers
///
/// Workers exit once the queue is closed and drained; `join` waits for that.
pub struct WorkerPool {
    handles: Vec<JoinHandle<u64>>,
}

impl WorkerPool {
    /// Start `count` workers on `queue`
    ///
    /// If a thread cannot be started the queue is closed and the workers
    /// already running are joined before the error is returned.
    pub fn spawn(count: usize, queue: Arc<RequestQueue>, engine: Arc<Engine>) -> Result<Self> {
        Self::spawn_with(count, queue, engine, |_| thread::Builder::new())
    }

    fn spawn_with(
        count: usize,
        queue: Arc<RequestQueue>,
        engine: Arc<Engine>,
        builder: impl Fn(usize) -> thread::Builder,
    ) -> Result<Self> {
        if count == 0 {
            return Err(NavError::Config("worker pool needs at least one thread".to_string()));
        }

        let mut handles = Vec::with_capacity(count);
        for worker_id in 1..=count {
            let worker_queue = Arc::clone(&queue);
            let worker_engine = Arc::clone(&engine);

            let spawned = builder(worker_id)
                .name(format!("navdb-worker-{}", worker_id))
                .spawn(move || run_worker(worker_id, &worker_queue, &worker_engine));

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    tracing::error!("Failed to start worker {}: {}", worker_id, e);
                    queue.close();
                    Self { handles }.join();
                    return Err(e.into());
                }
            }
        }

        tracing::info!("Worker pool started with {} threads", count);
        Ok(Self { handles })
    }

    /// Wait for every worker to exit; returns the number of requests processed
    ///
    /// Call after closing the queue, otherwise this blocks forever.
    pub fn join(self) -> u64 {
        let mut processed = 0;
        for handle in self.handles {
            match handle.join() {
                Ok(count) => processed += count,
                Err(_) => tracing::warn!("Worker thread panicked"),
            }
        }
        tracing::info!("Worker pool stopped after {} requests", processed);
        processed
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

fn run_worker(worker_id: usize, queue: &RequestQueue, engine: &Engine) -> u64 {
    tracing::debug!("Worker {} started", worker_id);
    let mut processed = 0;

    while let Some(QueueItem { request, reply }) = queue.dequeue() {
        let response = engine.execute(&request);
        processed += 1;

        // The client may have disconnected while the request was queued.
        if let Err(e) = reply.send_response(&response) {
            tracing::debug!(
                "Worker {}: response to client {} (request {}) not delivered: {}",
                worker_id,
                request.client_id,
                request.request_id,
                e
            );
        }
    }

    tracing::debug!("Worker {} stopped after {} requests", worker_id, processed);
    processed
}
