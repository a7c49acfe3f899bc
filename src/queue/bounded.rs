//! Bounded blocking queue
//!
//! Fixed-capacity FIFO guarded by one mutex and two condition variables.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

/// Returned by [`BoundedQueue::enqueue`] when the queue was closed; hands the
/// item back to the caller.
#[derive(Debug, PartialEq, Eq)]
pub struct Closed<T>(pub T);

/// Failure of [`BoundedQueue::try_enqueue`]
#[derive(Debug, PartialEq, Eq)]
pub enum TryEnqueueError<T> {
    /// Every slot is taken
    Full(T),
    /// The queue no longer accepts items
    Closed(T),
}

impl<T> TryEnqueueError<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Full(item) | Self::Closed(item) => item,
        }
    }
}

/// Failure of [`BoundedQueue::try_dequeue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryDequeueError {
    /// Nothing buffered right now
    Empty,
    /// Closed and fully drained
    Closed,
}

struct State<T> {
    buffer: VecDeque<T>,
    closed: bool,
}

/// Multi-producer / multi-consumer FIFO with a fixed capacity
///
/// ## Concurrency:
/// - `state`: buffer and closed flag, one lock for both
/// - `not_empty`: consumers wait here
/// - `not_full`: producers wait here
///
/// Items leave in exactly the order they entered, across all producers.
pub struct BoundedQueue<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items
    ///
    /// # Panics
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be at least 1");
        Self {
            state: Mutex::new(State {
                buffer: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    /// Append an item, waiting for a free slot
    ///
    /// Fails, returning the item, if the queue is closed before a slot frees.
    pub fn enqueue(&self, item: T) -> Result<(), Closed<T>> {
        let mut state = self.state.lock();
        while state.buffer.len() >= self.capacity && !state.closed {
            self.not_full.wait(&mut state);
        }
        if state.closed {
            return Err(Closed(item));
        }

        state.buffer.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Append an item without waiting
    pub fn try_enqueue(&self, item: T) -> Result<(), TryEnqueueError<T>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TryEnqueueError::Closed(item));
        }
        if state.buffer.len() >= self.capacity {
            return Err(TryEnqueueError::Full(item));
        }

        state.buffer.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove the oldest item, waiting until one is available
    ///
    /// After [`close`](Self::close) this keeps returning buffered items and
    /// yields `None` once the buffer is empty.
    pub fn dequeue(&self) -> Option<T> {
        let mut state = self.state.lock();
        while state.buffer.is_empty() && !state.closed {
            self.not_empty.wait(&mut state);
        }

        let item = state.buffer.pop_front()?;
        drop(state);
        self.not_full.notify_one();
        Some(item)
    }

    /// Remove the oldest item without waiting
    pub fn try_dequeue(&self) -> Result<T, TryDequeueError> {
        let mut state = self.state.lock();
        let item = state.buffer.pop_front();
        match item {
            Some(item) => {
                drop(state);
                self.not_full.notify_one();
                Ok(item)
            }
            None if state.closed => Err(TryDequeueError::Closed),
            None => Err(TryDequeueError::Empty),
        }
    }

    /// Stop accepting items and wake every waiter. Idempotent.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Drop every buffered item, returning how many were removed
    pub fn clear(&self) -> usize {
        let removed = {
            let mut state = self.state.lock();
            let removed = state.buffer.len();
            state.buffer.clear();
            removed
        };
        self.not_full.notify_all();
        removed
    }

    pub fn len(&self) -> usize {
        self.state.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().buffer.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.state.lock().buffer.len() >= self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
