//! Request Queue Tests
//!
//! These tests verify:
//! - FIFO order for single and multiple producers
//! - Blocking at capacity and non-blocking rejection
//! - Close semantics (drain, then end-of-stream; waiters woken)

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use navdb::queue::{BoundedQueue, Closed, TryDequeueError, TryEnqueueError};

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_fifo_order_single_producer() {
    let queue = BoundedQueue::new(8);
    for i in 0..5 {
        queue.enqueue(i).unwrap();
    }

    let drained: Vec<i32> = (0..5).map(|_| queue.dequeue().unwrap()).collect();
    assert_eq!(drained, vec![0, 1, 2, 3, 4]);
    assert!(queue.is_empty());
}

#[test]
fn test_capacity_and_len() {
    let queue = BoundedQueue::new(3);
    assert_eq!(queue.capacity(), 3);

    queue.enqueue('a').unwrap();
    queue.enqueue('b').unwrap();
    assert_eq!(queue.len(), 2);
    assert!(!queue.is_full());

    queue.enqueue('c').unwrap();
    assert!(queue.is_full());
}

#[test]
fn test_try_enqueue_on_full_queue_returns_item() {
    let queue = BoundedQueue::new(2);
    queue.try_enqueue(1).unwrap();
    queue.try_enqueue(2).unwrap();

    assert_eq!(queue.try_enqueue(3), Err(TryEnqueueError::Full(3)));
    assert_eq!(queue.len(), 2);
}

#[test]
fn test_try_dequeue_on_empty_queue() {
    let queue: BoundedQueue<u8> = BoundedQueue::new(2);
    assert_eq!(queue.try_dequeue(), Err(TryDequeueError::Empty));
}

#[test]
fn test_clear_removes_buffered_items() {
    let queue = BoundedQueue::new(4);
    queue.enqueue(1).unwrap();
    queue.enqueue(2).unwrap();

    assert_eq!(queue.clear(), 2);
    assert!(queue.is_empty());
}

#[test]
#[should_panic]
fn test_zero_capacity_panics() {
    let _queue: BoundedQueue<u8> = BoundedQueue::new(0);
}

// =============================================================================
// Blocking Tests
// =============================================================================

#[test]
fn test_enqueue_blocks_until_slot_frees() {
    let queue = Arc::new(BoundedQueue::new(2));
    queue.enqueue(1).unwrap();
    queue.enqueue(2).unwrap();

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.enqueue(3))
    };

    thread::sleep(Duration::from_millis(100));
    assert!(!producer.is_finished(), "enqueue should block on a full queue");
    assert_eq!(queue.len(), 2);

    assert_eq!(queue.dequeue(), Some(1));
    producer.join().unwrap().unwrap();

    assert_eq!(queue.dequeue(), Some(2));
    assert_eq!(queue.dequeue(), Some(3));
}

#[test]
fn test_dequeue_blocks_until_item_arrives() {
    let queue = Arc::new(BoundedQueue::new(1));

    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.dequeue())
    };

    thread::sleep(Duration::from_millis(50));
    queue.enqueue("hello").unwrap();
    assert_eq!(consumer.join().unwrap(), Some("hello"));
}

// =============================================================================
// Close Tests
// =============================================================================

#[test]
fn test_close_drains_buffered_items_then_ends() {
    let queue = BoundedQueue::new(4);
    queue.enqueue(1).unwrap();
    queue.enqueue(2).unwrap();
    queue.close();

    assert!(queue.is_closed());
    assert_eq!(queue.dequeue(), Some(1));
    assert_eq!(queue.try_dequeue(), Ok(2));
    assert_eq!(queue.dequeue(), None);
    assert_eq!(queue.try_dequeue(), Err(TryDequeueError::Closed));
}

#[test]
fn test_enqueue_after_close_is_refused() {
    let queue = BoundedQueue::new(4);
    queue.close();

    assert_eq!(queue.enqueue(7), Err(Closed(7)));
    assert_eq!(queue.try_enqueue(8), Err(TryEnqueueError::Closed(8)));
    assert!(queue.is_empty());
}

#[test]
fn test_close_wakes_blocked_consumers() {
    let queue: Arc<BoundedQueue<u32>> = Arc::new(BoundedQueue::new(4));

    let consumers: Vec<_> = (0..3)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.dequeue())
        })
        .collect();

    thread::sleep(Duration::from_millis(50));
    queue.close();

    for consumer in consumers {
        assert_eq!(consumer.join().unwrap(), None);
    }
}

#[test]
fn test_close_wakes_blocked_producer() {
    let queue = Arc::new(BoundedQueue::new(1));
    queue.enqueue(0).unwrap();

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.enqueue(1))
    };

    thread::sleep(Duration::from_millis(50));
    queue.close();

    assert_eq!(producer.join().unwrap(), Err(Closed(1)));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_multiple_producers_preserve_per_producer_order() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 500;

    let queue = Arc::new(BoundedQueue::new(16));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    queue.enqueue((p, i)).unwrap();
                }
            })
        })
        .collect();

    let mut last_seen = vec![None; PRODUCERS];
    for _ in 0..PRODUCERS * PER_PRODUCER {
        let (p, i) = queue.dequeue().unwrap();
        if let Some(prev) = last_seen[p] {
            assert!(i > prev, "producer {} out of order: {} after {}", p, i, prev);
        }
        last_seen[p] = Some(i);
    }

    for producer in producers {
        producer.join().unwrap();
    }
    assert!(queue.is_empty());
    assert!(last_seen.iter().all(|s| *s == Some(PER_PRODUCER - 1)));
}

#[test]
fn test_multiple_consumers_receive_every_item_once() {
    let queue = Arc::new(BoundedQueue::new(8));

    let consumers: Vec<_> = (0..3)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut got = Vec::new();
                while let Some(item) = queue.dequeue() {
                    got.push(item);
                }
                got
            })
        })
        .collect();

    for i in 0..1_000u32 {
        queue.enqueue(i).unwrap();
    }
    queue.close();

    let mut all: Vec<u32> = consumers
        .into_iter()
        .flat_map(|c| c.join().unwrap())
        .collect();
    all.sort_unstable();
    assert_eq!(all, (0..1_000).collect::<Vec<_>>());
}
