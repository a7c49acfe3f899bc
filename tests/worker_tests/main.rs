//! Worker Pool Tests
//!
//! Drives the queue → worker → engine pipeline in-process, with crossbeam
//! channels standing in for client connections.

use std::sync::Arc;
use std::thread;

use crossbeam::channel::{self, Receiver};
use navdb::engine::Engine;
use navdb::protocol::{Request, RequestType, Response, Status};
use navdb::queue::{QueueItem, ReplyHandle, RequestQueue};
use navdb::worker::WorkerPool;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_engine() -> (TempDir, Arc<Engine>) {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open_path(temp_dir.path()).unwrap();
    (temp_dir, Arc::new(engine))
}

fn client_channel() -> (ReplyHandle, Receiver<Response>) {
    let (tx, rx) = channel::unbounded::<Response>();
    (Arc::new(tx), rx)
}

fn add_location_request(client_id: u32, request_id: u32) -> Request {
    let mut request = Request::new(RequestType::AddLocation)
        .with_param("name", format!("c{}-r{}", client_id, request_id))
        .with_param("latitude", 10.0)
        .with_param("longitude", 20.0);
    request.client_id = client_id;
    request.request_id = request_id;
    request
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_spawn_rejects_zero_workers() {
    let (_temp, engine) = setup_engine();
    let queue = Arc::new(RequestQueue::new(4));
    assert!(WorkerPool::spawn(0, queue, engine).is_err());
}

#[test]
fn test_single_request_roundtrip() {
    let (_temp, engine) = setup_engine();
    let queue = Arc::new(RequestQueue::new(4));
    let pool = WorkerPool::spawn(2, Arc::clone(&queue), Arc::clone(&engine)).unwrap();
    assert_eq!(pool.len(), 2);

    let (reply, rx) = client_channel();
    let mut request = Request::new(RequestType::InitSample);
    request.client_id = 3;
    request.request_id = 1;
    queue.enqueue(QueueItem::new(request, reply)).unwrap();

    let response = rx.recv().unwrap();
    assert_eq!(response.client_id, 3);
    assert_eq!(response.status, Status::Success);
    assert_eq!(response.data, "locations=5;roads=7");

    queue.close();
    assert_eq!(pool.join(), 1);
}

#[test]
fn test_concurrent_producers_all_answered() {
    const CLIENTS: u32 = 6;
    const PER_CLIENT: u32 = 50;

    let (_temp, engine) = setup_engine();
    let queue = Arc::new(RequestQueue::new(8));
    let pool = WorkerPool::spawn(4, Arc::clone(&queue), Arc::clone(&engine)).unwrap();

    let producers: Vec<_> = (1..=CLIENTS)
        .map(|client_id| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let (reply, rx) = client_channel();
                for request_id in 1..=PER_CLIENT {
                    let item = QueueItem::new(
                        add_location_request(client_id, request_id),
                        Arc::clone(&reply),
                    );
                    queue.enqueue(item).unwrap();
                }

                let mut seen: Vec<u32> = (0..PER_CLIENT)
                    .map(|_| {
                        let response = rx.recv().unwrap();
                        assert_eq!(response.client_id, client_id);
                        assert_eq!(response.status, Status::Success);
                        response.request_id
                    })
                    .collect();
                seen.sort_unstable();
                seen
            })
        })
        .collect();

    for producer in producers {
        let seen = producer.join().unwrap();
        assert_eq!(seen, (1..=PER_CLIENT).collect::<Vec<_>>());
    }

    queue.close();
    assert_eq!(pool.join(), u64::from(CLIENTS * PER_CLIENT));

    // Every insert got its own id; none was lost to a race
    let count = engine.with_database(|db| {
        db.validate_indexes().unwrap();
        db.location_count()
    });
    assert_eq!(count, (CLIENTS * PER_CLIENT) as usize);
}

#[test]
fn test_close_drains_buffered_requests() {
    let (_temp, engine) = setup_engine();
    let queue = Arc::new(RequestQueue::new(16));
    let (reply, rx) = client_channel();

    for request_id in 1..=10 {
        queue
            .enqueue(QueueItem::new(add_location_request(1, request_id), Arc::clone(&reply)))
            .unwrap();
    }
    queue.close();

    let pool = WorkerPool::spawn(3, Arc::clone(&queue), Arc::clone(&engine)).unwrap();
    assert_eq!(pool.join(), 10);

    drop(reply);
    assert_eq!(rx.iter().count(), 10);
}

#[test]
fn test_disconnected_client_does_not_stop_worker() {
    let (_temp, engine) = setup_engine();
    let queue = Arc::new(RequestQueue::new(4));
    let pool = WorkerPool::spawn(1, Arc::clone(&queue), Arc::clone(&engine)).unwrap();

    let (gone, gone_rx) = client_channel();
    drop(gone_rx);
    queue
        .enqueue(QueueItem::new(add_location_request(1, 1), gone))
        .unwrap();

    let (reply, rx) = client_channel();
    queue
        .enqueue(QueueItem::new(add_location_request(2, 1), reply))
        .unwrap();

    assert_eq!(rx.recv().unwrap().client_id, 2);

    queue.close();
    assert_eq!(pool.join(), 2);
}
