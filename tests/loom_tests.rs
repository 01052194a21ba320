//! Loom-based concurrency tests.
//!
//! Run with: `cargo test --features loom --test loom_tests --release`
//!
//! The real `RingBuffer` always uses `std::sync::atomic`, so it can't be
//! driven directly under loom's instrumented atomics. Instead this models
//! the same claim/commit/read/commit_read protocol (producer_position,
//! consumer_cache_position, consumer_position, one header word per slot)
//! with loom's atomics, small enough for exhaustive exploration.

#![cfg(feature = "loom")]

use loom::cell::UnsafeCell;
use loom::sync::atomic::{AtomicU64, Ordering};
use loom::sync::Arc;
use loom::thread;

const CAPACITY: u64 = 4;

struct LoomRing {
    producer_position: AtomicU64,
    consumer_cache_position: AtomicU64,
    consumer_position: AtomicU64,
    headers: [AtomicU64; CAPACITY as usize],
    slots: [UnsafeCell<u64>; CAPACITY as usize],
}

unsafe impl Send for LoomRing {}
unsafe impl Sync for LoomRing {}

impl LoomRing {
    fn new() -> Self {
        Self {
            producer_position: AtomicU64::new(0),
            consumer_cache_position: AtomicU64::new(0),
            consumer_position: AtomicU64::new(0),
            headers: [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)],
            slots: [UnsafeCell::new(0), UnsafeCell::new(0), UnsafeCell::new(0), UnsafeCell::new(0)],
        }
    }

    fn try_claim(&self, value: u64) -> bool {
        let producer_position = self.producer_position.load(Ordering::Relaxed);
        let mut consumer_position = self.consumer_cache_position.load(Ordering::Relaxed);

        if CAPACITY - (producer_position - consumer_position) == 0 {
            let fresh = self.consumer_position.load(Ordering::Acquire);
            if CAPACITY - (producer_position - fresh) == 0 {
                return false;
            }
            self.consumer_cache_position.store(fresh, Ordering::Relaxed);
            consumer_position = fresh;
        }
        let _ = consumer_position;

        let index = (producer_position % CAPACITY) as usize;
        self.slots[index].with_mut(|slot| unsafe { *slot = value });
        self.producer_position.store(producer_position + 1, Ordering::Release);
        self.headers[index].store(value + 1, Ordering::Release); // +1: 0 means "empty"
        true
    }

    fn try_read(&self) -> Option<u64> {
        let consumer_position = self.consumer_position.load(Ordering::Relaxed);
        let producer_position = self.producer_position.load(Ordering::Acquire);
        if consumer_position >= producer_position {
            return None;
        }

        let index = (consumer_position % CAPACITY) as usize;
        let header = self.headers[index].load(Ordering::Acquire);
        if header == 0 {
            return None;
        }

        let value = self.slots[index].with(|slot| unsafe { *slot });
        self.headers[index].store(0, Ordering::Relaxed);
        self.consumer_position.store(consumer_position + 1, Ordering::Release);
        Some(header - 1)
    }
}

#[test]
fn loom_claim_then_read_round_trip() {
    loom::model(|| {
        let ring = Arc::new(LoomRing::new());
        let producer_ring = Arc::clone(&ring);

        let producer = thread::spawn(move || {
            producer_ring.try_claim(7);
        });

        let consumer = thread::spawn(move || {
            for _ in 0..10 {
                if let Some(value) = ring.try_read() {
                    return Some(value);
                }
                loom::thread::yield_now();
            }
            None
        });

        producer.join().unwrap();
        let received = consumer.join().unwrap();
        if let Some(value) = received {
            assert_eq!(value, 7);
        }
    });
}

#[test]
fn loom_full_ring_recovers_after_one_read() {
    loom::model(|| {
        let ring = Arc::new(LoomRing::new());
        for i in 0..CAPACITY {
            assert!(ring.try_claim(i));
        }
        assert!(!ring.try_claim(CAPACITY), "ring should report full");

        let consumer_ring = Arc::clone(&ring);
        let consumer = thread::spawn(move || consumer_ring.try_read());

        let value = consumer.join().unwrap();
        assert_eq!(value, Some(0));

        assert!(ring.try_claim(CAPACITY), "a slot should have been freed");
    });
}

#[test]
fn loom_concurrent_claim_and_read_never_reorders() {
    loom::model(|| {
        let ring = Arc::new(LoomRing::new());
        let producer_ring = Arc::clone(&ring);

        let producer = thread::spawn(move || {
            producer_ring.try_claim(1);
            producer_ring.try_claim(2);
        });

        let consumer = thread::spawn(move || {
            let mut received = Vec::new();
            for _ in 0..8 {
                if let Some(value) = ring.try_read() {
                    received.push(value);
                }
                loom::thread::yield_now();
            }
            received
        });

        producer.join().unwrap();
        let received = consumer.join().unwrap();
        for window in received.windows(2) {
            assert!(window[0] < window[1], "reads must preserve commit order");
        }
    });
}
