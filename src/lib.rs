//! ringspsc-rs - a lock-free single-producer single-consumer ring buffer
//! of fixed-size records.
//!
//! Producer and consumer never take a lock and never block each other:
//! claim/commit on the producer side and read/commit_read on the consumer
//! side only ever touch three cache-line-isolated control words plus the
//! record slot they're currently working on.
//!
//! # Key features
//!
//! - Zero-copy claim/commit producer API: write directly into the slot,
//!   commit publishes it with a release store.
//! - Three consumer read paths: single record, bounded batch, and
//!   streaming batch (per-record position release instead of one at the
//!   end of the batch).
//! - A lookahead batch claim that amortizes the consumer-position acquire
//!   load across several claims.
//! - Cache-line isolation between producer and consumer metadata to avoid
//!   false sharing.
//!
//! # Example
//!
//! ```
//! use ringspsc_rs::RingBuffer;
//!
//! let ring = RingBuffer::new(16, 64).expect("valid capacity");
//! let (producer, consumer) = ring.split();
//!
//! let mut claim = producer.try_claim().expect("ring has room");
//! claim.payload_mut()[..5].copy_from_slice(b"hello");
//! claim.commit(1, 5);
//!
//! let guard = consumer.try_read().expect("a record was committed");
//! assert_eq!(guard.payload(), b"hello");
//! guard.commit_read();
//! ```

mod backoff;
mod claim;
mod consumer;
mod control;
mod error;
mod header;
mod layout;
mod metrics;
mod producer;
mod ring;

pub use backoff::Backoff;
pub use claim::Claim;
pub use consumer::{Consumer, ReadGuard};
pub use error::InitError;
pub use layout::Layout;
pub use metrics::{Metrics, MetricsSnapshot};
pub use producer::Producer;
pub use ring::RingBuffer;
