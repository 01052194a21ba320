//! Lightweight, always-on counters for monitoring ring activity.
//!
//! Unlike the core claim/commit/read path, these use plain atomics with
//! `Relaxed` ordering: they're diagnostic only, never load-bearing for
//! correctness, so there's nothing to synchronize-with. The producer-touched
//! and consumer-touched counters are split into their own `CachePadded`
//! groups so the two threads sharing a `Metrics` never contend the same
//! cache line while updating them, the same concern that puts `tail`/`head`
//! on separate cache lines in a ring buffer's control block.

use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
struct ProducerCounters {
    claims: AtomicU64,
    padding_records: AtomicU64,
    cache_refreshes: AtomicU64,
}

#[derive(Debug, Default)]
struct ConsumerCounters {
    reads: AtomicU64,
    batch_records: AtomicU64,
}

/// Counters shared between a [`crate::Producer`] and [`crate::Consumer`]
/// split from the same ring.
#[derive(Debug, Default)]
pub struct Metrics {
    producer: CachePadded<ProducerCounters>,
    consumer: CachePadded<ConsumerCounters>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_claim(&self) {
        self.producer.claims.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_padding(&self) {
        self.producer.padding_records.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_cache_refresh(&self) {
        self.producer.cache_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_read(&self) {
        self.consumer.reads.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_batch_read(&self, count: u64) {
        self.consumer.reads.fetch_add(count, Ordering::Relaxed);
        self.consumer.batch_records.fetch_add(count, Ordering::Relaxed);
    }

    /// Takes a consistent point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            claims: self.producer.claims.load(Ordering::Relaxed),
            padding_records: self.producer.padding_records.load(Ordering::Relaxed),
            cache_refreshes: self.producer.cache_refreshes.load(Ordering::Relaxed),
            reads: self.consumer.reads.load(Ordering::Relaxed),
            batch_records: self.consumer.batch_records.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of a ring's [`Metrics`] counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub claims: u64,
    pub padding_records: u64,
    pub cache_refreshes: u64,
    pub reads: u64,
    pub batch_records: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let metrics = Metrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn records_accumulate() {
        let metrics = Metrics::new();
        metrics.record_claim();
        metrics.record_claim();
        metrics.record_padding();
        metrics.record_batch_read(3);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.claims, 2);
        assert_eq!(snapshot.padding_records, 1);
        assert_eq!(snapshot.reads, 3);
        assert_eq!(snapshot.batch_records, 3);
    }
}
