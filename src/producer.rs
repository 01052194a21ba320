use crate::claim::Claim;
use crate::control::Raw;
use crate::layout::Layout;
use crate::metrics::Metrics;
use std::marker::PhantomData;
use std::sync::Arc;

/// The producer half of a split [`crate::RingBuffer`].
///
/// Holds no `Clone` impl: only one `Producer` can exist per ring, which is
/// what lets the claim/commit path run without any atomic read-modify-write
/// on the hot path -- `producer_position` only ever has one writer.
///
/// The `'a` lifetime ties a producer split from [`crate::RingBuffer::init_in`]
/// to the caller-supplied buffer it borrows; it is `'static` for rings
/// backed by owned or raw-pointer storage.
pub struct Producer<'a> {
    pub(crate) raw: Arc<Raw>,
    pub(crate) layout: Layout,
    pub(crate) metrics: Arc<Metrics>,
    pub(crate) _marker: PhantomData<&'a mut [u8]>,
}

// SAFETY: Producer is the sole writer of producer_position and
// consumer_cache_position, and the sole writer of claimed-but-uncommitted
// payload bytes; Raw's internal synchronization (see control.rs) makes
// sharing those reads/writes across threads sound as long as there is only
// ever one Producer.
unsafe impl<'a> Send for Producer<'a> {}

impl<'a> Producer<'a> {
    /// Attempts to reserve exactly one record. Returns `None` if the ring
    /// is full (no transient retry contract beyond what the caller builds
    /// on top -- see [`Producer::try_claim_with_backoff`]).
    #[inline]
    pub fn try_claim(&self) -> Option<Claim<'_>> {
        self.try_claim_impl(0)
    }

    /// Like [`Producer::try_claim`], but when the consumer-position cache
    /// must be refreshed, verifies enough room for `1 + max_lookahead`
    /// records instead of just one. If that succeeds, this claim (and up to
    /// `max_lookahead` more) can be served from the refreshed cache without
    /// another acquire load of the shared consumer position.
    ///
    /// `max_lookahead` is advisory: the ring may satisfy fewer lookahead
    /// claims than requested if the consumer catches up and reclaims space
    /// in the meantime -- the next claim simply refreshes the cache again.
    #[inline]
    pub fn try_lookahead_claim(&self, max_lookahead: usize) -> Option<Claim<'_>> {
        self.try_claim_impl(max_lookahead)
    }

    /// Spins with [`crate::Backoff`] until a claim succeeds. Convenience
    /// only -- the core claim path above is wait-free and never spins
    /// itself; this exists for callers who don't want to write their own
    /// spin-wait strategy.
    pub fn try_claim_with_backoff(&self) -> Option<Claim<'_>> {
        let mut backoff = crate::Backoff::new();
        loop {
            // Borrow-checker note: try_claim's returned Claim borrows self,
            // so we re-check fullness through a fresh call each iteration
            // rather than holding a stale Option across the loop.
            if self.capacity_available() {
                return self.try_claim();
            }
            if backoff.is_completed() {
                return None;
            }
            backoff.snooze();
        }
    }

    fn capacity_available(&self) -> bool {
        let producer_position = self.raw.producer_position_relaxed(&self.layout);
        let consumer_cache = self.raw.consumer_cache_position_relaxed(&self.layout);
        let size = producer_position.wrapping_sub(consumer_cache) as usize;
        self.layout.record_stride <= self.layout.data_region_bytes.saturating_sub(size)
    }

    fn try_claim_impl(&self, max_lookahead: usize) -> Option<Claim<'_>> {
        let layout = &self.layout;
        let stride = layout.record_stride;
        let mask = layout.mask;
        let capacity = layout.data_region_bytes;

        let producer_position = self.raw.producer_position_relaxed(layout);
        let mut consumer_position = self.raw.consumer_cache_position_relaxed(layout);

        let size = producer_position.wrapping_sub(consumer_position) as usize;
        let available = capacity.saturating_sub(size);

        if stride > available {
            // Slow path: refresh the cache, pretending max_lookahead more
            // claims have already happened so the cache stays valid for
            // the next several claims without another acquire load.
            let fresh = self.raw.consumer_position_acquire(layout);
            let fresh_size = producer_position.wrapping_sub(fresh) as usize;
            let fresh_available = capacity.saturating_sub(fresh_size);
            let required = stride.saturating_mul(1 + max_lookahead);
            if required > fresh_available {
                #[cfg(feature = "tracing")]
                tracing::trace!(required, fresh_available, "try_claim: ring full");
                return None;
            }
            self.raw.store_consumer_cache_position_relaxed(layout, fresh);
            self.metrics.record_cache_refresh();
            consumer_position = fresh;
        }

        let producer_index = (producer_position & mask as u64) as usize;
        let until_end = capacity - producer_index;

        let mut padding = 0usize;
        if stride > until_end {
            let mut consumer_index = (consumer_position & mask as u64) as usize;
            if stride > consumer_index {
                let fresh = self.raw.consumer_position_acquire(layout);
                consumer_index = (fresh & mask as u64) as usize;
                if stride > consumer_index {
                    #[cfg(feature = "tracing")]
                    tracing::trace!("try_claim: consumer too slow to wrap");
                    return None;
                }
                self.raw.store_consumer_cache_position_relaxed(layout, fresh);
                self.metrics.record_cache_refresh();
            }
            padding = until_end;
        }

        let new_producer_position = producer_position + stride as u64 + padding as u64;
        self.raw.store_producer_position_release(layout, new_producer_position);

        let header_index = if padding != 0 {
            // SAFETY: [producer_index, producer_index + padding) is owned
            // by the producer: producer_position has already moved past it
            // and the consumer cannot have reached it (checked above).
            unsafe { self.raw.store_header(producer_index, crate::layout::PADDING_TYPE_ID, padding as u32) };
            self.metrics.record_padding();
            ((producer_position + padding as u64) & mask as u64) as usize
        } else {
            producer_index
        };

        let payload_offset = header_index + crate::layout::RECORD_HEADER_BYTES;
        let payload_len = stride - crate::layout::RECORD_HEADER_BYTES;
        // SAFETY: this byte range was just reserved above and is not
        // reachable by the consumer until commit() releases the header.
        let payload = unsafe { self.raw.payload_mut(payload_offset, payload_len) };

        self.metrics.record_claim();
        Some(Claim { raw: Arc::as_ptr(&self.raw), header_index, payload })
    }
}
