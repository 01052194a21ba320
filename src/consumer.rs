use crate::control::Raw;
use crate::header::is_padding;
use crate::layout::Layout;
use crate::metrics::Metrics;
use std::marker::PhantomData;
use std::sync::Arc;

/// The consumer half of a split [`crate::RingBuffer`].
///
/// Holds no `Clone` impl, mirroring [`crate::Producer`]: only one `Consumer`
/// may exist per ring. The `'a` lifetime mirrors [`crate::Producer`]'s: tied
/// to a borrowed buffer for rings from `init_in`, `'static` otherwise.
pub struct Consumer<'a> {
    pub(crate) raw: Arc<Raw>,
    pub(crate) layout: Layout,
    pub(crate) metrics: Arc<Metrics>,
    pub(crate) _marker: PhantomData<&'a mut [u8]>,
}

// SAFETY: see Producer's impl -- sound as long as there is only one Consumer.
unsafe impl<'a> Send for Consumer<'a> {}

/// A single record read out by [`Consumer::try_read`], not yet released
/// back to the producer.
///
/// Dropping a `ReadGuard` without calling [`ReadGuard::commit_read`] leaves
/// the slot unreclaimed: the producer will not see the space freed until
/// `commit_read` is eventually called. There is no implicit `Drop`-time
/// commit, to keep the cost of reading fully under the caller's control.
pub struct ReadGuard<'a> {
    raw: *const Raw,
    layout: Layout,
    header_index: usize,
    new_consumer_position: u64,
    type_id: u32,
    payload: &'a [u8],
}

impl<'a> ReadGuard<'a> {
    #[inline]
    pub fn type_id(&self) -> u32 {
        self.type_id
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        self.payload
    }

    /// Zeroes the consumed bytes and releases the new `consumer_position`,
    /// making the slot available for the producer to reclaim.
    pub fn commit_read(self) {
        // SAFETY: this guard is the sole owner of [header_index, header_index
        // + record_stride) until this call; nothing else reads or writes
        // those bytes between try_read and commit_read.
        unsafe {
            let zero_len = self.layout.record_stride;
            (*self.raw).zero(self.header_index, zero_len);
            (*self.raw).store_consumer_position_release(&self.layout, self.new_consumer_position);
        }
    }
}

impl<'a> Consumer<'a> {
    /// Attempts to read the next record without releasing it. Returns
    /// `None` if no record has been published yet. Padding records are
    /// consumed transparently: this never returns one to the caller.
    pub fn try_read(&self) -> Option<ReadGuard<'_>> {
        let layout = &self.layout;
        let mut position = self.raw.consumer_position_relaxed(layout);

        loop {
            let (type_id, index, consumed, record_len) = self.walk_one(position)?;
            if is_padding(type_id) {
                // SAFETY: a padding record's byte range is owned by the
                // consumer the same way a real record's is.
                unsafe {
                    self.raw.zero(index, consumed);
                    self.raw.store_consumer_position_release(layout, position + consumed as u64);
                }
                position += consumed as u64;
                continue;
            }
            self.metrics.record_read();
            return Some(ReadGuard {
                raw: Arc::as_ptr(&self.raw),
                layout: *layout,
                header_index: index,
                new_consumer_position: position + consumed as u64,
                type_id,
                payload: unsafe { self.raw.payload(index + crate::layout::RECORD_HEADER_BYTES, record_len) },
            });
        }
    }

    /// Reads up to `max_count` records, invoking `callback(type_id, payload)`
    /// for each, then performs a single zero + release-store of the new
    /// `consumer_position` covering everything consumed. Stops early if
    /// `callback` returns `false`, the ring runs out of published records,
    /// or the walk reaches the end of the data region -- a single call
    /// never crosses the wrap boundary; the next call picks up at index 0.
    ///
    /// Returns the number of records delivered to `callback` (padding
    /// records consumed along the way are skipped and not counted).
    pub fn batch_read(&self, mut callback: impl FnMut(u32, &[u8]) -> bool, max_count: u32) -> u32 {
        let layout = &self.layout;
        let start = self.raw.consumer_position_relaxed(layout);
        let remaining = layout.data_region_bytes - (start & layout.mask as u64) as usize;
        let mut position = start;
        let mut delivered = 0u32;

        while delivered < max_count && (position - start) < remaining as u64 {
            let Some((type_id, index, consumed, record_len)) = self.walk_one(position) else {
                break;
            };
            position += consumed as u64;
            if is_padding(type_id) {
                continue;
            }
            // SAFETY: [index, index + record_stride) was published by the
            // producer and not yet advanced past by consumer_position.
            let payload = unsafe { self.raw.payload(index + crate::layout::RECORD_HEADER_BYTES, record_len) };
            delivered += 1;
            if !callback(type_id, payload) {
                break;
            }
        }

        if position != start {
            let consumed_len = (position - start) as usize;
            debug_assert!(consumed_len <= remaining, "batch_read must not cross the wrap boundary");
            // SAFETY: [start_index, start_index + consumed_len) is exactly
            // the byte range this loop walked, entirely owned by the
            // consumer until the release store below; it never crosses the
            // data region boundary because the loop above stops at it.
            unsafe {
                let start_index = (start & layout.mask as u64) as usize;
                self.raw.zero(start_index, consumed_len);
            }
            self.raw.store_consumer_position_release(layout, position);
        }
        self.metrics.record_batch_read(delivered as u64);
        delivered
    }

    /// Like [`Consumer::batch_read`], but releases `consumer_position` after
    /// every individual record instead of once at the end. Costs one extra
    /// release store per record; use this when downstream processing of one
    /// record may take long enough that the producer should see space
    /// reclaimed incrementally rather than only at the end of the batch.
    /// Like `batch_read`, a single call never crosses the wrap boundary.
    pub fn stream_batch_read(&self, mut callback: impl FnMut(u32, &[u8]) -> bool, max_count: u32) -> u32 {
        let layout = &self.layout;
        let start = self.raw.consumer_position_relaxed(layout);
        let remaining = layout.data_region_bytes - (start & layout.mask as u64) as usize;
        let mut delivered = 0u32;

        while delivered < max_count {
            let position = self.raw.consumer_position_relaxed(layout);
            if (position - start) >= remaining as u64 {
                break;
            }
            let Some((type_id, index, consumed, record_len)) = self.walk_one(position) else {
                break;
            };
            let new_position = position + consumed as u64;

            if !is_padding(type_id) {
                // SAFETY: published by the producer, owned by the consumer
                // until the release store below.
                let payload = unsafe { self.raw.payload(index + crate::layout::RECORD_HEADER_BYTES, record_len) };
                delivered += 1;
                let keep_going = callback(type_id, payload);
                unsafe { self.raw.zero(index, consumed) };
                self.raw.store_consumer_position_release(layout, new_position);
                if !keep_going {
                    break;
                }
            } else {
                unsafe { self.raw.zero(index, consumed) };
                self.raw.store_consumer_position_release(layout, new_position);
            }
        }
        self.metrics.record_batch_read(delivered as u64);
        delivered
    }

    /// Diagnostic observer: the approximate number of bytes currently
    /// occupied by unread records. Uses the double-read stability protocol
    /// (consumer, then producer, then consumer again) since the two
    /// positions are never read atomically together.
    pub fn size(&self) -> u64 {
        let layout = &self.layout;
        loop {
            let before = self.raw.consumer_position_acquire(layout);
            let producer_position = self.raw.producer_position_acquire(layout);
            let after = self.raw.consumer_position_acquire(layout);
            if before == after {
                return producer_position.wrapping_sub(after);
            }
        }
    }

    /// Reads the header at `position` and returns
    /// `(type_id, header_index, bytes_to_advance, payload_len)`. The record
    /// found may itself be padding -- callers decide whether to skip it.
    fn walk_one(&self, position: u64) -> Option<(u32, usize, usize, usize)> {
        let layout = &self.layout;
        let producer_position = self.raw.producer_position_acquire(layout);
        if position >= producer_position {
            return None;
        }

        let index = (position & layout.mask as u64) as usize;
        // SAFETY: index + 8 <= data_region_bytes holds because index is a
        // position modulo a power-of-two-sized data region.
        let (type_id, length) = unsafe { self.raw.load_header(index) };
        if length == 0 {
            // Not yet published, even though producer_position has moved
            // past it logically -- can happen transiently mid-commit.
            return None;
        }

        if is_padding(type_id) {
            return Some((type_id, index, length as usize, 0));
        }

        let payload_len = (length as usize).saturating_sub(crate::layout::RECORD_HEADER_BYTES);
        Some((type_id, index, layout.record_stride, payload_len))
    }
}
