//! Raw access to the backing byte region: the three trailer control words
//! and the per-record header words, all accessed as naturally-aligned
//! atomics at computed byte offsets.
//!
//! This is the only module that turns a byte offset into a pointer cast.
//! Everywhere else the buffer is handled as `&[u8]`/`&mut [u8]`.

use crate::header::{decode_header, make_header};
use crate::layout::Layout;
use std::sync::atomic::{AtomicU64, Ordering};

/// Owns (or borrows, via raw pointer) the bytes backing a ring buffer.
///
/// `Raw` is the single point of `unsafe` pointer arithmetic in the crate.
/// Every method documents which side of the SPSC protocol (producer or
/// consumer) is allowed to call it and why the resulting aliasing is sound.
pub(crate) struct Raw {
    ptr: *mut u8,
    len: usize,
    // Keeps the allocation alive for the owned constructor; `None` when the
    // buffer was supplied externally (`from_raw_parts`) and outlives us by
    // contract instead.
    _owned: Option<Box<[u8]>>,
}

// SAFETY: access to the pointed-to bytes is synchronized by the SPSC
// claim/commit/read/commit_read protocol implemented in `producer` and
// `consumer`; `Raw` itself just exposes the primitive operations.
unsafe impl Send for Raw {}
unsafe impl Sync for Raw {}

impl Raw {
    pub(crate) fn owned(mut bytes: Box<[u8]>) -> Self {
        let ptr = bytes.as_mut_ptr();
        let len = bytes.len();
        Self { ptr, len, _owned: Some(bytes) }
    }

    /// # Safety
    /// `ptr` must be valid for reads and writes for `len` bytes for as long
    /// as the returned `Raw` (and any handle derived from it) is alive.
    pub(crate) unsafe fn from_raw_parts(ptr: *mut u8, len: usize) -> Self {
        Self { ptr, len, _owned: None }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_8_byte_aligned(&self) -> bool {
        (self.ptr as usize) % 8 == 0
    }

    #[inline]
    unsafe fn atomic_u64(&self, offset: usize) -> &AtomicU64 {
        debug_assert_eq!(offset % 8, 0, "atomic word offset must be 8-byte aligned");
        debug_assert!(offset + 8 <= self.len, "atomic word out of bounds");
        AtomicU64::from_ptr(self.ptr.add(offset).cast::<u64>())
    }

    // --- producer_position -------------------------------------------------

    #[inline]
    pub(crate) fn producer_position_relaxed(&self, layout: &Layout) -> u64 {
        unsafe { self.atomic_u64(layout.producer_position_offset).load(Ordering::Relaxed) }
    }

    #[inline]
    pub(crate) fn producer_position_acquire(&self, layout: &Layout) -> u64 {
        unsafe { self.atomic_u64(layout.producer_position_offset).load(Ordering::Acquire) }
    }

    #[inline]
    pub(crate) fn store_producer_position_release(&self, layout: &Layout, value: u64) {
        unsafe { self.atomic_u64(layout.producer_position_offset).store(value, Ordering::Release) }
    }

    // --- consumer_cache_position (producer-owned, single-writer) ----------

    #[inline]
    pub(crate) fn consumer_cache_position_relaxed(&self, layout: &Layout) -> u64 {
        unsafe { self.atomic_u64(layout.consumer_cache_position_offset).load(Ordering::Relaxed) }
    }

    #[inline]
    pub(crate) fn store_consumer_cache_position_relaxed(&self, layout: &Layout, value: u64) {
        unsafe { self.atomic_u64(layout.consumer_cache_position_offset).store(value, Ordering::Relaxed) }
    }

    // --- consumer_position --------------------------------------------------

    #[inline]
    pub(crate) fn consumer_position_relaxed(&self, layout: &Layout) -> u64 {
        unsafe { self.atomic_u64(layout.consumer_position_offset).load(Ordering::Relaxed) }
    }

    #[inline]
    pub(crate) fn consumer_position_acquire(&self, layout: &Layout) -> u64 {
        unsafe { self.atomic_u64(layout.consumer_position_offset).load(Ordering::Acquire) }
    }

    #[inline]
    pub(crate) fn store_consumer_position_release(&self, layout: &Layout, value: u64) {
        unsafe { self.atomic_u64(layout.consumer_position_offset).store(value, Ordering::Release) }
    }

    // --- per-record header word ---------------------------------------------

    /// Acquire-load the header word at `index` and decode it.
    ///
    /// # Safety
    /// Caller (the consumer) must ensure `index + 8 <= data_region_bytes`.
    #[inline]
    pub(crate) unsafe fn load_header(&self, index: usize) -> (u32, u32) {
        decode_header(self.atomic_u64(index).load(Ordering::Acquire))
    }

    /// Release-store an encoded header word at `index`, publishing the
    /// record (or padding record) to the consumer.
    ///
    /// # Safety
    /// Caller (the producer) must own the bytes at `index` -- they must lie
    /// in the region it has claimed but not yet committed.
    #[inline]
    pub(crate) unsafe fn store_header(&self, index: usize, type_id: u32, length: u32) {
        self.atomic_u64(index).store(make_header(type_id, length), Ordering::Release);
    }

    // --- payload bytes -------------------------------------------------------

    /// # Safety
    /// Caller must own (per the SPSC disjoint-ownership protocol) the byte
    /// range `[offset, offset + len)` for the duration of the borrow.
    #[inline]
    pub(crate) unsafe fn payload_mut(&self, offset: usize, len: usize) -> &mut [u8] {
        debug_assert!(offset + len <= self.len);
        std::slice::from_raw_parts_mut(self.ptr.add(offset), len)
    }

    /// # Safety
    /// Caller must own (per the SPSC disjoint-ownership protocol) the byte
    /// range `[offset, offset + len)` for the duration of the borrow.
    #[inline]
    pub(crate) unsafe fn payload(&self, offset: usize, len: usize) -> &[u8] {
        debug_assert!(offset + len <= self.len);
        std::slice::from_raw_parts(self.ptr.add(offset), len)
    }

    /// Zeroes `len` bytes starting at `offset`, re-arming the empty signal
    /// for slots the consumer has just finished consuming.
    ///
    /// # Safety
    /// Caller (the consumer) must own the byte range being zeroed.
    #[inline]
    pub(crate) unsafe fn zero(&self, offset: usize, len: usize) {
        std::ptr::write_bytes(self.ptr.add(offset), 0, len);
    }
}
