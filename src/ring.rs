use crate::consumer::Consumer;
use crate::control::Raw;
use crate::error::InitError;
use crate::layout::Layout;
use crate::metrics::Metrics;
use crate::producer::Producer;
use std::marker::PhantomData;
use std::sync::Arc;

/// A single-producer single-consumer lock-free ring buffer of fixed-size
/// records, backed by a contiguous byte region.
///
/// Construct with [`RingBuffer::new`] (heap-allocated), [`RingBuffer::init_in`]
/// (a caller-supplied `&mut [u8]`, borrow-checked), or the `unsafe`
/// [`RingBuffer::from_raw_parts`] (a caller-supplied raw pointer, e.g. shared
/// memory or a memory-mapped file outside Rust's borrow tracking), then call
/// [`RingBuffer::split`] to obtain the [`Producer`]/[`Consumer`] pair. There
/// is no way to use the ring without splitting it first: claim/commit and
/// read/commit_read are only ever valid from exactly one producer and one
/// consumer.
///
/// The `'a` lifetime is `'static` for `new`/`from_raw_parts` (the ring owns
/// its bytes, or the caller's `unsafe` contract vouches for them outliving
/// the ring); `init_in` ties it to the borrowed slice instead, so the
/// `RingBuffer` -- and the `Producer`/`Consumer` split from it -- cannot
/// outlive the buffer they were built over.
pub struct RingBuffer<'a> {
    raw: Arc<Raw>,
    layout: Layout,
    metrics: Arc<Metrics>,
    _marker: PhantomData<&'a mut [u8]>,
}

impl RingBuffer<'static> {
    /// Allocates a new ring with room for at least `capacity_records`
    /// records, each carrying up to `payload_bytes` of payload.
    pub fn new(capacity_records: usize, payload_bytes: usize) -> Result<Self, InitError> {
        let layout = Layout::calculate_for_records(capacity_records, payload_bytes)?;
        let bytes = vec![0u8; layout.total_bytes].into_boxed_slice();
        let raw = Raw::owned(bytes);
        Ok(Self { raw: Arc::new(raw), layout, metrics: Arc::new(Metrics::new()), _marker: PhantomData })
    }

    /// Wraps a caller-supplied buffer (e.g. shared memory, a memory-mapped
    /// file) as a ring buffer, without taking ownership of it.
    ///
    /// `total_bytes` must equal the `total_bytes` of the `Layout` computed
    /// from `capacity_records`/`payload_bytes`, and the control-word trailer
    /// must already be zero-initialized (a freshly-allocated or
    /// freshly-mapped region zeroed by the OS satisfies this).
    ///
    /// Prefer [`RingBuffer::init_in`] when the buffer is an ordinary Rust
    /// slice: it gives the same layout checks with the lifetime tracked by
    /// the borrow checker instead of by caller discipline. Reach for this
    /// constructor only when the memory comes from outside Rust's ownership
    /// model (shared memory, a `mmap`).
    ///
    /// # Safety
    /// `ptr` must be valid for reads and writes for `total_bytes` bytes, and
    /// for as long as the returned `RingBuffer` (and any `Producer`/
    /// `Consumer` split from it) is alive. The caller must ensure no other
    /// code accesses these bytes concurrently outside of this ring's
    /// claim/commit/read/commit_read protocol.
    pub unsafe fn from_raw_parts(
        ptr: *mut u8,
        total_bytes: usize,
        capacity_records: usize,
        payload_bytes: usize,
    ) -> Result<Self, InitError> {
        let layout = Layout::calculate_for_records(capacity_records, payload_bytes)?;
        if total_bytes != layout.total_bytes {
            return Err(InitError::SizeMismatch { expected: layout.total_bytes, actual: total_bytes });
        }
        let raw = Raw::from_raw_parts(ptr, total_bytes);
        if !raw.is_8_byte_aligned() {
            return Err(InitError::Misaligned);
        }
        Ok(Self { raw: Arc::new(raw), layout, metrics: Arc::new(Metrics::new()), _marker: PhantomData })
    }
}

impl<'a> RingBuffer<'a> {
    /// Initializes a ring directly over a caller-supplied, safely borrowed
    /// buffer: no `unsafe`, and the returned `RingBuffer<'a>` (and the
    /// `Producer<'a>`/`Consumer<'a>` split from it) cannot outlive `buffer`.
    ///
    /// `buffer.len()` must equal the `total_bytes` of the `Layout` computed
    /// from `capacity_records`/`payload_bytes`, and `buffer` must already be
    /// zero-initialized (freshly allocated with `vec![0u8; n]` satisfies
    /// this).
    pub fn init_in(buffer: &'a mut [u8], capacity_records: usize, payload_bytes: usize) -> Result<Self, InitError> {
        let layout = Layout::calculate_for_records(capacity_records, payload_bytes)?;
        if buffer.len() != layout.total_bytes {
            return Err(InitError::SizeMismatch { expected: layout.total_bytes, actual: buffer.len() });
        }
        // SAFETY: ptr/len are derived from `buffer`, which is valid for
        // reads and writes for its whole length; `PhantomData<&'a mut
        // [u8]>` ties this `RingBuffer`'s lifetime (and everything split
        // from it) back to that borrow, so `buffer` cannot be touched again
        // while the ring is alive.
        let raw = unsafe { Raw::from_raw_parts(buffer.as_mut_ptr(), buffer.len()) };
        if !raw.is_8_byte_aligned() {
            return Err(InitError::Misaligned);
        }
        Ok(Self { raw: Arc::new(raw), layout, metrics: Arc::new(Metrics::new()), _marker: PhantomData })
    }

    /// The geometry this ring was constructed with.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Splits the ring into its producer and consumer halves. Each may be
    /// moved to its own thread; there is no way to get them back together.
    pub fn split(self) -> (Producer<'a>, Consumer<'a>) {
        let producer = Producer {
            raw: Arc::clone(&self.raw),
            layout: self.layout,
            metrics: Arc::clone(&self.metrics),
            _marker: PhantomData,
        };
        let consumer = Consumer { raw: self.raw, layout: self.layout, metrics: self.metrics, _marker: PhantomData };
        (producer, consumer)
    }
}
