use thiserror::Error;

/// Errors reported when computing a [`crate::Layout`] or initializing a
/// [`crate::RingBuffer`] over a caller-supplied buffer.
///
/// These are the only fallible entry points in the crate: once a ring is
/// initialized, `try_claim`/`try_read` report transient contention with
/// `None`, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InitError {
    /// The data region computed from the requested capacity is not a power
    /// of two. `Layout::calculate` rounds up automatically, so this only
    /// fires when a caller hand-built a `Layout` or buffer size that skipped
    /// that rounding.
    #[error("data region of {0} bytes is not a power of two")]
    NotPowerOfTwo(usize),

    /// The supplied buffer's base address is not 8-byte aligned, so the
    /// control words and record headers inside it cannot be accessed as
    /// naturally-aligned atomics.
    #[error("buffer base pointer is not 8-byte aligned")]
    Misaligned,

    /// The configured record payload does not fit under `max_msg_length`
    /// for the computed data region.
    #[error("payload of {payload} bytes exceeds max_msg_length of {max} bytes")]
    PayloadTooLarge { payload: usize, max: usize },

    /// The caller-supplied buffer's length does not match the `total_bytes`
    /// the layout computed for the requested capacity and payload size.
    #[error("buffer is {actual} bytes, expected exactly {expected} bytes")]
    SizeMismatch { expected: usize, actual: usize },
}
