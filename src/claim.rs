use crate::control::Raw;
use crate::header::is_valid_type_id;
use crate::layout::RECORD_HEADER_BYTES;

/// A zero-copy view over one claimed-but-not-yet-committed record.
///
/// Obtained from [`crate::Producer::try_claim`] or
/// [`crate::Producer::try_lookahead_claim`]. Write the payload into
/// [`Claim::payload_mut`], then call [`Claim::commit`] to publish it.
///
/// There is no rollback: per the core's contract, a claim that is dropped
/// without being committed leaves its slot permanently claimed (the
/// producer has already advanced `producer_position` past it). Always
/// commit what you claim, even with a placeholder `type_id` if the
/// original content turns out not to be needed.
pub struct Claim<'a> {
    pub(crate) raw: *const Raw,
    pub(crate) header_index: usize,
    pub(crate) payload: &'a mut [u8],
}

impl<'a> Claim<'a> {
    /// The mutable payload bytes of this slot. Its length is the record's
    /// configured maximum payload size; `commit` may publish fewer bytes
    /// than that.
    #[inline]
    pub fn payload_mut(&mut self) -> &mut [u8] {
        self.payload
    }

    /// Maximum number of payload bytes this claim can commit.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.payload.len()
    }

    /// Publishes the record with the given `type_id` and `payload_len`
    /// (which must be `<= capacity()`). Returns `false` without publishing
    /// if `type_id` is `0` or the reserved padding id, or if `payload_len`
    /// overruns the claimed capacity -- a programming error, not transient
    /// contention.
    pub fn commit(self, type_id: u32, payload_len: usize) -> bool {
        if !is_valid_type_id(type_id) || payload_len > self.payload.len() {
            #[cfg(feature = "tracing")]
            tracing::warn!(type_id, payload_len, "commit rejected: invalid type id or oversized payload");
            return false;
        }

        let length = (RECORD_HEADER_BYTES + payload_len) as u32;
        // SAFETY: header_index was computed by try_claim/try_lookahead_claim
        // as the slot this Claim exclusively owns; raw outlives the Claim
        // because it points into the Producer's ring, which this borrow's
        // lifetime is tied to.
        unsafe { (*self.raw).store_header(self.header_index, type_id, length) };
        true
    }
}
