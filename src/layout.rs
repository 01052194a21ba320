use crate::error::InitError;

/// Byte isolation unit for control words; two cache lines separate each
/// word from its neighbours (see the trailer offsets below).
pub const CACHE_LINE_BYTES: usize = 64;

/// Size of a record header word: low 32 bits length, high 32 bits type id.
pub const RECORD_HEADER_BYTES: usize = 8;

/// Default alignment every record (and the padding record) is rounded up
/// to. Exposed as a parameter on [`Layout::calculate`] rather than
/// hardcoded so callers targeting a wider header can override it.
pub const DEFAULT_RECORD_ALIGNMENT: usize = 8;

/// Reserved type id for a synthetic end-of-buffer padding record. Chosen
/// out of range of any caller-assigned `type_id` (which must be `> 0`).
pub const PADDING_TYPE_ID: u32 = u32::MAX;

/// Total bytes of trailer appended after the data region: three
/// cache-line-isolated control words, each given two cache lines of room
/// (one for the word itself, one left empty) so that no two words and no
/// word and the data region ever share a line.
const TRAILER_CACHE_LINES: usize = 8;

#[inline]
const fn align_up(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) & !(alignment - 1)
}

/// Immutable geometry of a ring buffer instance: byte sizes, the index
/// mask, and the trailer offsets of the three control words.
///
/// Constructed once by [`Layout::calculate`] and never mutated afterwards;
/// every producer/consumer operation only ever reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Size of the data region in bytes. Always a power of two.
    pub data_region_bytes: usize,
    /// Bytes per record slot (`RECORD_HEADER_BYTES + payload_bytes`, rounded
    /// up to `record_alignment`). Every claimed record occupies exactly
    /// this many bytes.
    pub record_stride: usize,
    /// Index mask for wrap-around: `data_region_bytes - 1`.
    pub mask: usize,
    /// Maximum payload bytes a single record may carry in this data region.
    pub max_msg_length: usize,
    /// Alignment every record's on-wire length is rounded up to.
    pub record_alignment: usize,
    /// Total bytes the caller must supply: data region plus an 8-cache-line
    /// trailer holding the three control words.
    pub total_bytes: usize,
    pub(crate) producer_position_offset: usize,
    pub(crate) consumer_cache_position_offset: usize,
    pub(crate) consumer_position_offset: usize,
}

impl Layout {
    /// Computes the layout for a data region of at least
    /// `requested_capacity_bytes`, rounded up to the next power of two, and
    /// a per-record payload of `payload_bytes`.
    ///
    /// Mirrors the original C `ring_buffer_capacity`/`init_ring_buffer_header`
    /// pair: the data region is rounded up, not rejected, and the trailer's
    /// three control words sit at offsets `2`, `4`, and `6` cache lines past
    /// the end of the data region.
    pub fn calculate(requested_capacity_bytes: usize, payload_bytes: usize) -> Result<Self, InitError> {
        Self::calculate_with_alignment(requested_capacity_bytes, payload_bytes, DEFAULT_RECORD_ALIGNMENT)
    }

    /// Like [`Layout::calculate`], but for a capacity expressed as a number
    /// of records rather than raw bytes. Convenience for callers (and
    /// tests) that think in "how many records should fit", not "how many
    /// bytes".
    pub fn calculate_for_records(capacity_records: usize, payload_bytes: usize) -> Result<Self, InitError> {
        let record_stride = align_up(RECORD_HEADER_BYTES + payload_bytes, DEFAULT_RECORD_ALIGNMENT);
        let requested_capacity_bytes = capacity_records.saturating_mul(record_stride);
        Self::calculate(requested_capacity_bytes, payload_bytes)
    }

    fn calculate_with_alignment(
        requested_capacity_bytes: usize,
        payload_bytes: usize,
        record_alignment: usize,
    ) -> Result<Self, InitError> {
        let data_region_bytes = requested_capacity_bytes.max(1).next_power_of_two();
        if !data_region_bytes.is_power_of_two() {
            return Err(InitError::NotPowerOfTwo(data_region_bytes));
        }

        let max_msg_length = data_region_bytes.saturating_sub(RECORD_HEADER_BYTES);
        if payload_bytes > max_msg_length {
            return Err(InitError::PayloadTooLarge { payload: payload_bytes, max: max_msg_length });
        }

        let record_stride = align_up(RECORD_HEADER_BYTES + payload_bytes, record_alignment);
        let mask = data_region_bytes - 1;

        let producer_position_offset = data_region_bytes + 2 * CACHE_LINE_BYTES;
        let consumer_cache_position_offset = data_region_bytes + 4 * CACHE_LINE_BYTES;
        let consumer_position_offset = data_region_bytes + 6 * CACHE_LINE_BYTES;
        let total_bytes = data_region_bytes + TRAILER_CACHE_LINES * CACHE_LINE_BYTES;

        Ok(Self {
            data_region_bytes,
            record_stride,
            mask,
            max_msg_length,
            record_alignment,
            total_bytes,
            producer_position_offset,
            consumer_cache_position_offset,
            consumer_position_offset,
        })
    }

    /// Rounds `length` up to `record_alignment`, as every record's on-wire
    /// length (header + content) must be before it is added to a position.
    #[inline]
    pub(crate) fn align(&self, length: usize) -> usize {
        align_up(length, self.record_alignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_up_to_power_of_two() {
        let layout = Layout::calculate(100, 8).unwrap();
        assert!(layout.data_region_bytes.is_power_of_two());
        assert!(layout.data_region_bytes >= 100);
    }

    #[test]
    fn record_stride_is_aligned() {
        let layout = Layout::calculate_for_records(4, 8).unwrap();
        assert_eq!(layout.record_stride, 16); // 8 header + 8 payload, already aligned
        assert_eq!(layout.data_region_bytes, 64); // 4 * 16 rounded to pow2
    }

    #[test]
    fn rejects_oversized_payload() {
        let err = Layout::calculate(64, 100).unwrap_err();
        assert!(matches!(err, InitError::PayloadTooLarge { .. }));
    }

    #[test]
    fn trailer_offsets_are_cache_line_spaced() {
        let layout = Layout::calculate(64, 8).unwrap();
        assert_eq!(layout.producer_position_offset, 64 + 2 * CACHE_LINE_BYTES);
        assert_eq!(layout.consumer_cache_position_offset, 64 + 4 * CACHE_LINE_BYTES);
        assert_eq!(layout.consumer_position_offset, 64 + 6 * CACHE_LINE_BYTES);
        assert_eq!(layout.total_bytes, 64 + 8 * CACHE_LINE_BYTES);
    }
}
