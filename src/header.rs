//! Record slot header encoding.
//!
//! A slot transitions **empty** (header word `0`) -> **claimed** (header
//! still `0`, but `producer_position` has moved past it -- invisible to the
//! consumer) -> **published** (header set via a release store, the only
//! producer-side transition the consumer can observe) -> **consumed**
//! (`consumer_position` has advanced past it, header still set) -> **empty**
//! again once the consumer zeroes the bytes, re-arming the slot for reuse.
//! A padding slot follows the same path with `type_id == PADDING_TYPE_ID`.

use crate::layout::PADDING_TYPE_ID;

/// Packs a record length (header + payload, in bytes) and a type id into
/// the 64-bit header word: low 32 bits length, high 32 bits type id.
#[inline]
pub(crate) const fn make_header(type_id: u32, length: u32) -> u64 {
    ((type_id as u64) << 32) | (length as u64)
}

/// Unpacks a header word into `(type_id, length)`.
#[inline]
pub(crate) const fn decode_header(word: u64) -> (u32, u32) {
    let length = (word & 0xFFFF_FFFF) as u32;
    let type_id = (word >> 32) as u32;
    (type_id, length)
}

#[inline]
pub(crate) const fn is_padding(type_id: u32) -> bool {
    type_id == PADDING_TYPE_ID
}

/// Returns `true` for ids a caller may legally pass to `commit`: nonzero
/// and distinct from the reserved padding id.
#[inline]
pub(crate) const fn is_valid_type_id(type_id: u32) -> bool {
    type_id != 0 && type_id != PADDING_TYPE_ID
}
