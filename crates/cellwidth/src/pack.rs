//! Sub-byte packing of level offsets.
//!
//! Offsets are stored `8 / bits` per byte, least-significant group first:
//!
//! ```text
//! width 2:  byte = o3 o2 o1 o0     (o0 in bits 0..2)
//! width 4:  byte = o1 o0           (o0 in bits 0..4)
//! width 8:  byte = o0
//! ```
//!
//! The final byte is zero-padded. A decoder recovers offset `i` with
//! `(bytes[i / k] >> (bits * (i % k))) & mask`, which [`unpack`] implements.

use cellwidth_core::{Error, OffsetWidth, Result};

/// Pack `indices` at `width` bits each.
///
/// Every index must be below `2^width`. An index that does not fit is an
/// error; it is never masked or wrapped.
pub fn pack(indices: &[usize], width: OffsetWidth) -> Result<Vec<u8>> {
    let per_byte = width.per_byte();
    let bits = width.bits();
    let mut bytes = Vec::with_capacity(width.packed_len(indices.len()));

    for (chunk_idx, chunk) in indices.chunks(per_byte).enumerate() {
        let mut byte = 0u8;
        for (j, &index) in chunk.iter().enumerate() {
            if index > width.max_index() {
                return Err(Error::IndexTooWide {
                    position: chunk_idx * per_byte + j,
                    index,
                    bits,
                });
            }
            byte |= (index as u8) << (j as u8 * bits);
        }
        bytes.push(byte);
    }

    Ok(bytes)
}

/// Read offset `index` from packed bytes.
///
/// # Panics
/// Panics if `index` lies beyond `bytes`; packed layouts are validated before
/// they are walked.
#[inline]
pub fn unpack(bytes: &[u8], index: usize, width: OffsetWidth) -> u8 {
    let per_byte = width.per_byte();
    let shift = width.bits() as usize * (index % per_byte);
    (bytes[index / per_byte] >> shift) & width.mask()
}

/// Read offset `index`, or `None` if it lies beyond `bytes`.
#[inline]
pub fn try_unpack(bytes: &[u8], index: usize, width: OffsetWidth) -> Option<u8> {
    if index / width.per_byte() >= bytes.len() {
        return None;
    }
    Some(unpack(bytes, index, width))
}

/// Unpack the first `count` offsets.
pub fn unpack_all(bytes: &[u8], count: usize, width: OffsetWidth) -> Vec<u8> {
    (0..count).map(|i| unpack(bytes, i, width)).collect()
}

// =============================================================================
// Tests
// =============================================================================
