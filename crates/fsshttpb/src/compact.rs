//! Compact unsigned 64-bit integers.
//!
//! The encoded width is signalled by the number of trailing zero bits in the
//! first byte: one trailing one-bit means a single byte carrying 7 value bits,
//! `10` two bytes carrying 14 bits, and so on up to seven bytes carrying 49
//! bits. A first byte of `0x80` is followed by the full value as a
//! little-endian `u64`, and a first byte of `0x00` encodes zero.
//!
//! ```
//! use fsshttpb::{ByteCursor, decode_compact_u64, encode_compact_u64};
//!
//! let mut encoded = Vec::new();
//! encode_compact_u64(300, &mut encoded);
//! assert_eq!(encoded, [0xB2, 0x04]);
//!
//! let mut cursor = ByteCursor::new(&encoded);
//! assert_eq!(decode_compact_u64(&mut cursor).unwrap(), 300);
//! assert!(cursor.is_empty());
//! ```

use crate::cursor::ByteCursor;
use crate::error::ParseError;

/// Value bits available to each width, indexed by `width - 1` for widths 1-7.
const WIDTH_LIMITS: [u32; 7] = [7, 14, 21, 28, 35, 42, 49];

/// Appends the compact encoding of `value` to `out`.
pub fn encode_compact_u64(value: u64, out: &mut Vec<u8>) {
    if value == 0 {
        out.push(0);
        return;
    }
    for (index, &bits) in WIDTH_LIMITS.iter().enumerate() {
        if value < (1u64 << bits) {
            let width = index + 1;
            let tagged = (value << width) | (1u64 << index);
            out.extend_from_slice(&tagged.to_le_bytes()[..width]);
            return;
        }
    }
    out.push(0x80);
    out.extend_from_slice(&value.to_le_bytes());
}

/// Number of bytes [`encode_compact_u64`] writes for `value`.
#[must_use]
pub fn compact_u64_len(value: u64) -> usize {
    if value == 0 {
        return 1;
    }
    WIDTH_LIMITS
        .iter()
        .position(|&bits| value < (1u64 << bits))
        .map_or(9, |index| index + 1)
}

/// Decodes a compact integer from `cursor`.
pub fn decode_compact_u64(cursor: &mut ByteCursor<'_>) -> Result<u64, ParseError> {
    let first = cursor.peek_u8()?;
    if first == 0 {
        cursor.read_u8()?;
        return Ok(0);
    }
    if first == 0x80 {
        cursor.read_u8()?;
        return cursor.read_u64_le();
    }
    let width = first.trailing_zeros() as usize + 1;
    let raw = cursor.read_bytes(width)?;
    let mut padded = [0u8; 8];
    padded[..width].copy_from_slice(raw);
    Ok(u64::from_le_bytes(padded) >> width)
}

/// Decodes a compact integer that is used as a byte or element count.
pub fn decode_compact_len(cursor: &mut ByteCursor<'_>) -> Result<usize, ParseError> {
    let offset = cursor.position();
    let value = decode_compact_u64(cursor)?;
    usize::try_from(value).map_err(|_| ParseError::LengthOverflow { offset, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encoded(value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        encode_compact_u64(value, &mut out);
        out
    }

    #[test]
    fn width_boundaries() {
        assert_eq!(encoded(0), [0x00]);
        assert_eq!(encoded(1), [0x03]);
        assert_eq!(encoded(127), [0xFF]);
        assert_eq!(encoded(128), [0x02, 0x02]);
        assert_eq!(encoded((1 << 14) - 1).len(), 2);
        assert_eq!(encoded(1 << 14).len(), 3);
        assert_eq!(encoded((1 << 49) - 1).len(), 7);
        assert_eq!(encoded(1 << 49).len(), 9);
        assert_eq!(encoded(u64::MAX)[0], 0x80);
    }

    #[test]
    fn truncated_input_is_rejected() {
        let mut cursor = ByteCursor::new(&[0x04, 0x00]);
        assert!(matches!(
            decode_compact_u64(&mut cursor),
            Err(ParseError::Truncated { offset: 0, needed: 1 })
        ));
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(value in any::<u64>()) {
            let bytes = encoded(value);
            prop_assert_eq!(bytes.len(), compact_u64_len(value));
            let mut cursor = ByteCursor::new(&bytes);
            prop_assert_eq!(decode_compact_u64(&mut cursor).expect("decode"), value);
            prop_assert!(cursor.is_empty());
        }
    }
}
