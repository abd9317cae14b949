//! Length-prefixed byte blobs and identifier arrays.

use crate::compact::{decode_compact_len, encode_compact_u64};
use crate::cursor::ByteCursor;
use crate::error::ParseError;
use crate::exguid::ExGuid;

/// Appends a binary item (compact length followed by the bytes).
pub fn encode_binary_item(bytes: &[u8], out: &mut Vec<u8>) {
    encode_compact_u64(bytes.len() as u64, out);
    out.extend_from_slice(bytes);
}

/// Decodes a binary item, borrowing the payload from the input buffer.
pub fn decode_binary_item<'a>(cursor: &mut ByteCursor<'a>) -> Result<&'a [u8], ParseError> {
    let len = decode_compact_len(cursor)?;
    cursor.read_bytes(len)
}

/// Appends an extended GUID array (compact count followed by the entries).
pub fn encode_ex_guid_array(ids: &[ExGuid], out: &mut Vec<u8>) {
    encode_compact_u64(ids.len() as u64, out);
    for id in ids {
        id.encode_to(out);
    }
}

/// Decodes an extended GUID array.
pub fn decode_ex_guid_array(cursor: &mut ByteCursor<'_>) -> Result<Vec<ExGuid>, ParseError> {
    let count = decode_compact_len(cursor)?;
    // Each entry takes at least one byte, which bounds the preallocation.
    let mut ids = Vec::with_capacity(count.min(cursor.remaining()));
    for _ in 0..count {
        ids.push(ExGuid::decode(cursor)?);
    }
    Ok(ids)
}

/// Cell identifier: a pair of extended GUIDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellId {
    /// First extended GUID.
    pub ex_guid1: ExGuid,
    /// Second extended GUID.
    pub ex_guid2: ExGuid,
}

impl CellId {
    /// Appends the wire encoding to `out`.
    pub fn encode_to(&self, out: &mut Vec<u8>) {
        self.ex_guid1.encode_to(out);
        self.ex_guid2.encode_to(out);
    }

    /// Decodes a cell identifier.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            ex_guid1: ExGuid::decode(cursor)?,
            ex_guid2: ExGuid::decode(cursor)?,
        })
    }
}

/// Appends a cell identifier array.
pub fn encode_cell_id_array(ids: &[CellId], out: &mut Vec<u8>) {
    encode_compact_u64(ids.len() as u64, out);
    for id in ids {
        id.encode_to(out);
    }
}

/// Decodes a cell identifier array.
pub fn decode_cell_id_array(cursor: &mut ByteCursor<'_>) -> Result<Vec<CellId>, ParseError> {
    let count = decode_compact_len(cursor)?;
    let mut ids = Vec::with_capacity(count.min(cursor.remaining() / 2));
    for _ in 0..count {
        ids.push(CellId::decode(cursor)?);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn binary_item_borrows_payload() {
        let mut out = Vec::new();
        encode_binary_item(b"chunk", &mut out);
        assert_eq!(out[0], 0x0B);
        let mut cursor = ByteCursor::new(&out);
        assert_eq!(decode_binary_item(&mut cursor).expect("item"), b"chunk");
        assert!(cursor.is_empty());
    }

    #[test]
    fn binary_item_longer_than_input_is_truncated() {
        let mut cursor = ByteCursor::new(&[0x09, b'a', b'b']);
        assert!(matches!(
            decode_binary_item(&mut cursor),
            Err(ParseError::Truncated { offset: 1, needed: 2 })
        ));
    }

    #[test]
    fn arrays_preserve_order() {
        let guid = Uuid::from_u128(7);
        let ids: Vec<ExGuid> = (1..=3).map(|v| ExGuid::new(v, guid)).collect();
        let cells = vec![CellId {
            ex_guid1: ids[0],
            ex_guid2: ExGuid::NIL,
        }];
        let mut out = Vec::new();
        encode_ex_guid_array(&ids, &mut out);
        encode_cell_id_array(&cells, &mut out);

        let mut cursor = ByteCursor::new(&out);
        assert_eq!(decode_ex_guid_array(&mut cursor).expect("ids"), ids);
        assert_eq!(decode_cell_id_array(&mut cursor).expect("cells"), cells);
        assert!(cursor.is_empty());
    }

    #[test]
    fn huge_declared_count_fails_without_allocating() {
        let mut out = Vec::new();
        encode_compact_u64(1 << 40, &mut out);
        let mut cursor = ByteCursor::new(&out);
        assert!(matches!(
            decode_ex_guid_array(&mut cursor),
            Err(ParseError::Truncated { .. })
        ));
    }
}
