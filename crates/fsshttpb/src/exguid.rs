//! Extended GUIDs: a GUID scoped by a 32-bit sequence value.
//!
//! The wire form picks the narrowest of four encodings for the value and
//! follows it with the GUID in its mixed-endian field layout. An all-zero
//! extended GUID encodes as the single byte `0x00`.

use std::fmt;

use uuid::Uuid;

use crate::cursor::ByteCursor;
use crate::error::ParseError;

/// Identifier of an object, data element or node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExGuid {
    value: u32,
    guid: Uuid,
}

impl Default for ExGuid {
    fn default() -> Self {
        Self::NIL
    }
}

impl ExGuid {
    /// The nil extended GUID.
    pub const NIL: Self = Self {
        value: 0,
        guid: Uuid::nil(),
    };

    /// Creates an extended GUID from its parts.
    #[inline]
    #[must_use]
    pub const fn new(value: u32, guid: Uuid) -> Self {
        Self { value, guid }
    }

    /// Sequence value.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.value
    }

    /// Scoping GUID.
    #[inline]
    #[must_use]
    pub const fn guid(&self) -> Uuid {
        self.guid
    }

    /// Reports whether this is the nil extended GUID.
    #[inline]
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.value == 0 && self.guid.is_nil()
    }

    /// Appends the wire encoding to `out`.
    pub fn encode_to(&self, out: &mut Vec<u8>) {
        if self.is_nil() {
            out.push(0x00);
            return;
        }
        let value = self.value;
        if value < (1 << 5) {
            out.push(((value << 3) | 0x04) as u8);
        } else if value < (1 << 10) {
            out.extend_from_slice(&(((value << 6) | 0x20) as u16).to_le_bytes());
        } else if value < (1 << 17) {
            out.extend_from_slice(&((value << 7) | 0x40).to_le_bytes()[..3]);
        } else {
            out.push(0x80);
            out.extend_from_slice(&value.to_le_bytes());
        }
        out.extend_from_slice(&self.guid.to_bytes_le());
    }

    /// Decodes an extended GUID from `cursor`.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, ParseError> {
        let offset = cursor.position();
        let tag = cursor.peek_u8()?;
        let value = if tag == 0x00 {
            cursor.read_u8()?;
            return Ok(Self::NIL);
        } else if tag & 0x07 == 0x04 {
            u32::from(cursor.read_u8()? >> 3)
        } else if tag & 0x3F == 0x20 {
            u32::from(cursor.read_u16_le()? >> 6)
        } else if tag & 0x7F == 0x40 {
            let raw = cursor.read_array::<3>()?;
            u32::from_le_bytes([raw[0], raw[1], raw[2], 0]) >> 7
        } else if tag == 0x80 {
            cursor.read_u8()?;
            cursor.read_u32_le()?
        } else {
            return Err(ParseError::InvalidExGuid { offset, tag });
        };
        let guid = Uuid::from_bytes_le(cursor.read_array::<16>()?);
        Ok(Self { value, guid })
    }
}

impl fmt::Display for ExGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}:{}", self.guid, self.value)
    }
}

/// Mints fresh extended GUIDs with increasing sequence values.
///
/// One generator belongs to one chunking or build pass. Each identifier gets
/// a random GUID unless the generator was created with
/// [`ExGuidGenerator::with_guid`], in which case every identifier shares that
/// GUID and only the value differs.
#[derive(Clone, Debug)]
pub struct ExGuidGenerator {
    next: u32,
    fixed: Option<Uuid>,
}

impl Default for ExGuidGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExGuidGenerator {
    /// Generator producing random GUIDs, starting at sequence value 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: 1,
            fixed: None,
        }
    }

    /// Generator that scopes every value under `guid`.
    #[must_use]
    pub const fn with_guid(guid: Uuid) -> Self {
        Self {
            next: 1,
            fixed: Some(guid),
        }
    }

    /// Returns the next identifier.
    pub fn next_ex_guid(&mut self) -> ExGuid {
        let value = self.next;
        self.next = self.next.wrapping_add(1).max(1);
        let guid = self.fixed.unwrap_or_else(Uuid::new_v4);
        ExGuid::new(value, guid)
    }
}
