//! Stream object start and end headers.
//!
//! # Start headers
//!
//! | Form | Bits 0-1 | Bit 2 | Type bits | Length bits |
//! |------|----------|-------|-----------|-------------|
//! | 16-bit | `00` | compound | 3-8 (6 bits) | 9-15 (7 bits) |
//! | 32-bit | `10` | compound | 3-16 (14 bits) | 17-31 (15 bits) |
//!
//! A 32-bit header whose length field is `32767` is followed by the real
//! length as a compact integer.
//!
//! # End headers
//!
//! Compound objects close with an 8-bit end header (`01` followed by a 6-bit
//! type) when the type fits in six bits, otherwise a 16-bit one (`11` followed
//! by a 14-bit type).

use std::fmt;

use crate::compact::{decode_compact_u64, encode_compact_u64};
use crate::cursor::ByteCursor;
use crate::error::ParseError;

/// Largest length a 16-bit start header can carry.
pub const MAX_SHORT_LENGTH: u64 = 127;
/// Largest type a 16-bit start header or 8-bit end header can carry.
pub const MAX_SHORT_TYPE: u16 = 0x3F;
/// Length field value signalling that a compact large length follows.
pub const LARGE_LENGTH_MARKER: u64 = 32767;

/// Stream object types understood by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum StreamObjectType {
    /// Data element wrapper.
    DataElement = 0x01,
    /// Container for a sequence of data elements.
    DataElementPackage = 0x15,
    /// Object data entry inside an object group.
    ObjectGroupObjectData = 0x16,
    /// Object declaration inside an object group.
    ObjectGroupObjectDeclare = 0x18,
    /// Container for object declarations.
    ObjectGroupDeclarations = 0x1D,
    /// Container for object data entries.
    ObjectGroupData = 0x1E,
    /// Leaf node of a chunked file.
    LeafNodeObject = 0x1F,
    /// Intermediate (root) node of a chunked file.
    IntermediateNodeObject = 0x20,
    /// Chunk signature.
    SignatureObject = 0x21,
    /// Chunk data size.
    DataSizeObject = 0x22,
    /// Chunk data hash.
    DataHashObject = 0x2F,
}

impl StreamObjectType {
    /// Raw numeric type.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self as u16
    }

    /// Maps a raw type back to a known variant.
    #[must_use]
    pub const fn from_raw(raw: u16) -> Option<Self> {
        Some(match raw {
            0x01 => Self::DataElement,
            0x15 => Self::DataElementPackage,
            0x16 => Self::ObjectGroupObjectData,
            0x18 => Self::ObjectGroupObjectDeclare,
            0x1D => Self::ObjectGroupDeclarations,
            0x1E => Self::ObjectGroupData,
            0x1F => Self::LeafNodeObject,
            0x20 => Self::IntermediateNodeObject,
            0x21 => Self::SignatureObject,
            0x22 => Self::DataSizeObject,
            0x2F => Self::DataHashObject,
            _ => return None,
        })
    }

    /// Reports whether objects of this type contain child objects and close
    /// with an end header.
    #[must_use]
    pub const fn is_compound(self) -> bool {
        matches!(
            self,
            Self::DataElement
                | Self::DataElementPackage
                | Self::ObjectGroupDeclarations
                | Self::ObjectGroupData
                | Self::LeafNodeObject
                | Self::IntermediateNodeObject
        )
    }

    /// Human-readable name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DataElement => "DataElement",
            Self::DataElementPackage => "DataElementPackage",
            Self::ObjectGroupObjectData => "ObjectGroupObjectData",
            Self::ObjectGroupObjectDeclare => "ObjectGroupObjectDeclare",
            Self::ObjectGroupDeclarations => "ObjectGroupDeclarations",
            Self::ObjectGroupData => "ObjectGroupData",
            Self::LeafNodeObject => "LeafNodeObject",
            Self::IntermediateNodeObject => "IntermediateNodeObject",
            Self::SignatureObject => "SignatureObject",
            Self::DataSizeObject => "DataSizeObject",
            Self::DataHashObject => "DataHashObject",
        }
    }
}

impl fmt::Display for StreamObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02x})", self.name(), self.raw())
    }
}

/// Decoded stream object start header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamObjectHeader {
    /// Object type.
    pub object_type: StreamObjectType,
    /// Compound flag as carried on the wire.
    pub compound: bool,
    /// Length of the object's own fields, excluding child objects.
    pub length: u64,
}

impl StreamObjectHeader {
    /// Header for `object_type` with the compound flag the type requires.
    #[must_use]
    pub const fn new(object_type: StreamObjectType, length: u64) -> Self {
        Self {
            object_type,
            compound: object_type.is_compound(),
            length,
        }
    }

    /// Appends the narrowest legal start header to `out`.
    pub fn encode_to(&self, out: &mut Vec<u8>) {
        let raw_type = u32::from(self.object_type.raw());
        let compound = u32::from(self.compound);
        if raw_type <= u32::from(MAX_SHORT_TYPE) && self.length <= MAX_SHORT_LENGTH {
            let word = (compound << 2) | (raw_type << 3) | ((self.length as u32) << 9);
            out.extend_from_slice(&(word as u16).to_le_bytes());
            return;
        }
        let short_length = self.length.min(LARGE_LENGTH_MARKER) as u32;
        let word = 0x2 | (compound << 2) | (raw_type << 3) | (short_length << 17);
        out.extend_from_slice(&word.to_le_bytes());
        if self.length >= LARGE_LENGTH_MARKER {
            encode_compact_u64(self.length, out);
        }
    }

    /// Decodes a start header, validating the type and compound flag.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, ParseError> {
        let offset = cursor.position();
        let first = cursor.peek_u8()?;
        let (raw_type, compound, mut length) = match first & 0x3 {
            0x0 => {
                let word = u32::from(cursor.read_u16_le()?);
                ((word >> 3) & 0x3F, (word >> 2) & 1 == 1, u64::from(word >> 9))
            }
            0x2 => {
                let word = cursor.read_u32_le()?;
                ((word >> 3) & 0x3FFF, (word >> 2) & 1 == 1, u64::from(word >> 17))
            }
            _ => return Err(ParseError::NotAStartHeader { offset, byte: first }),
        };
        if first & 0x3 == 0x2 && length == LARGE_LENGTH_MARKER {
            length = decode_compact_u64(cursor)?;
        }
        let raw = raw_type as u16;
        let object_type =
            StreamObjectType::from_raw(raw).ok_or(ParseError::UnknownType { offset, raw })?;
        if compound != object_type.is_compound() {
            return Err(ParseError::CompoundMismatch {
                offset,
                object: object_type,
                found: compound,
            });
        }
        Ok(Self {
            object_type,
            compound,
            length,
        })
    }
}

/// Appends the end header that closes a compound `object_type`.
pub fn encode_end_header(object_type: StreamObjectType, out: &mut Vec<u8>) {
    let raw = object_type.raw();
    if raw <= MAX_SHORT_TYPE {
        out.push((0x1 | (raw << 2)) as u8);
    } else {
        out.extend_from_slice(&(0x3 | (raw << 2)).to_le_bytes());
    }
}

/// Reports whether the next byte starts an end header.
#[must_use]
pub fn at_end_header(cursor: &ByteCursor<'_>) -> bool {
    cursor.peek_u8().is_ok_and(|byte| byte & 0x1 == 0x1)
}

/// Consumes the end header closing `expected`.
pub fn decode_end_header(
    cursor: &mut ByteCursor<'_>,
    expected: StreamObjectType,
) -> Result<(), ParseError> {
    let offset = cursor.position();
    let first = cursor.peek_u8()?;
    let found = match first & 0x3 {
        0x1 => u16::from(cursor.read_u8()? >> 2),
        0x3 => cursor.read_u16_le()? >> 2,
        _ => {
            return Err(ParseError::EndMismatch {
                offset,
                expected,
                found: u16::from(first),
            });
        }
    };
    if found == expected.raw() {
        Ok(())
    } else {
        Err(ParseError::EndMismatch {
            offset,
            expected,
            found,
        })
    }
}
