use thiserror::Error;

use crate::header::StreamObjectType;

/// Failure while decoding FSSHTTPB binary structures.
///
/// Every variant carries the absolute byte offset at which decoding stopped.
/// Decoding never resumes after an error because every later field offset
/// depends on the one that failed.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ParseError {
    /// The input ended inside a field.
    #[error("unexpected end of input at offset {offset}: {needed} more bytes required")]
    Truncated {
        /// Offset of the field that could not be read.
        offset: usize,
        /// Number of bytes missing.
        needed: usize,
    },
    /// The first byte of an extended GUID is not one of the defined forms.
    #[error("invalid extended GUID tag 0x{tag:02x} at offset {offset}")]
    InvalidExGuid {
        /// Offset of the tag byte.
        offset: usize,
        /// The tag byte.
        tag: u8,
    },
    /// The first byte of a serial number is neither nil nor the 64-bit form.
    #[error("invalid serial number tag 0x{tag:02x} at offset {offset}")]
    InvalidSerialNumber {
        /// Offset of the tag byte.
        offset: usize,
        /// The tag byte.
        tag: u8,
    },
    /// Expected a stream object start header but found an end header.
    #[error("expected a stream object start header at offset {offset}, found 0x{byte:02x}")]
    NotAStartHeader {
        /// Offset of the offending byte.
        offset: usize,
        /// The byte found.
        byte: u8,
    },
    /// The header names a stream object type this crate does not know.
    #[error("unknown stream object type 0x{raw:x} at offset {offset}")]
    UnknownType {
        /// Offset of the header.
        offset: usize,
        /// Raw type field.
        raw: u16,
    },
    /// The header names a known type other than the one required here.
    #[error("expected {expected} at offset {offset}, found {found}")]
    UnexpectedType {
        /// Offset of the header.
        offset: usize,
        /// Required type.
        expected: StreamObjectType,
        /// Type found on the wire.
        found: StreamObjectType,
    },
    /// The compound bit disagrees with the object type.
    #[error("{object} at offset {offset} has compound flag {found}")]
    CompoundMismatch {
        /// Offset of the header.
        offset: usize,
        /// Object type.
        object: StreamObjectType,
        /// Compound flag as found on the wire.
        found: bool,
    },
    /// The object's fields did not consume exactly the declared length.
    #[error("{object} over-parse at offset {offset}: declared {declared} bytes, consumed {consumed}")]
    LengthMismatch {
        /// Offset of the object's items.
        offset: usize,
        /// Object type.
        object: StreamObjectType,
        /// Length declared in the header.
        declared: u64,
        /// Bytes actually consumed by the fields.
        consumed: u64,
    },
    /// A fixed-width object carried an item of the wrong size.
    #[error("{object} at offset {offset} must be {expected} bytes, found {found}")]
    FixedLength {
        /// Offset of the object's items.
        offset: usize,
        /// Object type.
        object: StreamObjectType,
        /// Required item length.
        expected: u64,
        /// Declared item length.
        found: u64,
    },
    /// An end header was missing or closed a different object.
    #[error("end header at offset {offset} closes type 0x{found:x}, expected {expected}")]
    EndMismatch {
        /// Offset of the end header.
        offset: usize,
        /// Type of the object being closed.
        expected: StreamObjectType,
        /// Raw type in the end header.
        found: u16,
    },
    /// A length field does not fit in addressable memory.
    #[error("length {value} at offset {offset} exceeds addressable memory")]
    LengthOverflow {
        /// Offset of the length field.
        offset: usize,
        /// Decoded value.
        value: u64,
    },
    /// Object declarations and object data entries are not paired one to one.
    #[error("{declarations} object declarations but {data} object data entries")]
    DeclarationCountMismatch {
        /// Number of declarations.
        declarations: usize,
        /// Number of data entries.
        data: usize,
    },
    /// The data element type is not an object group.
    #[error("data element at offset {offset} has type {found}, expected an object group")]
    UnsupportedDataElement {
        /// Offset of the type field.
        offset: usize,
        /// Type found.
        found: u64,
    },
    /// Bytes remained after the outermost structure.
    #[error("{remaining} trailing bytes at offset {offset}")]
    TrailingBytes {
        /// Offset of the first unread byte.
        offset: usize,
        /// Number of unread bytes.
        remaining: usize,
    },
}
