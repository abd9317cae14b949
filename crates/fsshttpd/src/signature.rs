//! crates/fsshttpd/src/signature.rs
//!
//! Scalar stream objects carried by every node: the chunk signature, the
//! declared data size, and the optional data hash.

use std::fmt;

use fsshttpb::stream::{read_object, write_object};
use fsshttpb::{ByteCursor, ParseError, StreamObjectType, decode_binary_item, encode_binary_item};

/// Opaque signature bytes of a chunk.
///
/// Two signatures are equal when their bytes are equal. The display form is
/// the bytes in decimal, separated by commas.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SignatureObject {
    bytes: Vec<u8>,
}

impl SignatureObject {
    /// Wraps signature bytes.
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Signature bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the signature and returns its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of signature bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Reports whether the signature is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Appends the stream object encoding to `out`.
    pub fn encode_to(&self, out: &mut Vec<u8>) {
        let mut items = Vec::with_capacity(self.bytes.len() + 2);
        encode_binary_item(&self.bytes, &mut items);
        write_object(out, StreamObjectType::SignatureObject, &items);
    }

    /// Decodes a signature stream object.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, ParseError> {
        read_object(cursor, StreamObjectType::SignatureObject, |items| {
            decode_binary_item(items).map(|bytes| Self::new(bytes.to_vec()))
        })
    }
}

impl From<Vec<u8>> for SignatureObject {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for SignatureObject {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for SignatureObject {
    fn from(bytes: [u8; N]) -> Self {
        Self::new(bytes.to_vec())
    }
}

impl fmt::Display for SignatureObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, byte) in self.bytes.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{byte}")?;
        }
        Ok(())
    }
}

fn encode_u64_object(object_type: StreamObjectType, value: u64, out: &mut Vec<u8>) {
    write_object(out, object_type, &value.to_le_bytes());
}

fn decode_u64_object(
    cursor: &mut ByteCursor<'_>,
    object_type: StreamObjectType,
) -> Result<u64, ParseError> {
    read_object(cursor, object_type, |items| {
        if items.remaining() != 8 {
            return Err(ParseError::FixedLength {
                offset: items.position(),
                object: object_type,
                expected: 8,
                found: items.remaining() as u64,
            });
        }
        items.read_u64_le()
    })
}

/// Declared number of bytes a node represents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataSizeObject(pub u64);

impl DataSizeObject {
    /// Declared size in bytes.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Appends the stream object encoding to `out`.
    pub fn encode_to(self, out: &mut Vec<u8>) {
        encode_u64_object(StreamObjectType::DataSizeObject, self.0, out);
    }

    /// Decodes a data size stream object. The payload must be exactly 8 bytes.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, ParseError> {
        decode_u64_object(cursor, StreamObjectType::DataSizeObject).map(Self)
    }
}

/// Optional hash value attached to a leaf node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DataHashObject(pub u64);

impl DataHashObject {
    /// Hash value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Appends the stream object encoding to `out`.
    pub fn encode_to(self, out: &mut Vec<u8>) {
        encode_u64_object(StreamObjectType::DataHashObject, self.0, out);
    }

    /// Decodes a data hash stream object. The payload must be exactly 8 bytes.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, ParseError> {
        decode_u64_object(cursor, StreamObjectType::DataHashObject).map(Self)
    }
}
