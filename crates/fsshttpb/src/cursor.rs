//! Bounded little-endian reader over a borrowed buffer.
//!
//! A [`ByteCursor`] tracks absolute offsets into the original buffer so errors
//! raised from nested objects still point at the right byte. Sub-cursors
//! created with [`ByteCursor::split_to`] share the buffer and are limited to a
//! window of it.

use crate::error::ParseError;

/// Forward-only reader over `bytes[position..end]`.
#[derive(Clone, Copy, Debug)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    position: usize,
    end: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor over the whole buffer.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            position: 0,
            end: bytes.len(),
        }
    }

    /// Absolute offset of the next unread byte.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Number of unread bytes within this cursor's window.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.end - self.position
    }

    /// Reports whether the window has been fully consumed.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.position == self.end
    }

    /// Returns the next byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8, ParseError> {
        if self.is_empty() {
            return Err(self.truncated(1));
        }
        Ok(self.bytes[self.position])
    }

    /// Returns the next two bytes as a little-endian `u16` without consuming them.
    pub fn peek_u16_le(&self) -> Result<u16, ParseError> {
        let bytes = self.peek_array::<2>()?;
        Ok(u16::from_le_bytes(bytes))
    }

    /// Consumes `len` bytes and returns them as a slice of the original buffer.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ParseError> {
        if self.remaining() < len {
            return Err(self.truncated(len - self.remaining()));
        }
        let start = self.position;
        self.position += len;
        Ok(&self.bytes[start..self.position])
    }

    /// Consumes a fixed number of bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ParseError> {
        let array = self.peek_array::<N>()?;
        self.position += N;
        Ok(array)
    }

    /// Consumes one byte.
    pub fn read_u8(&mut self) -> Result<u8, ParseError> {
        let byte = self.peek_u8()?;
        self.position += 1;
        Ok(byte)
    }

    /// Consumes a little-endian `u16`.
    pub fn read_u16_le(&mut self) -> Result<u16, ParseError> {
        self.read_array::<2>().map(u16::from_le_bytes)
    }

    /// Consumes a little-endian `u32`.
    pub fn read_u32_le(&mut self) -> Result<u32, ParseError> {
        self.read_array::<4>().map(u32::from_le_bytes)
    }

    /// Consumes a little-endian `u64`.
    pub fn read_u64_le(&mut self) -> Result<u64, ParseError> {
        self.read_array::<8>().map(u64::from_le_bytes)
    }

    /// Splits off a sub-cursor over the next `len` bytes and advances past them.
    pub fn split_to(&mut self, len: usize) -> Result<Self, ParseError> {
        if self.remaining() < len {
            return Err(self.truncated(len - self.remaining()));
        }
        let sub = Self {
            bytes: self.bytes,
            position: self.position,
            end: self.position + len,
        };
        self.position += len;
        Ok(sub)
    }

    /// Fails with [`ParseError::TrailingBytes`] unless the window is consumed.
    pub fn expect_end(&self) -> Result<(), ParseError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ParseError::TrailingBytes {
                offset: self.position,
                remaining: self.remaining(),
            })
        }
    }

    fn peek_array<const N: usize>(&self) -> Result<[u8; N], ParseError> {
        if self.remaining() < N {
            return Err(self.truncated(N - self.remaining()));
        }
        let mut array = [0u8; N];
        array.copy_from_slice(&self.bytes[self.position..self.position + N]);
        Ok(array)
    }

    const fn truncated(&self, needed: usize) -> ParseError {
        ParseError::Truncated {
            offset: self.position,
            needed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_fields() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_u8().expect("u8"), 0x01);
        assert_eq!(cursor.read_u16_le().expect("u16"), 0x0302);
        assert_eq!(cursor.read_u32_le().expect("u32"), 0x0706_0504);
        assert!(cursor.is_empty());
    }

    #[test]
    fn truncation_reports_offset_and_shortfall() {
        let data = [0xAA, 0xBB];
        let mut cursor = ByteCursor::new(&data);
        cursor.read_u8().expect("first byte");
        assert_eq!(
            cursor.read_u32_le(),
            Err(ParseError::Truncated {
                offset: 1,
                needed: 3
            })
        );
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn split_cursor_keeps_absolute_offsets() {
        let data = [0u8; 10];
        let mut cursor = ByteCursor::new(&data);
        cursor.read_bytes(3).expect("skip");
        let mut sub = cursor.split_to(4).expect("split");
        assert_eq!(cursor.position(), 7);
        assert_eq!(sub.position(), 3);
        assert_eq!(sub.remaining(), 4);
        assert!(matches!(
            sub.read_bytes(5),
            Err(ParseError::Truncated { offset: 3, needed: 1 })
        ));
        sub.read_bytes(2).expect("within window");
        assert_eq!(
            sub.expect_end(),
            Err(ParseError::TrailingBytes {
                offset: 5,
                remaining: 2
            })
        );
    }
}
