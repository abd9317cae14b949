//! Rolling hash used by RDC content-defined chunking.
//!
//! # Algorithm
//!
//! The hash is a cyclic polynomial ("buzhash") over a fixed window. Each byte
//! maps to a 32-bit value through a constant table. Appending a byte rotates
//! the state left by one bit and mixes in the new value; sliding the window
//! additionally cancels the outgoing byte by mixing in its value rotated by the
//! window length. Both operations are O(1).
//!
//! # Example
//!
//! ```rust
//! use checksums::RdcRollingHash;
//!
//! let mut rolling = RdcRollingHash::new(4).unwrap();
//! rolling.update(b"abcd").unwrap();
//!
//! // Slide window: remove 'a', add 'e'
//! rolling.roll(b'a', b'e').unwrap();
//! assert_eq!(rolling.value(), RdcRollingHash::hash_window(b"bcde"));
//! ```

mod error;
mod table;

pub use error::RollingError;

use table::BYTE_TABLE;

/// Default window length, in bytes, used by RDC chunking.
pub const DEFAULT_RDC_WINDOW: usize = 48;

/// Windowed rolling hash state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RdcRollingHash {
    window: usize,
    filled: usize,
    value: u32,
}

impl RdcRollingHash {
    /// Creates an empty rolling hash over `window` bytes.
    pub const fn new(window: usize) -> Result<Self, RollingError> {
        if window == 0 {
            return Err(RollingError::EmptyWindow);
        }
        Ok(Self {
            window,
            filled: 0,
            value: 0,
        })
    }

    /// Configured window length.
    #[inline]
    #[must_use]
    pub const fn window(&self) -> usize {
        self.window
    }

    /// Number of bytes currently held in the window.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.filled
    }

    /// Reports whether no byte has been pushed yet.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Reports whether the window holds exactly `window` bytes.
    #[inline]
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.filled == self.window
    }

    /// Current hash value.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.value
    }

    /// Clears the state while keeping the window length.
    pub fn reset(&mut self) {
        self.filled = 0;
        self.value = 0;
    }

    /// Appends a single byte to a window that is not yet full.
    #[inline]
    pub fn push(&mut self, byte: u8) -> Result<(), RollingError> {
        if self.is_full() {
            return Err(RollingError::WindowOverflow {
                window: self.window,
            });
        }
        self.value = self.value.rotate_left(1) ^ BYTE_TABLE[usize::from(byte)];
        self.filled += 1;
        Ok(())
    }

    /// Appends `data` to a window that has room for it.
    pub fn update(&mut self, data: &[u8]) -> Result<(), RollingError> {
        if self.filled + data.len() > self.window {
            return Err(RollingError::WindowOverflow {
                window: self.window,
            });
        }
        for &byte in data {
            self.value = self.value.rotate_left(1) ^ BYTE_TABLE[usize::from(byte)];
        }
        self.filled += data.len();
        Ok(())
    }

    /// Slides a full window by one byte.
    #[inline]
    pub fn roll(&mut self, outgoing: u8, incoming: u8) -> Result<(), RollingError> {
        if !self.is_full() {
            return Err(RollingError::WindowNotFull {
                filled: self.filled,
                window: self.window,
            });
        }
        let shift = (self.window % 32) as u32;
        self.value = self.value.rotate_left(1)
            ^ BYTE_TABLE[usize::from(outgoing)].rotate_left(shift)
            ^ BYTE_TABLE[usize::from(incoming)];
        Ok(())
    }

    /// Hashes `data` from scratch as a single window.
    #[must_use]
    pub fn hash_window(data: &[u8]) -> u32 {
        data.iter().fold(0u32, |acc, &byte| {
            acc.rotate_left(1) ^ BYTE_TABLE[usize::from(byte)]
        })
    }

    /// Returns, for every position `i` in `data`, the hash of the window that
    /// ends at `i`. Positions closer than `window` to the start hash the
    /// shorter prefix.
    pub fn window_hashes(data: &[u8], window: usize) -> Result<Vec<u32>, RollingError> {
        let mut state = Self::new(window)?;
        let mut hashes = Vec::with_capacity(data.len());
        for (index, &byte) in data.iter().enumerate() {
            if state.is_full() {
                state.roll(data[index - window], byte)?;
            } else {
                state.push(byte)?;
            }
            hashes.push(state.value);
        }
        Ok(hashes)
    }
}

#[cfg(test)]
mod tests;
