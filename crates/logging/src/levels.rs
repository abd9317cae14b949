//! crates/logging/src/levels.rs
//! Debug flag categories and their per-flag levels.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Diagnostic categories, one per chunking subsystem.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DebugFlag {
    /// Strategy selection and chunk emission.
    Chunk,
    /// Zip local-file-header walking.
    Zip,
    /// RDC boundary detection.
    Rdc,
    /// Node tree reconstruction from object groups.
    Build,
    /// Chunk verification against a received tree.
    Verify,
    /// Stream object encoding and decoding.
    Wire,
}

impl DebugFlag {
    /// Every flag, in display order.
    pub const ALL: [Self; 6] = [
        Self::Chunk,
        Self::Zip,
        Self::Rdc,
        Self::Build,
        Self::Verify,
        Self::Wire,
    ];

    /// Flag name as accepted on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Chunk => "chunk",
            Self::Zip => "zip",
            Self::Rdc => "rdc",
            Self::Build => "build",
            Self::Verify => "verify",
            Self::Wire => "wire",
        }
    }

    /// Tracing target events in this category are emitted under.
    #[must_use]
    pub const fn target(self) -> &'static str {
        match self {
            Self::Chunk => "fsshttpd::chunk",
            Self::Zip => "fsshttpd::zip",
            Self::Rdc => "fsshttpd::rdc",
            Self::Build => "fsshttpd::build",
            Self::Verify => "fsshttpd::verify",
            Self::Wire => "fsshttpb::wire",
        }
    }
}

impl fmt::Display for DebugFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a `FLAG[N]` specification cannot be parsed.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum FlagParseError {
    /// The flag name is not one of [`DebugFlag::ALL`].
    #[error("unknown debug flag '{0}'")]
    UnknownFlag(String),
    /// The trailing level is not a number in `0..=4`.
    #[error("invalid level in debug flag '{0}'")]
    InvalidLevel(String),
}

impl FromStr for DebugFlag {
    type Err = FlagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|flag| flag.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| FlagParseError::UnknownFlag(s.to_owned()))
    }
}

/// Highest level a debug flag can be raised to.
pub const MAX_DEBUG_LEVEL: u8 = 4;

/// Parses `FLAG` or `FLAGN` (for example `zip` or `zip3`).
///
/// A bare flag name means level 1.
pub fn parse_debug_flag(spec: &str) -> Result<(DebugFlag, u8), FlagParseError> {
    let split = spec
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(spec.len());
    let (name, digits) = spec.split_at(split);
    let flag = name.parse::<DebugFlag>()?;
    let level = if digits.is_empty() {
        1
    } else {
        digits
            .parse::<u8>()
            .ok()
            .filter(|level| *level <= MAX_DEBUG_LEVEL)
            .ok_or_else(|| FlagParseError::InvalidLevel(spec.to_owned()))?
    };
    Ok((flag, level))
}

/// Per-flag debug levels. Zero disables a category.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DebugLevels {
    /// Strategy selection and chunk emission.
    pub chunk: u8,
    /// Zip header walking.
    pub zip: u8,
    /// RDC boundaries.
    pub rdc: u8,
    /// Tree reconstruction.
    pub build: u8,
    /// Verification.
    pub verify: u8,
    /// Wire codec.
    pub wire: u8,
}

impl DebugLevels {
    /// Sets every category to `level`.
    #[must_use]
    pub const fn uniform(level: u8) -> Self {
        Self {
            chunk: level,
            zip: level,
            rdc: level,
            build: level,
            verify: level,
            wire: level,
        }
    }

    /// Level configured for `flag`.
    #[must_use]
    pub const fn get(&self, flag: DebugFlag) -> u8 {
        match flag {
            DebugFlag::Chunk => self.chunk,
            DebugFlag::Zip => self.zip,
            DebugFlag::Rdc => self.rdc,
            DebugFlag::Build => self.build,
            DebugFlag::Verify => self.verify,
            DebugFlag::Wire => self.wire,
        }
    }

    /// Sets the level for `flag`.
    pub fn set(&mut self, flag: DebugFlag, level: u8) {
        let slot = match flag {
            DebugFlag::Chunk => &mut self.chunk,
            DebugFlag::Zip => &mut self.zip,
            DebugFlag::Rdc => &mut self.rdc,
            DebugFlag::Build => &mut self.build,
            DebugFlag::Verify => &mut self.verify,
            DebugFlag::Wire => &mut self.wire,
        };
        *slot = level;
    }
}
