//! crates/logging/src/config.rs
//! Verbosity configuration combining a base level and per-flag debug levels.

use super::levels::{DebugFlag, DebugLevels, FlagParseError, parse_debug_flag};

/// Combined verbosity configuration.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerbosityConfig {
    /// Number of `-v` flags given. 0 = warnings only, 1 = info.
    pub verbose: u8,
    /// Debug flag levels.
    pub debug: DebugLevels,
}

impl VerbosityConfig {
    /// Create a configuration from a `-v` count.
    ///
    /// Level 2 turns every category on at level 1, level 3 and above raise
    /// them to trace.
    pub fn from_verbose_level(level: u8) -> Self {
        let debug = match level {
            0 | 1 => DebugLevels::default(),
            2 => DebugLevels::uniform(1),
            _ => DebugLevels::uniform(2),
        };
        Self {
            verbose: level,
            debug,
        }
    }

    /// Applies a `FLAG[N]` specification on top of the current levels.
    pub fn apply_debug_flag(&mut self, spec: &str) -> Result<DebugFlag, FlagParseError> {
        let (flag, level) = parse_debug_flag(spec)?;
        self.debug.set(flag, level);
        Ok(flag)
    }

    /// Name of the `tracing` level used for events outside any category.
    #[must_use]
    pub const fn base_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// `EnvFilter` directives equivalent to this configuration.
    ///
    /// Debug level 1 maps to `debug`, 2 and above to `trace`.
    #[must_use]
    pub fn filter_directives(&self) -> String {
        let mut directives = String::from(self.base_level());
        for flag in DebugFlag::ALL {
            let level = match self.debug.get(flag) {
                0 => continue,
                1 => "debug",
                _ => "trace",
            };
            directives.push(',');
            directives.push_str(flag.target());
            directives.push('=');
            directives.push_str(level);
        }
        directives
    }
}
