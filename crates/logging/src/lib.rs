#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` maps command-line verbosity onto `tracing` targets for the
//! chunking crates. Each subsystem logs under its own target (see
//! [`DebugFlag::target`]) and a [`VerbosityConfig`] decides which targets are
//! shown and at what level.
//!
//! # Design
//!
//! - [`VerbosityConfig::from_verbose_level`] turns a `-v` count into a base
//!   level plus per-category levels.
//! - [`VerbosityConfig::apply_debug_flag`] accepts `FLAG[N]` specifications
//!   such as `zip2` to raise one category.
//! - With the `tracing` feature, `init_tracing` renders the configuration into
//!   `EnvFilter` directives and installs a `tracing-subscriber` registry that
//!   writes to stderr. The `trace_*!` macros emit under the matching target.
//!
//! # Examples
//!
//! ```
//! use logging::{DebugFlag, VerbosityConfig};
//!
//! let mut config = VerbosityConfig::from_verbose_level(1);
//! config.apply_debug_flag("verify").unwrap();
//! assert_eq!(config.debug.get(DebugFlag::Verify), 1);
//! assert_eq!(config.filter_directives(), "info,fsshttpd::verify=debug");
//! ```

mod config;
mod levels;
#[cfg(feature = "tracing")]
mod tracing_bridge;
#[cfg(feature = "tracing")]
mod tracing_macros;

pub use config::VerbosityConfig;
pub use levels::{DebugFlag, DebugLevels, FlagParseError, MAX_DEBUG_LEVEL, parse_debug_flag};
#[cfg(feature = "tracing")]
pub use tracing_bridge::{LOG_ENV_VAR, build_filter, init_tracing, target_to_debug_flag};
