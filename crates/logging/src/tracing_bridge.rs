//! crates/logging/src/tracing_bridge.rs
//! Installs a `tracing-subscriber` filtered by a [`VerbosityConfig`].
//!
//! The configuration is rendered into `EnvFilter` directives so the chunking
//! crates can use plain `tracing` macros with the targets named by
//! [`DebugFlag::target`]. A `RUST_LOG` value, when present, is appended after
//! the configured directives and therefore wins for any target it names.
//!
//! # Usage
//!
//! ```rust,ignore
//! use logging::{VerbosityConfig, init_tracing};
//!
//! let config = VerbosityConfig::from_verbose_level(2);
//! init_tracing(&config)?;
//!
//! tracing::debug!(target: "fsshttpd::zip", "walking entries");
//! ```

use super::config::VerbosityConfig;
use super::levels::DebugFlag;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Environment variable consulted for extra filter directives.
pub const LOG_ENV_VAR: &str = "RUST_LOG";

/// Maps a tracing target back to the debug category that owns it.
#[must_use]
pub fn target_to_debug_flag(target: &str) -> Option<DebugFlag> {
    DebugFlag::ALL
        .into_iter()
        .find(|flag| target == flag.target() || target.starts_with(&format!("{}::", flag.target())))
}

/// Builds the `EnvFilter` for `config`, merged with `RUST_LOG`.
#[must_use]
pub fn build_filter(config: &VerbosityConfig) -> EnvFilter {
    let mut directives = config.filter_directives();
    if let Ok(extra) = std::env::var(LOG_ENV_VAR) {
        if !extra.trim().is_empty() {
            directives.push(',');
            directives.push_str(extra.trim());
        }
    }
    EnvFilter::new(directives)
}

/// Installs the global subscriber. Events are written to stderr.
pub fn init_tracing(config: &VerbosityConfig) -> Result<(), TryInitError> {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);
    tracing_subscriber::registry()
        .with(build_filter(config))
        .with(layer)
        .try_init()
}
