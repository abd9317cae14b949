//! crates/logging/src/tracing_macros.rs
//! Convenience macros that emit under the per-category tracing targets.
//!
//! Callers must depend on `tracing` themselves; the macros expand to
//! `::tracing::debug!` or `::tracing::trace!` with a fixed target.

/// Emit a strategy-selection or chunk-emission event.
///
/// # Example
/// ```ignore
/// trace_chunk!(count = leaves.len(), "chunked input");
/// ```
#[macro_export]
macro_rules! trace_chunk {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "fsshttpd::chunk", $($arg)*);
    };
}

/// Emit a zip header walking event.
#[macro_export]
macro_rules! trace_zip {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "fsshttpd::zip", $($arg)*);
    };
}

/// Emit an RDC boundary event.
#[macro_export]
macro_rules! trace_rdc {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "fsshttpd::rdc", $($arg)*);
    };
}

/// Emit a tree reconstruction event.
#[macro_export]
macro_rules! trace_build {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "fsshttpd::build", $($arg)*);
    };
}

/// Emit a verification event.
#[macro_export]
macro_rules! trace_verify {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "fsshttpd::verify", $($arg)*);
    };
}

/// Emit a wire codec event. Uses trace level since it fires per object.
#[macro_export]
macro_rules! trace_wire {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: "fsshttpb::wire", $($arg)*);
    };
}
