use thiserror::Error;

/// Errors that can occur while updating the rolling hash state.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum RollingError {
    /// A zero-length window cannot hold any bytes.
    #[error("rolling hash requires a non-empty window")]
    EmptyWindow,
    /// A roll was requested before the window held `window` bytes.
    #[error("rolling hash window holds {filled} of {window} bytes; cannot roll yet")]
    WindowNotFull {
        /// Bytes pushed so far.
        filled: usize,
        /// Configured window length.
        window: usize,
    },
    /// More bytes were pushed than the window can hold.
    #[error("rolling hash window of {window} bytes is already full")]
    WindowOverflow {
        /// Configured window length.
        window: usize,
    },
}
