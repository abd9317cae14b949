//! Per-session settings threaded through chunking, building and verification.

/// Default RDC horizon: a position is a boundary when its hash beats every
/// hash this many positions to either side.
pub const DEFAULT_RDC_HORIZON: usize = 16 * 1024;

/// Parameters of the RDC boundary filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RdcParameters {
    /// Rolling hash window in bytes.
    pub window: usize,
    /// Local-maximum horizon in bytes.
    pub horizon: usize,
}

impl Default for RdcParameters {
    fn default() -> Self {
        Self {
            window: checksums::DEFAULT_RDC_WINDOW,
            horizon: DEFAULT_RDC_HORIZON,
        }
    }
}

/// Negotiated session state that selects version-dependent behaviour.
///
/// ```
/// use fsshttpd::ChunkingContext;
///
/// let ctx = ChunkingContext::default().with_minor_version(1).with_legacy_server(true);
/// assert!(!ctx.xor_single_chunk_signature());
/// assert!(!ctx.always_rdc());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChunkingContext {
    /// Negotiated cell storage minor version.
    pub minor_version: u16,
    /// The counterpart is a 2010-era server. Such servers do not sign small
    /// zip entries or zip payloads the way newer ones do, and cap zip
    /// sub-chunks at 1 MiB instead of 3 MiB.
    pub legacy_server: bool,
    /// Run chunk verification at the end of every tree build.
    pub verify_on_build: bool,
    /// RDC boundary filter parameters.
    pub rdc: RdcParameters,
}

impl Default for ChunkingContext {
    fn default() -> Self {
        Self {
            minor_version: 2,
            legacy_server: false,
            verify_on_build: false,
            rdc: RdcParameters::default(),
        }
    }
}

impl ChunkingContext {
    /// Sets the negotiated minor version.
    pub fn with_minor_version(mut self, minor_version: u16) -> Self {
        self.minor_version = minor_version;
        self
    }

    /// Marks the counterpart as a 2010-era server.
    pub fn with_legacy_server(mut self, legacy_server: bool) -> Self {
        self.legacy_server = legacy_server;
        self
    }

    /// Enables verification after every build.
    pub fn with_verification(mut self, verify_on_build: bool) -> Self {
        self.verify_on_build = verify_on_build;
        self
    }

    /// Overrides the RDC parameters.
    pub fn with_rdc(mut self, rdc: RdcParameters) -> Self {
        self.rdc = rdc;
        self
    }

    /// Small zip entries are signed with `SHA1(header) XOR data-file-signature`
    /// from minor version 2 on, and with the concatenation before that.
    #[inline]
    #[must_use]
    pub const fn xor_single_chunk_signature(&self) -> bool {
        self.minor_version >= 2
    }

    /// Counterparts at minor version 2 or later always RDC-chunk non-zip content.
    #[inline]
    #[must_use]
    pub const fn always_rdc(&self) -> bool {
        self.minor_version >= 2
    }
}
