#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Digest primitives shared by the FSSHTTPD chunking strategies.
//!
//! Two families live here:
//!
//! - [`strong`] wraps the RustCrypto SHA-1 and MD4 implementations behind the
//!   [`strong::StrongDigest`] trait. Simple and zip chunking sign their chunks
//!   with SHA-1, RDC chunking signs with MD4.
//! - [`RdcRollingHash`] is the windowed rolling hash RDC chunking feeds into
//!   its boundary filter.
//!
//! ```
//! use checksums::strong::{Sha1, StrongDigest};
//!
//! let digest = Sha1::digest(b"abc");
//! assert_eq!(digest.len(), Sha1::DIGEST_LEN);
//! ```

mod rolling;
pub mod strong;

pub use rolling::{DEFAULT_RDC_WINDOW, RdcRollingHash, RollingError};
