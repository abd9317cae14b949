#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `fsshttpd` splits file content into a tree of signed chunks and rebuilds
//! such trees from the object groups a peer sends, checking that the peer
//! chunked the content the way the negotiated protocol requires.
//!
//! # Design
//!
//! - [`node`] holds the tree: an [`IntermediateNodeObject`] root over ordered
//!   [`LeafNodeObject`]s, each carrying either bytes or further leaves.
//! - [`chunking`] implements the three strategies behind the [`Chunking`]
//!   trait, and [`ChunkingFactory`] picks one for fresh content or for a
//!   received tree.
//! - [`RootNodeObjectBuilder`] rebuilds trees from object groups through an
//!   ExGuid-keyed [`ObjectGroupArena`]; [`ObjectGroupBuilder`] goes the other
//!   way.
//! - Version-dependent behaviour is selected by an explicit
//!   [`ChunkingContext`] passed to every call.
//!
//! # Invariants
//!
//! - Chunking is deterministic and lossless: the leaves' contents concatenate
//!   back to the input.
//! - Every node produced by chunking declares the size of its content.
//! - Signature algorithms that are not defined fail with
//!   [`ChunkingError::NotImplemented`] instead of producing a guess.
//!
//! # Examples
//!
//! ```
//! use fsshttpb::ExGuidGenerator;
//! use fsshttpd::{ChunkingContext, ObjectGroupBuilder, RootNodeObjectBuilder};
//!
//! let ctx = ChunkingContext::default().with_verification(true);
//! let builder = RootNodeObjectBuilder::new(&ctx);
//! let mut ids = ExGuidGenerator::new();
//!
//! let root = builder.build_from_content(b"hello, chunks", &mut ids).unwrap();
//! let groups = ObjectGroupBuilder::build(&root, &mut ids).unwrap();
//! let rebuilt = builder.build(&groups, root.ex_guid()).unwrap();
//! assert_eq!(rebuilt.content(), b"hello, chunks");
//! ```

mod builder;
pub mod chunking;
mod context;
mod error;
mod factory;
pub mod node;
mod object_groups;
mod signature;

pub use builder::{ObjectGroupArena, RootNodeObjectBuilder};
pub use chunking::{
    Chunking, ChunkingMethod, ParseChunkingMethodError, RdcAnalysisChunking, SimpleChunking,
    ZipChunkLayout, ZipFilesChunking,
};
pub use context::{ChunkingContext, DEFAULT_RDC_HORIZON, RdcParameters};
pub use error::ChunkingError;
pub use factory::{ChunkingFactory, EDITORS_TABLE_HEADER};
pub use node::{DataNodeObjectData, IntermediateNodeObject, LeafNodeObject, LeafPayload, NodeHeader};
pub use object_groups::{NODE_PARTITION_ID, ObjectGroupBuilder};
pub use signature::{DataHashObject, DataSizeObject, SignatureObject};
