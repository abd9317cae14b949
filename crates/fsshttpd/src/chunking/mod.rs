//! crates/fsshttpd/src/chunking/mod.rs
//!
//! Chunking strategies.
//!
//! A strategy splits a flat byte buffer into an ordered list of
//! [`LeafNodeObject`]s and, in the other direction, checks that a received
//! tree was chunked the way the strategy would have chunked the same content.
//! Three strategies exist:
//!
//! - [`SimpleChunking`]: fixed 1 MiB blocks signed with SHA-1.
//! - [`ZipFilesChunking`]: zip local file headers split from their payloads.
//! - [`RdcAnalysisChunking`]: content-defined boundaries from a rolling hash,
//!   signed with MD4.
//!
//! [`ChunkingFactory`](crate::ChunkingFactory) picks one for a buffer or a
//! received tree.

mod rdc;
mod simple;
mod zip;

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use fsshttpb::ExGuidGenerator;

use crate::context::ChunkingContext;
use crate::error::ChunkingError;
use crate::node::{IntermediateNodeObject, LeafNodeObject};
use crate::signature::SignatureObject;

pub use rdc::RdcAnalysisChunking;
pub use simple::{SIMPLE_BLOCK_SIZE, SIMPLE_VERIFY_LIMIT, SimpleChunking};
pub use zip::{
    LocalFileHeader, ZIP_LOCAL_FILE_HEADER_LEN, ZIP_LOCAL_FILE_HEADER_MAGIC, ZIP_MERGE_LIMIT,
    ZIP_SUB_CHUNK_SIZE, ZipChunkLayout, ZipFilesChunking, ZipSpan, ZipSpanKind,
    is_zip_local_file_header,
};

/// Identifies a chunking strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ChunkingMethod {
    /// Content-defined chunking with the RDC rolling hash.
    RdcAnalysis,
    /// Fixed-size 1 MiB blocks.
    SimpleAlgorithm,
    /// Zip-aware chunking.
    ZipAlgorithm,
}

impl ChunkingMethod {
    /// Every strategy.
    pub const ALL: [Self; 3] = [Self::RdcAnalysis, Self::SimpleAlgorithm, Self::ZipAlgorithm];

    /// Short name accepted on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RdcAnalysis => "rdc",
            Self::SimpleAlgorithm => "simple",
            Self::ZipAlgorithm => "zip",
        }
    }
}

impl fmt::Display for ChunkingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a chunking method name is not recognised.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown chunking method '{0}' (expected rdc, simple or zip)")]
pub struct ParseChunkingMethodError(String);

impl FromStr for ChunkingMethod {
    type Err = ParseChunkingMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rdc" | "rdc-analysis" => Ok(Self::RdcAnalysis),
            "simple" | "simple-algorithm" => Ok(Self::SimpleAlgorithm),
            "zip" | "zip-algorithm" => Ok(Self::ZipAlgorithm),
            _ => Err(ParseChunkingMethodError(s.to_owned())),
        }
    }
}

/// A chunking strategy.
///
/// Implementations are deterministic: the same content always yields the
/// same boundaries and signatures. Only the ExGuids drawn from the generator
/// differ between calls.
pub trait Chunking {
    /// Which strategy this is.
    fn method(&self) -> ChunkingMethod;

    /// Splits `content` into ordered leaves whose contents concatenate back
    /// to `content`.
    fn chunk(
        &self,
        content: &[u8],
        ids: &mut ExGuidGenerator,
    ) -> Result<Vec<LeafNodeObject>, ChunkingError>;

    /// Re-derives the chunking of the tree's flattened content and compares
    /// it with the tree. Returns the first disagreement.
    fn analyze(
        &self,
        root: &IntermediateNodeObject,
        ctx: &ChunkingContext,
    ) -> Result<(), ChunkingError>;
}

/// Wraps one chunk of bytes in a data leaf with fresh identifiers.
pub(crate) fn data_leaf(
    ids: &mut ExGuidGenerator,
    bytes: &[u8],
    signature: SignatureObject,
) -> LeafNodeObject {
    let leaf_id = ids.next_ex_guid();
    let data_id = ids.next_ex_guid();
    LeafNodeObject::with_data(leaf_id, data_id, bytes.to_vec(), signature)
}

/// Builds one data leaf per range of `content`.
pub(crate) fn leaves_from_ranges<I, F>(
    content: &[u8],
    ranges: I,
    ids: &mut ExGuidGenerator,
    mut sign: F,
) -> Result<Vec<LeafNodeObject>, ChunkingError>
where
    I: IntoIterator<Item = Range<usize>>,
    F: FnMut(&[u8]) -> Result<SignatureObject, ChunkingError>,
{
    let mut leaves = Vec::new();
    for range in ranges {
        let bytes = &content[range];
        let signature = sign(bytes)?;
        leaves.push(data_leaf(ids, bytes, signature));
    }
    Ok(leaves)
}

/// Compares re-derived chunk ranges and signatures with received leaves.
pub(crate) fn compare_leaves<F>(
    leaves: &[LeafNodeObject],
    content: &[u8],
    expected: &[Range<usize>],
    mut sign: F,
) -> Result<(), ChunkingError>
where
    F: FnMut(&[u8]) -> SignatureObject,
{
    if leaves.len() != expected.len() {
        return Err(ChunkingError::ChunkCountMismatch {
            expected: expected.len(),
            actual: leaves.len(),
        });
    }
    for (leaf, range) in leaves.iter().zip(expected) {
        let expected_size = range.len() as u64;
        if leaf.data_size() != expected_size {
            return Err(ChunkingError::SizeMismatch {
                context: "chunk size",
                expected: expected_size,
                actual: leaf.data_size(),
            });
        }
        let expected_signature = sign(&content[range.clone()]);
        if leaf.signature() != &expected_signature {
            return Err(ChunkingError::SignatureMismatch {
                context: "chunk signature",
                expected: expected_signature,
                actual: leaf.signature().clone(),
            });
        }
    }
    Ok(())
}
