use checksums::RollingError;
use fsshttpb::{ExGuid, ParseError};
use thiserror::Error;

use crate::signature::SignatureObject;

/// Errors raised while chunking content, rebuilding node trees, or verifying
/// a received chunking.
///
/// None of these are retryable: each one means the input is malformed or the
/// producer of a tree used a different algorithm.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Serialized bytes could not be decoded.
    #[error("failed to parse stream object: {0}")]
    Parse(#[from] ParseError),

    /// RDC parameters were rejected by the rolling hash.
    #[error("invalid RDC parameters: {0}")]
    Rolling(#[from] RollingError),

    /// A referenced object is not declared in any object group.
    #[error("object {ex_guid} is not declared in any object group")]
    ObjectNotFound {
        /// The missing identifier.
        ex_guid: ExGuid,
    },

    /// The same object is declared twice across the object groups.
    #[error("object {ex_guid} is declared more than once")]
    DuplicateObject {
        /// The repeated identifier.
        ex_guid: ExGuid,
    },

    /// Following object references leads back to an object being built.
    #[error("object {ex_guid} is reachable from its own descendants")]
    CyclicReference {
        /// The identifier reached twice.
        ex_guid: ExGuid,
    },

    /// An object is referenced from more than one place in the tree.
    #[error("object {ex_guid} is referenced more than once")]
    SharedReference {
        /// The identifier reached twice.
        ex_guid: ExGuid,
    },

    /// An object declaration disagrees with the object data it declares.
    #[error("object {ex_guid} declares {field} {declared}, but its data has {actual}")]
    DeclarationMismatch {
        /// The declared object.
        ex_guid: ExGuid,
        /// Which declaration field disagrees.
        field: &'static str,
        /// Value in the declaration.
        declared: u64,
        /// Value derived from the object data.
        actual: u64,
    },

    /// A leaf node object references neither a data node nor children.
    #[error("leaf node {ex_guid} references no objects")]
    MissingReferences {
        /// The leaf node's identifier.
        ex_guid: ExGuid,
    },

    /// No signature algorithm is defined for this case.
    #[error("not implemented: {what}")]
    NotImplemented {
        /// The unsupported case.
        what: &'static str,
    },

    /// A received signature differs from the re-derived one.
    #[error("{context}: expected signature {expected}, actual signature {actual}")]
    SignatureMismatch {
        /// Which chunk was being checked.
        context: &'static str,
        /// Re-derived signature.
        expected: SignatureObject,
        /// Received signature.
        actual: SignatureObject,
    },

    /// A received size differs from the re-derived one.
    #[error("{context}: expected {expected} bytes, actual {actual} bytes")]
    SizeMismatch {
        /// Which chunk or node was being checked.
        context: &'static str,
        /// Re-derived size.
        expected: u64,
        /// Received size.
        actual: u64,
    },

    /// The received tree has a different number of chunks.
    #[error("expected {expected} chunks, received {actual}")]
    ChunkCountMismatch {
        /// Re-derived chunk count.
        expected: usize,
        /// Received chunk count.
        actual: usize,
    },

    /// A received chunk exceeds the size its strategy allows.
    #[error("chunk {index} holds {size} bytes, more than the {limit}-byte limit")]
    ChunkTooLarge {
        /// Position of the chunk among its siblings.
        index: usize,
        /// Received size.
        size: u64,
        /// Allowed maximum.
        limit: u64,
    },

    /// A zip local file header or its payload runs past the end of the content.
    #[error("zip entry at offset {offset} extends past the end of the content")]
    TruncatedZipEntry {
        /// Offset of the local file header.
        offset: usize,
    },

    /// Zip chunking was requested for content with no local file header at offset 0.
    #[error("content does not start with a zip local file header")]
    NotZipContent,

    /// The node tree does not have the shape the operation requires.
    #[error("malformed node tree: {reason}")]
    MalformedTree {
        /// What was wrong.
        reason: &'static str,
    },
}
