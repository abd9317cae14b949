//! Fixed-size chunking.

use std::ops::Range;

use checksums::strong::Sha1;
use fsshttpb::ExGuidGenerator;
use tracing::instrument;

use super::{Chunking, ChunkingMethod, compare_leaves, leaves_from_ranges};
use crate::context::ChunkingContext;
use crate::error::ChunkingError;
use crate::node::{IntermediateNodeObject, LeafNodeObject};
use crate::signature::SignatureObject;

/// Size of every block except possibly the last.
pub const SIMPLE_BLOCK_SIZE: usize = 1024 * 1024;

/// Largest file whose simple chunking can be verified.
pub const SIMPLE_VERIFY_LIMIT: u64 = 250 * 1024 * 1024;

/// Splits content into consecutive 1 MiB blocks signed with SHA-1.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleChunking;

impl SimpleChunking {
    /// Creates the strategy.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Block ranges for content of `len` bytes. Content up to one block,
    /// including empty content, is a single chunk.
    #[must_use]
    pub fn chunk_ranges(len: usize) -> Vec<Range<usize>> {
        if len <= SIMPLE_BLOCK_SIZE {
            return vec![0..len];
        }
        (0..len)
            .step_by(SIMPLE_BLOCK_SIZE)
            .map(|start| start..len.min(start + SIMPLE_BLOCK_SIZE))
            .collect()
    }

    /// Reports whether the tree has exactly the chunk count and chunk sizes
    /// simple chunking would produce for its content. Signatures are not
    /// compared.
    #[must_use]
    pub fn matches_layout(root: &IntermediateNodeObject) -> bool {
        let Ok(len) = usize::try_from(root.content_len()) else {
            return false;
        };
        let expected = Self::chunk_ranges(len);
        expected.len() == root.children().len()
            && expected
                .iter()
                .zip(root.children())
                .all(|(range, leaf)| leaf.data_size() == range.len() as u64)
    }

    fn sign(bytes: &[u8]) -> SignatureObject {
        SignatureObject::from(Sha1::digest(bytes))
    }
}

impl Chunking for SimpleChunking {
    fn method(&self) -> ChunkingMethod {
        ChunkingMethod::SimpleAlgorithm
    }

    #[instrument(level = "debug", skip_all, fields(len = content.len()))]
    fn chunk(
        &self,
        content: &[u8],
        ids: &mut ExGuidGenerator,
    ) -> Result<Vec<LeafNodeObject>, ChunkingError> {
        let leaves = leaves_from_ranges(content, Self::chunk_ranges(content.len()), ids, |bytes| {
            Ok(Self::sign(bytes))
        })?;
        logging::trace_chunk!(method = "simple", chunks = leaves.len(), "chunked content");
        Ok(leaves)
    }

    #[instrument(level = "debug", skip_all, fields(size = root.data_size()))]
    fn analyze(
        &self,
        root: &IntermediateNodeObject,
        _ctx: &ChunkingContext,
    ) -> Result<(), ChunkingError> {
        let total = root.content_len();
        if total != root.data_size() {
            return Err(ChunkingError::SizeMismatch {
                context: "file size",
                expected: total,
                actual: root.data_size(),
            });
        }
        if total <= SIMPLE_BLOCK_SIZE as u64 {
            logging::trace_verify!(size = total, "single block content carries no checked signature");
            return Ok(());
        }
        check_verify_limit(total)?;
        for (index, leaf) in root.children().iter().enumerate() {
            if leaf.data_size() > SIMPLE_BLOCK_SIZE as u64 {
                return Err(ChunkingError::ChunkTooLarge {
                    index,
                    size: leaf.data_size(),
                    limit: SIMPLE_BLOCK_SIZE as u64,
                });
            }
        }
        let content = root.content();
        compare_leaves(
            root.children(),
            &content,
            &Self::chunk_ranges(content.len()),
            Self::sign,
        )?;
        logging::trace_verify!(method = "simple", chunks = root.children().len(), "verified");
        Ok(())
    }
}

/// Sizes above [`SIMPLE_VERIFY_LIMIT`] have no defined signature check.
fn check_verify_limit(total: u64) -> Result<(), ChunkingError> {
    if total > SIMPLE_VERIFY_LIMIT {
        return Err(ChunkingError::NotImplemented {
            what: "simple chunking signatures for files larger than 250 MiB",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsshttpb::ExGuid;
    use uuid::Uuid;

    fn ids() -> ExGuidGenerator {
        ExGuidGenerator::with_guid(Uuid::from_u128(7))
    }

    fn root_of(leaves: Vec<LeafNodeObject>) -> IntermediateNodeObject {
        IntermediateNodeObject::new(ExGuid::new(999, Uuid::from_u128(7)), leaves)
    }

    #[test]
    fn ranges_at_block_boundary() {
        assert_eq!(SimpleChunking::chunk_ranges(0), vec![0..0]);
        assert_eq!(
            SimpleChunking::chunk_ranges(SIMPLE_BLOCK_SIZE),
            vec![0..SIMPLE_BLOCK_SIZE]
        );
        assert_eq!(
            SimpleChunking::chunk_ranges(SIMPLE_BLOCK_SIZE + 1),
            vec![0..SIMPLE_BLOCK_SIZE, SIMPLE_BLOCK_SIZE..SIMPLE_BLOCK_SIZE + 1]
        );
        assert_eq!(SimpleChunking::chunk_ranges(3 * SIMPLE_BLOCK_SIZE).len(), 3);
    }

    #[test]
    fn each_chunk_is_signed_with_sha1() {
        let content = vec![0x5a; SIMPLE_BLOCK_SIZE + 10];
        let leaves = SimpleChunking.chunk(&content, &mut ids()).expect("chunk");
        assert_eq!(leaves.len(), 2);
        assert_eq!(
            leaves[1].signature().as_bytes(),
            Sha1::digest(&content[SIMPLE_BLOCK_SIZE..])
        );
        assert_eq!(leaves[1].data_size(), 10);
    }

    #[test]
    fn small_files_skip_signature_checks() {
        let leaf = LeafNodeObject::with_data(
            ExGuid::new(1, Uuid::nil()),
            ExGuid::new(2, Uuid::nil()),
            b"tiny".to_vec(),
            SignatureObject::default(),
        );
        SimpleChunking
            .analyze(&root_of(vec![leaf]), &ChunkingContext::default())
            .expect("exempt");
    }

    #[test]
    fn verify_limit_is_inclusive() {
        check_verify_limit(SIMPLE_VERIFY_LIMIT).expect("at the limit");
        assert!(matches!(
            check_verify_limit(SIMPLE_VERIFY_LIMIT + 1),
            Err(ChunkingError::NotImplemented { .. })
        ));
    }

    #[test]
    fn content_past_verify_limit_is_not_implemented() {
        // Zeroed blocks are never read before the limit check fires.
        let mut ids = ids();
        let blocks = (SIMPLE_VERIFY_LIMIT / SIMPLE_BLOCK_SIZE as u64) as usize;
        let mut leaves: Vec<LeafNodeObject> = (0..blocks)
            .map(|_| {
                LeafNodeObject::with_data(
                    ids.next_ex_guid(),
                    ids.next_ex_guid(),
                    vec![0u8; SIMPLE_BLOCK_SIZE],
                    SignatureObject::default(),
                )
            })
            .collect();
        leaves.push(LeafNodeObject::with_data(
            ids.next_ex_guid(),
            ids.next_ex_guid(),
            vec![0u8; 1],
            SignatureObject::default(),
        ));
        let root = root_of(leaves);
        assert_eq!(root.content_len(), SIMPLE_VERIFY_LIMIT + 1);

        let err = SimpleChunking
            .analyze(&root, &ChunkingContext::default())
            .unwrap_err();
        assert!(matches!(err, ChunkingError::NotImplemented { .. }), "{err}");
    }

    #[test]
    fn tampered_signature_is_reported() {
        let content = vec![1u8; SIMPLE_BLOCK_SIZE + 1];
        let mut leaves = SimpleChunking.chunk(&content, &mut ids()).expect("chunk");
        let last = leaves.pop().expect("two chunks");
        leaves.push(LeafNodeObject::with_data(
            last.ex_guid(),
            ExGuid::new(77, Uuid::nil()),
            last.content(),
            SignatureObject::from([0u8; 20]),
        ));
        let err = SimpleChunking
            .analyze(&root_of(leaves), &ChunkingContext::default())
            .unwrap_err();
        assert!(matches!(err, ChunkingError::SignatureMismatch { .. }), "{err}");
    }

    #[test]
    fn oversized_chunk_is_reported() {
        let content = vec![2u8; SIMPLE_BLOCK_SIZE + 1];
        let leaf = LeafNodeObject::with_data(
            ExGuid::new(1, Uuid::nil()),
            ExGuid::new(2, Uuid::nil()),
            content,
            SignatureObject::default(),
        );
        assert!(matches!(
            SimpleChunking.analyze(&root_of(vec![leaf]), &ChunkingContext::default()),
            Err(ChunkingError::ChunkTooLarge { index: 0, .. })
        ));
    }

    #[test]
    fn layout_check_ignores_signatures() {
        let content = vec![3u8; 2 * SIMPLE_BLOCK_SIZE + 5];
        let leaves = SimpleChunking.chunk(&content, &mut ids()).expect("chunk");
        assert!(SimpleChunking::matches_layout(&root_of(leaves)));

        let uneven = vec![
            LeafNodeObject::with_data(
                ExGuid::new(1, Uuid::nil()),
                ExGuid::new(2, Uuid::nil()),
                vec![0; 10],
                SignatureObject::default(),
            ),
            LeafNodeObject::with_data(
                ExGuid::new(3, Uuid::nil()),
                ExGuid::new(4, Uuid::nil()),
                vec![0; SIMPLE_BLOCK_SIZE],
                SignatureObject::default(),
            ),
        ];
        assert!(!SimpleChunking::matches_layout(&root_of(uneven)));
    }
}
