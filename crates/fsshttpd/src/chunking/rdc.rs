//! Content-defined chunking with the RDC rolling hash.
//!
//! Every position is given the hash of the window of bytes ending at it.
//! A position is a boundary when its hash is strictly greater than every
//! other hash within `horizon` positions on both sides, so boundaries move
//! with the content rather than with offsets. Chunks are signed with MD4.

use std::ops::Range;

use checksums::RdcRollingHash;
use checksums::strong::Md4;
use fsshttpb::ExGuidGenerator;
use tracing::instrument;

use super::{Chunking, ChunkingMethod, compare_leaves, leaves_from_ranges};
use crate::context::{ChunkingContext, RdcParameters};
use crate::error::ChunkingError;
use crate::node::{IntermediateNodeObject, LeafNodeObject};
use crate::signature::SignatureObject;

/// Splits content at local maxima of the rolling hash.
#[derive(Clone, Copy, Debug)]
pub struct RdcAnalysisChunking {
    window: usize,
    horizon: usize,
}

impl RdcAnalysisChunking {
    /// Creates the strategy. The window must be non-empty; a horizon of zero
    /// is treated as one.
    pub fn new(params: RdcParameters) -> Result<Self, ChunkingError> {
        RdcRollingHash::new(params.window)?;
        Ok(Self {
            window: params.window,
            horizon: params.horizon.max(1),
        })
    }

    /// Rolling hash window in bytes.
    #[inline]
    #[must_use]
    pub const fn window(&self) -> usize {
        self.window
    }

    /// Local-maximum horizon in bytes.
    #[inline]
    #[must_use]
    pub const fn horizon(&self) -> usize {
        self.horizon
    }

    /// Positions after which a chunk ends, excluding the end of content.
    pub fn boundaries(&self, content: &[u8]) -> Result<Vec<usize>, ChunkingError> {
        let hashes = RdcRollingHash::window_hashes(content, self.window)?;
        let len = hashes.len();
        let previous = nearest_at_least(&hashes, Direction::Backward);
        let next = nearest_at_least(&hashes, Direction::Forward);

        let mut cuts = Vec::new();
        for index in self.horizon..len.saturating_sub(self.horizon) {
            let clear_before = previous[index].is_none_or(|at| index - at > self.horizon);
            let clear_after = next[index].is_none_or(|at| at - index > self.horizon);
            if clear_before && clear_after {
                cuts.push(index + 1);
            }
        }
        Ok(cuts)
    }

    /// Chunk ranges for `content`. Empty content is a single empty chunk.
    pub fn chunk_ranges(&self, content: &[u8]) -> Result<Vec<Range<usize>>, ChunkingError> {
        let cuts = self.boundaries(content)?;
        let mut ranges = Vec::with_capacity(cuts.len() + 1);
        let mut start = 0;
        for cut in cuts {
            ranges.push(start..cut);
            start = cut;
        }
        ranges.push(start..content.len());
        Ok(ranges)
    }

    fn sign(bytes: &[u8]) -> SignatureObject {
        SignatureObject::from(Md4::digest(bytes))
    }
}

impl Default for RdcAnalysisChunking {
    fn default() -> Self {
        let params = RdcParameters::default();
        Self {
            window: params.window,
            horizon: params.horizon,
        }
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Backward,
    Forward,
}

/// For every position, the nearest position in `direction` whose hash is at
/// least as large. Monotonic stack, linear time.
fn nearest_at_least(hashes: &[u32], direction: Direction) -> Vec<Option<usize>> {
    let mut result = vec![None; hashes.len()];
    let mut stack: Vec<usize> = Vec::new();
    let mut visit = |index: usize| {
        while stack.last().is_some_and(|&top| hashes[top] < hashes[index]) {
            stack.pop();
        }
        result[index] = stack.last().copied();
        stack.push(index);
    };
    match direction {
        Direction::Backward => (0..hashes.len()).for_each(&mut visit),
        Direction::Forward => (0..hashes.len()).rev().for_each(&mut visit),
    }
    result
}

impl Chunking for RdcAnalysisChunking {
    fn method(&self) -> ChunkingMethod {
        ChunkingMethod::RdcAnalysis
    }

    #[instrument(level = "debug", skip_all, fields(len = content.len(), horizon = self.horizon))]
    fn chunk(
        &self,
        content: &[u8],
        ids: &mut ExGuidGenerator,
    ) -> Result<Vec<LeafNodeObject>, ChunkingError> {
        let ranges = self.chunk_ranges(content)?;
        logging::trace_rdc!(boundaries = ranges.len().saturating_sub(1), "rdc boundaries");
        let leaves = leaves_from_ranges(content, ranges, ids, |bytes| Ok(Self::sign(bytes)))?;
        logging::trace_chunk!(method = "rdc", chunks = leaves.len(), "chunked content");
        Ok(leaves)
    }

    #[instrument(level = "debug", skip_all, fields(size = root.data_size()))]
    fn analyze(
        &self,
        root: &IntermediateNodeObject,
        _ctx: &ChunkingContext,
    ) -> Result<(), ChunkingError> {
        let content = root.content();
        if content.len() as u64 != root.data_size() {
            return Err(ChunkingError::SizeMismatch {
                context: "file size",
                expected: content.len() as u64,
                actual: root.data_size(),
            });
        }
        let expected = self.chunk_ranges(&content)?;
        compare_leaves(root.children(), &content, &expected, Self::sign)?;
        logging::trace_verify!(method = "rdc", chunks = expected.len(), "verified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsshttpb::ExGuid;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use uuid::Uuid;

    fn small() -> RdcAnalysisChunking {
        RdcAnalysisChunking::new(RdcParameters {
            window: 16,
            horizon: 64,
        })
        .expect("params")
    }

    fn random_bytes(seed: u64, len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        StdRng::seed_from_u64(seed).fill(&mut bytes[..]);
        bytes
    }

    #[test]
    fn empty_window_is_rejected() {
        assert!(matches!(
            RdcAnalysisChunking::new(RdcParameters {
                window: 0,
                horizon: 10
            }),
            Err(ChunkingError::Rolling(_))
        ));
    }

    #[test]
    fn nearest_at_least_matches_brute_force() {
        let hashes = [3, 1, 4, 1, 5, 9, 2, 6, 5, 3, 5];
        let backward = nearest_at_least(&hashes, Direction::Backward);
        let forward = nearest_at_least(&hashes, Direction::Forward);
        for index in 0..hashes.len() {
            let expected_back = (0..index).rev().find(|&j| hashes[j] >= hashes[index]);
            let expected_fwd = (index + 1..hashes.len()).find(|&j| hashes[j] >= hashes[index]);
            assert_eq!(backward[index], expected_back, "backward {index}");
            assert_eq!(forward[index], expected_fwd, "forward {index}");
        }
    }

    #[test]
    fn boundaries_are_strict_local_maxima() {
        let chunker = small();
        let content = random_bytes(1, 20_000);
        let hashes = RdcRollingHash::window_hashes(&content, 16).expect("hashes");
        let cuts = chunker.boundaries(&content).expect("boundaries");
        assert!(!cuts.is_empty());
        for cut in &cuts {
            let at = cut - 1;
            let lo = at - 64;
            let hi = at + 64;
            assert!((lo..=hi).filter(|&j| j != at).all(|j| hashes[j] < hashes[at]));
        }
        for pair in cuts.windows(2) {
            assert!(pair[1] - pair[0] > 64);
        }
    }

    #[test]
    fn boundaries_follow_content_not_offsets() {
        let chunker = small();
        let content = random_bytes(2, 20_000);
        let mut shifted = random_bytes(3, 333);
        shifted.extend_from_slice(&content);

        let stable_from = 64 + 16;
        let original: Vec<usize> = chunker
            .boundaries(&content)
            .expect("boundaries")
            .into_iter()
            .filter(|&cut| cut > stable_from)
            .collect();
        let moved: Vec<usize> = chunker
            .boundaries(&shifted)
            .expect("boundaries")
            .into_iter()
            .filter(|&cut| cut > 333 + stable_from)
            .map(|cut| cut - 333)
            .collect();
        assert_eq!(original, moved);
    }

    #[test]
    fn empty_and_short_content_is_one_chunk() {
        let chunker = small();
        assert_eq!(chunker.chunk_ranges(&[]).expect("ranges"), vec![0..0]);
        assert_eq!(chunker.chunk_ranges(&[1; 100]).expect("ranges"), vec![0..100]);
    }

    #[test]
    fn analysis_accepts_own_chunking_and_rejects_other_horizons() {
        let chunker = small();
        let content = random_bytes(4, 50_000);
        let mut ids = ExGuidGenerator::with_guid(Uuid::from_u128(4));
        let leaves = chunker.chunk(&content, &mut ids).expect("chunk");
        assert!(leaves.len() > 1);
        for leaf in &leaves {
            assert_eq!(leaf.signature().as_bytes(), Md4::digest(&leaf.content()));
        }
        let root = IntermediateNodeObject::new(ExGuid::new(0, Uuid::from_u128(4)), leaves);
        let ctx = ChunkingContext::default();
        chunker.analyze(&root, &ctx).expect("verified");

        let wider = RdcAnalysisChunking::new(RdcParameters {
            window: 16,
            horizon: 4_096,
        })
        .expect("params");
        assert!(wider.analyze(&root, &ctx).is_err());
    }
}
