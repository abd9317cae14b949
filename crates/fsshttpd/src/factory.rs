//! crates/fsshttpd/src/factory.rs
//!
//! Strategy selection.
//!
//! Forward direction: an explicit [`ChunkingMethod`] always wins; otherwise
//! content that opens with a zip local file header is zip-chunked and
//! everything else is RDC-chunked.
//!
//! Reverse direction, for a tree received from a peer: editors tables are not
//! chunked file content and get no strategy. Zip content is zip-chunked.
//! Peers at minor version 2 or later always RDC-chunk the rest. Older peers
//! picked between simple and RDC chunking by rules they never published, so
//! the received layout is compared with what simple chunking would produce
//! and RDC is assumed when it differs.

use tracing::instrument;

use crate::chunking::{
    Chunking, ChunkingMethod, RdcAnalysisChunking, SimpleChunking, ZipFilesChunking,
    is_zip_local_file_header,
};
use crate::context::ChunkingContext;
use crate::error::ChunkingError;
use crate::node::IntermediateNodeObject;

/// Leading bytes of an editors table.
pub const EDITORS_TABLE_HEADER: [u8; 8] = [0x1A, 0x5A, 0x3A, 0x30, 0x00, 0x00, 0x00, 0x00];

/// Picks and instantiates chunking strategies.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChunkingFactory;

impl ChunkingFactory {
    /// Strategy for fresh content: zip when it opens with a local file
    /// header, RDC otherwise.
    #[must_use]
    pub fn detect_method(content: &[u8]) -> ChunkingMethod {
        if is_zip_local_file_header(content, 0) {
            ChunkingMethod::ZipAlgorithm
        } else {
            ChunkingMethod::RdcAnalysis
        }
    }

    /// Reports whether `content` is an editors table.
    #[must_use]
    pub fn is_editors_table(content: &[u8]) -> bool {
        content.starts_with(&EDITORS_TABLE_HEADER)
    }

    /// Instantiates the strategy for fresh content.
    pub fn create(
        content: &[u8],
        ctx: &ChunkingContext,
    ) -> Result<Box<dyn Chunking>, ChunkingError> {
        Self::create_with_method(Self::detect_method(content), ctx)
    }

    /// Instantiates `method` regardless of content.
    pub fn create_with_method(
        method: ChunkingMethod,
        ctx: &ChunkingContext,
    ) -> Result<Box<dyn Chunking>, ChunkingError> {
        logging::trace_chunk!(%method, "selected chunking strategy");
        Ok(match method {
            ChunkingMethod::RdcAnalysis => Box::new(RdcAnalysisChunking::new(ctx.rdc)?),
            ChunkingMethod::SimpleAlgorithm => Box::new(SimpleChunking::new()),
            ChunkingMethod::ZipAlgorithm => Box::new(ZipFilesChunking::new(ctx)),
        })
    }

    /// Strategy a peer used to produce `root`, or `None` when the content is
    /// not chunked file content.
    #[instrument(level = "debug", skip_all, fields(size = root.data_size()))]
    pub fn method_for_root(
        root: &IntermediateNodeObject,
        ctx: &ChunkingContext,
    ) -> Option<ChunkingMethod> {
        let content = root.content();
        if Self::is_editors_table(&content) {
            logging::trace_verify!("editors table, no chunking applies");
            return None;
        }
        if is_zip_local_file_header(&content, 0) {
            return Some(ChunkingMethod::ZipAlgorithm);
        }
        if ctx.always_rdc() {
            return Some(ChunkingMethod::RdcAnalysis);
        }
        if SimpleChunking::matches_layout(root) {
            logging::trace_verify!("received layout matches simple chunking");
            Some(ChunkingMethod::SimpleAlgorithm)
        } else {
            logging::trace_verify!("received layout differs from simple chunking, assuming rdc");
            Some(ChunkingMethod::RdcAnalysis)
        }
    }

    /// Instantiates the strategy a peer used to produce `root`.
    pub fn for_root(
        root: &IntermediateNodeObject,
        ctx: &ChunkingContext,
    ) -> Result<Option<Box<dyn Chunking>>, ChunkingError> {
        Self::method_for_root(root, ctx)
            .map(|method| Self::create_with_method(method, ctx))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::{SIMPLE_BLOCK_SIZE, ZIP_LOCAL_FILE_HEADER_MAGIC};
    use crate::node::LeafNodeObject;
    use crate::signature::SignatureObject;
    use fsshttpb::{ExGuid, ExGuidGenerator};
    use uuid::Uuid;

    fn single_leaf_root(content: Vec<u8>) -> IntermediateNodeObject {
        let leaf = LeafNodeObject::with_data(
            ExGuid::new(1, Uuid::nil()),
            ExGuid::new(2, Uuid::nil()),
            content,
            SignatureObject::default(),
        );
        IntermediateNodeObject::new(ExGuid::new(3, Uuid::nil()), vec![leaf])
    }

    #[test]
    fn zip_magic_selects_zip() {
        let mut content = ZIP_LOCAL_FILE_HEADER_MAGIC.to_vec();
        content.extend_from_slice(&[0; 40]);
        assert_eq!(ChunkingFactory::detect_method(&content), ChunkingMethod::ZipAlgorithm);
        assert_eq!(ChunkingFactory::detect_method(b"PK\x05\x06"), ChunkingMethod::RdcAnalysis);
        assert_eq!(ChunkingFactory::detect_method(&[]), ChunkingMethod::RdcAnalysis);
    }

    #[test]
    fn explicit_method_is_always_honoured() {
        let ctx = ChunkingContext::default();
        for method in ChunkingMethod::ALL {
            let strategy = ChunkingFactory::create_with_method(method, &ctx).expect("create");
            assert_eq!(strategy.method(), method);
        }
    }

    #[test]
    fn editors_table_is_not_chunked() {
        let mut content = EDITORS_TABLE_HEADER.to_vec();
        content.extend_from_slice(b"<editors/>");
        let root = single_leaf_root(content);
        assert_eq!(
            ChunkingFactory::method_for_root(&root, &ChunkingContext::default()),
            None
        );
        assert!(
            ChunkingFactory::for_root(&root, &ChunkingContext::default())
                .expect("for_root")
                .is_none()
        );
    }

    #[test]
    fn current_peers_always_use_rdc() {
        let root = single_leaf_root(b"plain".to_vec());
        assert_eq!(
            ChunkingFactory::method_for_root(&root, &ChunkingContext::default()),
            Some(ChunkingMethod::RdcAnalysis)
        );
    }

    #[test]
    fn legacy_peers_are_checked_against_simple_layout() {
        let ctx = ChunkingContext::default().with_minor_version(1);
        let content = vec![0x42; SIMPLE_BLOCK_SIZE + 3];
        let leaves = SimpleChunking
            .chunk(&content, &mut ExGuidGenerator::with_guid(Uuid::nil()))
            .expect("chunk");
        let simple_root = IntermediateNodeObject::new(ExGuid::new(99, Uuid::nil()), leaves);
        assert_eq!(
            ChunkingFactory::method_for_root(&simple_root, &ctx),
            Some(ChunkingMethod::SimpleAlgorithm)
        );

        let one_big_leaf = single_leaf_root(content);
        assert_eq!(
            ChunkingFactory::method_for_root(&one_big_leaf, &ctx),
            Some(ChunkingMethod::RdcAnalysis)
        );
    }
}
