//! crates/fsshttpd/src/chunking/zip.rs
//!
//! Zip-aware chunking.
//!
//! Content is walked from offset 0 one local file header at a time. Each
//! entry is split according to the combined size of its header and
//! compressed payload:
//!
//! | Entry size | Chunks |
//! |---|---|
//! | header + payload ≤ 4096 | one merged chunk |
//! | payload ≤ 1 MiB | header chunk, payload chunk |
//! | payload > 1 MiB | header chunk, 1 MiB sub-chunks |
//!
//! Whatever follows the last entry (central directory, end record) becomes
//! the final chunk, even when it is empty. Zip content is never decompressed;
//! only the header fields needed to find boundaries are read.

use std::ops::Range;

use checksums::strong::Sha1;
use fsshttpb::ExGuidGenerator;
use tracing::instrument;

use super::{Chunking, ChunkingMethod, data_leaf};
use crate::context::ChunkingContext;
use crate::error::ChunkingError;
use crate::node::{IntermediateNodeObject, LeafNodeObject, LeafPayload};
use crate::signature::SignatureObject;

/// Signature that opens every zip local file header.
pub const ZIP_LOCAL_FILE_HEADER_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Length of the fixed part of a local file header.
pub const ZIP_LOCAL_FILE_HEADER_LEN: usize = 30;

/// Entries whose header and payload fit in this many bytes become one chunk.
pub const ZIP_MERGE_LIMIT: usize = 4096;

/// Largest payload, sub-chunk or final chunk produced by zip chunking.
pub const ZIP_SUB_CHUNK_SIZE: usize = 1024 * 1024;

/// Sub-chunk size used by current servers when they split large payloads.
const CURRENT_SERVER_SUB_CHUNK_SIZE: u64 = 3 * 1024 * 1024;

/// Length of the synthesized data file signature.
const DATA_FILE_SIGNATURE_LEN: usize = 20;

/// Reports whether a local file header starts at `offset`.
#[must_use]
pub fn is_zip_local_file_header(content: &[u8], offset: usize) -> bool {
    offset
        .checked_add(ZIP_LOCAL_FILE_HEADER_MAGIC.len())
        .and_then(|end| content.get(offset..end))
        .is_some_and(|magic| magic == ZIP_LOCAL_FILE_HEADER_MAGIC)
}

/// Fields of a zip local file header that chunking depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalFileHeader {
    offset: usize,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    file_name_length: u16,
    extra_field_length: u16,
}

impl LocalFileHeader {
    /// Reads the header at `offset`. The whole header, including the file
    /// name and extra field, must lie within `content`; the payload need not.
    pub fn parse(content: &[u8], offset: usize) -> Result<Self, ChunkingError> {
        let truncated = ChunkingError::TruncatedZipEntry { offset };
        let fixed = offset
            .checked_add(ZIP_LOCAL_FILE_HEADER_LEN)
            .and_then(|end| content.get(offset..end))
            .ok_or(truncated)?;
        let u16_at = |at: usize| u16::from_le_bytes([fixed[at], fixed[at + 1]]);
        let u32_at =
            |at: usize| u32::from_le_bytes([fixed[at], fixed[at + 1], fixed[at + 2], fixed[at + 3]]);

        let header = Self {
            offset,
            crc32: u32_at(14),
            compressed_size: u32_at(18),
            uncompressed_size: u32_at(22),
            file_name_length: u16_at(26),
            extra_field_length: u16_at(28),
        };
        if offset + header.header_len() > content.len() {
            return Err(ChunkingError::TruncatedZipEntry { offset });
        }
        Ok(header)
    }

    /// Offset of the header within the content.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// CRC-32 of the uncompressed entry.
    #[inline]
    #[must_use]
    pub const fn crc32(&self) -> u32 {
        self.crc32
    }

    /// Size of the payload that follows the header.
    #[inline]
    #[must_use]
    pub const fn compressed_size(&self) -> u32 {
        self.compressed_size
    }

    /// Size of the entry once decompressed.
    #[inline]
    #[must_use]
    pub const fn uncompressed_size(&self) -> u32 {
        self.uncompressed_size
    }

    /// Header length: the fixed part, the file name and the extra field.
    #[must_use]
    pub const fn header_len(&self) -> usize {
        ZIP_LOCAL_FILE_HEADER_LEN + self.file_name_length as usize + self.extra_field_length as usize
    }

    /// Payload length in bytes.
    #[must_use]
    pub const fn payload_len(&self) -> usize {
        self.compressed_size as usize
    }

    /// CRC-32 (4 bytes), compressed size (8 bytes) and uncompressed size
    /// (8 bytes), each little-endian.
    #[must_use]
    pub fn data_file_signature(&self) -> [u8; DATA_FILE_SIGNATURE_LEN] {
        let mut out = [0u8; DATA_FILE_SIGNATURE_LEN];
        out[..4].copy_from_slice(&self.crc32.to_le_bytes());
        out[4..12].copy_from_slice(&u64::from(self.compressed_size).to_le_bytes());
        out[12..].copy_from_slice(&u64::from(self.uncompressed_size).to_le_bytes());
        out
    }
}

/// What a span of zip content holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZipSpanKind {
    /// Header and payload of a small entry.
    Merged(LocalFileHeader),
    /// A local file header on its own.
    Header(LocalFileHeader),
    /// The payload of the entry whose header precedes it.
    Payload(LocalFileHeader),
    /// One piece of a payload larger than 1 MiB.
    SubChunk,
    /// Everything after the last entry.
    Final,
}

/// A chunk boundary in zip content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZipSpan {
    /// What the bytes are.
    pub kind: ZipSpanKind,
    /// Where the bytes are.
    pub range: Range<usize>,
}

/// Chunk boundaries of zip content, computed without hashing anything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ZipChunkLayout {
    spans: Vec<ZipSpan>,
}

impl ZipChunkLayout {
    /// Walks the local file headers of `content`. Returns `None` when no
    /// header starts at offset 0.
    pub fn plan(content: &[u8]) -> Result<Option<Self>, ChunkingError> {
        let mut spans = Vec::new();
        let mut index = 0;
        while is_zip_local_file_header(content, index) {
            let header = LocalFileHeader::parse(content, index)?;
            let header_end = index + header.header_len();
            let payload_end = header_end
                .checked_add(header.payload_len())
                .filter(|&end| end <= content.len())
                .ok_or(ChunkingError::TruncatedZipEntry { offset: index })?;

            if header.header_len() + header.payload_len() <= ZIP_MERGE_LIMIT {
                spans.push(ZipSpan {
                    kind: ZipSpanKind::Merged(header),
                    range: index..payload_end,
                });
            } else {
                spans.push(ZipSpan {
                    kind: ZipSpanKind::Header(header),
                    range: index..header_end,
                });
                if header.payload_len() <= ZIP_SUB_CHUNK_SIZE {
                    spans.push(ZipSpan {
                        kind: ZipSpanKind::Payload(header),
                        range: header_end..payload_end,
                    });
                } else {
                    spans.extend((header_end..payload_end).step_by(ZIP_SUB_CHUNK_SIZE).map(
                        |start| ZipSpan {
                            kind: ZipSpanKind::SubChunk,
                            range: start..payload_end.min(start + ZIP_SUB_CHUNK_SIZE),
                        },
                    ));
                }
            }
            logging::trace_zip!(
                offset = index,
                header_len = header.header_len(),
                compressed = header.payload_len(),
                "zip entry"
            );
            index = payload_end;
        }

        if index == 0 {
            return Ok(None);
        }
        spans.push(ZipSpan {
            kind: ZipSpanKind::Final,
            range: index..content.len(),
        });
        Ok(Some(Self { spans }))
    }

    /// Spans in content order.
    #[must_use]
    pub fn spans(&self) -> &[ZipSpan] {
        &self.spans
    }

    /// Number of chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Reports whether the layout has no chunks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Chunks zip content along local file header boundaries.
#[derive(Clone, Copy, Debug)]
pub struct ZipFilesChunking {
    xor_single_chunk_signature: bool,
}

impl ZipFilesChunking {
    /// Creates the strategy for the negotiated session.
    #[must_use]
    pub const fn new(ctx: &ChunkingContext) -> Self {
        Self {
            xor_single_chunk_signature: ctx.xor_single_chunk_signature(),
        }
    }

    /// Chunks `content`, or returns `None` when it does not start with a
    /// local file header.
    #[instrument(level = "debug", skip_all, fields(len = content.len()))]
    pub fn chunk_entries(
        &self,
        content: &[u8],
        ids: &mut ExGuidGenerator,
    ) -> Result<Option<Vec<LeafNodeObject>>, ChunkingError> {
        let Some(layout) = ZipChunkLayout::plan(content)? else {
            return Ok(None);
        };
        let mut leaves = Vec::with_capacity(layout.len());
        for span in layout.spans() {
            let bytes = &content[span.range.clone()];
            let signature = match span.kind {
                ZipSpanKind::Merged(header) => {
                    self.single_chunk_signature(&bytes[..header.header_len()], &header)
                }
                ZipSpanKind::Header(_) => sha1_signature(bytes),
                ZipSpanKind::Payload(header) => SignatureObject::from(header.data_file_signature()),
                ZipSpanKind::SubChunk => {
                    return Err(ChunkingError::NotImplemented {
                        what: "signatures for zip sub-chunks",
                    });
                }
                ZipSpanKind::Final => final_chunk_signature(bytes)?,
            };
            leaves.push(data_leaf(ids, bytes, signature));
        }
        logging::trace_chunk!(method = "zip", chunks = leaves.len(), "chunked content");
        Ok(Some(leaves))
    }

    /// Signature of a merged entry: `SHA1(header) XOR data-file-signature`
    /// from minor version 2 on, `SHA1(header) ‖ data-file-signature` before.
    #[must_use]
    pub fn single_chunk_signature(
        &self,
        header_bytes: &[u8],
        header: &LocalFileHeader,
    ) -> SignatureObject {
        let digest = Sha1::digest(header_bytes);
        let data_file = header.data_file_signature();
        if self.xor_single_chunk_signature {
            let mut out = [0u8; DATA_FILE_SIGNATURE_LEN];
            for (slot, (a, b)) in out.iter_mut().zip(digest.iter().zip(data_file.iter())) {
                *slot = a ^ b;
            }
            SignatureObject::from(out)
        } else {
            let mut out = Vec::with_capacity(digest.len() + data_file.len());
            out.extend_from_slice(&digest);
            out.extend_from_slice(&data_file);
            SignatureObject::new(out)
        }
    }

    /// Checks the entry starting at `children[index]` and returns the index
    /// of the next one. Every version-dependent rule comes from `ctx`.
    fn analyze_entry(
        children: &[LeafNodeObject],
        index: usize,
        ctx: &ChunkingContext,
    ) -> Result<usize, ChunkingError> {
        let node = &children[index];
        let content = node.content();
        if !is_zip_local_file_header(&content, 0) {
            logging::trace_verify!(index, "chunk is not a zip entry, skipped");
            return Ok(index + 1);
        }
        let header = LocalFileHeader::parse(&content, 0)?;
        let header_bytes = &content[..header.header_len()];

        if header.header_len() + header.payload_len() <= ZIP_MERGE_LIMIT {
            if !ctx.legacy_server {
                expect_signature(
                    "zip single chunk",
                    &Self::new(ctx).single_chunk_signature(header_bytes, &header),
                    node.signature(),
                )?;
            }
            return Ok(index + 1);
        }

        expect_signature("zip header", &sha1_signature(header_bytes), node.signature())?;
        let payload = children.get(index + 1).ok_or(ChunkingError::MalformedTree {
            reason: "zip header chunk is not followed by its payload",
        })?;
        match payload.payload() {
            LeafPayload::Children(sub_chunks) => {
                check_sub_chunks(sub_chunks, header.payload_len() as u64, ctx)?;
            }
            LeafPayload::Data(_) => {
                let expected = header.payload_len() as u64;
                if payload.data_size() != expected {
                    return Err(ChunkingError::SizeMismatch {
                        context: "zip payload size",
                        expected,
                        actual: payload.data_size(),
                    });
                }
                if !ctx.legacy_server {
                    expect_signature(
                        "zip payload",
                        &SignatureObject::from(header.data_file_signature()),
                        payload.signature(),
                    )?;
                }
            }
        }
        Ok(index + 2)
    }
}

impl Chunking for ZipFilesChunking {
    fn method(&self) -> ChunkingMethod {
        ChunkingMethod::ZipAlgorithm
    }

    fn chunk(
        &self,
        content: &[u8],
        ids: &mut ExGuidGenerator,
    ) -> Result<Vec<LeafNodeObject>, ChunkingError> {
        self.chunk_entries(content, ids)?
            .ok_or(ChunkingError::NotZipContent)
    }

    #[instrument(level = "debug", skip_all, fields(size = root.data_size()))]
    fn analyze(
        &self,
        root: &IntermediateNodeObject,
        ctx: &ChunkingContext,
    ) -> Result<(), ChunkingError> {
        let children = root.children();
        let mut index = 0;
        while index < children.len() {
            if index + 1 == children.len() {
                let content = children[index].content();
                expect_signature(
                    "zip final chunk",
                    &final_chunk_signature(&content)?,
                    children[index].signature(),
                )?;
                break;
            }
            index = Self::analyze_entry(children, index, ctx)?;
        }
        logging::trace_verify!(method = "zip", chunks = children.len(), "verified");
        Ok(())
    }
}

fn sha1_signature(bytes: &[u8]) -> SignatureObject {
    SignatureObject::from(Sha1::digest(bytes))
}

fn final_chunk_signature(bytes: &[u8]) -> Result<SignatureObject, ChunkingError> {
    if bytes.len() > ZIP_SUB_CHUNK_SIZE {
        return Err(ChunkingError::NotImplemented {
            what: "signatures for zip final chunks larger than 1 MiB",
        });
    }
    Ok(sha1_signature(bytes))
}

fn expect_signature(
    context: &'static str,
    expected: &SignatureObject,
    actual: &SignatureObject,
) -> Result<(), ChunkingError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ChunkingError::SignatureMismatch {
            context,
            expected: expected.clone(),
            actual: actual.clone(),
        })
    }
}

/// Sub-chunks of a split payload are all `max` bytes except the last, which
/// may be shorter, and together cover the whole payload.
fn check_sub_chunks(
    sub_chunks: &[LeafNodeObject],
    compressed: u64,
    ctx: &ChunkingContext,
) -> Result<(), ChunkingError> {
    let max = if ctx.legacy_server {
        ZIP_SUB_CHUNK_SIZE as u64
    } else {
        CURRENT_SERVER_SUB_CHUNK_SIZE
    };
    let Some((last, rest)) = sub_chunks.split_last() else {
        return Err(ChunkingError::MalformedTree {
            reason: "zip payload branch has no sub-chunks",
        });
    };
    for sub_chunk in rest {
        if sub_chunk.data_size() != max {
            return Err(ChunkingError::SizeMismatch {
                context: "zip sub-chunk size",
                expected: max,
                actual: sub_chunk.data_size(),
            });
        }
    }
    if last.data_size() > max {
        return Err(ChunkingError::ChunkTooLarge {
            index: rest.len(),
            size: last.data_size(),
            limit: max,
        });
    }
    let total: u64 = sub_chunks.iter().map(LeafNodeObject::data_size).sum();
    if total != compressed {
        return Err(ChunkingError::SizeMismatch {
            context: "zip sub-chunk total",
            expected: compressed,
            actual: total,
        });
    }
    Ok(())
}
