//! crates/fsshttpd/src/node.rs
//!
//! The node tree that represents chunked file content.
//!
//! An [`IntermediateNodeObject`] is the root: its content is the concatenation
//! of its ordered children. Each [`LeafNodeObject`] either carries a
//! [`DataNodeObjectData`] with the raw bytes of one chunk, or is itself a
//! branch with ordered children. [`LeafPayload`] makes the two cases mutually
//! exclusive, so a leaf with both or neither cannot be constructed.
//!
//! Nodes are immutable once built. Declared sizes come from the producer of
//! the tree and may disagree with the actual content; [`LeafNodeObject::check_sizes`]
//! and [`IntermediateNodeObject::check_sizes`] report the first disagreement.

use fsshttpb::stream::{next_is, peek_object_type, read_compound, write_compound};
use fsshttpb::{ByteCursor, ExGuid, ParseError, StreamObjectType};

use crate::error::ChunkingError;
use crate::signature::{DataHashObject, DataSizeObject, SignatureObject};

/// Raw bytes of one chunk together with the identifier of the data node object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataNodeObjectData {
    ex_guid: ExGuid,
    data: Vec<u8>,
}

impl DataNodeObjectData {
    /// Wraps chunk bytes.
    #[must_use]
    pub const fn new(ex_guid: ExGuid, data: Vec<u8>) -> Self {
        Self { ex_guid, data }
    }

    /// Identifier of the data node object.
    #[inline]
    #[must_use]
    pub const fn ex_guid(&self) -> ExGuid {
        self.ex_guid
    }

    /// Chunk bytes.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// What a leaf node carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeafPayload {
    /// A single chunk of bytes.
    Data(DataNodeObjectData),
    /// Ordered child nodes whose contents concatenate to this node's content.
    Children(Vec<LeafNodeObject>),
}

/// A chunk, or a branch of chunks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafNodeObject {
    ex_guid: ExGuid,
    signature: SignatureObject,
    data_size: DataSizeObject,
    data_hash: Option<DataHashObject>,
    payload: LeafPayload,
}

impl LeafNodeObject {
    /// Leaf carrying `data` directly. The declared size is the data length.
    #[must_use]
    pub fn with_data(
        ex_guid: ExGuid,
        data_ex_guid: ExGuid,
        data: Vec<u8>,
        signature: SignatureObject,
    ) -> Self {
        Self {
            ex_guid,
            signature,
            data_size: DataSizeObject(data.len() as u64),
            data_hash: None,
            payload: LeafPayload::Data(DataNodeObjectData::new(data_ex_guid, data)),
        }
    }

    /// Branch leaf over `children`. The declared size is the sum of the
    /// children's declared sizes.
    #[must_use]
    pub fn with_children(
        ex_guid: ExGuid,
        signature: SignatureObject,
        children: Vec<Self>,
    ) -> Self {
        let size = children.iter().map(Self::data_size).sum();
        Self {
            ex_guid,
            signature,
            data_size: DataSizeObject(size),
            data_hash: None,
            payload: LeafPayload::Children(children),
        }
    }

    /// Leaf with every field supplied by the caller, as decoded from a peer.
    #[must_use]
    pub const fn from_raw_parts(
        ex_guid: ExGuid,
        signature: SignatureObject,
        data_size: DataSizeObject,
        data_hash: Option<DataHashObject>,
        payload: LeafPayload,
    ) -> Self {
        Self {
            ex_guid,
            signature,
            data_size,
            data_hash,
            payload,
        }
    }

    /// Identifier of this node.
    #[inline]
    #[must_use]
    pub const fn ex_guid(&self) -> ExGuid {
        self.ex_guid
    }

    /// Signature of this node.
    #[inline]
    #[must_use]
    pub const fn signature(&self) -> &SignatureObject {
        &self.signature
    }

    /// Declared size in bytes.
    #[inline]
    #[must_use]
    pub const fn data_size(&self) -> u64 {
        self.data_size.0
    }

    /// Optional data hash.
    #[inline]
    #[must_use]
    pub const fn data_hash(&self) -> Option<DataHashObject> {
        self.data_hash
    }

    /// What this leaf carries.
    #[inline]
    #[must_use]
    pub const fn payload(&self) -> &LeafPayload {
        &self.payload
    }

    /// The data node, when this leaf carries bytes directly.
    #[must_use]
    pub const fn data_node(&self) -> Option<&DataNodeObjectData> {
        match &self.payload {
            LeafPayload::Data(data) => Some(data),
            LeafPayload::Children(_) => None,
        }
    }

    /// The children, when this leaf is a branch.
    #[must_use]
    pub fn children(&self) -> Option<&[Self]> {
        match &self.payload {
            LeafPayload::Data(_) => None,
            LeafPayload::Children(children) => Some(children),
        }
    }

    /// Flattens this node back into the bytes it represents.
    #[must_use]
    pub fn content(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(usize::try_from(self.data_size()).unwrap_or(0));
        self.append_content(&mut out);
        out
    }

    /// Actual number of bytes this node represents.
    #[must_use]
    pub fn content_len(&self) -> u64 {
        match &self.payload {
            LeafPayload::Data(data) => data.data.len() as u64,
            LeafPayload::Children(children) => children.iter().map(Self::content_len).sum(),
        }
    }

    pub(crate) fn append_content(&self, out: &mut Vec<u8>) {
        match &self.payload {
            LeafPayload::Data(data) => out.extend_from_slice(&data.data),
            LeafPayload::Children(children) => {
                for child in children {
                    child.append_content(out);
                }
            }
        }
    }

    /// Checks, depth first, that every declared size equals the actual
    /// content length.
    pub fn check_sizes(&self) -> Result<(), ChunkingError> {
        if let LeafPayload::Children(children) = &self.payload {
            for child in children {
                child.check_sizes()?;
            }
        }
        let actual = self.content_len();
        if self.data_size() == actual {
            Ok(())
        } else {
            Err(ChunkingError::SizeMismatch {
                context: "leaf node data size",
                expected: actual,
                actual: self.data_size(),
            })
        }
    }

    /// Serializes the node header: signature, data size and optional data hash.
    /// Children and data are referenced separately by the object group.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.signature.len() + 24);
        write_compound(&mut out, StreamObjectType::LeafNodeObject, &[], |body| {
            self.signature.encode_to(body);
            self.data_size.encode_to(body);
            if let Some(hash) = self.data_hash {
                hash.encode_to(body);
            }
        });
        out
    }
}

/// Root of a node tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntermediateNodeObject {
    ex_guid: ExGuid,
    signature: SignatureObject,
    data_size: DataSizeObject,
    children: Vec<LeafNodeObject>,
}

impl IntermediateNodeObject {
    /// Root over `children` with an empty signature. The declared size is the
    /// sum of the children's declared sizes.
    #[must_use]
    pub fn new(ex_guid: ExGuid, children: Vec<LeafNodeObject>) -> Self {
        let size = children.iter().map(LeafNodeObject::data_size).sum();
        Self {
            ex_guid,
            signature: SignatureObject::default(),
            data_size: DataSizeObject(size),
            children,
        }
    }

    /// Root with every field supplied by the caller.
    #[must_use]
    pub const fn from_raw_parts(
        ex_guid: ExGuid,
        signature: SignatureObject,
        data_size: DataSizeObject,
        children: Vec<LeafNodeObject>,
    ) -> Self {
        Self {
            ex_guid,
            signature,
            data_size,
            children,
        }
    }

    /// Identifier of the root.
    #[inline]
    #[must_use]
    pub const fn ex_guid(&self) -> ExGuid {
        self.ex_guid
    }

    /// Signature of the root.
    #[inline]
    #[must_use]
    pub const fn signature(&self) -> &SignatureObject {
        &self.signature
    }

    /// Declared size in bytes.
    #[inline]
    #[must_use]
    pub const fn data_size(&self) -> u64 {
        self.data_size.0
    }

    /// Ordered children.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[LeafNodeObject] {
        &self.children
    }

    /// Consumes the root and returns its children.
    #[must_use]
    pub fn into_children(self) -> Vec<LeafNodeObject> {
        self.children
    }

    /// Reports whether this root wraps a lone leaf that shares its
    /// identifier, as produced when a peer sends a leaf where a root was
    /// expected.
    #[must_use]
    pub fn is_synthesized(&self) -> bool {
        matches!(self.children.as_slice(), [only] if only.ex_guid() == self.ex_guid)
    }

    /// Flattens the tree back into the bytes it represents.
    #[must_use]
    pub fn content(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(usize::try_from(self.data_size()).unwrap_or(0));
        for child in &self.children {
            child.append_content(&mut out);
        }
        out
    }

    /// Actual number of bytes the tree represents.
    #[must_use]
    pub fn content_len(&self) -> u64 {
        self.children.iter().map(LeafNodeObject::content_len).sum()
    }

    /// Checks the size invariant for the root and every descendant.
    pub fn check_sizes(&self) -> Result<(), ChunkingError> {
        for child in &self.children {
            child.check_sizes()?;
        }
        let actual = self.content_len();
        if self.data_size() == actual {
            Ok(())
        } else {
            Err(ChunkingError::SizeMismatch {
                context: "root node data size",
                expected: actual,
                actual: self.data_size(),
            })
        }
    }

    /// Serializes the node header: signature and data size.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.signature.len() + 16);
        write_compound(&mut out, StreamObjectType::IntermediateNodeObject, &[], |body| {
            self.signature.encode_to(body);
            self.data_size.encode_to(body);
        });
        out
    }
}

/// Decoded header of a serialized node object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeHeader {
    /// A leaf node object.
    Leaf {
        /// Signature.
        signature: SignatureObject,
        /// Declared size.
        data_size: DataSizeObject,
        /// Optional data hash.
        data_hash: Option<DataHashObject>,
    },
    /// An intermediate node object.
    Intermediate {
        /// Signature.
        signature: SignatureObject,
        /// Declared size.
        data_size: DataSizeObject,
    },
}

impl NodeHeader {
    /// Parses `bytes` as either node form. The bytes must hold exactly one
    /// node object; anything else is a parse error.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let mut cursor = ByteCursor::new(bytes);
        let header = match peek_object_type(&cursor)? {
            StreamObjectType::IntermediateNodeObject => read_compound(
                &mut cursor,
                StreamObjectType::IntermediateNodeObject,
                |_, body| {
                    Ok(Self::Intermediate {
                        signature: SignatureObject::decode(body)?,
                        data_size: DataSizeObject::decode(body)?,
                    })
                },
            )?,
            StreamObjectType::LeafNodeObject => {
                read_compound(&mut cursor, StreamObjectType::LeafNodeObject, |_, body| {
                    let signature = SignatureObject::decode(body)?;
                    let data_size = DataSizeObject::decode(body)?;
                    let data_hash = if next_is(body, StreamObjectType::DataHashObject) {
                        Some(DataHashObject::decode(body)?)
                    } else {
                        None
                    };
                    Ok(Self::Leaf {
                        signature,
                        data_size,
                        data_hash,
                    })
                })?
            }
            found => {
                return Err(ParseError::UnexpectedType {
                    offset: 0,
                    expected: StreamObjectType::LeafNodeObject,
                    found,
                });
            }
        };
        cursor.expect_end()?;
        Ok(header)
    }

    /// Declared size carried by either form.
    #[must_use]
    pub const fn data_size(&self) -> DataSizeObject {
        match self {
            Self::Leaf { data_size, .. } | Self::Intermediate { data_size, .. } => *data_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn id(value: u32) -> ExGuid {
        ExGuid::new(value, Uuid::from_u128(0xabc))
    }

    fn data_leaf(value: u32, bytes: &[u8]) -> LeafNodeObject {
        LeafNodeObject::with_data(
            id(value),
            id(value + 1000),
            bytes.to_vec(),
            SignatureObject::from(vec![value as u8]),
        )
    }

    #[test]
    fn content_concatenates_children_in_order() {
        let branch = LeafNodeObject::with_children(
            id(10),
            SignatureObject::default(),
            vec![data_leaf(1, b"ab"), data_leaf(2, b"cd")],
        );
        let root = IntermediateNodeObject::new(id(100), vec![branch, data_leaf(3, b"ef")]);
        assert_eq!(root.content(), b"abcdef");
        assert_eq!(root.data_size(), 6);
        assert_eq!(root.content_len(), 6);
        root.check_sizes().expect("consistent sizes");
    }

    #[test]
    fn payload_accessors_are_exclusive() {
        let leaf = data_leaf(1, b"x");
        assert!(leaf.data_node().is_some());
        assert!(leaf.children().is_none());

        let branch = LeafNodeObject::with_children(id(2), SignatureObject::default(), vec![leaf]);
        assert!(branch.data_node().is_none());
        assert_eq!(branch.children().map(<[_]>::len), Some(1));
    }

    #[test]
    fn size_check_reports_declared_and_actual() {
        let leaf = LeafNodeObject::from_raw_parts(
            id(1),
            SignatureObject::default(),
            DataSizeObject(5),
            None,
            LeafPayload::Data(DataNodeObjectData::new(id(2), b"abc".to_vec())),
        );
        assert!(matches!(
            leaf.check_sizes(),
            Err(ChunkingError::SizeMismatch {
                expected: 3,
                actual: 5,
                ..
            })
        ));
    }

    #[test]
    fn leaf_header_round_trips_through_node_header() {
        let leaf = LeafNodeObject::from_raw_parts(
            id(1),
            SignatureObject::from([7u8; 20]),
            DataSizeObject(42),
            Some(DataHashObject(9)),
            LeafPayload::Children(Vec::new()),
        );
        assert_eq!(
            NodeHeader::parse(&leaf.to_bytes()),
            Ok(NodeHeader::Leaf {
                signature: SignatureObject::from([7u8; 20]),
                data_size: DataSizeObject(42),
                data_hash: Some(DataHashObject(9)),
            })
        );
    }

    #[test]
    fn intermediate_header_is_distinguished_from_leaf() {
        let root = IntermediateNodeObject::new(id(1), vec![data_leaf(2, b"abc")]);
        let header = NodeHeader::parse(&root.to_bytes()).expect("parse");
        assert_eq!(
            header,
            NodeHeader::Intermediate {
                signature: SignatureObject::default(),
                data_size: DataSizeObject(3),
            }
        );
        assert_eq!(header.data_size(), DataSizeObject(3));
    }

    #[test]
    fn other_stream_objects_are_not_node_headers() {
        let mut bytes = Vec::new();
        DataSizeObject(1).encode_to(&mut bytes);
        assert!(matches!(
            NodeHeader::parse(&bytes),
            Err(ParseError::UnexpectedType {
                found: StreamObjectType::DataSizeObject,
                ..
            })
        ));
    }

    #[test]
    fn trailing_bytes_after_node_are_rejected() {
        let mut bytes = data_leaf(1, b"x").to_bytes();
        bytes.push(0);
        assert!(matches!(
            NodeHeader::parse(&bytes),
            Err(ParseError::TrailingBytes { .. })
        ));
    }

    #[test]
    fn synthesized_root_shares_identifier_with_its_leaf() {
        let leaf = data_leaf(5, b"solo");
        let root = IntermediateNodeObject::new(leaf.ex_guid(), vec![leaf]);
        assert!(root.is_synthesized());
        let normal = IntermediateNodeObject::new(id(99), vec![data_leaf(5, b"solo")]);
        assert!(!normal.is_synthesized());
    }
}
