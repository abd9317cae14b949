//! Flattening a node tree into object group data elements.
//!
//! The root gets a data element of its own that declares the root object and
//! references its children. Every leaf gets one data element: a leaf that
//! carries bytes declares its data node in the same element, and a branch
//! leaf references its children, each of which gets its own element in turn.
//! A synthesized root is not emitted; its lone leaf is declared under the
//! root's identifier instead.

use fsshttpb::{
    DataElementPackage, ExGuid, ExGuidGenerator, ObjectGroupDataElement, ObjectGroupObjectData,
    ObjectGroupObjectDeclare, SerialNumber,
};
use tracing::instrument;

use crate::error::ChunkingError;
use crate::node::{IntermediateNodeObject, LeafNodeObject, LeafPayload};

/// Partition that node and data objects are declared in.
pub const NODE_PARTITION_ID: u64 = 1;

/// Turns node trees into object groups ready for the wire.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjectGroupBuilder;

impl ObjectGroupBuilder {
    /// Flattens `root` into data elements. Data element identifiers are drawn
    /// from `ids`.
    ///
    /// A branch leaf with exactly one child cannot be told apart from a leaf
    /// carrying data once on the wire, so such trees are rejected.
    #[instrument(level = "debug", skip_all, fields(root = %root.ex_guid()))]
    pub fn build(
        root: &IntermediateNodeObject,
        ids: &mut ExGuidGenerator,
    ) -> Result<Vec<ObjectGroupDataElement>, ChunkingError> {
        let mut elements = Vec::new();
        if root.is_synthesized() {
            for leaf in root.children() {
                Self::push_leaf(leaf, ids, &mut elements)?;
            }
        } else {
            let mut element = Self::element(ids);
            Self::declare(
                &mut element,
                root.ex_guid(),
                root.children().iter().map(LeafNodeObject::ex_guid).collect(),
                root.to_bytes(),
            );
            elements.push(element);
            for leaf in root.children() {
                Self::push_leaf(leaf, ids, &mut elements)?;
            }
        }
        logging::trace_build!(elements = elements.len(), "flattened node tree");
        Ok(elements)
    }

    /// Flattens `root` into a data element package.
    pub fn to_package(
        root: &IntermediateNodeObject,
        ids: &mut ExGuidGenerator,
    ) -> Result<DataElementPackage, ChunkingError> {
        Ok(DataElementPackage {
            elements: Self::build(root, ids)?,
        })
    }

    fn push_leaf(
        leaf: &LeafNodeObject,
        ids: &mut ExGuidGenerator,
        elements: &mut Vec<ObjectGroupDataElement>,
    ) -> Result<(), ChunkingError> {
        let mut element = Self::element(ids);
        match leaf.payload() {
            LeafPayload::Data(data) => {
                Self::declare(&mut element, leaf.ex_guid(), vec![data.ex_guid()], leaf.to_bytes());
                Self::declare(&mut element, data.ex_guid(), Vec::new(), data.data().to_vec());
                elements.push(element);
            }
            LeafPayload::Children(children) => {
                if children.len() == 1 {
                    return Err(ChunkingError::MalformedTree {
                        reason: "a branch leaf with one child is indistinguishable from a data leaf",
                    });
                }
                Self::declare(
                    &mut element,
                    leaf.ex_guid(),
                    children.iter().map(LeafNodeObject::ex_guid).collect(),
                    leaf.to_bytes(),
                );
                elements.push(element);
                for child in children {
                    Self::push_leaf(child, ids, elements)?;
                }
            }
        }
        Ok(())
    }

    fn element(ids: &mut ExGuidGenerator) -> ObjectGroupDataElement {
        ObjectGroupDataElement {
            data_element_ex_guid: ids.next_ex_guid(),
            serial_number: SerialNumber::default(),
            declarations: Vec::new(),
            objects: Vec::new(),
        }
    }

    fn declare(
        element: &mut ObjectGroupDataElement,
        ex_guid: ExGuid,
        references: Vec<ExGuid>,
        data: Vec<u8>,
    ) {
        element.declarations.push(ObjectGroupObjectDeclare {
            ex_guid,
            partition_id: NODE_PARTITION_ID,
            data_size: data.len() as u64,
            object_references_count: references.len() as u64,
            cell_references_count: 0,
        });
        element.objects.push(ObjectGroupObjectData {
            object_ex_guids: references,
            cell_ids: Vec::new(),
            data,
        });
    }
}
