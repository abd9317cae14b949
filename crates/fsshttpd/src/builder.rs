//! crates/fsshttpd/src/builder.rs
//!
//! Rebuilding node trees from object groups, and building them from content.
//!
//! The reverse path indexes every declared object once in an
//! [`ObjectGroupArena`] and then walks references from the root. Node
//! headers are parsed with [`NodeHeader::parse`], which yields a tagged
//! result instead of guessing types:
//!
//! - The root normally parses as an intermediate node whose references are
//!   its children. Some peers send a lone leaf instead; the builder then
//!   synthesizes a root with the leaf's identifier around it.
//! - A leaf that references exactly one object carries that object's bytes
//!   as its data. A leaf with more references is a branch over them.
//! - An intermediate node in a child position becomes a branch leaf.
//!
//! Every object is entered at most once. A second reference to the same
//! node or data node is an error, not a shared subtree.

use fsshttpb::{
    ExGuid, ExGuidGenerator, ObjectGroupDataElement, ObjectGroupObjectData,
    ObjectGroupObjectDeclare, ParseError,
};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::instrument;

use crate::chunking::ChunkingMethod;
use crate::context::ChunkingContext;
use crate::error::ChunkingError;
use crate::factory::ChunkingFactory;
use crate::node::{
    DataNodeObjectData, IntermediateNodeObject, LeafNodeObject, LeafPayload, NodeHeader,
};
use crate::signature::{DataSizeObject, SignatureObject};

/// Declared objects of a set of object groups, indexed by identifier.
#[derive(Debug, Default)]
pub struct ObjectGroupArena<'a> {
    objects: FxHashMap<ExGuid, &'a ObjectGroupObjectData>,
}

impl<'a> ObjectGroupArena<'a> {
    /// Indexes every object declared in `groups`.
    ///
    /// Each group must pair its declarations with its data one to one, and
    /// each declaration must agree with its data on size and reference
    /// counts. An identifier declared twice is an error.
    pub fn new(groups: &'a [ObjectGroupDataElement]) -> Result<Self, ChunkingError> {
        let mut objects = FxHashMap::default();
        for group in groups {
            if group.declarations.len() != group.objects.len() {
                return Err(ParseError::DeclarationCountMismatch {
                    declarations: group.declarations.len(),
                    data: group.objects.len(),
                }
                .into());
            }
            for (declare, data) in group.entries() {
                check_declaration(declare, data)?;
                if objects.insert(declare.ex_guid, data).is_some() {
                    return Err(ChunkingError::DuplicateObject {
                        ex_guid: declare.ex_guid,
                    });
                }
            }
        }
        Ok(Self { objects })
    }

    /// Number of indexed objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Reports whether no objects are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Data of `ex_guid`.
    pub fn data(&self, ex_guid: ExGuid) -> Result<&'a ObjectGroupObjectData, ChunkingError> {
        self.objects
            .get(&ex_guid)
            .copied()
            .ok_or(ChunkingError::ObjectNotFound { ex_guid })
    }
}

fn check_declaration(
    declare: &ObjectGroupObjectDeclare,
    data: &ObjectGroupObjectData,
) -> Result<(), ChunkingError> {
    let fields = [
        ("data size", declare.data_size, data.data.len()),
        (
            "object reference count",
            declare.object_references_count,
            data.object_ex_guids.len(),
        ),
        (
            "cell reference count",
            declare.cell_references_count,
            data.cell_ids.len(),
        ),
    ];
    for (field, declared, actual) in fields {
        let actual = actual as u64;
        if declared != actual {
            return Err(ChunkingError::DeclarationMismatch {
                ex_guid: declare.ex_guid,
                field,
                declared,
                actual,
            });
        }
    }
    Ok(())
}

/// Builds the root node of a file, from object groups or from content.
#[derive(Clone, Copy, Debug)]
pub struct RootNodeObjectBuilder<'c> {
    ctx: &'c ChunkingContext,
}

impl<'c> RootNodeObjectBuilder<'c> {
    /// Creates a builder for the negotiated session.
    #[must_use]
    pub const fn new(ctx: &'c ChunkingContext) -> Self {
        Self { ctx }
    }

    /// Rebuilds the tree rooted at `root_ex_guid` from `groups`.
    ///
    /// With [`ChunkingContext::verify_on_build`] set, the rebuilt tree is
    /// checked against the strategy its producer must have used.
    #[instrument(level = "debug", skip_all, fields(root = %root_ex_guid, groups = groups.len()))]
    pub fn build(
        &self,
        groups: &[ObjectGroupDataElement],
        root_ex_guid: ExGuid,
    ) -> Result<IntermediateNodeObject, ChunkingError> {
        let arena = ObjectGroupArena::new(groups)?;
        let mut walk = TreeWalk {
            arena: &arena,
            in_progress: FxHashSet::default(),
            visited: FxHashSet::default(),
        };
        let root = walk.root(root_ex_guid)?;
        logging::trace_build!(
            size = root.data_size(),
            children = root.children().len(),
            synthesized = root.is_synthesized(),
            "rebuilt node tree"
        );
        if self.ctx.verify_on_build {
            self.verify(&root)?;
        }
        Ok(root)
    }

    /// Chunks `content` with the strategy the factory picks and wraps the
    /// leaves in a fresh root.
    pub fn build_from_content(
        &self,
        content: &[u8],
        ids: &mut ExGuidGenerator,
    ) -> Result<IntermediateNodeObject, ChunkingError> {
        self.build_from_content_with_method(ChunkingFactory::detect_method(content), content, ids)
    }

    /// Chunks `content` with `method` and wraps the leaves in a fresh root.
    #[instrument(level = "debug", skip_all, fields(%method, len = content.len()))]
    pub fn build_from_content_with_method(
        &self,
        method: ChunkingMethod,
        content: &[u8],
        ids: &mut ExGuidGenerator,
    ) -> Result<IntermediateNodeObject, ChunkingError> {
        let strategy = ChunkingFactory::create_with_method(method, self.ctx)?;
        let leaves = strategy.chunk(content, ids)?;
        Ok(IntermediateNodeObject::new(ids.next_ex_guid(), leaves))
    }

    /// Checks `root` against the strategy its producer must have used.
    /// Content that is not chunked file content passes.
    pub fn verify(&self, root: &IntermediateNodeObject) -> Result<(), ChunkingError> {
        root.check_sizes()?;
        match ChunkingFactory::for_root(root, self.ctx)? {
            Some(strategy) => {
                logging::trace_verify!(method = %strategy.method(), "verifying rebuilt tree");
                strategy.analyze(root, self.ctx)
            }
            None => Ok(()),
        }
    }
}

/// State of one reverse-path walk.
///
/// Every object is placed in the tree at most once: `visited` holds every
/// identifier placed so far, `in_progress` the ones whose subtree is still
/// being built.
struct TreeWalk<'w, 'a> {
    arena: &'w ObjectGroupArena<'a>,
    in_progress: FxHashSet<ExGuid>,
    visited: FxHashSet<ExGuid>,
}

impl TreeWalk<'_, '_> {
    fn root(&mut self, ex_guid: ExGuid) -> Result<IntermediateNodeObject, ChunkingError> {
        let data = self.arena.data(ex_guid)?;
        match NodeHeader::parse(&data.data)? {
            NodeHeader::Intermediate {
                signature,
                data_size,
            } => {
                self.enter(ex_guid)?;
                let children = self.children(&data.object_ex_guids)?;
                self.leave(ex_guid);
                Ok(IntermediateNodeObject::from_raw_parts(
                    ex_guid, signature, data_size, children,
                ))
            }
            NodeHeader::Leaf { .. } => {
                let leaf = self.leaf(ex_guid)?;
                let size = DataSizeObject(leaf.data_size());
                Ok(IntermediateNodeObject::from_raw_parts(
                    ex_guid,
                    SignatureObject::default(),
                    size,
                    vec![leaf],
                ))
            }
        }
    }

    fn children(&mut self, references: &[ExGuid]) -> Result<Vec<LeafNodeObject>, ChunkingError> {
        references.iter().map(|&child| self.leaf(child)).collect()
    }

    fn leaf(&mut self, ex_guid: ExGuid) -> Result<LeafNodeObject, ChunkingError> {
        let data = self.arena.data(ex_guid)?;
        self.enter(ex_guid)?;
        let leaf = match NodeHeader::parse(&data.data)? {
            NodeHeader::Leaf {
                signature,
                data_size,
                data_hash,
            } => {
                let payload = match data.object_ex_guids.as_slice() {
                    [] => return Err(ChunkingError::MissingReferences { ex_guid }),
                    [data_ex_guid] => {
                        let bytes = self.arena.data(*data_ex_guid)?;
                        self.claim(*data_ex_guid)?;
                        LeafPayload::Data(DataNodeObjectData::new(*data_ex_guid, bytes.data.clone()))
                    }
                    references => LeafPayload::Children(self.children(references)?),
                };
                LeafNodeObject::from_raw_parts(ex_guid, signature, data_size, data_hash, payload)
            }
            NodeHeader::Intermediate {
                signature,
                data_size,
            } => {
                let children = self.children(&data.object_ex_guids)?;
                LeafNodeObject::from_raw_parts(
                    ex_guid,
                    signature,
                    data_size,
                    None,
                    LeafPayload::Children(children),
                )
            }
        };
        self.leave(ex_guid);
        Ok(leaf)
    }

    fn enter(&mut self, ex_guid: ExGuid) -> Result<(), ChunkingError> {
        if self.in_progress.contains(&ex_guid) {
            return Err(ChunkingError::CyclicReference { ex_guid });
        }
        self.claim(ex_guid)?;
        self.in_progress.insert(ex_guid);
        Ok(())
    }

    fn claim(&mut self, ex_guid: ExGuid) -> Result<(), ChunkingError> {
        if self.visited.insert(ex_guid) {
            Ok(())
        } else {
            Err(ChunkingError::SharedReference { ex_guid })
        }
    }

    fn leave(&mut self, ex_guid: ExGuid) {
        self.in_progress.remove(&ex_guid);
    }
}
