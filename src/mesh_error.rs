//! MeshError: unified error type for mesh-topology public APIs
//!
//! Structural problems that make a rebuild impossible are reported as
//! [`MeshError`]. Local geometric defects that the engine can work around
//! (non-manifold facets, faces without an owner, duplicates) are not errors;
//! they are collected as [`TopologyDefect`]s in a [`Diagnostics`] list.

use std::fmt;
use thiserror::Error;

/// Entity kind named in error messages and diagnostics.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EntityKind {
    Node,
    Edge,
    Face,
    Element,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Node => "node",
            EntityKind::Edge => "edge",
            EntityKind::Face => "face",
            EntityKind::Element => "element",
        };
        f.write_str(s)
    }
}

/// A single structural or geometric defect found while deriving topology.
#[derive(Clone, Debug, PartialEq)]
pub enum TopologyDefect {
    /// `entity` references node `node`, but the mesh only has `nodes` nodes.
    NodeOutOfRange {
        kind: EntityKind,
        entity: usize,
        node: usize,
        nodes: usize,
    },
    /// `entity` references `target` of kind `target_kind` that does not exist.
    ReferenceOutOfRange {
        kind: EntityKind,
        entity: usize,
        target_kind: EntityKind,
        target: usize,
    },
    /// An element was handed to the builder without a part id.
    MissingPartition { element: usize },
    /// An element lists the same node twice.
    RepeatedNode { element: usize, node: usize },
    /// No element facet matches this face.
    UnownedFace { face: usize },
    /// A solid facet has neither a neighbor nor a face covering it.
    PartialAdjacency { element: usize, facet: usize },
    /// Facet `facet` of `element` matches `other`, whose facet is already
    /// linked to a third element.
    NonManifoldFacet {
        element: usize,
        facet: usize,
        other: usize,
    },
    /// More than three element facets match this face.
    OverOwnedFace { face: usize, element: usize },
    /// The face lists `element` as owner but the element does not point back.
    BrokenFaceBackReference { face: usize, element: usize },
    /// Element `a` lists `b` as neighbor across `facet`, but `b` does not list `a`.
    AsymmetricNeighbor { a: usize, facet: usize, b: usize },
    /// Exterior flag of a face disagrees with its back-references.
    FaceExteriorMismatch { face: usize },
    /// Edge partition id disagrees with the edge's recomputed exteriority.
    EdgeExteriorMismatch { edge: usize },
    /// Partition ids of `kind` are not contiguous from zero.
    PartitionGap { kind: EntityKind, missing: usize },
    /// Two records of `kind` describe the same entity.
    Duplicate { kind: EntityKind, first: usize, second: usize },
}

impl fmt::Display for TopologyDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyDefect::NodeOutOfRange {
                kind,
                entity,
                node,
                nodes,
            } => write!(
                f,
                "{kind} {entity} references node {node} but the mesh has {nodes} nodes"
            ),
            TopologyDefect::ReferenceOutOfRange {
                kind,
                entity,
                target_kind,
                target,
            } => write!(f, "{kind} {entity} references missing {target_kind} {target}"),
            TopologyDefect::MissingPartition { element } => {
                write!(f, "element {element} has no part id")
            }
            TopologyDefect::RepeatedNode { element, node } => {
                write!(f, "element {element} lists node {node} more than once")
            }
            TopologyDefect::UnownedFace { face } => {
                write!(f, "face {face} is not owned by any element facet")
            }
            TopologyDefect::PartialAdjacency { element, facet } => write!(
                f,
                "facet {facet} of element {element} has no neighbor and no face"
            ),
            TopologyDefect::NonManifoldFacet {
                element,
                facet,
                other,
            } => write!(
                f,
                "facet {facet} of element {element} matches element {other}, which is already linked"
            ),
            TopologyDefect::OverOwnedFace { face, element } => write!(
                f,
                "face {face} already has three owners; element {element} ignored"
            ),
            TopologyDefect::BrokenFaceBackReference { face, element } => write!(
                f,
                "face {face} lists element {element} which does not reference it"
            ),
            TopologyDefect::AsymmetricNeighbor { a, facet, b } => write!(
                f,
                "element {a} lists {b} across facet {facet} but {b} does not list {a}"
            ),
            TopologyDefect::FaceExteriorMismatch { face } => {
                write!(f, "face {face} exterior flag disagrees with its owners")
            }
            TopologyDefect::EdgeExteriorMismatch { edge } => write!(
                f,
                "edge {edge} curve id disagrees with its recomputed exteriority"
            ),
            TopologyDefect::PartitionGap { kind, missing } => {
                write!(f, "{kind} partition ids skip {missing}")
            }
            TopologyDefect::Duplicate {
                kind,
                first,
                second,
            } => write!(f, "{kind} {second} duplicates {kind} {first}"),
        }
    }
}

/// Accumulated best-effort defects from a rebuild.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diagnostics {
    defects: Vec<TopologyDefect>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a defect and report it once through the `log` facade.
    pub fn report(&mut self, defect: TopologyDefect) {
        log::warn!("Topology defect: {defect}");
        self.defects.push(defect);
    }

    pub fn is_empty(&self) -> bool {
        self.defects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.defects.len()
    }

    pub fn defects(&self) -> &[TopologyDefect] {
        &self.defects
    }

    pub fn clear(&mut self) {
        self.defects.clear();
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.defects.extend(other.defects);
    }
}

/// Unified error type for mesh-topology operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    /// An index handed to a public operation is outside its container.
    #[error("{kind} index {index} out of range (len = {len})")]
    IndexOutOfRange {
        kind: EntityKind,
        index: usize,
        len: usize,
    },
    /// The mesh cannot be rebuilt from its current records.
    #[error("invalid topology: {0}")]
    InvalidTopology(TopologyDefect),
    /// An explicit partition request covers entities from several partitions.
    #[error("selected {kind}s belong to more than one partition")]
    MixedPartitionSelection { kind: EntityKind },
    /// The operation has no meaning for this element or face shape.
    #[error("unsupported element type: {0}")]
    UnsupportedElementType(String),
    /// Sequential stable ids starting at `start` do not fit in `u32`.
    #[error("{count} {kind} ids starting at {start} overflow u32")]
    IdOverflow {
        kind: EntityKind,
        start: u32,
        count: usize,
    },
    /// An edit started mutating and then found a broken invariant.
    #[error("mesh left inconsistent: {0}")]
    InconsistentMesh(&'static str),
}

impl MeshError {
    pub(crate) fn out_of_range(kind: EntityKind, index: usize, len: usize) -> Self {
        MeshError::IndexOutOfRange { kind, index, len }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, MeshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_entity() {
        let e = MeshError::out_of_range(EntityKind::Face, 7, 3);
        assert_eq!(e.to_string(), "face index 7 out of range (len = 3)");

        let e = MeshError::InvalidTopology(TopologyDefect::NodeOutOfRange {
            kind: EntityKind::Element,
            entity: 2,
            node: 40,
            nodes: 8,
        });
        assert!(e.to_string().contains("element 2 references node 40"));
    }

    #[test]
    fn diagnostics_accumulate() {
        let mut d = Diagnostics::new();
        assert!(d.is_empty());
        d.report(TopologyDefect::UnownedFace { face: 1 });
        d.report(TopologyDefect::UnownedFace { face: 4 });
        assert_eq!(d.len(), 2);
        assert_eq!(d.defects()[1], TopologyDefect::UnownedFace { face: 4 });
        d.clear();
        assert!(d.is_empty());
    }
}
