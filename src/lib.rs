#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-topology
//!
//! mesh-topology derives the full topology of an unstructured finite-element
//! mesh from its nodes and element connectivity, and partitions it into the
//! groups a pre-processor works with: parts, surfaces, curves and vertices.
//!
//! ## Features
//! - Solid, shell and beam element tables with their local faces and edges
//! - Element neighbors, faces, edges and exterior classification
//! - Feature-angle partitioning of faces and edges, smoothing groups
//! - Explicit partitioning of user selections
//! - Mesh edits that leave the mesh rebuilt: delete, attach, weld, invert,
//!   detach and face extraction
//! - A columnar snapshot for save/load layers
//!
//! ## Usage
//! ```
//! use mesh_topology::prelude::*;
//!
//! let pos = [[0., 0., 0.], [1., 0., 0.], [0., 1., 0.], [0., 0., 1.]];
//! let tet = Element::new(ElementType::Tet4, &[0, 1, 2, 3]);
//! let mut mesh = Mesh::from_parts(&pos, vec![tet]).unwrap();
//! rebuild_mesh(&mut mesh, &RebuildOptions::default()).unwrap();
//! assert_eq!(mesh.face_count(), 4);
//! assert_eq!(mesh.edge_count(), 6);
//! ```
//!
//! ## Determinism
//!
//! Flood fills seed from the lowest unvisited index and visit neighbors in
//! local facet order, so partition ids depend only on the input arrays.
//! The optional `rayon` feature parallelizes read-only candidate searches
//! without changing results.

pub mod algs;
pub mod debug_invariants;
pub mod geometry;
pub mod mesh_error;
pub mod partitioning;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::rebuild::{RebuildOptions, build_mesh, rebuild_mesh};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::geometry::transform::Transform;
    pub use crate::mesh_error::{Diagnostics, EntityKind, MeshError, TopologyDefect};
    pub use crate::topology::cache::InvalidateCache;
    pub use crate::topology::cell_type::{EdgeType, ElementType, FaceType};
    pub use crate::topology::columns::MeshColumns;
    pub use crate::topology::entity::{Edge, Element, Face, FaceOwner, Gid, Node};
    pub use crate::topology::mesh::Mesh;
    pub use crate::topology::validation::ValidationOptions;
}
