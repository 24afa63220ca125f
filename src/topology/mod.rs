//! Top-level module for mesh topology records and their containers.
//!
//! It includes:
//! - Element, face and edge type tables ([`cell_type`])
//! - Node, edge, face and element records ([`entity`])
//! - The owning [`Mesh`] aggregate with id lookup tables and valence caches
//! - Consistency checks over derived topology ([`validation`])

pub mod cache;
pub mod cell_type;
pub mod columns;
pub mod entity;
pub mod labels;
pub mod lookup;
pub mod mesh;
pub mod valence;
pub mod validation;

pub use cache::InvalidateCache;
pub use cell_type::{EdgeType, ElementFamily, ElementType, FaceType};
pub use entity::{Edge, Element, Face, FaceOwner, Gid, Node};
pub use mesh::Mesh;
