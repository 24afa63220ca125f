//! Geometry helpers for the topology engine.
//!
//! Face normals and edge tangents drive feature-angle partitioning; the
//! object transform places attached meshes.

pub mod metrics;
pub mod transform;

pub use metrics::{BoundingBox, cos_deg, edge_tangent, face_normal};
pub use transform::Transform;
