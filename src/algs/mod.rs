//! Topology derivation and mesh editing algorithms.
//!
//! - [`adjacency`]: neighbor, back-reference and exterior passes
//! - [`rebuild`]: the full derivation pipeline and its face/edge builders
//! - [`renumber`]: group id compaction and index remapping
//! - [`edit`], [`attach`], [`invert`], [`submesh`]: structural edits that
//!   leave the mesh rebuilt

pub mod adjacency;
pub mod attach;
pub mod edit;
pub mod invert;
pub mod rebuild;
pub mod renumber;
pub mod submesh;

pub use adjacency::{find_duplicate_edges, find_duplicate_faces};
pub use attach::{attach, attach_and_weld};
pub use edit::{
    delete_elements, delete_faces, delete_nodes, delete_parts, delete_selected_elements,
    remove_duplicate_edges, remove_duplicate_faces, remove_isolated_nodes,
};
pub use invert::{invert_elements, invert_faces, invert_selected_elements};
pub use rebuild::{RebuildOptions, build_mesh, rebuild_mesh, repair_edges};
pub use renumber::renumber_all_partitions;
pub use submesh::{SubmeshMaps, detach_elements, detach_selected, extract_faces};
