//! The rebuild pipeline: derive faces, edges and every partition from
//! elements and node positions.
//!
//! [`rebuild_mesh`] runs the full pipeline and replaces all derived data.
//! [`build_mesh`] only refreshes adjacency on meshes whose faces and edges
//! already exist, for example after loading a file.

use hashbrown::HashMap;

use crate::algs::adjacency::{
    edge_on_surface_boundary, mark_exterior_edges, mark_exterior_elements, mark_exterior_nodes,
    update_edge_element_table, update_edge_neighbors, update_element_neighbors,
    update_face_element_table, update_face_neighbors,
};
use crate::algs::renumber::renumber_element_partitions;
use crate::mesh_error::{MeshError, Result};
use crate::partitioning::auto::{
    auto_partition_edges, auto_partition_elements, auto_partition_nodes, auto_partition_surface,
    auto_smooth,
};
use crate::topology::entity::Edge;
use crate::topology::mesh::Mesh;
use crate::topology::validation::{validate_edges, validate_elements, validate_faces};

/// Knobs for [`rebuild_mesh`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RebuildOptions {
    /// Feature angle in degrees for surfaces, smoothing groups and curves.
    pub smoothing_angle: f64,
    /// Re-derive parts from connectivity instead of keeping element ids.
    pub partition_elements: bool,
    /// Interior faces also split at the feature angle.
    pub crease_internal: bool,
}

impl Default for RebuildOptions {
    fn default() -> Self {
        Self {
            smoothing_angle: 60.0,
            partition_elements: false,
            crease_internal: true,
        }
    }
}

impl RebuildOptions {
    pub fn with_smoothing_angle(mut self, angle: f64) -> Self {
        self.smoothing_angle = angle;
        self
    }

    pub fn with_partition_elements(mut self, on: bool) -> Self {
        self.partition_elements = on;
        self
    }

    pub fn with_crease_internal(mut self, on: bool) -> Self {
        self.crease_internal = on;
        self
    }
}

/// Rebuild all derived data.
///
/// Element connectivity is checked first; on failure the mesh is left
/// untouched and the first defect is returned.
pub fn rebuild_mesh(mesh: &mut Mesh, options: &RebuildOptions) -> Result<()> {
    validate_elements(mesh, !options.partition_elements)?;
    mesh.diagnostics.clear();
    mesh.options = options.clone();
    mesh.clear_topology();
    mesh.invalidate_node_element_list();

    update_element_neighbors(mesh);
    if options.partition_elements {
        auto_partition_elements(mesh);
    } else {
        renumber_element_partitions(mesh);
    }
    mark_exterior_elements(mesh);

    build_faces(mesh);
    auto_partition_surface(mesh, options.smoothing_angle, options.crease_internal);
    auto_smooth(mesh, options.smoothing_angle, options.crease_internal);

    build_edges(mesh);
    auto_partition_edges(mesh, Some(options.smoothing_angle));
    auto_partition_nodes(mesh);

    rebuild_node_data(mesh);
    mesh.update_mesh();
    mesh.inconsistent = false;
    crate::debug_invariants!(mesh);

    log::debug!(
        "rebuilt mesh: {} elements, {} faces, {} edges, {} parts, {} surfaces, {} curves, {} vertices",
        mesh.element_count(),
        mesh.face_count(),
        mesh.edge_count(),
        mesh.count_element_partitions(),
        mesh.count_face_partitions(),
        mesh.count_edge_partitions(),
        mesh.count_node_partitions(),
    );
    if !mesh.diagnostics.is_empty() {
        log::info!(
            "rebuild recorded {} topology defects",
            mesh.diagnostics.len()
        );
    }
    Ok(())
}

/// Refresh adjacency and exterior flags of a mesh whose faces and edges are
/// already present. Partitions are kept; element ids are compacted.
pub fn build_mesh(mesh: &mut Mesh) -> Result<()> {
    validate_elements(mesh, true)?;
    validate_faces(mesh)?;
    validate_edges(mesh)?;
    mesh.diagnostics.clear();
    mesh.invalidate_node_element_list();

    renumber_element_partitions(mesh);
    update_element_neighbors(mesh);
    mark_exterior_elements(mesh);
    rebuild_face_data(mesh);
    rebuild_edge_data(mesh);
    rebuild_node_data(mesh);
    mesh.update_mesh();
    mesh.inconsistent = false;
    crate::debug_invariants!(mesh);
    Ok(())
}

/// Replace the face list with one face per open solid facet, one per part
/// interface and one per shell.
pub fn build_faces(mesh: &mut Mesh) {
    let els = &mesh.elements;
    let mut faces = Vec::new();
    for el in els.iter().filter(|e| e.is_solid()) {
        for j in 0..el.kind.faces().len() {
            match el.nbr[j] {
                None => {
                    let mut f = el.face_of(j);
                    f.exterior = true;
                    faces.push(f);
                }
                Some(k) => {
                    // Interfaces belong to the lower part; shell-covered
                    // facets are left to the shell.
                    let other = &els[k];
                    if other.is_solid() && el.gid < other.gid {
                        faces.push(el.face_of(j));
                    }
                }
            }
        }
    }
    for el in els.iter().filter(|e| e.is_shell()) {
        if let Some(mut f) = el.shell_face() {
            f.exterior = true;
            faces.push(f);
        }
    }
    mesh.faces = faces;
    rebuild_face_data(mesh);
}

/// Back-references and neighbors of faces.
pub fn rebuild_face_data(mesh: &mut Mesh) {
    update_face_element_table(mesh);
    update_face_neighbors(mesh);
}

/// Sorted end nodes, the bucket key used to find duplicate edges.
fn edge_key(e: &Edge) -> (usize, usize) {
    (e.n[0].min(e.n[1]), e.n[0].max(e.n[1]))
}

/// Replace the edge list with the face edges and one edge per beam.
///
/// An edge is created once for each shared face edge and for every open
/// face edge. Edges on a surface boundary start in curve 0; the curve
/// partition splits them afterwards.
pub fn build_edges(mesh: &mut Mesh) {
    let nfl = mesh.node_face_list();
    let faces = &mesh.faces;
    let mut edges: Vec<Edge> = Vec::new();
    let mut seen: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    let mut insert = |e: Edge, edges: &mut Vec<Edge>| {
        let bucket = seen.entry(edge_key(&e)).or_default();
        if let Some(&k) = bucket.iter().find(|&&k| edges[k].same_as(&e)) {
            // Seen from several faces: a boundary on any side wins.
            if e.gid.is_some() && edges[k].gid.is_none() {
                edges[k].gid = e.gid;
                edges[k].exterior = true;
            }
            return;
        }
        bucket.push(edges.len());
        edges.push(e);
    };

    for (i, f) in faces.iter().enumerate() {
        for j in 0..f.edge_count() {
            // An open edge is always owned, even on an interior face such
            // as a shell between two solids.
            if f.nbr[j].is_some_and(|k| k < i) {
                continue;
            }
            let mut e = f.edge(j);
            let boundary = edge_on_surface_boundary(faces, &nfl, e.n[0], e.n[1]);
            e.gid = boundary.then_some(0);
            e.exterior = boundary;
            insert(e, &mut edges);
        }
    }
    for (i, el) in mesh.elements.iter().enumerate() {
        if let Some(mut e) = el.beam_edge() {
            e.gid = Some(0);
            e.elem = Some(i);
            e.exterior = true;
            insert(e, &mut edges);
        }
    }
    log::trace!("built {} edges from {} faces", edges.len(), faces.len());
    mesh.edges = edges;
    rebuild_edge_data(mesh);
}

/// Beam back-references, exterior flags and neighbors of edges.
pub fn rebuild_edge_data(mesh: &mut Mesh) {
    update_edge_element_table(mesh);
    mark_exterior_edges(mesh);
    update_edge_neighbors(mesh);
}

pub fn rebuild_node_data(mesh: &mut Mesh) {
    mark_exterior_nodes(mesh);
}

/// Rebuild edges from faces and beams while keeping surface ids.
pub fn repair_edges(mesh: &mut Mesh) -> Result<()> {
    validate_faces(mesh)?;
    if mesh.faces.iter().any(|f| f.elem[0].is_none()) {
        return Err(MeshError::InconsistentMesh(
            "faces must be linked to elements before edges are rebuilt",
        ));
    }
    build_edges(mesh);
    let angle = mesh.options.smoothing_angle;
    auto_partition_edges(mesh, Some(angle));
    auto_partition_nodes(mesh);
    rebuild_node_data(mesh);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh_error::TopologyDefect;
    use crate::topology::cell_type::ElementType;
    use crate::topology::entity::Element;

    fn unit_hex() -> Mesh {
        let pos = [
            [0., 0., 0.],
            [1., 0., 0.],
            [1., 1., 0.],
            [0., 1., 0.],
            [0., 0., 1.],
            [1., 0., 1.],
            [1., 1., 1.],
            [0., 1., 1.],
        ];
        Mesh::from_parts(&pos, vec![Element::new(ElementType::Hex8, &[0, 1, 2, 3, 4, 5, 6, 7])])
            .unwrap()
    }

    #[test]
    fn options_default_and_builders() {
        let o = RebuildOptions::default();
        assert_eq!(o.smoothing_angle, 60.0);
        assert!(!o.partition_elements);
        assert!(o.crease_internal);
        let o = o.with_smoothing_angle(30.0).with_crease_internal(false);
        assert_eq!(o.smoothing_angle, 30.0);
        assert!(!o.crease_internal);
    }

    #[test]
    fn rebuild_stores_the_options_used() {
        let mut m = unit_hex();
        let o = RebuildOptions::default().with_smoothing_angle(89.0);
        rebuild_mesh(&mut m, &o).unwrap();
        assert_eq!(m.options(), &o);
        assert!(m.is_consistent());
        assert!(m.diagnostics().is_empty());
    }

    #[test]
    fn bad_connectivity_leaves_mesh_untouched() {
        let mut m = unit_hex();
        rebuild_mesh(&mut m, &RebuildOptions::default()).unwrap();
        let faces = m.face_count();
        m.elements_mut()[0].n[3] = 42;
        let err = rebuild_mesh(&mut m, &RebuildOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            MeshError::InvalidTopology(TopologyDefect::NodeOutOfRange { node: 42, .. })
        ));
        assert_eq!(m.face_count(), faces);
    }

    #[test]
    fn facet_without_face_is_reported() {
        let mut m = unit_hex();
        rebuild_mesh(&mut m, &RebuildOptions::default()).unwrap();
        m.resize_faces(5);
        for f in m.faces_mut() {
            for n in f.nbr.iter_mut().filter(|n| **n == Some(5)) {
                *n = None;
            }
        }
        build_mesh(&mut m).unwrap();
        assert_eq!(m.face_count(), 5);
        assert_eq!(
            m.diagnostics().defects(),
            &[TopologyDefect::PartialAdjacency {
                element: 0,
                facet: 5
            }]
        );
    }

    #[test]
    fn beams_add_edges_backed_by_elements() {
        let mut m = Mesh::from_parts(
            &[[0., 0., 0.], [1., 0., 0.], [2., 0., 0.]],
            vec![
                Element::new(ElementType::Beam2, &[0, 1]),
                Element::new(ElementType::Beam2, &[1, 2]),
            ],
        )
        .unwrap();
        rebuild_mesh(&mut m, &RebuildOptions::default()).unwrap();
        assert_eq!(m.face_count(), 0);
        assert_eq!(m.edge_count(), 2);
        assert_eq!(m.edges()[0].elem, Some(0));
        assert_eq!(m.edges()[1].elem, Some(1));
        // Collinear beams form one curve with two end vertices.
        assert_eq!(m.count_edge_partitions(), 1);
        assert_eq!(m.count_node_partitions(), 2);
        assert!(m.nodes().iter().all(|n| n.exterior));
    }

    #[test]
    fn build_mesh_refreshes_without_recreating_faces() {
        let mut m = unit_hex();
        rebuild_mesh(&mut m, &RebuildOptions::default()).unwrap();
        let snapshot = |m: &Mesh| (m.elements().to_vec(), m.faces().to_vec(), m.edges().to_vec());
        let before = snapshot(&m);
        build_mesh(&mut m).unwrap();
        assert_eq!(snapshot(&m), before);
    }

    #[test]
    fn repair_edges_requires_linked_faces() {
        let mut m = unit_hex();
        rebuild_mesh(&mut m, &RebuildOptions::default()).unwrap();
        m.faces_mut()[0].elem = [None; 3];
        assert!(matches!(
            repair_edges(&mut m),
            Err(MeshError::InconsistentMesh(_))
        ));
    }
}
