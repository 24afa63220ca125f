//! Merging meshes.
//!
//! [`attach`] appends another mesh with every reference and group id
//! offset, so the partitions of both meshes stay distinct.
//! [`attach_and_weld`] additionally fuses coincident surface nodes and
//! rebuilds.

use hashbrown::HashMap;
use itertools::Itertools;

use crate::algs::edit::remove_isolated_nodes;
use crate::algs::rebuild::rebuild_mesh;
use crate::mesh_error::Result;
use crate::topology::entity::{FaceOwner, Gid};
use crate::topology::mesh::{Mesh, count_groups};

fn shift(gid: Gid, by: usize) -> Gid {
    gid.map(|g| g + by)
}

fn shift_idx(idx: Option<usize>, by: usize) -> Option<usize> {
    idx.map(|i| i + by)
}

/// Append `other` to `mesh`.
///
/// Node positions are carried from `other`'s frame into `mesh`'s frame.
/// Group ids of `other` start after the largest id of the same kind in
/// `mesh`. Element fields of `mesh` are dropped; node sets of `other` are
/// appended.
pub fn attach(mesh: &mut Mesh, other: &Mesh) {
    let nn0 = mesh.nodes.len();
    let ne0 = mesh.elements.len();
    let nf0 = mesh.faces.len();
    let nl0 = mesh.edges.len();

    let node_g = count_groups(mesh.nodes.iter().map(|n| n.gid));
    let elem_g = count_groups(mesh.elements.iter().map(|e| e.gid));
    let face_g = count_groups(mesh.faces.iter().map(|f| f.gid));
    let smooth_g = count_groups(mesh.faces.iter().map(|f| f.sid));
    let edge_g = count_groups(mesh.edges.iter().map(|e| e.gid));

    let (to_global, to_local) = (&other.transform, &mesh.transform);
    mesh.nodes.extend(other.nodes.iter().map(|n| {
        let mut n = n.clone();
        n.gid = shift(n.gid, node_g);
        n.pos = to_local.global_to_local(&to_global.local_to_global(&n.pos));
        n
    }));

    mesh.elements.extend(other.elements.iter().map(|e| {
        let mut e = e.clone();
        e.gid = shift(e.gid, elem_g);
        for n in e.nodes_mut() {
            *n += nn0;
        }
        for nb in &mut e.nbr {
            *nb = shift_idx(*nb, ne0);
        }
        for f in &mut e.face {
            *f = shift_idx(*f, nf0);
        }
        e
    }));

    mesh.faces.extend(other.faces.iter().map(|f| {
        let mut f = f.clone();
        f.gid = shift(f.gid, face_g);
        f.sid = shift(f.sid, smooth_g);
        for n in f.nodes_mut() {
            *n += nn0;
        }
        for slot in &mut f.elem {
            *slot = slot.map(|o| FaceOwner {
                eid: o.eid + ne0,
                lid: o.lid,
            });
        }
        for nb in &mut f.nbr {
            *nb = shift_idx(*nb, nf0);
        }
        f
    }));

    mesh.edges.extend(other.edges.iter().map(|e| {
        let mut e = e.clone();
        e.gid = shift(e.gid, edge_g);
        for n in e.nodes_mut() {
            *n += nn0;
        }
        for nb in &mut e.nbr {
            *nb = shift_idx(*nb, nl0);
        }
        e.elem = shift_idx(e.elem, ne0);
        e
    }));

    mesh.node_sets.append_shifted(&other.node_sets, nn0);
    mesh.element_fields.clear();
    mesh.update_mesh();
    log::debug!(
        "attached {} nodes and {} elements; part ids offset by {elem_g}",
        other.nodes.len(),
        other.elements.len()
    );
}

type Cell = (i64, i64, i64);

fn cell_of(p: &nalgebra::Point3<f64>, h: f64) -> Cell {
    (
        (p.x / h).floor() as i64,
        (p.y / h).floor() as i64,
        (p.z / h).floor() as i64,
    )
}

/// Sorted list of nodes used by faces in `range`.
fn surface_nodes(mesh: &Mesh, range: std::ops::Range<usize>) -> Vec<usize> {
    mesh.faces[range]
        .iter()
        .flat_map(|f| f.nodes().iter().copied())
        .sorted_unstable()
        .dedup()
        .collect()
}

/// Attach `other`, then weld surface nodes of `other` onto surface nodes of
/// `mesh` that lie within `tol`, and rebuild with the mesh's options.
///
/// When exactly one node of a pair carries a vertex id, that node survives.
/// A non-positive `tol` only attaches. Returns the number of welded nodes.
pub fn attach_and_weld(mesh: &mut Mesh, other: &Mesh, tol: f64) -> Result<usize> {
    let nn0 = mesh.nodes.len();
    let nf0 = mesh.faces.len();
    attach(mesh, other);
    if tol <= 0.0 {
        return Ok(0);
    }

    let targets = surface_nodes(mesh, 0..nf0);
    let sources = surface_nodes(mesh, nf0..mesh.faces.len());

    let mut grid: HashMap<Cell, Vec<usize>> = HashMap::new();
    for &t in &targets {
        grid.entry(cell_of(&mesh.nodes[t].pos, tol))
            .or_default()
            .push(t);
    }

    let tol2 = tol * tol;
    let mut order: Vec<usize> = (0..mesh.nodes.len()).collect();
    let mut welded = 0;
    for &s in sources.iter().filter(|&&s| s >= nn0) {
        let ps = mesh.nodes[s].pos;
        let (cx, cy, cz) = cell_of(&ps, tol);
        let mut best: Option<usize> = None;
        for (dx, dy, dz) in itertools::iproduct!(-1..=1, -1..=1, -1..=1) {
            let Some(bucket) = grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                continue;
            };
            for &t in bucket {
                if (mesh.nodes[t].pos - ps).norm_squared() <= tol2 && best.is_none_or(|b| t < b) {
                    best = Some(t);
                }
            }
        }
        let Some(t) = best else { continue };
        if mesh.nodes[s].gid.is_some() && mesh.nodes[t].gid.is_none() {
            order[t] = s;
        } else {
            order[s] = t;
        }
        welded += 1;
    }

    // Collapse chains so every node maps straight to its survivor.
    for i in 0..order.len() {
        let mut j = order[i];
        let mut steps = 0;
        while order[j] != j && steps < order.len() {
            j = order[j];
            steps += 1;
        }
        order[i] = j;
    }

    for el in &mut mesh.elements {
        for n in el.nodes_mut() {
            *n = order[*n];
        }
    }
    for f in &mut mesh.faces {
        for n in f.nodes_mut() {
            *n = order[*n];
        }
    }
    for e in &mut mesh.edges {
        for n in e.nodes_mut() {
            *n = order[*n];
        }
    }
    let remap: Vec<Option<usize>> = order.iter().map(|&o| Some(o)).collect();
    mesh.node_sets.remap(&remap);
    mesh.invalidate_node_element_list();

    remove_isolated_nodes(mesh);
    let options = mesh.options.clone();
    rebuild_mesh(mesh, &options)?;
    log::debug!("welded {welded} nodes within {tol}");
    Ok(welded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::rebuild::RebuildOptions;
    use crate::geometry::transform::Transform;
    use crate::topology::cell_type::ElementType;
    use crate::topology::entity::Element;
    use nalgebra::Vector3;

    fn tet(origin: [f64; 3]) -> Mesh {
        let [x, y, z] = origin;
        let pos = [
            [x, y, z],
            [x + 1., y, z],
            [x, y + 1., z],
            [x, y, z + 1.],
        ];
        let mut m =
            Mesh::from_parts(&pos, vec![Element::new(ElementType::Tet4, &[0, 1, 2, 3])]).unwrap();
        rebuild_mesh(&mut m, &RebuildOptions::default()).unwrap();
        m
    }

    #[test]
    fn attach_offsets_indices_and_group_ids() {
        let mut a = tet([0., 0., 0.]);
        let b = tet([5., 0., 0.]);
        let fa = a.face_count();
        let (surfaces, curves) = (a.count_face_partitions(), a.count_edge_partitions());
        attach(&mut a, &b);
        assert_eq!(a.node_count(), 8);
        assert_eq!(a.element_count(), 2);
        assert_eq!(a.elements()[1].gid, Some(1));
        assert_eq!(a.elements()[1].nodes(), &[4, 5, 6, 7]);
        assert_eq!(a.faces()[fa].elem[0].map(|o| o.eid), Some(1));
        assert_eq!(a.count_face_partitions(), 2 * surfaces);
        assert_eq!(a.count_edge_partitions(), 2 * curves);
    }

    #[test]
    fn attach_maps_positions_between_frames() {
        let mut a = tet([0., 0., 0.]);
        a.set_transform(Transform::from_translation(Vector3::new(1., 0., 0.)));
        let mut b = tet([0., 0., 0.]);
        b.set_transform(Transform::from_translation(Vector3::new(3., 0., 0.)));
        attach(&mut a, &b);
        // b's origin sits at global x = 3, which is local x = 2 in a.
        assert!((a.nodes()[4].pos.x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn weld_fuses_a_shared_face() {
        let mut a = tet([0., 0., 0.]);
        // A second tet on the opposite side of the x = 0 face.
        let pos = [[0., 0., 0.], [0., 1., 0.], [0., 0., 1.], [-1., 0., 0.]];
        let mut b =
            Mesh::from_parts(&pos, vec![Element::new(ElementType::Tet4, &[0, 1, 2, 3])]).unwrap();
        rebuild_mesh(&mut b, &RebuildOptions::default()).unwrap();
        let welded = attach_and_weld(&mut a, &b, 1e-6).unwrap();
        assert_eq!(welded, 3);
        assert_eq!(a.node_count(), 5);
        let n0 = a.elements()[0].nbr.iter().flatten().count();
        assert_eq!(n0, 1);
    }
}
