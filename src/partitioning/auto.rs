//! Automatic partitioning by connectivity and feature angle.
//!
//! Group ids are handed out in the order seeds are discovered while scanning
//! the entity arrays, so the numbering is deterministic for a given mesh.

use nalgebra::Vector3;

use crate::algs::adjacency::{mark_exterior_nodes, update_edge_neighbors};
use crate::algs::rebuild::build_edges;
use crate::algs::renumber::renumber_element_partitions;
use crate::geometry::metrics::{cos_deg, edge_tangent, face_normal, within_angle};
use crate::partitioning::flood_fill;
use crate::topology::entity::{Element, Face, Gid};
use crate::topology::mesh::Mesh;

/// One part per connected component of solids and shells; all beams share
/// one trailing part.
pub fn auto_partition_elements(mesh: &mut Mesh) -> usize {
    let n = mesh.elements.len();
    let (state, next) = {
        let els = &mesh.elements;
        flood_fill(n, (0..n).filter(|&i| !els[i].is_beam()), 0, |i, out| {
            let el = &els[i];
            out.extend(
                el.nbr[..el.facet_count()]
                    .iter()
                    .flatten()
                    .copied()
                    .filter(|&k| k < n && !els[k].is_beam()),
            );
        })
    };
    for (el, s) in mesh.elements.iter_mut().zip(&state) {
        el.gid = if el.is_beam() { Some(next) } else { s.group() };
    }
    let parts = renumber_element_partitions(mesh);
    log::debug!("auto partition: {parts} parts from {n} elements");
    parts
}

/// Part ids of the first two owners of a face.
pub(crate) fn owner_parts(elements: &[Element], f: &Face) -> (Option<Gid>, Option<Gid>) {
    let part = |s: usize| f.elem[s].map(|o| elements[o.eid].gid);
    (part(0), part(1))
}

/// Whether a flood over faces may cross from `f` to `g`.
pub(crate) fn faces_mergeable(
    f: &Face,
    g: &Face,
    nf: &Vector3<f64>,
    ng: &Vector3<f64>,
    cos_w: f64,
    crease_internal: bool,
) -> bool {
    if !f.exterior && !g.exterior {
        !crease_internal || within_angle(nf, ng, cos_w)
    } else {
        within_angle(nf, ng, cos_w)
    }
}

/// Surface partition: faces merge when they are linked, belong to the same
/// parts and meet within `angle` degrees. With `crease_internal == false`
/// interior faces merge regardless of angle.
pub fn auto_partition_surface(mesh: &mut Mesh, angle: f64, crease_internal: bool) -> usize {
    let cos_w = cos_deg(angle);
    let nf = mesh.faces.len();
    let (state, next) = {
        let faces = &mesh.faces;
        let elements = &mesh.elements;
        let normals: Vec<Vector3<f64>> = faces.iter().map(|f| face_normal(&mesh.nodes, f)).collect();
        let parts: Vec<_> = faces.iter().map(|f| owner_parts(elements, f)).collect();
        flood_fill(nf, 0..nf, 0, |i, out| {
            let f = &faces[i];
            for &k in f.nbr[..f.edge_count()].iter().flatten() {
                if parts[k] == parts[i]
                    && faces_mergeable(f, &faces[k], &normals[i], &normals[k], cos_w, crease_internal)
                {
                    out.push(k);
                }
            }
        })
    };
    for (f, s) in mesh.faces.iter_mut().zip(&state) {
        f.gid = s.group();
    }
    log::debug!("auto partition: {next} surfaces from {nf} faces at {angle} deg");
    next
}

/// Smoothing groups: like the surface partition but blind to parts.
pub fn auto_smooth(mesh: &mut Mesh, angle: f64, crease_internal: bool) -> usize {
    let cos_w = cos_deg(angle);
    let nf = mesh.faces.len();
    let (state, next) = {
        let faces = &mesh.faces;
        let normals: Vec<Vector3<f64>> = faces.iter().map(|f| face_normal(&mesh.nodes, f)).collect();
        flood_fill(nf, 0..nf, 0, |i, out| {
            let f = &faces[i];
            for &k in f.nbr[..f.edge_count()].iter().flatten() {
                if faces_mergeable(f, &faces[k], &normals[i], &normals[k], cos_w, crease_internal) {
                    out.push(k);
                }
            }
        })
    };
    for (f, s) in mesh.faces.iter_mut().zip(&state) {
        f.sid = s.group();
    }
    next
}

/// Whether a flood over edges may turn from edge `e` into its neighbor `k`
/// across end `j`. Tangents are oriented to run through the shared node.
pub(crate) fn edges_mergeable(mesh: &Mesh, e: usize, j: usize, k: usize, cos_w: f64) -> bool {
    let pe = &mesh.edges[e];
    let pk = &mesh.edges[k];
    let t = edge_tangent(&mesh.nodes, pe);
    let mut tk = edge_tangent(&mesh.nodes, pk);
    if pk.n[j] == pe.n[j] {
        tk = -tk;
    }
    within_angle(&t, &tk, cos_w)
}

/// Curve partition over edges that carry a curve id. With `angle`, a curve
/// breaks where consecutive tangents turn by more than `angle` degrees.
/// Edge neighbor links are refreshed afterwards so they never cross curves.
pub fn auto_partition_edges(mesh: &mut Mesh, angle: Option<f64>) -> usize {
    let cos_w = angle.map(cos_deg);
    let ne = mesh.edges.len();
    let (state, next) = {
        let m = &*mesh;
        let edges = &m.edges;
        flood_fill(
            ne,
            (0..ne).filter(|&i| edges[i].gid.is_some()),
            0,
            |i, out| {
                for j in 0..2 {
                    let Some(k) = edges[i].nbr[j] else {
                        continue;
                    };
                    if k < ne
                        && edges[k].gid.is_some()
                        && cos_w.is_none_or(|c| edges_mergeable(m, i, j, k, c))
                    {
                        out.push(k);
                    }
                }
            },
        )
    };
    for (e, s) in mesh.edges.iter_mut().zip(&state) {
        if e.gid.is_some() {
            e.gid = s.group();
        }
    }
    update_edge_neighbors(mesh);
    log::debug!("auto partition: {next} curves from {ne} edges");
    next
}

/// Vertex partition: every node that ends a curve gets the next vertex id.
pub fn auto_partition_nodes(mesh: &mut Mesh) -> usize {
    for n in &mut mesh.nodes {
        n.gid = None;
    }
    let mut next = 0;
    let Mesh { nodes, edges, .. } = mesh;
    for e in edges.iter() {
        if e.gid.is_none() {
            continue;
        }
        for k in 0..2 {
            let ends_curve = match e.nbr[k] {
                None => true,
                Some(nb) => edges.get(nb).is_none_or(|o| o.gid != e.gid),
            };
            if !ends_curve {
                continue;
            }
            if let Some(node) = nodes.get_mut(e.n[k]) {
                if node.gid.is_none() {
                    node.gid = Some(next);
                    next += 1;
                }
            }
        }
    }
    next
}

/// Surfaces by angle, then curves and vertices derived from them.
pub fn auto_partition(mesh: &mut Mesh, angle: f64) {
    auto_partition_surface(mesh, angle, true);
    build_edges(mesh);
    auto_partition_edges(mesh, Some(angle));
    auto_partition_nodes(mesh);
    mark_exterior_nodes(mesh);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::rebuild::{RebuildOptions, rebuild_mesh};
    use crate::topology::cell_type::ElementType;

    fn strip(n: usize) -> Mesh {
        // n quads in a row along x.
        let mut pos = Vec::new();
        for i in 0..=n {
            pos.push([i as f64, 0.0, 0.0]);
            pos.push([i as f64, 1.0, 0.0]);
        }
        let els = (0..n)
            .map(|i| {
                Element::new(
                    ElementType::Quad4,
                    &[2 * i, 2 * i + 2, 2 * i + 3, 2 * i + 1],
                )
            })
            .collect();
        Mesh::from_parts(&pos, els).unwrap()
    }

    #[test]
    fn flat_strip_is_one_surface_with_four_curves() {
        let mut m = strip(3);
        rebuild_mesh(&mut m, &RebuildOptions::default()).unwrap();
        assert_eq!(m.count_face_partitions(), 1);
        assert_eq!(m.count_edge_partitions(), 4);
        assert_eq!(m.count_node_partitions(), 4);
    }

    #[test]
    fn beams_go_to_one_trailing_part() {
        let mut m = Mesh::from_parts(
            &[[0., 0., 0.], [1., 0., 0.], [1., 1., 0.], [5., 0., 0.], [6., 0., 0.], [9., 0., 0.]],
            vec![
                Element::new(ElementType::Beam2, &[3, 4]),
                Element::new(ElementType::Tri3, &[0, 1, 2]),
                Element::new(ElementType::Beam2, &[4, 5]),
            ],
        )
        .unwrap();
        rebuild_mesh(&mut m, &RebuildOptions::default().with_partition_elements(true)).unwrap();
        let gids: Vec<_> = m.elements().iter().map(|e| e.gid).collect();
        assert_eq!(gids, vec![Some(1), Some(0), Some(1)]);
    }

    #[test]
    fn folded_strip_splits_by_angle() {
        let mut m = strip(2);
        // Fold the second quad up by 90 degrees about x = 1.
        for n in m.nodes_mut() {
            if n.pos.x > 1.5 {
                n.pos.z = n.pos.x - 1.0;
                n.pos.x = 1.0;
            }
        }
        rebuild_mesh(&mut m, &RebuildOptions::default()).unwrap();
        assert_eq!(m.count_face_partitions(), 2);
        rebuild_mesh(&mut m, &RebuildOptions::default().with_smoothing_angle(120.0)).unwrap();
        assert_eq!(m.count_face_partitions(), 1);
    }
}
