//! Partitioning driven by user selections.
//!
//! The selection-based operations read the `selected` flags of the entity
//! records. The `auto_partition_*` variants here take explicit index lists
//! and only ever split the one partition the selection lives in.

use nalgebra::Vector3;

use crate::algs::adjacency::{
    mark_exterior_nodes, update_edge_neighbors, update_face_element_table, update_face_neighbors,
};
use crate::algs::rebuild::{build_edges, rebuild_edge_data};
use crate::algs::renumber::{
    renumber_edge_partitions, renumber_element_partitions, renumber_face_partitions,
    renumber_node_partitions,
};
use crate::geometry::metrics::{cos_deg, face_normal};
use crate::mesh_error::{EntityKind, MeshError, Result};
use crate::partitioning::auto::{
    auto_partition_edges, auto_partition_nodes, edges_mergeable, faces_mergeable, owner_parts,
};
use crate::partitioning::flood_fill;
use crate::topology::cell_type::MAX_FACETS;
use crate::topology::entity::Gid;
use crate::topology::mesh::{Mesh, count_groups};

/// Target id for a selection: `gid` when it names an existing partition,
/// otherwise a fresh one.
fn target_id(existing: usize, gid: Option<usize>) -> usize {
    match gid {
        Some(g) if g < existing => g,
        _ => existing,
    }
}

/// Assign the selected faces to surface `gid` (or a new surface) and derive
/// curves and vertices again. Returns the number of faces moved.
pub fn partition_face_selection(mesh: &mut Mesh, gid: Option<usize>) -> usize {
    let target = target_id(mesh.count_face_partitions(), gid);
    let mut moved = 0;
    for f in mesh.faces.iter_mut().filter(|f| f.selected) {
        f.gid = Some(target);
        moved += 1;
    }
    if moved == 0 {
        return 0;
    }
    renumber_face_partitions(mesh);
    build_edges(mesh);
    let angle = mesh.options.smoothing_angle;
    auto_partition_edges(mesh, Some(angle));
    auto_partition_nodes(mesh);
    mark_exterior_nodes(mesh);
    mesh.update_mesh();
    log::debug!("moved {moved} faces to surface {target}");
    moved
}

/// Assign the selected edges to curve `gid` (or a new curve). The edges
/// become exterior. Returns the number of edges moved.
pub fn partition_edge_selection(mesh: &mut Mesh, gid: Option<usize>) -> usize {
    let target = target_id(mesh.count_edge_partitions(), gid);
    let mut moved = 0;
    for e in mesh.edges.iter_mut().filter(|e| e.selected) {
        e.gid = Some(target);
        e.exterior = true;
        moved += 1;
    }
    if moved == 0 {
        return 0;
    }
    renumber_edge_partitions(mesh);
    update_edge_neighbors(mesh);
    auto_partition_nodes(mesh);
    mark_exterior_nodes(mesh);
    mesh.update_mesh();
    moved
}

/// Move the selected elements into part `gid` (or a new part).
///
/// Faces are created on the new part boundary and the surfaces of the
/// moved elements get ids of their own. Curves are derived again. Existing
/// vertex ids keep their numbers; vertices that appear are numbered after
/// them. Returns the number of elements moved.
pub fn partition_element_selection(mesh: &mut Mesh, gid: Option<usize>) -> usize {
    let selected: Vec<usize> = mesh
        .elements
        .iter()
        .enumerate()
        .filter_map(|(i, e)| e.selected.then_some(i))
        .collect();
    if selected.is_empty() {
        return 0;
    }
    let part = target_id(mesh.count_element_partitions(), gid);
    for &i in &selected {
        mesh.elements[i].gid = Some(part);
    }
    // A part may have lost all of its elements.
    renumber_element_partitions(mesh);
    let part = mesh.elements[selected[0]].gid.unwrap_or(part);

    // Faces of moved elements are offset past every existing surface id;
    // new boundary faces start out unpartitioned.
    let offset = mesh.count_face_partitions() + 1;
    let mut shifted = vec![false; mesh.faces.len()];
    let mut new_faces = Vec::new();
    for &i in &selected {
        let el = &mesh.elements[i];
        let facets = if el.is_solid() {
            el.facet_count()
        } else if el.is_shell() {
            1
        } else {
            0
        };
        for j in 0..facets.min(MAX_FACETS) {
            match el.face[j] {
                Some(fi) => {
                    if let Some(s) = shifted.get_mut(fi) {
                        if !*s {
                            *s = true;
                            let f = &mut mesh.faces[fi];
                            f.gid = f.gid.map(|g| g + offset);
                        }
                    }
                }
                None if el.is_solid() => {
                    let Some(k) = el.nbr[j] else {
                        continue;
                    };
                    let other = &mesh.elements[k];
                    if other.is_solid() && other.gid != el.gid {
                        new_faces.push(el.face_of(j));
                    }
                }
                None => {}
            }
        }
    }
    let first_new = mesh.faces.len();
    mesh.faces.extend(new_faces);
    renumber_face_partitions(mesh);
    update_face_element_table(mesh);
    update_face_neighbors(mesh);

    let nf = mesh.faces.len();
    let (state, _) = {
        let faces = &mesh.faces;
        flood_fill(nf, first_new..nf, mesh.count_face_partitions(), |i, out| {
            let f = &faces[i];
            out.extend(
                f.nbr[..f.edge_count()]
                    .iter()
                    .flatten()
                    .copied()
                    .filter(|&k| faces[k].gid.is_none()),
            );
        })
    };
    for (f, s) in mesh.faces.iter_mut().zip(&state) {
        if f.gid.is_none() {
            f.gid = s.group();
        }
    }

    build_edges(mesh);
    let angle = mesh.options.smoothing_angle;
    auto_partition_edges(mesh, Some(angle));
    preserve_vertex_ids(mesh);
    mark_exterior_nodes(mesh);
    mesh.update_mesh();
    log::debug!("moved {} elements to part {part}", selected.len());
    selected.len()
}

/// Re-derive vertices, keeping the ids of nodes that were vertices before.
fn preserve_vertex_ids(mesh: &mut Mesh) {
    let before = mesh.count_node_partitions();
    let mut holders: Vec<Option<usize>> = vec![None; before];
    for (i, n) in mesh.nodes.iter().enumerate() {
        if let Some(g) = n.gid {
            holders[g] = Some(i);
        }
    }
    auto_partition_nodes(mesh);
    let mut next = mesh.count_node_partitions().max(before);
    for n in mesh.nodes.iter_mut().filter(|n| n.gid.is_some()) {
        n.gid = Some(next);
        next += 1;
    }
    for (g, holder) in holders.into_iter().enumerate() {
        if let Some(i) = holder {
            mesh.nodes[i].gid = Some(g);
        }
    }
    renumber_node_partitions(mesh);
}

/// Promote node `index` to a vertex. When the node lies inside a curve the
/// curve is split there: the edges on one side get a new curve id.
/// Returns `false` if the node already was a vertex.
pub fn partition_node(mesh: &mut Mesh, index: usize) -> Result<bool> {
    if index >= mesh.nodes.len() {
        return Err(MeshError::out_of_range(EntityKind::Node, index, mesh.nodes.len()));
    }
    if mesh.nodes[index].gid.is_some() {
        return Ok(false);
    }
    mesh.nodes[index].gid = Some(mesh.count_node_partitions());
    split_curve_at(mesh, index);
    Ok(true)
}

fn split_curve_at(mesh: &mut Mesh, node: usize) {
    let edges = &mut mesh.edges;
    let Some(start) = edges
        .iter()
        .position(|e| e.gid.is_some() && (e.n[0] == node || e.n[1] == node))
    else {
        return;
    };
    let new_curve = count_groups(edges.iter().map(|e| e.gid));
    let j = if edges[start].n[0] == node { 0 } else { 1 };

    // Cut the link across the new vertex in both directions.
    if let Some(p) = edges[start].nbr[j].take() {
        for slot in 0..2 {
            if edges[p].n[slot] == node && edges[p].nbr[slot] == Some(start) {
                edges[p].nbr[slot] = None;
            }
        }
    }

    let mut visited = vec![false; edges.len()];
    visited[start] = true;
    edges[start].gid = Some(new_curve);
    let mut at = edges[start].n[1 - j];
    let mut cur = edges[start].nbr[1 - j];
    while let Some(k) = cur {
        if k >= edges.len() || visited[k] {
            break;
        }
        visited[k] = true;
        edges[k].gid = Some(new_curve);
        let s = if edges[k].n[0] == at { 1 } else { 0 };
        at = edges[k].n[s];
        cur = edges[k].nbr[s];
    }
    renumber_edge_partitions(mesh);
}

/// Promote every node in `nodes` to a vertex. All indices are checked
/// before anything changes. Returns the number of new vertices.
pub fn partition_node_set(mesh: &mut Mesh, nodes: &[usize]) -> Result<usize> {
    let len = mesh.nodes.len();
    if let Some(&bad) = nodes.iter().find(|&&n| n >= len) {
        return Err(MeshError::out_of_range(EntityKind::Node, bad, len));
    }
    let mut promoted = 0;
    for &n in nodes {
        if partition_node(mesh, n)? {
            promoted += 1;
        }
    }
    Ok(promoted)
}

/// The single partition shared by `ids`, if they share one.
fn shared_partition(ids: &[usize], gid_of: impl Fn(usize) -> Gid) -> Option<usize> {
    let first = gid_of(ids[0])?;
    ids.iter().all(|&i| gid_of(i) == Some(first)).then_some(first)
}

/// Split the surface holding `faces` by connectivity and `angle`, flooding
/// only inside the selection. Returns the number of new surfaces.
pub fn auto_partition_faces(mesh: &mut Mesh, faces: &[usize], angle: f64) -> Result<usize> {
    if faces.is_empty() {
        return Ok(0);
    }
    let nf = mesh.faces.len();
    if let Some(&bad) = faces.iter().find(|&&i| i >= nf) {
        return Err(MeshError::out_of_range(EntityKind::Face, bad, nf));
    }
    if shared_partition(faces, |i| mesh.faces[i].gid).is_none() {
        return Err(MeshError::MixedPartitionSelection {
            kind: EntityKind::Face,
        });
    }

    let cos_w = cos_deg(angle);
    let mut in_sel = vec![false; nf];
    for &i in faces {
        in_sel[i] = true;
    }
    let first = mesh.count_face_partitions();
    let (state, next) = {
        let all = &mesh.faces;
        let normals: Vec<Vector3<f64>> = all.iter().map(|f| face_normal(&mesh.nodes, f)).collect();
        let parts: Vec<_> = all.iter().map(|f| owner_parts(&mesh.elements, f)).collect();
        flood_fill(nf, faces.iter().copied(), first, |i, out| {
            let f = &all[i];
            for &k in f.nbr[..f.edge_count()].iter().flatten() {
                if in_sel[k]
                    && parts[k] == parts[i]
                    && faces_mergeable(f, &all[k], &normals[i], &normals[k], cos_w, true)
                {
                    out.push(k);
                }
            }
        })
    };
    for &i in faces {
        mesh.faces[i].gid = state[i].group();
    }
    renumber_face_partitions(mesh);
    build_edges(mesh);
    let smoothing = mesh.options.smoothing_angle;
    auto_partition_edges(mesh, Some(smoothing));
    auto_partition_nodes(mesh);
    mark_exterior_nodes(mesh);
    Ok(next - first)
}

/// Split the curve holding `edges` by connectivity and `angle`, flooding
/// only inside the selection. Returns the number of new curves.
pub fn auto_partition_edges_in(mesh: &mut Mesh, edges: &[usize], angle: f64) -> Result<usize> {
    if edges.is_empty() {
        return Ok(0);
    }
    let ne = mesh.edges.len();
    if let Some(&bad) = edges.iter().find(|&&i| i >= ne) {
        return Err(MeshError::out_of_range(EntityKind::Edge, bad, ne));
    }
    if shared_partition(edges, |i| mesh.edges[i].gid).is_none() {
        return Err(MeshError::MixedPartitionSelection {
            kind: EntityKind::Edge,
        });
    }

    let cos_w = cos_deg(angle);
    let mut in_sel = vec![false; ne];
    for &i in edges {
        in_sel[i] = true;
    }
    let first = mesh.count_edge_partitions();
    let (state, next) = {
        let m = &*mesh;
        flood_fill(ne, edges.iter().copied(), first, |i, out| {
            for j in 0..2 {
                if let Some(k) = m.edges[i].nbr[j] {
                    if k < ne && in_sel[k] && edges_mergeable(m, i, j, k, cos_w) {
                        out.push(k);
                    }
                }
            }
        })
    };
    for &i in edges {
        mesh.edges[i].gid = state[i].group();
    }
    renumber_edge_partitions(mesh);
    rebuild_edge_data(mesh);
    auto_partition_nodes(mesh);
    mark_exterior_nodes(mesh);
    Ok(next - first)
}
