//! Structural edits: deletion and duplicate removal.
//!
//! Deletions compact the entity arrays through old → new remap tables and
//! rewrite every reference. The public operators finish with a rebuild so
//! the mesh is consistent again when they return.

use hashbrown::HashMap;

use crate::algs::adjacency::{find_duplicate_edges, find_duplicate_faces, update_element_neighbors};
use crate::algs::rebuild::{rebuild_edge_data, rebuild_face_data, rebuild_mesh, rebuild_node_data};
use crate::algs::renumber::{
    build_remap, remap_opt, renumber_all_partitions, renumber_element_partitions,
    renumber_node_partitions, retain_flagged,
};
use crate::mesh_error::{EntityKind, MeshError, Result};
use crate::topology::entity::FaceOwner;
use crate::topology::mesh::Mesh;

fn check_indices(kind: EntityKind, indices: &[usize], len: usize) -> Result<()> {
    match indices.iter().find(|&&i| i >= len) {
        Some(&bad) => Err(MeshError::out_of_range(kind, bad, len)),
        None => Ok(()),
    }
}

fn mask(len: usize, indices: &[usize]) -> Vec<bool> {
    let mut m = vec![false; len];
    for &i in indices {
        m[i] = true;
    }
    m
}

/// Drop the flagged elements and remap every element reference. Element
/// fields of matching length are compacted alongside; others are dropped.
/// Returns the number removed. No rebuild is done.
pub(crate) fn remove_elements(mesh: &mut Mesh, remove: &[bool]) -> usize {
    let before = mesh.elements.len();
    let keep: Vec<bool> = (0..before)
        .map(|i| !remove.get(i).copied().unwrap_or(false))
        .collect();
    let (remap, kept) = build_remap(&keep);
    if kept == before {
        return 0;
    }
    retain_flagged(&mut mesh.elements, &keep);
    mesh.element_fields.retain(|name, values| {
        if values.len() == before {
            retain_flagged(values, &keep);
            true
        } else {
            log::debug!("dropping element field {name}: length does not match the element count");
            false
        }
    });
    for el in &mut mesh.elements {
        for nb in &mut el.nbr {
            *nb = remap_opt(&remap, *nb);
        }
    }
    for f in &mut mesh.faces {
        for slot in &mut f.elem {
            *slot = slot.and_then(|o| {
                remap_opt(&remap, Some(o.eid)).map(|eid| FaceOwner { eid, lid: o.lid })
            });
        }
    }
    for e in &mut mesh.edges {
        e.elem = remap_opt(&remap, e.elem);
    }
    mesh.element_lookup.clear();
    mesh.invalidate_node_element_list();
    before - kept
}

/// Drop every node not flagged in `keep` and rewrite node references of
/// elements, faces, edges and node sets. Every referenced node must be kept.
pub(crate) fn compact_nodes(mesh: &mut Mesh, keep: &[bool]) -> Vec<Option<usize>> {
    let (remap, _) = build_remap(keep);
    let mut dangling = false;
    let mut apply = |nodes: &mut [usize]| {
        for n in nodes {
            match remap.get(*n).copied().flatten() {
                Some(m) => *n = m,
                None => dangling = true,
            }
        }
    };
    for el in &mut mesh.elements {
        apply(el.nodes_mut());
    }
    for f in &mut mesh.faces {
        apply(f.nodes_mut());
    }
    for e in &mut mesh.edges {
        apply(e.nodes_mut());
    }
    if dangling {
        log::warn!("node compaction left references to removed nodes");
        mesh.inconsistent = true;
    }
    retain_flagged(&mut mesh.nodes, keep);
    mesh.node_sets.remap(&remap);
    mesh.node_lookup.clear();
    mesh.invalidate_node_element_list();
    remap
}

/// Remove nodes that no element, face or edge references, unless they are
/// required or belong to a node set. Vertex ids are compacted. Returns the
/// number removed.
pub fn remove_isolated_nodes(mesh: &mut Mesh) -> usize {
    let nn = mesh.nodes.len();
    let mut keep: Vec<bool> = mesh.nodes.iter().map(|n| n.required).collect();
    let mut mark = |nodes: &[usize]| {
        for &n in nodes {
            if let Some(k) = keep.get_mut(n) {
                *k = true;
            }
        }
    };
    for el in &mesh.elements {
        mark(el.nodes());
    }
    for f in &mesh.faces {
        mark(f.nodes());
    }
    for e in &mesh.edges {
        mark(e.nodes());
    }
    mesh.node_sets.mark_nodes(&mut keep);

    let removed = keep.iter().filter(|k| !**k).count();
    if removed == 0 {
        return 0;
    }
    compact_nodes(mesh, &keep);
    renumber_node_partitions(mesh);
    log::debug!("removed {removed} isolated nodes of {nn}");
    removed
}

/// Delete elements by index, drop the nodes that become isolated and
/// rebuild. Returns the number of elements removed.
pub fn delete_elements(mesh: &mut Mesh, indices: &[usize]) -> Result<usize> {
    check_indices(EntityKind::Element, indices, mesh.elements.len())?;
    let remove = mask(mesh.elements.len(), indices);
    delete_flagged_elements(mesh, &remove)
}

/// Delete the selected elements.
pub fn delete_selected_elements(mesh: &mut Mesh) -> Result<usize> {
    let remove: Vec<bool> = mesh.elements.iter().map(|e| e.selected).collect();
    delete_flagged_elements(mesh, &remove)
}

fn delete_flagged_elements(mesh: &mut Mesh, remove: &[bool]) -> Result<usize> {
    let removed = remove_elements(mesh, remove);
    if removed == 0 {
        return Ok(0);
    }
    renumber_element_partitions(mesh);
    mesh.clear_topology();
    remove_isolated_nodes(mesh);
    let options = mesh.options.clone();
    rebuild_mesh(mesh, &options)?;
    Ok(removed)
}

/// Delete every element that uses one of `nodes`. Returns the number of
/// elements removed.
pub fn delete_nodes(mesh: &mut Mesh, nodes: &[usize]) -> Result<usize> {
    check_indices(EntityKind::Node, nodes, mesh.nodes.len())?;
    let doomed = mask(mesh.nodes.len(), nodes);
    let remove: Vec<bool> = mesh
        .elements
        .iter()
        .map(|el| el.nodes().iter().any(|&n| doomed[n]))
        .collect();
    delete_flagged_elements(mesh, &remove)
}

/// Delete every element that owns one of `faces`. Returns the number of
/// elements removed.
pub fn delete_faces(mesh: &mut Mesh, faces: &[usize]) -> Result<usize> {
    check_indices(EntityKind::Face, faces, mesh.faces.len())?;
    let mut remove = vec![false; mesh.elements.len()];
    for &i in faces {
        for o in mesh.faces[i].owners() {
            if let Some(r) = remove.get_mut(o.eid) {
                *r = true;
            }
        }
    }
    delete_flagged_elements(mesh, &remove)
}

/// Copy of `mesh` without the elements of `parts`.
///
/// Unlike [`delete_elements`] this keeps the existing faces, edges and
/// partitions where they survive instead of deriving them again. Faces go
/// when every owner is deleted; edges go when only deleted elements use
/// them. Curve ends exposed by the cut become vertices.
pub fn delete_parts(mesh: &Mesh, parts: &[usize]) -> Result<Mesh> {
    let mut m = mesh.clone();
    let doomed: Vec<bool> = m
        .elements
        .iter()
        .map(|e| e.gid.is_some_and(|g| parts.contains(&g)))
        .collect();
    if !doomed.contains(&true) {
        return Ok(m);
    }

    // Nodes of deleted elements go unless a surviving element uses them.
    let mut node_keep = vec![true; m.nodes.len()];
    for (el, _) in m.elements.iter().zip(&doomed).filter(|(_, d)| **d) {
        for &n in el.nodes() {
            node_keep[n] = false;
        }
    }
    for (el, _) in m.elements.iter().zip(&doomed).filter(|(_, d)| !**d) {
        for &n in el.nodes() {
            node_keep[n] = true;
        }
    }
    for (k, node) in node_keep.iter_mut().zip(&m.nodes) {
        *k |= node.required;
    }

    let mut face_keep = Vec::with_capacity(m.faces.len());
    for f in &m.faces {
        if f.elem[0].is_none() {
            return Err(MeshError::InconsistentMesh("face without an owning element"));
        }
        face_keep.push(!f.owners().all(|o| doomed[o.eid]));
    }

    // Element → edge incidence through corner pairs.
    let mut by_ends: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for (i, e) in m.edges.iter().enumerate() {
        let (a, b) = e.ends();
        by_ends.entry((a.min(b), a.max(b))).or_default().push(i);
    }
    let mut edge_state: Vec<Option<bool>> = vec![None; m.edges.len()];
    for (el, &d) in m.elements.iter().zip(&doomed) {
        for key in el.corner_edges() {
            for &i in by_ends.get(&key).into_iter().flatten() {
                edge_state[i] = match (edge_state[i], d) {
                    (Some(true), _) | (_, false) => Some(true),
                    (_, true) => Some(false),
                };
            }
        }
    }
    let edge_keep: Vec<bool> = edge_state.iter().map(|s| s.unwrap_or(true)).collect();

    let keeps_node = |nodes: &[usize]| nodes.iter().all(|&n| node_keep[n]);
    let faces_ok = m
        .faces
        .iter()
        .zip(&face_keep)
        .all(|(f, &k)| !k || keeps_node(f.nodes()));
    let edges_ok = m
        .edges
        .iter()
        .zip(&edge_keep)
        .all(|(e, &k)| !k || keeps_node(e.nodes()));
    if !faces_ok || !edges_ok {
        return Err(MeshError::InconsistentMesh(
            "surviving faces or edges reference nodes of deleted parts",
        ));
    }

    remove_elements(&mut m, &doomed);
    retain_flagged(&mut m.faces, &face_keep);
    retain_flagged(&mut m.edges, &edge_keep);
    compact_nodes(&mut m, &node_keep);

    update_element_neighbors(&mut m);
    rebuild_face_data(&mut m);
    rebuild_edge_data(&mut m);

    let mut next = m.count_node_partitions();
    let Mesh { nodes, edges, .. } = &mut m;
    for e in edges.iter().filter(|e| e.gid.is_some()) {
        for j in 0..2 {
            if e.nbr[j].is_none() {
                let node = &mut nodes[e.n[j]];
                if node.gid.is_none() {
                    node.gid = Some(next);
                    next += 1;
                }
            }
        }
    }
    rebuild_node_data(&mut m);
    renumber_all_partitions(&mut m);
    m.update_mesh();
    log::debug!(
        "deleted parts {parts:?}: {} elements remain",
        m.element_count()
    );
    Ok(m)
}

/// Remove faces that repeat an earlier face. Returns the number removed.
pub fn remove_duplicate_faces(mesh: &mut Mesh) -> usize {
    let dups = find_duplicate_faces(mesh);
    if dups.is_empty() {
        return 0;
    }
    let mut keep = vec![true; mesh.faces.len()];
    for &(_, second) in &dups {
        keep[second] = false;
    }
    retain_flagged(&mut mesh.faces, &keep);
    rebuild_face_data(mesh);
    keep.iter().filter(|k| !**k).count()
}

/// Remove edges that repeat an earlier edge. Returns the number removed.
pub fn remove_duplicate_edges(mesh: &mut Mesh) -> usize {
    let dups = find_duplicate_edges(mesh);
    if dups.is_empty() {
        return 0;
    }
    let mut keep = vec![true; mesh.edges.len()];
    for &(_, second) in &dups {
        keep[second] = false;
    }
    retain_flagged(&mut mesh.edges, &keep);
    rebuild_edge_data(mesh);
    keep.iter().filter(|k| !**k).count()
}
