//! Neighbor, back-reference and exterior derivation.
//!
//! Each stage reads the records produced by the previous one:
//!
//! 1. [`update_element_neighbors`] links element facets through the node →
//!    element valence list.
//! 2. [`update_face_element_table`] points every face at the element facets
//!    it covers, and every element facet back at its face.
//! 3. [`update_face_neighbors`] links faces across shared corner edges.
//! 4. [`update_edge_element_table`], [`mark_exterior_edges`] and
//!    [`update_edge_neighbors`] do the same for edges.
//!
//! Non-manifold input never aborts a stage. Facets without a match stay
//! unlinked (and therefore exterior) and the defect is recorded in the
//! mesh's diagnostics.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::mesh_error::TopologyDefect;
use crate::topology::cell_type::{ElementFamily, MAX_FACE_EDGES, MAX_FACETS};
use crate::topology::entity::{Element, Face, FaceOwner};
use crate::topology::mesh::Mesh;
use crate::topology::valence::ValenceList;

/// A facet of one element matched against another element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FacetMatch {
    facet: usize,
    nbr: usize,
    /// Facet of `nbr` that receives the symmetric link.
    back: Option<usize>,
}

/// Candidate neighbors of element `i`, scanning only elements incident on
/// the facet's first node.
fn facet_matches(elements: &[Element], nel: &ValenceList, i: usize) -> Vec<FacetMatch> {
    let el = &elements[i];
    let mut out = Vec::new();
    match el.kind.family() {
        ElementFamily::Solid => {
            for j in 0..el.kind.faces().len() {
                let f = el.face_of(j);
                let cands = nel.items(f.n[0]);
                // A shell on this face owns it; try those first.
                let shell = cands.iter().copied().find(|&k| {
                    k != i
                        && elements[k]
                            .shell_face()
                            .is_some_and(|sf| sf.same_as(&f))
                });
                if let Some(k) = shell {
                    out.push(FacetMatch {
                        facet: j,
                        nbr: k,
                        back: None,
                    });
                    continue;
                }
                let solid = cands.iter().copied().find_map(|k| {
                    (k != i && elements[k].is_solid())
                        .then(|| elements[k].find_face(&f))
                        .flatten()
                        .map(|l| (k, l))
                });
                if let Some((k, l)) = solid {
                    out.push(FacetMatch {
                        facet: j,
                        nbr: k,
                        back: Some(l),
                    });
                }
            }
        }
        ElementFamily::Shell => {
            for j in 0..el.kind.edges().len() {
                let e = el.edge_of(j);
                let m = nel.items(e.n[0]).iter().copied().find_map(|k| {
                    let other = &elements[k];
                    (k != i && other.is_shell() && !other.same_as(el))
                        .then(|| other.find_edge(&e))
                        .flatten()
                        .map(|l| (k, l))
                });
                if let Some((k, l)) = m {
                    out.push(FacetMatch {
                        facet: j,
                        nbr: k,
                        back: Some(l),
                    });
                }
            }
        }
        ElementFamily::Beam => {
            for j in 0..2 {
                let node = el.n[j];
                let m = nel.items(node).iter().copied().find(|&k| {
                    let other = &elements[k];
                    k != i && other.is_beam() && (other.n[0] == node || other.n[1] == node)
                });
                if let Some(k) = m {
                    out.push(FacetMatch {
                        facet: j,
                        nbr: k,
                        back: None,
                    });
                }
            }
        }
    }
    out
}

/// Link every element facet to the element across it.
///
/// Candidate discovery is read-only and runs in parallel with the `rayon`
/// feature. Links are then applied in element order, skipping facets that an
/// earlier element already filled symmetrically, so the result is the same
/// either way.
pub fn update_element_neighbors(mesh: &mut Mesh) {
    for el in &mut mesh.elements {
        el.clear_topology();
    }
    let matches: Vec<Vec<FacetMatch>> = {
        let nel = mesh.node_element_list();
        let elements = &mesh.elements;
        #[cfg(feature = "rayon")]
        {
            (0..elements.len())
                .into_par_iter()
                .map(|i| facet_matches(elements, nel, i))
                .collect()
        }
        #[cfg(not(feature = "rayon"))]
        {
            (0..elements.len())
                .map(|i| facet_matches(elements, nel, i))
                .collect()
        }
    };
    for (i, ms) in matches.into_iter().enumerate() {
        for m in ms {
            if mesh.elements[i].nbr[m.facet].is_some() {
                continue;
            }
            if let Some(l) = m.back {
                // A third element on a facet pair keeps the first link.
                if mesh.elements[m.nbr].nbr[l].is_some_and(|k| k != i) {
                    mesh.diagnostics.report(TopologyDefect::NonManifoldFacet {
                        element: i,
                        facet: m.facet,
                        other: m.nbr,
                    });
                    continue;
                }
                mesh.elements[m.nbr].nbr[l] = Some(i);
            }
            mesh.elements[i].nbr[m.facet] = Some(m.nbr);
        }
    }
    let linked: usize = mesh
        .elements
        .iter()
        .map(|e| e.nbr.iter().flatten().count())
        .sum();
    log::debug!(
        "element neighbors: {} elements, {linked} linked facets",
        mesh.elements.len()
    );
}

/// Solids with an open face are exterior; shells and beams always are.
pub fn mark_exterior_elements(mesh: &mut Mesh) {
    for el in &mut mesh.elements {
        el.exterior = if el.is_solid() {
            el.nbr[..el.facet_count()].iter().any(Option::is_none)
        } else {
            true
        };
    }
}

/// Point each face at the element facets it covers.
///
/// Slot 0 takes a coincident shell when there is one. Solid owners follow
/// in ascending part id (ties keep discovery order). A face is exterior iff
/// it has no second owner. Open solid facets left without a face are
/// recorded as partial adjacency.
pub fn update_face_element_table(mesh: &mut Mesh) {
    let nel = mesh.node_element_list().clone();
    let Mesh {
        faces,
        elements,
        diagnostics,
        ..
    } = mesh;
    for el in elements.iter_mut() {
        el.face = [None; MAX_FACETS];
    }
    for (i, face) in faces.iter_mut().enumerate() {
        face.elem = [None; 3];
        let cands = nel.items(face.n[0]);

        let mut shell: Option<FaceOwner> = None;
        let mut solids = Vec::new();
        for &k in cands {
            let el = &elements[k];
            match el.kind.family() {
                ElementFamily::Shell => {
                    if shell.is_none()
                        && el.face[0].is_none()
                        && el.shell_face().is_some_and(|sf| sf.same_as(face))
                    {
                        shell = Some(FaceOwner { eid: k, lid: 0 });
                    }
                }
                ElementFamily::Solid => {
                    for l in 0..el.kind.faces().len() {
                        if el.face[l].is_none() && el.face_of(l).same_as(face) {
                            solids.push((el.gid, FaceOwner { eid: k, lid: l }));
                        }
                    }
                }
                ElementFamily::Beam => {}
            }
        }
        solids.sort_by_key(|(gid, _)| *gid);

        let owners = shell
            .into_iter()
            .chain(solids.into_iter().map(|(_, o)| o));
        let mut slot = 0;
        for owner in owners {
            if slot == face.elem.len() {
                diagnostics.report(TopologyDefect::OverOwnedFace {
                    face: i,
                    element: owner.eid,
                });
                continue;
            }
            face.elem[slot] = Some(owner);
            elements[owner.eid].face[owner.lid] = Some(i);
            slot += 1;
        }
        if slot == 0 {
            diagnostics.report(TopologyDefect::UnownedFace { face: i });
        }
        face.exterior = face.elem[1].is_none();
    }
    for (i, el) in elements.iter().enumerate().filter(|(_, e)| e.is_solid()) {
        for facet in 0..el.facet_count() {
            if el.nbr[facet].is_none() && el.face[facet].is_none() {
                diagnostics.report(TopologyDefect::PartialAdjacency { element: i, facet });
            }
        }
    }
}

/// Connected components of the undirected element neighbor graph, labeled
/// in order of their lowest element.
pub(crate) fn element_super_groups(elements: &[Element]) -> Vec<usize> {
    let n = elements.len();
    let mut parent: Vec<usize> = (0..n).collect();
    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }
    for (i, el) in elements.iter().enumerate() {
        for &k in el.nbr[..el.facet_count()].iter().flatten() {
            if k < n {
                let (a, b) = (find(&mut parent, i), find(&mut parent, k));
                if a != b {
                    parent[a.max(b)] = a.min(b);
                }
            }
        }
    }
    let mut label = vec![usize::MAX; n];
    let mut groups = vec![0; n];
    let mut next = 0;
    for i in 0..n {
        let r = find(&mut parent, i);
        if label[r] == usize::MAX {
            label[r] = next;
            next += 1;
        }
        groups[i] = label[r];
    }
    groups
}

/// Whether faces `f` and `g` that share an edge may be linked.
fn valid_face_neighbor(f: &Face, g: &Face) -> bool {
    if f.exterior != g.exterior || f.same_as(g) {
        return false;
    }
    // A tri lying on half of a quad (T-junction) is not a neighbor.
    let covers = |tri: &Face, quad: &Face| {
        tri.corners().iter().all(|&n| quad.corners().contains(&n))
    };
    match (f.kind.is_tri(), g.kind.is_tri()) {
        (true, false) => !covers(f, g),
        (false, true) => !covers(g, f),
        _ => true,
    }
}

/// Link faces that share a corner edge, lie in the same element super-group
/// and have the same exterior flag.
pub fn update_face_neighbors(mesh: &mut Mesh) {
    let groups = element_super_groups(&mesh.elements);
    let face_group: Vec<Option<usize>> = mesh
        .faces
        .iter()
        .map(|f| f.elem[0].map(|o| groups[o.eid]))
        .collect();
    let nfl = mesh.node_face_list();
    let faces = &mesh.faces;
    let nbrs: Vec<[Option<usize>; MAX_FACE_EDGES]> = faces
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let mut nbr = [None; MAX_FACE_EDGES];
            let c = f.corners();
            for j in 0..c.len() {
                let (a, b) = (c[j], c[(j + 1) % c.len()]);
                nbr[j] = nfl.items(a).iter().copied().find(|&k| {
                    k != i
                        && faces[k].has_edge(a, b)
                        && face_group[k] == face_group[i]
                        && valid_face_neighbor(f, &faces[k])
                });
            }
            nbr
        })
        .collect();
    for (f, nbr) in mesh.faces.iter_mut().zip(nbrs) {
        f.nbr = nbr;
    }
}

/// Refresh exterior flags of all faces from their back-references.
pub fn mark_exterior_faces(mesh: &mut Mesh) {
    for f in &mut mesh.faces {
        f.exterior = f.elem[1].is_none();
    }
}

/// Point every edge at the beam element it backs, if any.
pub fn update_edge_element_table(mesh: &mut Mesh) {
    let nel = mesh.node_element_list().clone();
    let Mesh {
        edges, elements, ..
    } = mesh;
    for e in edges.iter_mut() {
        e.elem = nel.items(e.n[0]).iter().copied().find(|&k| {
            elements[k]
                .beam_edge()
                .is_some_and(|be| be.same_as(e))
        });
    }
}

/// True if the edge `(a, b)` separates faces: one face has no neighbor
/// across it, or the faces on it lie in different surface partitions.
pub(crate) fn edge_on_surface_boundary(
    faces: &[Face],
    nfl: &ValenceList,
    a: usize,
    b: usize,
) -> bool {
    let mut gid = None;
    for &k in nfl.items(a) {
        let f = &faces[k];
        let Some(j) = f.find_edge(a, b) else {
            continue;
        };
        if f.nbr[j].is_none() {
            return true;
        }
        match gid {
            None => gid = Some(f.gid),
            Some(g) if g != f.gid => return true,
            _ => {}
        }
    }
    false
}

/// Recompute edge exteriority from face data instead of trusting the curve
/// ids alone. An edge is exterior if it backs a beam, lies on a surface
/// boundary, or carries a curve id.
pub fn mark_exterior_edges(mesh: &mut Mesh) {
    let nfl = mesh.node_face_list();
    let Mesh { edges, faces, .. } = mesh;
    for e in edges.iter_mut() {
        e.exterior = e.gid.is_some()
            || e.elem.is_some()
            || edge_on_surface_boundary(faces, &nfl, e.n[0], e.n[1]);
    }
}

/// Link partitioned edges that meet at a node shared by exactly two
/// exterior edges and carry the same curve id.
pub fn update_edge_neighbors(mesh: &mut Mesh) {
    let nll = mesh.node_edge_list(true);
    let edges = &mesh.edges;
    let nbrs: Vec<[Option<usize>; 2]> = edges
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut nbr = [None; 2];
            if e.gid.is_none() {
                return nbr;
            }
            for (j, slot) in nbr.iter_mut().enumerate() {
                let items = nll.items(e.n[j]);
                if items.len() != 2 || !items.contains(&i) {
                    continue;
                }
                let k = if items[0] == i { items[1] } else { items[0] };
                if k != i && edges[k].gid == e.gid {
                    *slot = Some(k);
                }
            }
            nbr
        })
        .collect();
    for (e, nbr) in mesh.edges.iter_mut().zip(nbrs) {
        e.nbr = nbr;
    }
}

/// Nodes of exterior faces and of beams are exterior.
pub fn mark_exterior_nodes(mesh: &mut Mesh) {
    let Mesh {
        nodes,
        faces,
        elements,
        ..
    } = mesh;
    for n in nodes.iter_mut() {
        n.exterior = false;
    }
    let mut mark = |ns: &[usize]| {
        for &n in ns {
            if let Some(node) = nodes.get_mut(n) {
                node.exterior = true;
            }
        }
    };
    for f in faces.iter().filter(|f| f.exterior) {
        mark(f.nodes());
    }
    for el in elements.iter().filter(|e| e.is_beam()) {
        mark(el.nodes());
    }
}

/// Indices of faces that duplicate an earlier face, paired with the earlier one.
pub fn find_duplicate_faces(mesh: &Mesh) -> Vec<(usize, usize)> {
    let nfl = mesh.node_face_list();
    let mut out = Vec::new();
    for (i, f) in mesh.faces.iter().enumerate() {
        if let Some(&k) = nfl
            .items(f.n[0])
            .iter()
            .find(|&&k| k < i && mesh.faces[k].same_as(f))
        {
            out.push((k, i));
        }
    }
    out
}

/// Indices of edges that duplicate an earlier edge, paired with the earlier one.
pub fn find_duplicate_edges(mesh: &Mesh) -> Vec<(usize, usize)> {
    let nll = mesh.node_edge_list(false);
    let mut out = Vec::new();
    for (i, e) in mesh.edges.iter().enumerate() {
        if let Some(&k) = nll
            .items(e.n[0])
            .iter()
            .find(|&&k| k < i && mesh.edges[k].same_as(e))
        {
            out.push((k, i));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::cell_type::{ElementType, FaceType};

    fn two_hexes() -> Mesh {
        // 2x1x1 block of hexes sharing the x = 1 face.
        let mut pos = Vec::new();
        for z in 0..2 {
            for y in 0..2 {
                for x in 0..3 {
                    pos.push([x as f64, y as f64, z as f64]);
                }
            }
        }
        let id = |x: usize, y: usize, z: usize| x + 3 * y + 6 * z;
        let hex = |x: usize| {
            Element::new(
                ElementType::Hex8,
                &[
                    id(x, 0, 0),
                    id(x + 1, 0, 0),
                    id(x + 1, 1, 0),
                    id(x, 1, 0),
                    id(x, 0, 1),
                    id(x + 1, 0, 1),
                    id(x + 1, 1, 1),
                    id(x, 1, 1),
                ],
            )
        };
        Mesh::from_parts(&pos, vec![hex(0), hex(1)]).unwrap()
    }

    #[test]
    fn shared_hex_face_links_both_ways() {
        let mut m = two_hexes();
        update_element_neighbors(&mut m);
        let a = &m.elements()[0];
        let b = &m.elements()[1];
        assert_eq!(a.nbr[1], Some(1));
        assert_eq!(b.nbr[3], Some(0));
        assert_eq!(a.nbr.iter().flatten().count(), 1);
        mark_exterior_elements(&mut m);
        assert!(m.elements().iter().all(|e| e.exterior));
    }

    #[test]
    fn shells_link_across_edges() {
        let mut m = Mesh::from_parts(
            &[[0., 0., 0.], [1., 0., 0.], [1., 1., 0.], [0., 1., 0.]],
            vec![
                Element::new(ElementType::Tri3, &[0, 1, 2]),
                Element::new(ElementType::Tri3, &[0, 2, 3]),
            ],
        )
        .unwrap();
        update_element_neighbors(&mut m);
        assert_eq!(m.elements()[0].nbr[2], Some(1));
        assert_eq!(m.elements()[1].nbr[0], Some(0));
    }

    #[test]
    fn beams_chain_through_shared_nodes() {
        let mut m = Mesh::from_parts(
            &[[0., 0., 0.], [1., 0., 0.], [2., 0., 0.]],
            vec![
                Element::new(ElementType::Beam2, &[0, 1]),
                Element::new(ElementType::Beam2, &[1, 2]),
            ],
        )
        .unwrap();
        update_element_neighbors(&mut m);
        assert_eq!(m.elements()[0].nbr[..2], [None, Some(1)]);
        assert_eq!(m.elements()[1].nbr[..2], [Some(0), None]);
    }

    #[test]
    fn super_groups_split_disconnected_clusters() {
        let els = vec![
            Element::new(ElementType::Tri3, &[0, 1, 2]),
            Element::new(ElementType::Tri3, &[5, 6, 7]),
            Element::new(ElementType::Tri3, &[0, 2, 3]),
        ];
        let mut els = els;
        els[0].nbr[2] = Some(2);
        els[2].nbr[0] = Some(0);
        assert_eq!(element_super_groups(&els), vec![0, 1, 0]);
    }

    #[test]
    fn tri_on_half_of_a_quad_is_rejected() {
        let q = Face::new(FaceType::Quad4, &[0, 1, 2, 3]);
        let t = Face::new(FaceType::Tri3, &[0, 1, 2]);
        let u = Face::new(FaceType::Tri3, &[1, 0, 4]);
        assert!(!valid_face_neighbor(&q, &t));
        assert!(!valid_face_neighbor(&t, &q));
        assert!(valid_face_neighbor(&q, &u));
    }
}
