//! Mesh validation.
//!
//! `validate_*` check the references a rebuild depends on and return the
//! first problem as [`MeshError::InvalidTopology`]; they run before any
//! mutation. [`collect_defects`] checks the derived adjacency data of a
//! rebuilt mesh and lists every violation it finds.

use crate::algs::adjacency::{edge_on_surface_boundary, find_duplicate_edges, find_duplicate_faces};
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::{EntityKind, MeshError, Result, TopologyDefect};
use crate::topology::entity::Gid;
use crate::topology::mesh::Mesh;

/// Toggles for [`collect_defects`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Element neighbor links are reciprocated.
    pub neighbor_symmetry: bool,
    /// Face owners point back at the face, and every face has an owner.
    pub face_owners: bool,
    /// A face is exterior iff it has no second owner.
    pub face_exterior: bool,
    /// Curve ids agree with recomputed edge exteriority.
    pub edge_exterior: bool,
    /// Partition ids of every kind run `0..N` without gaps.
    pub partition_contiguity: bool,
    pub duplicates: bool,
}

impl ValidationOptions {
    pub fn all() -> Self {
        Self {
            neighbor_symmetry: true,
            face_owners: true,
            face_exterior: true,
            edge_exterior: true,
            partition_contiguity: true,
            duplicates: true,
        }
    }

    pub fn none() -> Self {
        Self {
            neighbor_symmetry: false,
            face_owners: false,
            face_exterior: false,
            edge_exterior: false,
            partition_contiguity: false,
            duplicates: false,
        }
    }
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self::all()
    }
}

fn fail(defect: TopologyDefect) -> Result<()> {
    Err(MeshError::InvalidTopology(defect))
}

fn check_nodes(kind: EntityKind, entity: usize, nodes: &[usize], len: usize) -> Result<()> {
    match nodes.iter().find(|&&n| n >= len) {
        Some(&node) => fail(TopologyDefect::NodeOutOfRange {
            kind,
            entity,
            node,
            nodes: len,
        }),
        None => Ok(()),
    }
}

fn check_ref(
    kind: EntityKind,
    entity: usize,
    target_kind: EntityKind,
    target: Option<usize>,
    len: usize,
) -> Result<()> {
    match target {
        Some(t) if t >= len => fail(TopologyDefect::ReferenceOutOfRange {
            kind,
            entity,
            target_kind,
            target: t,
        }),
        _ => Ok(()),
    }
}

/// Element connectivity: nodes in range and not repeated, and a part id
/// when `require_part` is set.
pub fn validate_elements(mesh: &Mesh, require_part: bool) -> Result<()> {
    let nn = mesh.nodes.len();
    for (i, el) in mesh.elements.iter().enumerate() {
        let nodes = el.nodes();
        check_nodes(EntityKind::Element, i, nodes, nn)?;
        for (k, &a) in nodes.iter().enumerate() {
            if nodes[k + 1..].contains(&a) {
                return fail(TopologyDefect::RepeatedNode {
                    element: i,
                    node: a,
                });
            }
        }
        if require_part && el.gid.is_none() {
            return fail(TopologyDefect::MissingPartition { element: i });
        }
    }
    Ok(())
}

/// Face nodes, owners and neighbors are in range.
pub fn validate_faces(mesh: &Mesh) -> Result<()> {
    let (nn, ne, nf) = (mesh.nodes.len(), mesh.elements.len(), mesh.faces.len());
    for (i, f) in mesh.faces.iter().enumerate() {
        check_nodes(EntityKind::Face, i, f.nodes(), nn)?;
        for o in f.owners() {
            check_ref(EntityKind::Face, i, EntityKind::Element, Some(o.eid), ne)?;
        }
        for &k in &f.nbr {
            check_ref(EntityKind::Face, i, EntityKind::Face, k, nf)?;
        }
    }
    Ok(())
}

/// Edge nodes, neighbors and beam references are in range.
pub fn validate_edges(mesh: &Mesh) -> Result<()> {
    let (nn, ne, nl) = (mesh.nodes.len(), mesh.elements.len(), mesh.edges.len());
    for (i, e) in mesh.edges.iter().enumerate() {
        check_nodes(EntityKind::Edge, i, e.nodes(), nn)?;
        check_ref(EntityKind::Edge, i, EntityKind::Element, e.elem, ne)?;
        for &k in &e.nbr {
            check_ref(EntityKind::Edge, i, EntityKind::Edge, k, nl)?;
        }
    }
    Ok(())
}

/// First id in `0..max` that no entity uses.
fn first_gap(gids: impl Iterator<Item = Gid>) -> Option<usize> {
    let used: Vec<usize> = gids.flatten().collect();
    let max = used.iter().copied().max()?;
    let mut seen = vec![false; max + 1];
    for g in used {
        seen[g] = true;
    }
    seen.iter().position(|s| !s)
}

/// Every violation of the derived-data invariants enabled in `opts`.
///
/// Reference ranges are checked first; if they fail, only that defect is
/// returned since the remaining checks would index out of bounds.
pub fn collect_defects(mesh: &Mesh, opts: &ValidationOptions) -> Vec<TopologyDefect> {
    for check in [
        validate_elements(mesh, false),
        validate_faces(mesh),
        validate_edges(mesh),
    ] {
        if let Err(MeshError::InvalidTopology(d)) = check {
            return vec![d];
        }
    }
    let elements = &mesh.elements;
    let ne = elements.len();
    let mut out = Vec::new();

    if opts.neighbor_symmetry {
        for (a, el) in elements.iter().enumerate() {
            // Beam links and solid-to-shell links are one-directional.
            if el.is_beam() {
                continue;
            }
            for (facet, nb) in el.nbr[..el.facet_count()].iter().enumerate() {
                let Some(b) = *nb else { continue };
                if b >= ne {
                    out.push(TopologyDefect::ReferenceOutOfRange {
                        kind: EntityKind::Element,
                        entity: a,
                        target_kind: EntityKind::Element,
                        target: b,
                    });
                    continue;
                }
                let other = &elements[b];
                if el.is_solid() && other.is_shell() {
                    continue;
                }
                if !other.nbr[..other.facet_count()].contains(&Some(a)) {
                    out.push(TopologyDefect::AsymmetricNeighbor { a, facet, b });
                }
            }
        }
    }

    if opts.face_owners {
        for (i, f) in mesh.faces.iter().enumerate() {
            if f.elem[0].is_none() {
                out.push(TopologyDefect::UnownedFace { face: i });
            }
            for o in f.owners() {
                if elements[o.eid].face.get(o.lid).copied().flatten() != Some(i) {
                    out.push(TopologyDefect::BrokenFaceBackReference {
                        face: i,
                        element: o.eid,
                    });
                }
            }
        }
    }

    if opts.face_exterior {
        for (i, f) in mesh.faces.iter().enumerate() {
            if f.exterior != f.elem[1].is_none() {
                out.push(TopologyDefect::FaceExteriorMismatch { face: i });
            }
        }
    }

    if opts.edge_exterior {
        let nfl = mesh.node_face_list();
        for (i, e) in mesh.edges.iter().enumerate() {
            let boundary = edge_on_surface_boundary(&mesh.faces, &nfl, e.n[0], e.n[1]);
            if (e.gid.is_some() && !e.exterior) || (boundary && e.gid.is_none()) {
                out.push(TopologyDefect::EdgeExteriorMismatch { edge: i });
            }
        }
    }

    if opts.partition_contiguity {
        let gaps = [
            (EntityKind::Element, first_gap(elements.iter().map(|e| e.gid))),
            (EntityKind::Face, first_gap(mesh.faces.iter().map(|f| f.gid))),
            (EntityKind::Edge, first_gap(mesh.edges.iter().map(|e| e.gid))),
            (EntityKind::Node, first_gap(mesh.nodes.iter().map(|n| n.gid))),
        ];
        for (kind, gap) in gaps {
            if let Some(missing) = gap {
                out.push(TopologyDefect::PartitionGap { kind, missing });
            }
        }
    }

    if opts.duplicates {
        for (first, second) in find_duplicate_faces(mesh) {
            out.push(TopologyDefect::Duplicate {
                kind: EntityKind::Face,
                first,
                second,
            });
        }
        for (first, second) in find_duplicate_edges(mesh) {
            out.push(TopologyDefect::Duplicate {
                kind: EntityKind::Edge,
                first,
                second,
            });
        }
    }
    out
}

/// First violation of the invariants enabled in `opts`.
pub fn validate_invariants(mesh: &Mesh, opts: &ValidationOptions) -> Result<()> {
    match collect_defects(mesh, opts).into_iter().next() {
        Some(d) => fail(d),
        None => Ok(()),
    }
}

impl DebugInvariants for Mesh {
    fn debug_assert_invariants(&self) {
        if let Err(e) = self.validate_invariants() {
            panic!("[invariants] mesh: {e}");
        }
    }

    fn validate_invariants(&self) -> Result<()> {
        validate_invariants(self, &ValidationOptions::all())
    }
}
