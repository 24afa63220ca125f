//! Node, edge, face and element records.
//!
//! All cross references are indices into the owning [`Mesh`](crate::topology::mesh::Mesh)
//! containers. An absent reference is `None`; an unpartitioned entity has
//! `gid == None`.

use crate::topology::cell_type::{
    EdgeType, ElementFamily, ElementType, FaceType, LocalFace, MAX_EDGE_NODES, MAX_ELEMENT_NODES, MAX_FACE_EDGES,
    MAX_FACE_NODES, MAX_FACETS,
};
use nalgebra::Point3;

/// Group id: part for elements, surface for faces, curve for edges, vertex for nodes.
pub type Gid = Option<usize>;

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub pos: Point3<f64>,
    /// Vertex partition.
    pub gid: Gid,
    /// Stable external id.
    pub nid: Option<u32>,
    pub exterior: bool,
    pub selected: bool,
    /// Never removed as an isolated node.
    pub required: bool,
}

impl Node {
    pub fn new(pos: Point3<f64>) -> Self {
        Self {
            pos,
            gid: None,
            nid: None,
            exterior: false,
            selected: false,
            required: false,
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new(Point3::origin())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Edge {
    pub kind: EdgeType,
    pub n: [usize; MAX_EDGE_NODES],
    /// Curve partition.
    pub gid: Gid,
    /// Neighbor across each end node.
    pub nbr: [Option<usize>; 2],
    /// Beam element backed by this edge.
    pub elem: Option<usize>,
    pub exterior: bool,
    pub selected: bool,
}

impl Edge {
    pub fn new(kind: EdgeType, nodes: &[usize]) -> Self {
        let mut n = [0; MAX_EDGE_NODES];
        n[..nodes.len()].copy_from_slice(nodes);
        Self {
            kind,
            n,
            ..Default::default()
        }
    }

    pub fn nodes(&self) -> &[usize] {
        &self.n[..self.kind.node_count()]
    }

    pub fn nodes_mut(&mut self) -> &mut [usize] {
        let k = self.kind.node_count();
        &mut self.n[..k]
    }

    /// End nodes, in stored order.
    pub fn ends(&self) -> (usize, usize) {
        (self.n[0], self.n[1])
    }

    pub fn has_node(&self, node: usize) -> bool {
        self.nodes().contains(&node)
    }

    /// Same end nodes in either direction and the same interior nodes.
    pub fn same_as(&self, other: &Edge) -> bool {
        if self.kind != other.kind {
            return false;
        }
        let forward = self.n[0] == other.n[0] && self.n[1] == other.n[1];
        let backward = self.n[0] == other.n[1] && self.n[1] == other.n[0];
        if !forward && !backward {
            return false;
        }
        match self.kind {
            EdgeType::Line2 => true,
            EdgeType::Line3 => self.n[2] == other.n[2],
            EdgeType::Line4 if forward => self.n[2] == other.n[2] && self.n[3] == other.n[3],
            EdgeType::Line4 => self.n[2] == other.n[3] && self.n[3] == other.n[2],
        }
    }
}

/// Back-reference from a face to an element facet.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FaceOwner {
    /// Element index.
    pub eid: usize,
    /// Local face (solids) or 0 (shells).
    pub lid: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Face {
    pub kind: FaceType,
    pub n: [usize; MAX_FACE_NODES],
    /// Surface partition.
    pub gid: Gid,
    /// Smoothing group.
    pub sid: Gid,
    /// Up to two solids plus one shell. Slot 0 holds the shell when one
    /// coincides with the face; solids follow in ascending part id.
    pub elem: [Option<FaceOwner>; 3],
    /// Neighbor face across each edge.
    pub nbr: [Option<usize>; MAX_FACE_EDGES],
    pub exterior: bool,
    pub selected: bool,
}

impl Face {
    pub fn new(kind: FaceType, nodes: &[usize]) -> Self {
        let mut n = [0; MAX_FACE_NODES];
        n[..nodes.len()].copy_from_slice(nodes);
        Self {
            kind,
            n,
            ..Default::default()
        }
    }

    /// Face of `el` described by the local face table entry `lf`.
    pub fn from_local(el: &Element, lf: &LocalFace) -> Self {
        let mut n = [0; MAX_FACE_NODES];
        for (slot, &l) in n.iter_mut().zip(lf.nodes) {
            *slot = el.n[l];
        }
        Self {
            kind: lf.kind,
            n,
            ..Default::default()
        }
    }

    pub fn nodes(&self) -> &[usize] {
        &self.n[..self.kind.node_count()]
    }

    pub fn nodes_mut(&mut self) -> &mut [usize] {
        let k = self.kind.node_count();
        &mut self.n[..k]
    }

    pub fn corners(&self) -> &[usize] {
        &self.n[..self.kind.corner_count()]
    }

    pub fn edge_count(&self) -> usize {
        self.kind.corner_count()
    }

    pub fn has_node(&self, node: usize) -> bool {
        self.nodes().contains(&node)
    }

    /// True if `a` and `b` are consecutive corners of this face.
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        let c = self.corners();
        let m = c.len();
        (0..m).any(|j| {
            let (p, q) = (c[j], c[(j + 1) % m]);
            (p == a && q == b) || (p == b && q == a)
        })
    }

    /// Index of the edge between corners `a` and `b`.
    pub fn find_edge(&self, a: usize, b: usize) -> Option<usize> {
        let c = self.corners();
        let m = c.len();
        (0..m).find(|&j| {
            let (p, q) = (c[j], c[(j + 1) % m]);
            (p == a && q == b) || (p == b && q == a)
        })
    }

    /// Edge `j` of this face as a standalone record.
    pub fn edge(&self, j: usize) -> Edge {
        let le = &self.kind.edges()[j];
        let mut e = Edge {
            kind: le.kind,
            ..Default::default()
        };
        for (slot, &l) in e.n.iter_mut().zip(le.nodes) {
            *slot = self.n[l];
        }
        e
    }

    /// Same face type, same corners and same remaining nodes, in any order.
    pub fn same_as(&self, other: &Face) -> bool {
        if self.kind != other.kind {
            return false;
        }
        let nc = self.kind.corner_count();
        let a = self.nodes();
        let b = other.nodes();
        same_set(&a[..nc], &b[..nc]) && same_set(&a[nc..], &b[nc..])
    }

    /// Owning element slots that are filled.
    pub fn owners(&self) -> impl Iterator<Item = FaceOwner> + '_ {
        self.elem.iter().flatten().copied()
    }
}

fn same_set(a: &[usize], b: &[usize]) -> bool {
    a.len() == b.len() && a.iter().all(|x| b.contains(x)) && b.iter().all(|x| a.contains(x))
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub kind: ElementType,
    pub n: [usize; MAX_ELEMENT_NODES],
    /// Part partition.
    pub gid: Gid,
    pub mat_id: Option<usize>,
    /// Neighbor across each facet.
    pub nbr: [Option<usize>; MAX_FACETS],
    /// Face record of each local face (solids) or of the shell itself (slot 0).
    pub face: [Option<usize>; MAX_FACETS],
    /// Stable external id.
    pub nid: Option<u32>,
    /// Shell thickness per node.
    pub thickness: Option<[f64; MAX_FACE_NODES]>,
    pub exterior: bool,
    pub selected: bool,
}

impl Element {
    pub fn new(kind: ElementType, nodes: &[usize]) -> Self {
        let mut n = [0; MAX_ELEMENT_NODES];
        n[..nodes.len()].copy_from_slice(nodes);
        Self {
            kind,
            n,
            gid: Some(0),
            ..Default::default()
        }
    }

    pub fn with_gid(mut self, gid: usize) -> Self {
        self.gid = Some(gid);
        self
    }

    pub fn nodes(&self) -> &[usize] {
        &self.n[..self.kind.node_count()]
    }

    pub fn nodes_mut(&mut self) -> &mut [usize] {
        let k = self.kind.node_count();
        &mut self.n[..k]
    }

    pub fn is_solid(&self) -> bool {
        self.kind.is_solid()
    }

    pub fn is_shell(&self) -> bool {
        self.kind.is_shell()
    }

    pub fn is_beam(&self) -> bool {
        self.kind.is_beam()
    }

    pub fn has_node(&self, node: usize) -> bool {
        self.nodes().contains(&node)
    }

    pub fn facet_count(&self) -> usize {
        self.kind.facet_count()
    }

    /// Local face `j` of a solid.
    pub fn face_of(&self, j: usize) -> Face {
        Face::from_local(self, &self.kind.faces()[j])
    }

    /// The face spanned by a shell.
    pub fn shell_face(&self) -> Option<Face> {
        self.kind
            .shell_face_type()
            .map(|ft| Face::new(ft, self.nodes()))
    }

    /// Local edge `j` of a shell.
    pub fn edge_of(&self, j: usize) -> Edge {
        let le = &self.kind.edges()[j];
        let mut e = Edge {
            kind: le.kind,
            ..Default::default()
        };
        for (slot, &l) in e.n.iter_mut().zip(le.nodes) {
            *slot = self.n[l];
        }
        e
    }

    /// The edge spanned by a beam.
    pub fn beam_edge(&self) -> Option<Edge> {
        self.kind
            .beam_edge_type()
            .map(|et| Edge::new(et, self.nodes()))
    }

    /// Local face of this solid that matches `face`.
    pub fn find_face(&self, face: &Face) -> Option<usize> {
        (0..self.kind.faces().len()).find(|&j| self.face_of(j).same_as(face))
    }

    /// Local edge of this shell that matches `edge`.
    pub fn find_edge(&self, edge: &Edge) -> Option<usize> {
        (0..self.kind.edges().len()).find(|&j| self.edge_of(j).same_as(edge))
    }

    /// Same type and the same node set.
    pub fn same_as(&self, other: &Element) -> bool {
        self.kind == other.kind && same_set(self.nodes(), other.nodes())
    }

    /// Corner-node pairs of every edge of this element, sorted within each pair.
    pub fn corner_edges(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        let mut push = |a: usize, b: usize| {
            let key = (a.min(b), a.max(b));
            if !out.contains(&key) {
                out.push(key);
            }
        };
        match self.kind.family() {
            ElementFamily::Beam => push(self.n[0], self.n[1]),
            ElementFamily::Shell => {
                for j in 0..self.kind.edges().len() {
                    let e = self.edge_of(j);
                    push(e.n[0], e.n[1]);
                }
            }
            ElementFamily::Solid => {
                for j in 0..self.kind.faces().len() {
                    let f = self.face_of(j);
                    let c = f.corners();
                    for k in 0..c.len() {
                        push(c[k], c[(k + 1) % c.len()]);
                    }
                }
            }
        }
        out
    }

    pub fn clear_topology(&mut self) {
        self.nbr = [None; MAX_FACETS];
        self.face = [None; MAX_FACETS];
    }
}
