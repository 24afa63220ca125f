//! Node valence lists: node → incident elements, faces or edges.
//!
//! Stored in compressed form (`offsets` + `items`), like a CSR adjacency
//! graph. Entries for one node keep ascending entity order, so scans over a
//! node's incident entities are deterministic.

use crate::topology::entity::{Edge, Element, Face};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValenceList {
    offsets: Vec<usize>,
    items: Vec<usize>,
}

impl ValenceList {
    /// Build from `(entity, nodes)` pairs. Node indices at or beyond
    /// `node_count` are ignored.
    pub fn from_incidence<'a, I>(node_count: usize, incidence: I) -> Self
    where
        I: IntoIterator<Item = (usize, &'a [usize])> + Clone,
    {
        let mut counts = vec![0usize; node_count + 1];
        for (_, nodes) in incidence.clone() {
            for &n in nodes {
                if n < node_count {
                    counts[n + 1] += 1;
                }
            }
        }
        for i in 1..counts.len() {
            counts[i] += counts[i - 1];
        }
        let offsets = counts;
        let mut cursor = offsets.clone();
        let mut items = vec![0usize; offsets[node_count]];
        for (entity, nodes) in incidence {
            for &n in nodes {
                if n < node_count {
                    items[cursor[n]] = entity;
                    cursor[n] += 1;
                }
            }
        }
        Self { offsets, items }
    }

    /// Node → element list over every node of every element.
    pub fn for_elements(node_count: usize, elements: &[Element]) -> Self {
        Self::from_incidence(
            node_count,
            elements.iter().enumerate().map(|(i, e)| (i, e.nodes())),
        )
    }

    /// Node → face list over every node of every face.
    pub fn for_faces(node_count: usize, faces: &[Face]) -> Self {
        Self::from_incidence(
            node_count,
            faces.iter().enumerate().map(|(i, f)| (i, f.nodes())),
        )
    }

    /// Node → edge list over the end nodes of each edge. With
    /// `exterior_only`, edges without the exterior flag are left out.
    pub fn for_edges(node_count: usize, edges: &[Edge], exterior_only: bool) -> Self {
        Self::from_incidence(
            node_count,
            edges
                .iter()
                .enumerate()
                .filter(|(_, e)| !exterior_only || e.exterior)
                .map(|(i, e)| (i, &e.n[..2])),
        )
    }

    pub fn node_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Number of entities incident on `node`; zero for unknown nodes.
    pub fn valence(&self, node: usize) -> usize {
        self.items(node).len()
    }

    /// Entities incident on `node`, ascending.
    pub fn items(&self, node: usize) -> &[usize] {
        if node + 1 >= self.offsets.len() {
            return &[];
        }
        &self.items[self.offsets[node]..self.offsets[node + 1]]
    }
}
