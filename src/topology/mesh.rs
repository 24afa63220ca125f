//! The `Mesh` aggregate: owning containers for nodes, edges, faces and
//! elements, plus the caches derived from them.
//!
//! Entities reference each other by index only. Any change to the number or
//! order of nodes or elements invalidates the node → element valence list;
//! resizing a container also drops the id lookup table tied to it.

use std::collections::BTreeMap;

use nalgebra::Point3;
use once_cell::unsync::OnceCell;

use crate::algs::rebuild::RebuildOptions;
use crate::geometry::metrics::BoundingBox;
use crate::geometry::transform::Transform;
use crate::mesh_error::{Diagnostics, EntityKind, MeshError, Result, TopologyDefect};
use crate::topology::cache::InvalidateCache;
use crate::topology::cell_type::ElementType;
use crate::topology::entity::{Edge, Element, Face, Gid, Node};
use crate::topology::labels::NodeSets;
use crate::topology::lookup::IdLookup;
use crate::topology::valence::ValenceList;

#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) faces: Vec<Face>,
    pub(crate) elements: Vec<Element>,
    pub(crate) node_sets: NodeSets,
    pub(crate) element_fields: BTreeMap<String, Vec<f64>>,
    pub(crate) transform: Transform,
    pub(crate) node_lookup: IdLookup,
    pub(crate) element_lookup: IdLookup,
    pub(crate) options: RebuildOptions,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) inconsistent: bool,
    nel: OnceCell<ValenceList>,
}

/// Highest group id in `gids`, plus one.
pub(crate) fn count_groups<I: IntoIterator<Item = Gid>>(gids: I) -> usize {
    gids.into_iter().flatten().max().map_or(0, |m| m + 1)
}

/// One past the last of `count` sequential ids from `start`.
fn id_range_end(kind: EntityKind, start: u32, count: usize) -> Result<u32> {
    u32::try_from(count)
        .ok()
        .and_then(|c| start.checked_add(c))
        .ok_or(MeshError::IdOverflow { kind, start, count })
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mesh with `n_nodes` default nodes and `n_elements` default elements,
    /// plus empty face and edge slots.
    pub fn with_capacity(n_nodes: usize, n_elements: usize) -> Self {
        let mut m = Self::default();
        m.create(n_nodes, n_elements, 0, 0);
        m
    }

    /// Mesh from node positions and elements.
    pub fn from_parts(positions: &[[f64; 3]], elements: Vec<Element>) -> Result<Self> {
        let mut m = Self::default();
        m.nodes = positions
            .iter()
            .map(|p| Node::new(Point3::new(p[0], p[1], p[2])))
            .collect();
        for el in elements {
            m.add_element(el)?;
        }
        Ok(m)
    }

    /// (Re)allocate all four containers with default records.
    pub fn create(&mut self, n_nodes: usize, n_elements: usize, n_faces: usize, n_edges: usize) {
        self.nodes = vec![Node::default(); n_nodes];
        self.elements = vec![Element::default(); n_elements];
        self.faces = vec![Face::default(); n_faces];
        self.edges = vec![Edge::default(); n_edges];
        self.element_fields.clear();
        self.node_sets = NodeSets::new();
        self.invalidate_cache();
    }

    pub fn resize_nodes(&mut self, n: usize) {
        self.nodes.resize(n, Node::default());
        self.node_lookup.clear();
        self.nel.take();
    }

    pub fn resize_elements(&mut self, n: usize) {
        self.elements.resize(n, Element::default());
        self.element_lookup.clear();
        self.element_fields.retain(|_, v| v.len() == n);
        self.nel.take();
    }

    pub fn resize_faces(&mut self, n: usize) {
        self.faces.resize(n, Face::default());
    }

    pub fn resize_edges(&mut self, n: usize) {
        self.edges.resize(n, Edge::default());
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Nodes are mutable in place; their count is fixed.
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Element records may change their node lists, so the valence cache is
    /// dropped.
    pub fn elements_mut(&mut self) -> &mut [Element] {
        self.nel.take();
        &mut self.elements
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn faces_mut(&mut self) -> &mut [Face] {
        &mut self.faces
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edges_mut(&mut self) -> &mut [Edge] {
        &mut self.edges
    }

    pub fn node(&self, i: usize) -> Result<&Node> {
        let len = self.nodes.len();
        self.nodes
            .get(i)
            .ok_or(MeshError::out_of_range(EntityKind::Node, i, len))
    }

    pub fn node_mut(&mut self, i: usize) -> Result<&mut Node> {
        let len = self.nodes.len();
        self.nodes
            .get_mut(i)
            .ok_or(MeshError::out_of_range(EntityKind::Node, i, len))
    }

    pub fn element(&self, i: usize) -> Result<&Element> {
        let len = self.elements.len();
        self.elements
            .get(i)
            .ok_or(MeshError::out_of_range(EntityKind::Element, i, len))
    }

    pub fn element_mut(&mut self, i: usize) -> Result<&mut Element> {
        let len = self.elements.len();
        self.nel.take();
        self.elements
            .get_mut(i)
            .ok_or(MeshError::out_of_range(EntityKind::Element, i, len))
    }

    pub fn face(&self, i: usize) -> Result<&Face> {
        let len = self.faces.len();
        self.faces
            .get(i)
            .ok_or(MeshError::out_of_range(EntityKind::Face, i, len))
    }

    pub fn face_mut(&mut self, i: usize) -> Result<&mut Face> {
        let len = self.faces.len();
        self.faces
            .get_mut(i)
            .ok_or(MeshError::out_of_range(EntityKind::Face, i, len))
    }

    pub fn edge(&self, i: usize) -> Result<&Edge> {
        let len = self.edges.len();
        self.edges
            .get(i)
            .ok_or(MeshError::out_of_range(EntityKind::Edge, i, len))
    }

    pub fn edge_mut(&mut self, i: usize) -> Result<&mut Edge> {
        let len = self.edges.len();
        self.edges
            .get_mut(i)
            .ok_or(MeshError::out_of_range(EntityKind::Edge, i, len))
    }

    /// Append a node. It becomes a vertex of its own with the next free
    /// vertex id.
    pub fn add_node(&mut self, pos: Point3<f64>) -> usize {
        let mut node = Node::new(pos);
        node.gid = Some(self.count_node_partitions());
        self.nodes.push(node);
        self.nel.take();
        self.nodes.len() - 1
    }

    /// Append an element after checking its node references. Element
    /// fields grow with it; the new element reads `0.0` in each.
    pub fn add_element(&mut self, el: Element) -> Result<usize> {
        let index = self.elements.len();
        let nn = self.nodes.len();
        if let Some(&bad) = el.nodes().iter().find(|&&n| n >= nn) {
            return Err(MeshError::InvalidTopology(TopologyDefect::NodeOutOfRange {
                kind: EntityKind::Element,
                entity: index,
                node: bad,
                nodes: nn,
            }));
        }
        self.elements.push(el);
        for values in self.element_fields.values_mut() {
            values.push(0.0);
        }
        self.nel.take();
        Ok(index)
    }

    /// Cached node → element valence list.
    pub fn node_element_list(&self) -> &ValenceList {
        self.nel
            .get_or_init(|| ValenceList::for_elements(self.nodes.len(), &self.elements))
    }

    pub(crate) fn invalidate_node_element_list(&mut self) {
        self.nel.take();
    }

    /// Node → face valence list, built on demand.
    pub fn node_face_list(&self) -> ValenceList {
        ValenceList::for_faces(self.nodes.len(), &self.faces)
    }

    /// Node → edge valence list, built on demand.
    pub fn node_edge_list(&self, exterior_only: bool) -> ValenceList {
        ValenceList::for_edges(self.nodes.len(), &self.edges, exterior_only)
    }

    pub fn count_element_partitions(&self) -> usize {
        count_groups(self.elements.iter().map(|e| e.gid))
    }

    pub fn count_face_partitions(&self) -> usize {
        count_groups(self.faces.iter().map(|f| f.gid))
    }

    pub fn count_edge_partitions(&self) -> usize {
        count_groups(self.edges.iter().map(|e| e.gid))
    }

    pub fn count_node_partitions(&self) -> usize {
        count_groups(self.nodes.iter().map(|n| n.gid))
    }

    pub fn count_smoothing_groups(&self) -> usize {
        count_groups(self.faces.iter().map(|f| f.sid))
    }

    /// Assign sequential stable ids to nodes; returns the next free id.
    /// Fails without touching any id when the range does not fit in `u32`.
    pub fn generate_node_ids(&mut self, start: u32) -> Result<u32> {
        let next = id_range_end(EntityKind::Node, start, self.nodes.len())?;
        for (n, id) in self.nodes.iter_mut().zip(start..next) {
            n.nid = Some(id);
        }
        self.build_node_lookup();
        Ok(next)
    }

    /// Assign sequential stable ids to elements; returns the next free id.
    pub fn generate_element_ids(&mut self, start: u32) -> Result<u32> {
        let next = id_range_end(EntityKind::Element, start, self.elements.len())?;
        for (e, id) in self.elements.iter_mut().zip(start..next) {
            e.nid = Some(id);
        }
        self.build_element_lookup();
        Ok(next)
    }

    pub fn build_node_lookup(&mut self) {
        self.node_lookup = IdLookup::build(self.nodes.iter().map(|n| n.nid));
    }

    pub fn build_element_lookup(&mut self) {
        self.element_lookup = IdLookup::build(self.elements.iter().map(|e| e.nid));
    }

    pub fn node_index_from_id(&self, id: u32) -> Option<usize> {
        self.node_lookup.index_of(id, self.nodes.len())
    }

    pub fn element_index_from_id(&self, id: u32) -> Option<usize> {
        self.element_lookup.index_of(id, self.elements.len())
    }

    pub fn node_sets(&self) -> &NodeSets {
        &self.node_sets
    }

    /// Store a node set. Fails if any index is out of range.
    pub fn add_node_set(&mut self, name: &str, nodes: Vec<usize>) -> Result<()> {
        let nn = self.nodes.len();
        if let Some(&bad) = nodes.iter().find(|&&n| n >= nn) {
            return Err(MeshError::out_of_range(EntityKind::Node, bad, nn));
        }
        self.node_sets.insert(name, nodes);
        Ok(())
    }

    /// Attach a per-element value column.
    pub fn set_element_field(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if values.len() != self.elements.len() {
            return Err(MeshError::out_of_range(
                EntityKind::Element,
                values.len(),
                self.elements.len(),
            ));
        }
        self.element_fields.insert(name.to_string(), values);
        Ok(())
    }

    pub fn element_field(&self, name: &str) -> Option<&[f64]> {
        self.element_fields.get(name).map(Vec::as_slice)
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn set_transform(&mut self, t: Transform) {
        self.transform = t;
    }

    /// Options used by the last full rebuild.
    pub fn options(&self) -> &RebuildOptions {
        &self.options
    }

    /// Defects collected during the last rebuild.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// False after an edit failed part-way; cleared by the next rebuild.
    pub fn is_consistent(&self) -> bool {
        !self.inconsistent
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_nodes(&self.nodes)
    }

    pub fn has_element_type(&self, kind: ElementType) -> bool {
        self.elements.iter().any(|e| e.kind == kind)
    }

    /// Drop faces and edges and every link that points at them.
    pub fn clear_topology(&mut self) {
        self.faces.clear();
        self.edges.clear();
        for el in &mut self.elements {
            el.clear_topology();
        }
        for n in &mut self.nodes {
            n.gid = None;
            n.exterior = false;
        }
    }

    /// Refresh lookup tables and the valence cache after topology changes.
    pub fn update_mesh(&mut self) {
        if self.nodes.iter().any(|n| n.nid.is_some()) {
            self.build_node_lookup();
        } else {
            self.node_lookup.clear();
        }
        if self.elements.iter().any(|e| e.nid.is_some()) {
            self.build_element_lookup();
        } else {
            self.element_lookup.clear();
        }
        self.nel.take();
        let _ = self.node_element_list();
    }
}

impl InvalidateCache for Mesh {
    fn invalidate_cache(&mut self) {
        self.nel.take();
        self.node_lookup.clear();
        self.element_lookup.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tris() -> Mesh {
        Mesh::from_parts(
            &[[0., 0., 0.], [1., 0., 0.], [1., 1., 0.], [0., 1., 0.]],
            vec![
                Element::new(ElementType::Tri3, &[0, 1, 2]),
                Element::new(ElementType::Tri3, &[0, 2, 3]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn add_element_rejects_missing_nodes() {
        let mut m = two_tris();
        let err = m
            .add_element(Element::new(ElementType::Tri3, &[0, 1, 7]))
            .unwrap_err();
        assert!(matches!(err, MeshError::InvalidTopology(_)));
        assert_eq!(m.element_count(), 2);
    }

    #[test]
    fn valence_cache_follows_resizes() {
        let mut m = two_tris();
        assert_eq!(m.node_element_list().items(2), &[0, 1]);
        m.resize_elements(1);
        assert_eq!(m.node_element_list().items(2), &[0]);
        m.resize_nodes(6);
        assert_eq!(m.node_element_list().node_count(), 6);
    }

    #[test]
    fn index_errors_are_typed() {
        let m = two_tris();
        assert!(m.node(3).is_ok());
        assert_eq!(
            m.node(4).unwrap_err(),
            MeshError::IndexOutOfRange {
                kind: EntityKind::Node,
                index: 4,
                len: 4
            }
        );
        assert!(m.face(0).is_err());
    }

    #[test]
    fn generated_ids_resolve_back() {
        let mut m = two_tris();
        assert_eq!(m.node_index_from_id(1), Some(0));
        let next = m.generate_node_ids(100).unwrap();
        assert_eq!(next, 104);
        assert_eq!(m.node_index_from_id(102), Some(2));
        assert_eq!(m.node_index_from_id(1), None);
        assert_eq!(m.generate_element_ids(1), Ok(3));
        assert_eq!(m.element_index_from_id(2), Some(1));
    }

    #[test]
    fn added_elements_extend_fields() {
        let mut m = two_tris();
        m.set_element_field("thickness", vec![1.0, 2.0]).unwrap();
        let el = m.elements()[0].clone();
        assert_eq!(m.add_element(el), Ok(2));
        assert_eq!(m.element_field("thickness"), Some(&[1.0, 2.0, 0.0][..]));
    }

    #[test]
    fn id_generation_stops_at_u32_max() {
        let mut m = two_tris();
        assert_eq!(
            m.generate_node_ids(u32::MAX - 1),
            Err(MeshError::IdOverflow {
                kind: EntityKind::Node,
                start: u32::MAX - 1,
                count: 4,
            })
        );
        assert!(m.nodes().iter().all(|n| n.nid.is_none()));
        assert_eq!(m.generate_element_ids(u32::MAX - 2), Ok(u32::MAX));
    }

    #[test]
    fn added_nodes_become_vertices() {
        let mut m = two_tris();
        let a = m.add_node(Point3::new(5., 5., 5.));
        let b = m.add_node(Point3::new(6., 5., 5.));
        assert_eq!(m.nodes()[a].gid, Some(0));
        assert_eq!(m.nodes()[b].gid, Some(1));
        assert_eq!(m.count_node_partitions(), 2);
    }
}
