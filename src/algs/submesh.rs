//! Splitting meshes apart: detaching element subsets and extracting faces
//! into standalone shell meshes.

use hashbrown::HashMap;
use itertools::Itertools;

use crate::algs::edit::{remove_elements, remove_isolated_nodes};
use crate::algs::rebuild::{RebuildOptions, rebuild_mesh};
use crate::mesh_error::{EntityKind, MeshError, Result};
use crate::topology::cell_type::ElementType;
use crate::topology::entity::{Element, Node};
use crate::topology::mesh::Mesh;

/// Node correspondence between a parent mesh and a mesh cut from it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmeshMaps {
    /// Parent node index → node index in the sub-mesh.
    pub parent_to_sub: HashMap<usize, usize>,
    /// Sub-mesh node index → parent node index.
    pub sub_to_parent: Vec<usize>,
}

impl SubmeshMaps {
    fn from_nodes(nodes: Vec<usize>) -> Self {
        let parent_to_sub = nodes.iter().enumerate().map(|(s, &p)| (p, s)).collect();
        Self {
            parent_to_sub,
            sub_to_parent: nodes,
        }
    }

    pub fn sub_index(&self, parent: usize) -> Option<usize> {
        self.parent_to_sub.get(&parent).copied()
    }

    pub fn len(&self) -> usize {
        self.sub_to_parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_to_parent.is_empty()
    }
}

fn fresh_node(src: &Node) -> Node {
    Node {
        required: src.required,
        nid: src.nid,
        ..Node::new(src.pos)
    }
}

/// Move the given elements into a new mesh.
///
/// The new mesh gets compacted nodes and elements that keep their part,
/// material, thickness and stable id; element fields follow their elements.
/// The elements (and any nodes left unused) are removed from `mesh`. Both
/// meshes are rebuilt with `mesh`'s stored options.
///
/// Returns `None` when nothing is selected or when every element is, since
/// detaching would leave the source empty.
pub fn detach_elements(mesh: &mut Mesh, indices: &[usize]) -> Result<Option<(Mesh, SubmeshMaps)>> {
    let ne = mesh.elements.len();
    if let Some(&bad) = indices.iter().find(|&&i| i >= ne) {
        return Err(MeshError::out_of_range(EntityKind::Element, bad, ne));
    }
    let mut picked = vec![false; ne];
    for &i in indices {
        picked[i] = true;
    }
    let count = picked.iter().filter(|p| **p).count();
    if count == 0 || count == ne {
        return Ok(None);
    }

    let used: Vec<usize> = (0..ne)
        .filter(|&i| picked[i])
        .flat_map(|i| mesh.elements[i].nodes().to_vec())
        .sorted_unstable()
        .dedup()
        .collect();
    let maps = SubmeshMaps::from_nodes(used);

    let mut sub = Mesh::new();
    sub.transform = mesh.transform;
    sub.nodes = maps
        .sub_to_parent
        .iter()
        .map(|&p| fresh_node(&mesh.nodes[p]))
        .collect();
    for i in (0..ne).filter(|&i| picked[i]) {
        let src = &mesh.elements[i];
        let mut el = Element::new(src.kind, src.nodes());
        for n in el.nodes_mut() {
            // Every node of a picked element is in the map.
            *n = maps.sub_index(*n).unwrap_or(*n);
        }
        el.gid = src.gid;
        el.mat_id = src.mat_id;
        el.thickness = src.thickness;
        el.nid = src.nid;
        sub.elements.push(el);
    }
    for (name, values) in &mesh.element_fields {
        if values.len() == ne {
            let column = (0..ne).filter(|&i| picked[i]).map(|i| values[i]).collect();
            sub.element_fields.insert(name.clone(), column);
        }
    }

    let options = mesh.options.clone();
    remove_elements(mesh, &picked);
    mesh.clear_topology();
    remove_isolated_nodes(mesh);
    rebuild_mesh(mesh, &options)?;
    rebuild_mesh(&mut sub, &options)?;

    log::debug!(
        "detached {count} elements and {} nodes into a new mesh",
        maps.len()
    );
    Ok(Some((sub, maps)))
}

/// [`detach_elements`] over the selected elements.
pub fn detach_selected(mesh: &mut Mesh) -> Result<Option<(Mesh, SubmeshMaps)>> {
    let sel: Vec<usize> = (0..mesh.elements.len())
        .filter(|&i| mesh.elements[i].selected)
        .collect();
    detach_elements(mesh, &sel)
}

/// Build a shell mesh from the faces of `mesh`, all of them or only the
/// selected ones. Each face becomes one shell of the matching shape in a
/// single part. Returns `None` when no face qualifies.
pub fn extract_faces(mesh: &Mesh, selected_only: bool) -> Result<Option<Mesh>> {
    let faces: Vec<_> = mesh
        .faces
        .iter()
        .filter(|f| !selected_only || f.selected)
        .collect();
    if faces.is_empty() {
        return Ok(None);
    }
    let used: Vec<usize> = faces
        .iter()
        .flat_map(|f| f.nodes().iter().copied())
        .sorted_unstable()
        .dedup()
        .collect();
    let maps = SubmeshMaps::from_nodes(used);

    let mut out = Mesh::new();
    out.transform = mesh.transform;
    out.nodes = maps
        .sub_to_parent
        .iter()
        .map(|&p| Node::new(mesh.nodes[p].pos))
        .collect();
    for f in faces {
        let kind = ElementType::shell_for_face(f.kind);
        if kind.node_count() != f.nodes().len() {
            return Err(MeshError::UnsupportedElementType(format!("{:?}", f.kind)));
        }
        let nodes: Vec<usize> = f
            .nodes()
            .iter()
            .map(|n| maps.sub_index(*n).unwrap_or(*n))
            .collect();
        out.elements.push(Element::new(kind, &nodes).with_gid(0));
    }
    rebuild_mesh(&mut out, &RebuildOptions::default())?;
    Ok(Some(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_hexes() -> Mesh {
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
        let mut m = Mesh::from_parts(&pos, vec![hex(0), hex(1)]).unwrap();
        rebuild_mesh(&mut m, &RebuildOptions::default()).unwrap();
        m
    }

    #[test]
    fn detach_splits_nodes_and_elements() {
        let mut m = two_hexes();
        m.elements_mut()[1].mat_id = Some(7);
        let (sub, maps) = detach_elements(&mut m, &[1]).unwrap().unwrap();
        assert_eq!(sub.element_count(), 1);
        assert_eq!(sub.node_count(), 8);
        assert_eq!(sub.elements()[0].mat_id, Some(7));
        assert_eq!(sub.face_count(), 6);
        assert_eq!(m.element_count(), 1);
        assert_eq!(m.node_count(), 8);
        assert_eq!(m.face_count(), 6);
        assert_eq!(maps.len(), 8);
        for (s, &p) in maps.sub_to_parent.iter().enumerate() {
            assert_eq!(maps.sub_index(p), Some(s));
        }
    }

    #[test]
    fn detach_needs_a_proper_subset() {
        let mut m = two_hexes();
        assert!(detach_elements(&mut m, &[]).unwrap().is_none());
        assert!(detach_elements(&mut m, &[0, 1]).unwrap().is_none());
        assert_eq!(m.element_count(), 2);
        assert!(detach_elements(&mut m, &[2]).is_err());
    }

    #[test]
    fn extracted_surface_is_a_closed_shell() {
        let m = two_hexes();
        let shell = extract_faces(&m, false).unwrap().unwrap();
        assert_eq!(shell.element_count(), m.face_count());
        assert_eq!(shell.node_count(), 12);
        assert!(shell.elements().iter().all(|e| e.kind == ElementType::Quad4));
        // A closed quad surface has no free edges, so every shell edge has
        // a neighbor.
        assert!(
            shell
                .elements()
                .iter()
                .all(|e| e.nbr[..4].iter().all(Option::is_some))
        );
    }

    #[test]
    fn extract_selected_only() {
        let mut m = two_hexes();
        assert!(extract_faces(&m, true).unwrap().is_none());
        m.faces_mut()[0].selected = true;
        let shell = extract_faces(&m, true).unwrap().unwrap();
        assert_eq!(shell.element_count(), 1);
        assert_eq!(shell.node_count(), 4);
    }
}
