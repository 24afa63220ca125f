//! Orientation reversal of elements and faces.

use crate::algs::adjacency::{update_element_neighbors, update_face_element_table, update_face_neighbors};
use crate::mesh_error::{EntityKind, MeshError, Result};
use crate::topology::mesh::Mesh;

fn swap_nodes(n: &mut [usize], swaps: &[(usize, usize)]) {
    for &(a, b) in swaps {
        n.swap(a, b);
    }
}

/// Reverse the winding of the given elements.
///
/// Faces whose first owner was inverted take their node order from the
/// inverted element, then element and face adjacency is refreshed.
/// Returns the number of elements inverted.
pub fn invert_elements(mesh: &mut Mesh, indices: &[usize]) -> Result<usize> {
    let ne = mesh.elements.len();
    if let Some(&bad) = indices.iter().find(|&&i| i >= ne) {
        return Err(MeshError::out_of_range(EntityKind::Element, bad, ne));
    }
    let mut flipped = vec![false; ne];
    for &i in indices {
        // Listing an element twice would undo the flip.
        if std::mem::replace(&mut flipped[i], true) {
            continue;
        }
        let el = &mut mesh.elements[i];
        let swaps = el.kind.inversion_swaps();
        swap_nodes(&mut el.n, swaps);
    }

    let Mesh {
        faces, elements, ..
    } = mesh;
    for f in faces.iter_mut() {
        let Some(owner) = f.elem[0] else { continue };
        if !flipped.get(owner.eid).copied().unwrap_or(false) {
            continue;
        }
        let el = &elements[owner.eid];
        let regenerated = if el.is_shell() {
            el.shell_face()
        } else {
            el.find_face(f).map(|j| el.face_of(j))
        };
        if let Some(g) = regenerated {
            f.n = g.n;
        }
    }

    mesh.invalidate_node_element_list();
    update_element_neighbors(mesh);
    update_face_element_table(mesh);
    update_face_neighbors(mesh);
    mesh.update_mesh();
    Ok(flipped.iter().filter(|f| **f).count())
}

/// Invert the selected elements, or every element when none is selected.
pub fn invert_selected_elements(mesh: &mut Mesh) -> Result<usize> {
    let mut sel: Vec<usize> = (0..mesh.elements.len())
        .filter(|&i| mesh.elements[i].selected)
        .collect();
    if sel.is_empty() {
        sel = (0..mesh.elements.len()).collect();
    }
    invert_elements(mesh, &sel)
}

/// Reverse the winding of the given faces and refresh face adjacency.
pub fn invert_faces(mesh: &mut Mesh, indices: &[usize]) -> Result<usize> {
    let nf = mesh.faces.len();
    if let Some(&bad) = indices.iter().find(|&&i| i >= nf) {
        return Err(MeshError::out_of_range(EntityKind::Face, bad, nf));
    }
    let mut flipped = vec![false; nf];
    for &i in indices {
        if std::mem::replace(&mut flipped[i], true) {
            continue;
        }
        let f = &mut mesh.faces[i];
        let swaps = f.kind.inversion_swaps();
        swap_nodes(&mut f.n, swaps);
    }
    update_element_neighbors(mesh);
    update_face_element_table(mesh);
    update_face_neighbors(mesh);
    Ok(flipped.iter().filter(|f| **f).count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::rebuild::{RebuildOptions, rebuild_mesh};
    use crate::geometry::metrics::face_normal;
    use crate::topology::cell_type::{ElementType, FaceType};
    use crate::topology::entity::{Element, Face};

    fn quad() -> Mesh {
        let pos = [[0., 0., 0.], [1., 0., 0.], [1., 1., 0.], [0., 1., 0.]];
        let mut m =
            Mesh::from_parts(&pos, vec![Element::new(ElementType::Quad4, &[0, 1, 2, 3])]).unwrap();
        rebuild_mesh(&mut m, &RebuildOptions::default()).unwrap();
        m
    }

    #[test]
    fn inverting_a_shell_flips_its_face() {
        let mut m = quad();
        let before = face_normal(m.nodes(), &m.faces()[0]);
        assert_eq!(invert_elements(&mut m, &[0]).unwrap(), 1);
        let after = face_normal(m.nodes(), &m.faces()[0]);
        assert!((before + after).norm() < 1e-12);
        assert_eq!(m.faces()[0].elem[0].map(|o| o.eid), Some(0));
    }

    #[test]
    fn double_listing_flips_once() {
        let mut m = quad();
        let nodes = m.elements()[0].nodes().to_vec();
        assert_eq!(invert_elements(&mut m, &[0, 0]).unwrap(), 1);
        assert_ne!(m.elements()[0].nodes(), &nodes[..]);
    }

    #[test]
    fn hex_inversion_keeps_faces_owned() {
        let pos = [
            [0., 0., 0.],
            [1., 0., 0.],
            [1., 1., 0.],
            [0., 1., 0.],
            [0., 0., 1.],
            [1., 0., 1.],
            [1., 1., 1.],
            [0., 1., 1.],
        ];
        let mut m = Mesh::from_parts(
            &pos,
            vec![Element::new(ElementType::Hex8, &[0, 1, 2, 3, 4, 5, 6, 7])],
        )
        .unwrap();
        rebuild_mesh(&mut m, &RebuildOptions::default()).unwrap();
        invert_elements(&mut m, &[0]).unwrap();
        assert_eq!(m.face_count(), 6);
        assert!(m.faces().iter().all(|f| f.elem[0].is_some()));
        assert!(m.elements()[0].face.iter().take(6).all(Option::is_some));
    }

    #[test]
    fn face_inversion_reverses_winding() {
        let mut m = quad();
        let f = Face::new(FaceType::Quad4, &[0, 1, 2, 3]);
        m.faces_mut()[0] = f;
        invert_faces(&mut m, &[0]).unwrap();
        assert_eq!(m.faces()[0].nodes(), &[2, 1, 0, 3]);
        assert!(invert_faces(&mut m, &[3]).is_err());
    }
}
