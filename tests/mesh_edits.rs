mod util;

use mesh_topology::algs::{
    attach, attach_and_weld, delete_selected_elements, detach_selected, extract_faces,
    invert_selected_elements, remove_isolated_nodes,
};
use mesh_topology::prelude::*;
use nalgebra::Point3;
use util::{cube, hex_grid, rebuilt, snapshot};

fn shifted_cube(dx: f64) -> Mesh {
    let mut m = cube();
    for n in m.nodes_mut() {
        n.pos.x += dx;
    }
    rebuilt(m)
}

#[test]
fn hollowing_a_block_exposes_a_cavity() {
    let mut m = rebuilt(hex_grid(3, 3, 3));
    let centre = m
        .elements()
        .iter()
        .position(|e| !e.exterior)
        .unwrap();
    m.elements_mut()[centre].selected = true;
    assert_eq!(delete_selected_elements(&mut m).unwrap(), 1);
    assert_eq!(m.element_count(), 26);
    // Every node of the centre hex is shared with a neighbor.
    assert_eq!(m.node_count(), 64);
    assert_eq!(m.face_count(), 54 + 6);
    assert!(m.elements().iter().all(|e| e.exterior));
    assert!(m.is_consistent());
}

#[test]
fn isolated_node_round_trip() {
    let mut m = rebuilt(cube());
    let stray = m.add_node(Point3::new(5., 5., 5.));
    let pinned = m.add_node(Point3::new(6., 6., 6.));
    m.nodes_mut()[pinned].required = true;
    assert_eq!(m.node_count(), 10);
    assert_eq!(remove_isolated_nodes(&mut m), 1);
    assert_eq!(m.node_count(), 9);
    // The pinned node moved down into the stray node's slot.
    assert!(m.nodes()[stray].required);
    assert_eq!(remove_isolated_nodes(&mut m), 0);
}

#[test]
fn welding_cubes_fuses_the_shared_face() {
    let mut a = rebuilt(cube());
    let b = shifted_cube(1.0);
    let welded = attach_and_weld(&mut a, &b, 1e-6).unwrap();
    assert_eq!(welded, 4);
    assert_eq!(a.node_count(), 12);
    assert_eq!(a.element_count(), 2);
    assert!(a.elements()[0].nbr.contains(&Some(1)));
    assert!(a.elements()[1].nbr.contains(&Some(0)));
    // The cubes keep separate parts, so the shared face is an interface.
    assert_eq!(a.faces().iter().filter(|f| !f.exterior).count(), 1);
}

#[test]
fn plain_attach_keeps_meshes_apart() {
    let mut a = rebuilt(cube());
    let b = shifted_cube(1.0);
    attach(&mut a, &b);
    assert_eq!(a.node_count(), 16);
    assert!(a.elements()[0].nbr.iter().all(Option::is_none));
}

#[test]
fn double_inversion_restores_connectivity() {
    let mut m = rebuilt(hex_grid(2, 2, 1));
    let before = snapshot(&m);
    assert_eq!(invert_selected_elements(&mut m).unwrap(), 4);
    assert_ne!(m.elements()[0].nodes(), before.0[0].nodes());
    invert_selected_elements(&mut m).unwrap();
    for (el, orig) in m.elements().iter().zip(&before.0) {
        assert_eq!(el.nodes(), orig.nodes());
    }
    for (f, orig) in m.faces().iter().zip(&before.1) {
        assert_eq!(f.nodes(), orig.nodes());
    }
}

#[test]
fn detach_selected_block() {
    let mut m = rebuilt(hex_grid(3, 1, 1));
    m.elements_mut()[2].selected = true;
    let (sub, maps) = detach_selected(&mut m).unwrap().unwrap();
    assert_eq!(sub.element_count(), 1);
    assert_eq!(m.element_count(), 2);
    assert_eq!(m.node_count(), 12);
    assert_eq!(maps.len(), 8);
    // The four nodes on the cut plane now exist in both meshes.
    let on_cut = |m: &Mesh| {
        m.nodes()
            .iter()
            .filter(|n| (n.pos.x - 2.0).abs() < 1e-12)
            .count()
    };
    let shared = on_cut(&sub);
    assert_eq!(on_cut(&m), 4);
    assert_eq!(shared, 4);
}

#[test]
fn extracted_skin_matches_the_exterior() {
    let m = rebuilt(hex_grid(2, 2, 2));
    let skin = extract_faces(&m, false).unwrap().unwrap();
    assert_eq!(skin.element_count(), 24);
    assert!(skin.elements().iter().all(|e| e.kind == ElementType::Quad4));
    assert_eq!(skin.count_element_partitions(), 1);
    assert_eq!(skin.count_face_partitions(), 6);
}
