mod util;

use mesh_topology::prelude::*;
use mesh_topology::topology::columns::GidColumn;
use util::{hex_grid, quad_sheet, rebuilt};

fn mixed_parts() -> Mesh {
    let mut m = hex_grid(2, 2, 1);
    m.elements_mut()[3].gid = Some(1);
    m.elements_mut()[1].mat_id = Some(4);
    m.generate_node_ids(1).unwrap();
    rebuilt(m)
}

#[test]
fn json_round_trip_restores_the_mesh() {
    let m = mixed_parts();
    let text = serde_json::to_string(&m.to_columns()).unwrap();
    let cols: MeshColumns = serde_json::from_str(&text).unwrap();
    let back = Mesh::from_columns(&cols).unwrap();
    assert_eq!(back.elements(), m.elements());
    assert_eq!(back.faces(), m.faces());
    assert_eq!(back.node_index_from_id(5), Some(4));
    assert_eq!(back.count_edge_partitions(), m.count_edge_partitions());
}

#[test]
fn bincode_round_trip_keeps_columns() {
    let cols = rebuilt(quad_sheet(3, 2)).to_columns();
    let bytes = bincode::serialize(&cols).unwrap();
    let back: MeshColumns = bincode::deserialize(&bytes).unwrap();
    assert_eq!(back, cols);
    assert_eq!(back.element_count(), 6);
    assert!(back.element_ids.iter().all(|&id| id == -1));
}

#[test]
fn gid_chunks_survive_a_byte_copy() {
    let cols = mixed_parts().to_columns();
    for column in [GidColumn::Element, GidColumn::Face, GidColumn::Edge, GidColumn::Node] {
        let (header, bytes) = cols.gid_bytes(column);
        let copy = bytes.clone();
        let decoded = MeshColumns::gids_from_bytes(&header, &copy).unwrap();
        assert_eq!(decoded.len() * 4, bytes.len());
    }
    let (header, bytes) = cols.gid_bytes(GidColumn::Element);
    assert_eq!(
        MeshColumns::gids_from_bytes(&header, &bytes),
        Some(cols.element_gids.clone())
    );
}
