mod util;

use mesh_topology::prelude::*;
use mesh_topology::topology::validation::collect_defects;
use proptest::prelude::*;
use util::{hex_grid, snapshot};

fn grid_with_parts(nx: usize, ny: usize, nz: usize, parts: &[usize]) -> Mesh {
    let mut m = hex_grid(nx, ny, nz);
    for (el, &p) in m.elements_mut().iter_mut().zip(parts.iter().cycle()) {
        el.gid = Some(p);
    }
    m
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn single_part_grids_have_no_defects(nx in 1usize..4, ny in 1usize..4, nz in 1usize..3) {
        let mut m = hex_grid(nx, ny, nz);
        rebuild_mesh(&mut m, &RebuildOptions::default()).unwrap();
        prop_assert!(collect_defects(&m, &ValidationOptions::all()).is_empty());
        let skin = 2 * (nx * ny + ny * nz + nx * nz);
        prop_assert_eq!(m.face_count(), skin);
        prop_assert_eq!(m.count_face_partitions(), 6);
        prop_assert_eq!(m.count_edge_partitions(), 12);
        prop_assert_eq!(m.count_node_partitions(), 8);
    }

    #[test]
    fn multi_part_grids_stay_symmetric_and_contiguous(
        nx in 1usize..4,
        ny in 1usize..4,
        parts in prop::collection::vec(0usize..4, 1..6),
    ) {
        let mut m = grid_with_parts(nx, ny, 2, &parts);
        rebuild_mesh(&mut m, &RebuildOptions::default()).unwrap();
        prop_assert_eq!(collect_defects(&m, &ValidationOptions::all()), vec![]);
        prop_assert!(m.diagnostics().is_empty());
        // Part ids are compacted, so the count never exceeds the distinct
        // ids handed in.
        let mut distinct = parts.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert!(m.count_element_partitions() <= distinct.len());
    }

    #[test]
    fn rebuild_is_idempotent(
        nx in 1usize..4,
        parts in prop::collection::vec(0usize..3, 1..4),
        angle in 10.0f64..120.0,
    ) {
        let mut m = grid_with_parts(nx, 2, 1, &parts);
        let options = RebuildOptions::default().with_smoothing_angle(angle);
        rebuild_mesh(&mut m, &options).unwrap();
        let first = snapshot(&m);
        rebuild_mesh(&mut m, &options).unwrap();
        prop_assert_eq!(snapshot(&m), first);
    }
}
