use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use mesh_topology::prelude::*;

/// `n^3` hex block with node positions jittered so that feature angles are
/// not all exact right angles.
fn hex_block(n: usize, seed: u64) -> Mesh {
    let mut rng = SmallRng::seed_from_u64(seed);
    let id = |x: usize, y: usize, z: usize| x + (n + 1) * (y + (n + 1) * z);
    let mut pos = Vec::with_capacity((n + 1).pow(3));
    for z in 0..=n {
        for y in 0..=n {
            for x in 0..=n {
                let mut p = [x as f64, y as f64, z as f64];
                for c in &mut p {
                    *c += rng.gen_range(-0.05..0.05);
                }
                pos.push(p);
            }
        }
    }
    let mut els = Vec::with_capacity(n.pow(3));
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                els.push(Element::new(
                    ElementType::Hex8,
                    &[
                        id(x, y, z),
                        id(x + 1, y, z),
                        id(x + 1, y + 1, z),
                        id(x, y + 1, z),
                        id(x, y, z + 1),
                        id(x + 1, y, z + 1),
                        id(x + 1, y + 1, z + 1),
                        id(x, y + 1, z + 1),
                    ],
                ));
            }
        }
    }
    let mut m = Mesh::from_parts(&pos, els).expect("valid block");
    // Split the block into two parts so interface faces are built too.
    let half = m.element_count() / 2;
    for el in &mut m.elements_mut()[half..] {
        el.gid = Some(1);
    }
    m
}

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild");
    for &n in &[8usize, 16, 24] {
        let mesh = hex_block(n, 42);
        group.bench_with_input(BenchmarkId::new("hex_block", n), &n, |b, _| {
            let options = RebuildOptions::default();
            b.iter(|| {
                let mut m = mesh.clone();
                rebuild_mesh(&mut m, &options).expect("rebuild");
                black_box(m.count_face_partitions());
            });
        });
        group.bench_with_input(BenchmarkId::new("auto_parts", n), &n, |b, _| {
            let options = RebuildOptions::default().with_partition_elements(true);
            b.iter(|| {
                let mut m = mesh.clone();
                rebuild_mesh(&mut m, &options).expect("rebuild");
                black_box(m.count_element_partitions());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rebuild);
criterion_main!(benches);
