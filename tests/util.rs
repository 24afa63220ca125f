#![allow(dead_code)]
use mesh_topology::prelude::*;

/// Structured block of `nx * ny * nz` unit hexes, all in part 0.
pub fn hex_grid(nx: usize, ny: usize, nz: usize) -> Mesh {
    let id = |x: usize, y: usize, z: usize| x + (nx + 1) * (y + (ny + 1) * z);
    let mut pos = Vec::new();
    for z in 0..=nz {
        for y in 0..=ny {
            for x in 0..=nx {
                pos.push([x as f64, y as f64, z as f64]);
            }
        }
    }
    let mut els = Vec::new();
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
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
    Mesh::from_parts(&pos, els).unwrap()
}

pub fn cube() -> Mesh {
    hex_grid(1, 1, 1)
}

/// Flat `nx * ny` grid of quad shells in the z = 0 plane.
pub fn quad_sheet(nx: usize, ny: usize) -> Mesh {
    let id = |x: usize, y: usize| x + (nx + 1) * y;
    let mut pos = Vec::new();
    for y in 0..=ny {
        for x in 0..=nx {
            pos.push([x as f64, y as f64, 0.0]);
        }
    }
    let mut els = Vec::new();
    for y in 0..ny {
        for x in 0..nx {
            els.push(Element::new(
                ElementType::Quad4,
                &[id(x, y), id(x + 1, y), id(x + 1, y + 1), id(x, y + 1)],
            ));
        }
    }
    Mesh::from_parts(&pos, els).unwrap()
}

pub fn rebuilt(mut m: Mesh) -> Mesh {
    rebuild_mesh(&mut m, &RebuildOptions::default()).unwrap();
    m
}

/// Derived data that a rebuild must reproduce exactly.
pub fn snapshot(m: &Mesh) -> (Vec<Element>, Vec<Face>, Vec<Edge>, Vec<Node>) {
    (
        m.elements().to_vec(),
        m.faces().to_vec(),
        m.edges().to_vec(),
        m.nodes().to_vec(),
    )
}
