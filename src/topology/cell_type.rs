//! Element, face and edge type metadata.
//!
//! Every per-family constant the topology engine needs lives here: node
//! counts, the local faces of solids, the local edges of shells and faces,
//! and the node permutations used to flip winding. Callers dispatch on the
//! enums; no integer type tags leak out of this module.
//!
//! # Node ordering
//! - **Tet4**: `[0, 1, 2]` base, apex `3`. Tet10 adds mid-edge nodes
//!   `4..=9` on `(0,1) (1,2) (2,0) (0,3) (1,3) (2,3)`.
//! - **Hex8**: bottom face `[0, 1, 2, 3]`, top face `[4, 5, 6, 7]`.
//!   Hex20 adds mid-edge nodes `8..=19`; Hex27 adds face centers
//!   `20..=25` and the body center `26`.
//! - **Penta6**: bottom triangle `[0, 1, 2]`, top triangle `[3, 4, 5]`.
//! - **Pyra5**: base quad `[0, 1, 2, 3]`, apex `4`.
//! - **Shells** list their corner nodes counter-clockwise, then mid-side
//!   nodes, then the center node (Tri7, Quad9).

use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

/// Largest node count of any supported element (Hex27).
pub const MAX_ELEMENT_NODES: usize = 27;
/// Largest node count of any supported face (Quad9).
pub const MAX_FACE_NODES: usize = 9;
/// Largest node count of any supported edge (Line4).
pub const MAX_EDGE_NODES: usize = 4;
/// Largest number of facets (faces, edges or end nodes) of any element.
pub const MAX_FACETS: usize = 6;
/// Largest number of edges of any face.
pub const MAX_FACE_EDGES: usize = 4;

const_assert!(MAX_FACE_NODES <= MAX_ELEMENT_NODES);
const_assert!(MAX_FACE_EDGES <= MAX_FACETS);

/// Edge shapes.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum EdgeType {
    #[default]
    Line2,
    Line3,
    Line4,
}

impl EdgeType {
    pub fn node_count(self) -> usize {
        match self {
            EdgeType::Line2 => 2,
            EdgeType::Line3 => 3,
            EdgeType::Line4 => 4,
        }
    }
}

/// An edge of a face or shell, in local node numbering.
#[derive(Clone, Copy, Debug)]
pub struct LocalEdge {
    pub kind: EdgeType,
    pub nodes: &'static [usize],
}

/// Face shapes.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum FaceType {
    #[default]
    Tri3,
    Tri6,
    Tri7,
    Quad4,
    Quad8,
    Quad9,
}

const TRI3_EDGES: [LocalEdge; 3] = [
    LocalEdge { kind: EdgeType::Line2, nodes: &[0, 1] },
    LocalEdge { kind: EdgeType::Line2, nodes: &[1, 2] },
    LocalEdge { kind: EdgeType::Line2, nodes: &[2, 0] },
];
const TRI6_EDGES: [LocalEdge; 3] = [
    LocalEdge { kind: EdgeType::Line3, nodes: &[0, 1, 3] },
    LocalEdge { kind: EdgeType::Line3, nodes: &[1, 2, 4] },
    LocalEdge { kind: EdgeType::Line3, nodes: &[2, 0, 5] },
];
const QUAD4_EDGES: [LocalEdge; 4] = [
    LocalEdge { kind: EdgeType::Line2, nodes: &[0, 1] },
    LocalEdge { kind: EdgeType::Line2, nodes: &[1, 2] },
    LocalEdge { kind: EdgeType::Line2, nodes: &[2, 3] },
    LocalEdge { kind: EdgeType::Line2, nodes: &[3, 0] },
];
const QUAD8_EDGES: [LocalEdge; 4] = [
    LocalEdge { kind: EdgeType::Line3, nodes: &[0, 1, 4] },
    LocalEdge { kind: EdgeType::Line3, nodes: &[1, 2, 5] },
    LocalEdge { kind: EdgeType::Line3, nodes: &[2, 3, 6] },
    LocalEdge { kind: EdgeType::Line3, nodes: &[3, 0, 7] },
];

impl FaceType {
    pub fn node_count(self) -> usize {
        match self {
            FaceType::Tri3 => 3,
            FaceType::Tri6 => 6,
            FaceType::Tri7 => 7,
            FaceType::Quad4 => 4,
            FaceType::Quad8 => 8,
            FaceType::Quad9 => 9,
        }
    }

    /// Number of corner nodes, which is also the number of edges.
    pub fn corner_count(self) -> usize {
        if self.is_tri() { 3 } else { 4 }
    }

    pub fn is_tri(self) -> bool {
        matches!(self, FaceType::Tri3 | FaceType::Tri6 | FaceType::Tri7)
    }

    pub fn is_quad(self) -> bool {
        !self.is_tri()
    }

    pub fn edges(self) -> &'static [LocalEdge] {
        match self {
            FaceType::Tri3 => &TRI3_EDGES,
            FaceType::Tri6 | FaceType::Tri7 => &TRI6_EDGES,
            FaceType::Quad4 => &QUAD4_EDGES,
            FaceType::Quad8 | FaceType::Quad9 => &QUAD8_EDGES,
        }
    }

    /// Node swaps that reverse the winding of this face.
    pub fn inversion_swaps(self) -> &'static [(usize, usize)] {
        match self {
            FaceType::Tri3 | FaceType::Quad4 => &[(0, 2)],
            FaceType::Tri6 | FaceType::Tri7 => &[(0, 2), (3, 4)],
            FaceType::Quad8 | FaceType::Quad9 => &[(0, 2), (4, 5), (6, 7)],
        }
    }

    /// Face shape with the given node count, if one exists.
    pub fn from_node_count(n: usize) -> Option<Self> {
        match n {
            3 => Some(FaceType::Tri3),
            6 => Some(FaceType::Tri6),
            7 => Some(FaceType::Tri7),
            4 => Some(FaceType::Quad4),
            8 => Some(FaceType::Quad8),
            9 => Some(FaceType::Quad9),
            _ => None,
        }
    }
}

/// A face of a solid element, in local node numbering.
#[derive(Clone, Copy, Debug)]
pub struct LocalFace {
    pub kind: FaceType,
    pub nodes: &'static [usize],
}

const fn lf(kind: FaceType, nodes: &'static [usize]) -> LocalFace {
    LocalFace { kind, nodes }
}

const TET4_FACES: [LocalFace; 4] = [
    lf(FaceType::Tri3, &[0, 1, 3]),
    lf(FaceType::Tri3, &[1, 2, 3]),
    lf(FaceType::Tri3, &[0, 3, 2]),
    lf(FaceType::Tri3, &[0, 2, 1]),
];
const TET10_FACES: [LocalFace; 4] = [
    lf(FaceType::Tri6, &[0, 1, 3, 4, 8, 7]),
    lf(FaceType::Tri6, &[1, 2, 3, 5, 9, 8]),
    lf(FaceType::Tri6, &[2, 0, 3, 6, 7, 9]),
    lf(FaceType::Tri6, &[2, 1, 0, 5, 4, 6]),
];
const TET15_FACES: [LocalFace; 4] = [
    lf(FaceType::Tri7, &[0, 1, 3, 4, 8, 7, 11]),
    lf(FaceType::Tri7, &[1, 2, 3, 5, 9, 8, 12]),
    lf(FaceType::Tri7, &[2, 0, 3, 6, 7, 9, 13]),
    lf(FaceType::Tri7, &[2, 1, 0, 5, 4, 6, 10]),
];
const HEX8_FACES: [LocalFace; 6] = [
    lf(FaceType::Quad4, &[0, 1, 5, 4]),
    lf(FaceType::Quad4, &[1, 2, 6, 5]),
    lf(FaceType::Quad4, &[2, 3, 7, 6]),
    lf(FaceType::Quad4, &[3, 0, 4, 7]),
    lf(FaceType::Quad4, &[3, 2, 1, 0]),
    lf(FaceType::Quad4, &[4, 5, 6, 7]),
];
const HEX20_FACES: [LocalFace; 6] = [
    lf(FaceType::Quad8, &[0, 1, 5, 4, 8, 17, 12, 16]),
    lf(FaceType::Quad8, &[1, 2, 6, 5, 9, 18, 13, 17]),
    lf(FaceType::Quad8, &[2, 3, 7, 6, 10, 19, 14, 18]),
    lf(FaceType::Quad8, &[3, 0, 4, 7, 11, 16, 15, 19]),
    lf(FaceType::Quad8, &[3, 2, 1, 0, 10, 9, 8, 11]),
    lf(FaceType::Quad8, &[4, 5, 6, 7, 12, 13, 14, 15]),
];
const HEX27_FACES: [LocalFace; 6] = [
    lf(FaceType::Quad9, &[0, 1, 5, 4, 8, 17, 12, 16, 20]),
    lf(FaceType::Quad9, &[1, 2, 6, 5, 9, 18, 13, 17, 21]),
    lf(FaceType::Quad9, &[2, 3, 7, 6, 10, 19, 14, 18, 22]),
    lf(FaceType::Quad9, &[3, 0, 4, 7, 11, 16, 15, 19, 23]),
    lf(FaceType::Quad9, &[3, 2, 1, 0, 10, 9, 8, 11, 24]),
    lf(FaceType::Quad9, &[4, 5, 6, 7, 12, 13, 14, 15, 25]),
];
const PENTA6_FACES: [LocalFace; 5] = [
    lf(FaceType::Quad4, &[0, 1, 4, 3]),
    lf(FaceType::Quad4, &[1, 2, 5, 4]),
    lf(FaceType::Quad4, &[0, 3, 5, 2]),
    lf(FaceType::Tri3, &[0, 2, 1]),
    lf(FaceType::Tri3, &[3, 4, 5]),
];
const PENTA15_FACES: [LocalFace; 5] = [
    lf(FaceType::Quad8, &[0, 1, 4, 3, 6, 13, 9, 12]),
    lf(FaceType::Quad8, &[1, 2, 5, 4, 7, 14, 10, 13]),
    lf(FaceType::Quad8, &[0, 3, 5, 2, 12, 11, 14, 8]),
    lf(FaceType::Tri6, &[0, 2, 1, 8, 7, 6]),
    lf(FaceType::Tri6, &[3, 4, 5, 9, 10, 11]),
];
const PYRA5_FACES: [LocalFace; 5] = [
    lf(FaceType::Tri3, &[0, 1, 4]),
    lf(FaceType::Tri3, &[1, 2, 4]),
    lf(FaceType::Tri3, &[2, 3, 4]),
    lf(FaceType::Tri3, &[3, 0, 4]),
    lf(FaceType::Quad4, &[3, 2, 1, 0]),
];
const PYRA13_FACES: [LocalFace; 5] = [
    lf(FaceType::Tri6, &[0, 1, 4, 5, 10, 9]),
    lf(FaceType::Tri6, &[1, 2, 4, 6, 11, 10]),
    lf(FaceType::Tri6, &[2, 3, 4, 7, 12, 11]),
    lf(FaceType::Tri6, &[3, 0, 4, 8, 9, 12]),
    lf(FaceType::Quad8, &[3, 2, 1, 0, 7, 6, 5, 8]),
];

/// Broad element family; decides what a "facet" is.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum ElementFamily {
    /// Line elements; facets are the two end nodes.
    Beam,
    /// Surface elements; facets are edges.
    Shell,
    /// Volume elements; facets are faces.
    Solid,
}

/// Supported element types.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum ElementType {
    Beam2,
    Beam3,
    Tri3,
    Tri6,
    Tri7,
    Quad4,
    Quad8,
    Quad9,
    #[default]
    Tet4,
    Tet5,
    Tet10,
    Tet15,
    Hex8,
    Hex20,
    Hex27,
    Penta6,
    Penta15,
    Pyra5,
    Pyra13,
}

impl ElementType {
    pub const ALL: [ElementType; 19] = [
        ElementType::Beam2,
        ElementType::Beam3,
        ElementType::Tri3,
        ElementType::Tri6,
        ElementType::Tri7,
        ElementType::Quad4,
        ElementType::Quad8,
        ElementType::Quad9,
        ElementType::Tet4,
        ElementType::Tet5,
        ElementType::Tet10,
        ElementType::Tet15,
        ElementType::Hex8,
        ElementType::Hex20,
        ElementType::Hex27,
        ElementType::Penta6,
        ElementType::Penta15,
        ElementType::Pyra5,
        ElementType::Pyra13,
    ];

    pub fn family(self) -> ElementFamily {
        use ElementType::*;
        match self {
            Beam2 | Beam3 => ElementFamily::Beam,
            Tri3 | Tri6 | Tri7 | Quad4 | Quad8 | Quad9 => ElementFamily::Shell,
            _ => ElementFamily::Solid,
        }
    }

    pub fn is_beam(self) -> bool {
        self.family() == ElementFamily::Beam
    }

    pub fn is_shell(self) -> bool {
        self.family() == ElementFamily::Shell
    }

    pub fn is_solid(self) -> bool {
        self.family() == ElementFamily::Solid
    }

    pub fn node_count(self) -> usize {
        use ElementType::*;
        match self {
            Beam2 => 2,
            Beam3 => 3,
            Tri3 => 3,
            Tri6 => 6,
            Tri7 => 7,
            Quad4 => 4,
            Quad8 => 8,
            Quad9 => 9,
            Tet4 => 4,
            Tet5 => 5,
            Tet10 => 10,
            Tet15 => 15,
            Hex8 => 8,
            Hex20 => 20,
            Hex27 => 27,
            Penta6 => 6,
            Penta15 => 15,
            Pyra5 => 5,
            Pyra13 => 13,
        }
    }

    /// Local faces of a solid; empty for shells and beams.
    pub fn faces(self) -> &'static [LocalFace] {
        use ElementType::*;
        match self {
            Tet4 | Tet5 => &TET4_FACES,
            Tet10 => &TET10_FACES,
            Tet15 => &TET15_FACES,
            Hex8 => &HEX8_FACES,
            Hex20 => &HEX20_FACES,
            Hex27 => &HEX27_FACES,
            Penta6 => &PENTA6_FACES,
            Penta15 => &PENTA15_FACES,
            Pyra5 => &PYRA5_FACES,
            Pyra13 => &PYRA13_FACES,
            _ => &[],
        }
    }

    /// Local edges of a shell; empty for solids and beams.
    pub fn edges(self) -> &'static [LocalEdge] {
        match self.shell_face_type() {
            Some(ft) => ft.edges(),
            None => &[],
        }
    }

    /// Number of neighbor slots: faces for solids, edges for shells, end
    /// nodes for beams.
    pub fn facet_count(self) -> usize {
        match self.family() {
            ElementFamily::Solid => self.faces().len(),
            ElementFamily::Shell => self.edges().len(),
            ElementFamily::Beam => 2,
        }
    }

    /// The single face a shell element spans.
    pub fn shell_face_type(self) -> Option<FaceType> {
        use ElementType::*;
        match self {
            Tri3 => Some(FaceType::Tri3),
            Tri6 => Some(FaceType::Tri6),
            Tri7 => Some(FaceType::Tri7),
            Quad4 => Some(FaceType::Quad4),
            Quad8 => Some(FaceType::Quad8),
            Quad9 => Some(FaceType::Quad9),
            _ => None,
        }
    }

    /// Shell element spanning exactly this face shape.
    pub fn shell_for_face(ft: FaceType) -> ElementType {
        match ft {
            FaceType::Tri3 => ElementType::Tri3,
            FaceType::Tri6 => ElementType::Tri6,
            FaceType::Tri7 => ElementType::Tri7,
            FaceType::Quad4 => ElementType::Quad4,
            FaceType::Quad8 => ElementType::Quad8,
            FaceType::Quad9 => ElementType::Quad9,
        }
    }

    /// The edge a beam element spans.
    pub fn beam_edge_type(self) -> Option<EdgeType> {
        match self {
            ElementType::Beam2 => Some(EdgeType::Line2),
            ElementType::Beam3 => Some(EdgeType::Line3),
            _ => None,
        }
    }

    /// Node swaps that reverse the orientation of the element.
    pub fn inversion_swaps(self) -> &'static [(usize, usize)] {
        use ElementType::*;
        match self {
            Beam2 | Beam3 => &[(0, 1)],
            Tri3 => &[(0, 2)],
            Quad4 => &[(0, 3), (1, 2)],
            Tri6 | Tri7 => &[(0, 2), (3, 4)],
            Quad8 | Quad9 => &[(1, 3), (4, 7), (5, 6)],
            Tet4 | Tet5 => &[(0, 3)],
            Tet10 => &[(1, 2), (4, 6), (8, 9)],
            Tet15 => &[(1, 2), (4, 6), (8, 9), (11, 13)],
            Hex8 => &[(0, 4), (1, 5), (2, 6), (3, 7)],
            Hex20 => &[
                (1, 3),
                (5, 7),
                (8, 11),
                (9, 10),
                (12, 15),
                (13, 14),
                (17, 19),
            ],
            Hex27 => &[
                (1, 3),
                (5, 7),
                (8, 11),
                (9, 10),
                (12, 15),
                (13, 14),
                (17, 19),
                (20, 23),
                (21, 22),
            ],
            Penta6 => &[(0, 2), (3, 5)],
            Penta15 => &[(1, 2), (4, 5), (6, 8), (9, 11), (13, 14)],
            Pyra5 => &[(1, 3)],
            Pyra13 => &[(1, 3), (5, 8), (6, 7), (10, 12)],
        }
    }
}
