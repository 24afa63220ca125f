//! Columnar snapshot of a mesh for save/load layers.
//!
//! Every per-entity attribute becomes one flat array; absent ids are stored
//! as `-1`. Derived adjacency is not stored: [`Mesh::from_columns`] runs
//! [`build_mesh`](crate::algs::rebuild::build_mesh) to restore it.

use bytemuck::{Pod, Zeroable};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::algs::rebuild::build_mesh;
use crate::mesh_error::{EntityKind, MeshError, Result, TopologyDefect};
use crate::topology::cell_type::{EdgeType, ElementType, FaceType};
use crate::topology::entity::{Edge, Element, Face, Gid, Node};
use crate::topology::mesh::Mesh;

/// Which gid column [`MeshColumns::gid_bytes`] exposes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[repr(u16)]
pub enum GidColumn {
    Node = 1,
    Element = 2,
    Face = 3,
    Smoothing = 4,
    Edge = 5,
}

/// Header preceding a gid column in a chunked archive.
/// Multi-byte fields are stored little-endian.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ColumnHeader {
    pub kind_le: u16,
    pub reserved_le: u16,
    pub count_le: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshColumns {
    pub positions: Vec<[f64; 3]>,
    pub node_gids: Vec<i32>,
    pub node_ids: Vec<i64>,

    pub element_types: Vec<ElementType>,
    pub element_gids: Vec<i32>,
    pub material_ids: Vec<i32>,
    pub element_ids: Vec<i64>,
    /// `element_nodes[element_offsets[i]..element_offsets[i + 1]]` are the
    /// nodes of element `i`.
    pub element_offsets: Vec<u32>,
    pub element_nodes: Vec<u32>,

    pub face_types: Vec<FaceType>,
    pub face_gids: Vec<i32>,
    pub face_sids: Vec<i32>,
    /// Face nodes back to back; each face takes its type's node count.
    pub face_nodes: Vec<u32>,

    pub edge_types: Vec<EdgeType>,
    pub edge_gids: Vec<i32>,
    pub edge_nodes: Vec<u32>,
}

fn encode(gid: Gid) -> i32 {
    gid.and_then(|g| i32::try_from(g).ok()).unwrap_or(-1)
}

fn decode(v: i32) -> Gid {
    usize::try_from(v).ok()
}

fn encode_id(id: Option<u32>) -> i64 {
    id.map_or(-1, i64::from)
}

fn decode_id(v: i64) -> Option<u32> {
    u32::try_from(v).ok()
}

fn bad_column(kind: EntityKind, entity: usize, len: usize) -> MeshError {
    MeshError::InvalidTopology(TopologyDefect::ReferenceOutOfRange {
        kind,
        entity,
        target_kind: EntityKind::Node,
        target: len,
    })
}

/// Split a flat node column into per-entity slices sized by `counts`.
fn take_nodes(
    kind: EntityKind,
    flat: &[u32],
    counts: impl Iterator<Item = usize>,
) -> Result<Vec<Vec<usize>>> {
    let mut out = Vec::new();
    let mut at = 0;
    for (i, k) in counts.enumerate() {
        let chunk = flat
            .get(at..at + k)
            .ok_or_else(|| bad_column(kind, i, flat.len()))?;
        out.push(chunk.iter().map(|&n| n as usize).collect());
        at += k;
    }
    if at != flat.len() {
        return Err(bad_column(kind, out.len(), flat.len()));
    }
    Ok(out)
}

impl MeshColumns {
    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    pub fn element_count(&self) -> usize {
        self.element_types.len()
    }

    fn gids(&self, column: GidColumn) -> &[i32] {
        match column {
            GidColumn::Node => &self.node_gids,
            GidColumn::Element => &self.element_gids,
            GidColumn::Face => &self.face_gids,
            GidColumn::Smoothing => &self.face_sids,
            GidColumn::Edge => &self.edge_gids,
        }
    }

    /// Header plus little-endian bytes of one gid column.
    pub fn gid_bytes(&self, column: GidColumn) -> (ColumnHeader, Vec<u8>) {
        let le: Vec<i32> = self.gids(column).iter().map(|g| g.to_le()).collect();
        let header = ColumnHeader {
            kind_le: (column as u16).to_le(),
            reserved_le: 0,
            count_le: (le.len() as u32).to_le(),
        };
        (header, bytemuck::cast_slice::<i32, u8>(&le).to_vec())
    }

    /// Decode a gid column written by [`gid_bytes`](Self::gid_bytes).
    pub fn gids_from_bytes(header: &ColumnHeader, bytes: &[u8]) -> Option<Vec<i32>> {
        let count = u32::from_le(header.count_le) as usize;
        if bytes.len() != count * std::mem::size_of::<i32>() {
            return None;
        }
        let mut out = vec![0i32; count];
        bytemuck::cast_slice_mut::<i32, u8>(&mut out).copy_from_slice(bytes);
        Some(out.into_iter().map(i32::from_le).collect())
    }
}

impl Mesh {
    /// Flatten the mesh records into columns.
    pub fn to_columns(&self) -> MeshColumns {
        let mut c = MeshColumns::default();
        for n in &self.nodes {
            c.positions.push([n.pos.x, n.pos.y, n.pos.z]);
            c.node_gids.push(encode(n.gid));
            c.node_ids.push(encode_id(n.nid));
        }
        c.element_offsets.push(0);
        for el in &self.elements {
            c.element_types.push(el.kind);
            c.element_gids.push(encode(el.gid));
            c.material_ids.push(encode(el.mat_id));
            c.element_ids.push(encode_id(el.nid));
            c.element_nodes.extend(el.nodes().iter().map(|&n| n as u32));
            c.element_offsets.push(c.element_nodes.len() as u32);
        }
        for f in &self.faces {
            c.face_types.push(f.kind);
            c.face_gids.push(encode(f.gid));
            c.face_sids.push(encode(f.sid));
            c.face_nodes.extend(f.nodes().iter().map(|&n| n as u32));
        }
        for e in &self.edges {
            c.edge_types.push(e.kind);
            c.edge_gids.push(encode(e.gid));
            c.edge_nodes.extend(e.nodes().iter().map(|&n| n as u32));
        }
        c
    }

    /// Rebuild a mesh from columns. Column lengths and node indices are
    /// checked; derived adjacency is then restored with the stored
    /// partitions.
    pub fn from_columns(c: &MeshColumns) -> Result<Mesh> {
        let nn = c.positions.len();
        let ne = c.element_types.len();
        let (nf, nl) = (c.face_types.len(), c.edge_types.len());
        if c.node_gids.len() != nn || c.node_ids.len() != nn {
            return Err(bad_column(EntityKind::Node, 0, nn));
        }
        if c.element_gids.len() != ne
            || c.material_ids.len() != ne
            || c.element_ids.len() != ne
            || c.element_offsets.len() != ne + 1
        {
            return Err(bad_column(EntityKind::Element, 0, ne));
        }
        if c.face_gids.len() != nf || c.face_sids.len() != nf {
            return Err(bad_column(EntityKind::Face, 0, nf));
        }
        if c.edge_gids.len() != nl {
            return Err(bad_column(EntityKind::Edge, 0, nl));
        }

        let mut m = Mesh::new();
        m.nodes = c
            .positions
            .iter()
            .zip(&c.node_gids)
            .zip(&c.node_ids)
            .map(|((p, &g), &id)| Node {
                gid: decode(g),
                nid: decode_id(id),
                ..Node::new(Point3::new(p[0], p[1], p[2]))
            })
            .collect();

        for (i, &kind) in c.element_types.iter().enumerate() {
            let (a, b) = (c.element_offsets[i] as usize, c.element_offsets[i + 1] as usize);
            let nodes = c
                .element_nodes
                .get(a..b)
                .filter(|s| s.len() == kind.node_count())
                .ok_or_else(|| bad_column(EntityKind::Element, i, c.element_nodes.len()))?;
            let nodes: Vec<usize> = nodes.iter().map(|&n| n as usize).collect();
            let mut el = Element::new(kind, &nodes);
            el.gid = decode(c.element_gids[i]);
            el.mat_id = decode(c.material_ids[i]);
            el.nid = decode_id(c.element_ids[i]);
            m.elements.push(el);
        }

        let face_nodes = take_nodes(
            EntityKind::Face,
            &c.face_nodes,
            c.face_types.iter().map(|t| t.node_count()),
        )?;
        for (i, nodes) in face_nodes.iter().enumerate() {
            let mut f = Face::new(c.face_types[i], nodes);
            f.gid = decode(c.face_gids[i]);
            f.sid = decode(c.face_sids[i]);
            m.faces.push(f);
        }

        let edge_nodes = take_nodes(
            EntityKind::Edge,
            &c.edge_nodes,
            c.edge_types.iter().map(|t| t.node_count()),
        )?;
        for (i, nodes) in edge_nodes.iter().enumerate() {
            let mut e = Edge::new(c.edge_types[i], nodes);
            e.gid = decode(c.edge_gids[i]);
            m.edges.push(e);
        }

        build_mesh(&mut m)?;
        Ok(m)
    }
}
