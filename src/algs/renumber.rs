//! Renumbering utilities: group-id compaction and index remaps.
//!
//! Group ids are compacted after every structural edit so each kind's ids
//! run `0..N` without gaps. Entity compaction produces an old → new remap
//! (`None` for dropped entries) that callers apply to every reference.

use crate::topology::entity::Gid;
use crate::topology::mesh::Mesh;

/// Rewrite the group ids of `items` so they run `0..N` in ascending order
/// of the old ids. Returns `N`.
pub fn compact_group_ids<T>(items: &mut [T], gid: impl Fn(&mut T) -> &mut Gid) -> usize {
    let max = items.iter_mut().filter_map(|t| *gid(t)).max();
    let Some(max) = max else {
        return 0;
    };
    let mut table: Vec<Option<usize>> = vec![None; max + 1];
    for t in items.iter_mut() {
        if let Some(g) = *gid(t) {
            table[g] = Some(0);
        }
    }
    let mut next = 0;
    for slot in table.iter_mut().flatten() {
        *slot = next;
        next += 1;
    }
    for t in items.iter_mut() {
        let g = gid(t);
        if let Some(old) = *g {
            *g = table[old];
        }
    }
    next
}

pub fn renumber_element_partitions(mesh: &mut Mesh) -> usize {
    compact_group_ids(&mut mesh.elements, |e| &mut e.gid)
}

pub fn renumber_face_partitions(mesh: &mut Mesh) -> usize {
    compact_group_ids(&mut mesh.faces, |f| &mut f.gid)
}

pub fn renumber_edge_partitions(mesh: &mut Mesh) -> usize {
    compact_group_ids(&mut mesh.edges, |e| &mut e.gid)
}

pub fn renumber_node_partitions(mesh: &mut Mesh) -> usize {
    compact_group_ids(&mut mesh.nodes, |n| &mut n.gid)
}

pub fn renumber_smoothing_groups(mesh: &mut Mesh) -> usize {
    compact_group_ids(&mut mesh.faces, |f| &mut f.sid)
}

/// Compact every partition kind.
pub fn renumber_all_partitions(mesh: &mut Mesh) {
    renumber_element_partitions(mesh);
    renumber_face_partitions(mesh);
    renumber_edge_partitions(mesh);
    renumber_node_partitions(mesh);
}

/// Old → new index table for the entries flagged in `keep`, plus the
/// number kept.
pub fn build_remap(keep: &[bool]) -> (Vec<Option<usize>>, usize) {
    let mut next = 0;
    let remap = keep
        .iter()
        .map(|&k| {
            k.then(|| {
                next += 1;
                next - 1
            })
        })
        .collect();
    (remap, next)
}

/// Drop the entries of `items` not flagged in `keep`, preserving order.
pub fn retain_flagged<T>(items: &mut Vec<T>, keep: &[bool]) {
    let mut i = 0;
    items.retain(|_| {
        let k = keep.get(i).copied().unwrap_or(false);
        i += 1;
        k
    });
}

/// Map an optional index through `remap`.
pub(crate) fn remap_opt(remap: &[Option<usize>], idx: Option<usize>) -> Option<usize> {
    idx.and_then(|i| remap.get(i).copied().flatten())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaps_are_closed_in_order() {
        let mut gids: Vec<Gid> = vec![Some(4), None, Some(9), Some(4), Some(0)];
        let n = compact_group_ids(&mut gids, |g| g);
        assert_eq!(n, 3);
        assert_eq!(gids, vec![Some(1), None, Some(2), Some(1), Some(0)]);
    }

    #[test]
    fn all_unpartitioned_stays_empty() {
        let mut gids: Vec<Gid> = vec![None, None];
        assert_eq!(compact_group_ids(&mut gids, |g| g), 0);
        assert_eq!(gids, vec![None, None]);
    }

    #[test]
    fn remap_is_a_bijection_on_survivors() {
        let keep = [true, false, true, true, false];
        let (remap, n) = build_remap(&keep);
        assert_eq!(n, 3);
        assert_eq!(remap, vec![Some(0), None, Some(1), Some(2), None]);
        let mut v = vec!['a', 'b', 'c', 'd', 'e'];
        retain_flagged(&mut v, &keep);
        assert_eq!(v, vec!['a', 'c', 'd']);
        assert_eq!(remap_opt(&remap, Some(3)), Some(2));
        assert_eq!(remap_opt(&remap, Some(1)), None);
        assert_eq!(remap_opt(&remap, Some(42)), None);
    }
}
