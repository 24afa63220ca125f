//! Entry-point for group-id partitioning.
//!
//! Elements are grouped into parts, faces into surfaces, edges into curves
//! and nodes into vertices. Automatic partitioning ([`auto`]) floods over
//! neighbor links subject to connectivity and feature-angle rules; explicit
//! partitioning ([`explicit`]) splits or reassigns user selections.
//!
//! Every traversal keeps its own [`FillState`] array, so no algorithm leaves
//! marks on the entities it visits.

pub mod auto;
pub mod explicit;

pub use auto::{
    auto_partition, auto_partition_edges, auto_partition_elements, auto_partition_nodes,
    auto_partition_surface, auto_smooth,
};
pub use explicit::{
    auto_partition_edges_in, auto_partition_faces, partition_edge_selection,
    partition_element_selection, partition_face_selection, partition_node, partition_node_set,
};

/// Per-entity state of one flood fill.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillState {
    #[default]
    Unpartitioned,
    /// Pushed on the stack, group not yet written.
    Filling,
    Partitioned(usize),
}

impl FillState {
    pub fn group(self) -> Option<usize> {
        match self {
            FillState::Partitioned(g) => Some(g),
            _ => None,
        }
    }
}

/// Stack-based flood fill over `count` entities.
///
/// Each seed that is still unpartitioned opens a new group, numbered from
/// `first_id` in seed order. `expand(current, out)` pushes the neighbors the
/// fill may move to from `current`; visited ones are filtered here.
/// Returns the per-entity state and the next unused group id.
pub(crate) fn flood_fill<S, E>(
    count: usize,
    seeds: S,
    first_id: usize,
    mut expand: E,
) -> (Vec<FillState>, usize)
where
    S: IntoIterator<Item = usize>,
    E: FnMut(usize, &mut Vec<usize>),
{
    let mut state = vec![FillState::Unpartitioned; count];
    let mut next = first_id;
    let mut stack = Vec::new();
    let mut cands = Vec::new();
    for seed in seeds {
        if seed >= count || state[seed] != FillState::Unpartitioned {
            continue;
        }
        log::trace!("flood fill: seed {seed} opens group {next}");
        state[seed] = FillState::Filling;
        stack.push(seed);
        while let Some(cur) = stack.pop() {
            state[cur] = FillState::Partitioned(next);
            cands.clear();
            expand(cur, &mut cands);
            for &c in &cands {
                if c < count && state[c] == FillState::Unpartitioned {
                    state[c] = FillState::Filling;
                    stack.push(c);
                }
            }
        }
        next += 1;
    }
    (state, next)
}
