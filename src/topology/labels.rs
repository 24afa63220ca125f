//! Named node sets owned by a mesh.
//!
//! Node sets pin their nodes: isolated-node removal never drops a node that
//! belongs to a set, and every node compaction rewrites the stored indices.

use std::collections::BTreeMap;

/// Named lists of node indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeSets {
    sets: BTreeMap<String, Vec<usize>>,
}

impl NodeSets {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `nodes` under `name`, replacing any previous set.
    pub fn insert(&mut self, name: &str, mut nodes: Vec<usize>) -> Option<Vec<usize>> {
        nodes.sort_unstable();
        nodes.dedup();
        self.sets.insert(name.to_string(), nodes)
    }

    pub fn get(&self, name: &str) -> Option<&[usize]> {
        self.sets.get(name).map(Vec::as_slice)
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<usize>> {
        self.sets.remove(name)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Set names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.sets.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// True if any set references `node`.
    pub fn contains_node(&self, node: usize) -> bool {
        self.sets.values().any(|v| v.binary_search(&node).is_ok())
    }

    /// Mark every referenced node in `mask`.
    pub(crate) fn mark_nodes(&self, mask: &mut [bool]) {
        for &n in self.sets.values().flatten() {
            if let Some(m) = mask.get_mut(n) {
                *m = true;
            }
        }
    }

    /// Rewrite indices through `remap`; nodes mapped to `None` are dropped.
    pub(crate) fn remap(&mut self, remap: &[Option<usize>]) {
        for nodes in self.sets.values_mut() {
            let mut out: Vec<usize> = nodes
                .iter()
                .filter_map(|&n| remap.get(n).copied().flatten())
                .collect();
            out.sort_unstable();
            out.dedup();
            *nodes = out;
        }
    }

    /// Append every set from `other` with indices shifted by `offset`.
    /// Colliding names get a numeric suffix.
    pub(crate) fn append_shifted(&mut self, other: &NodeSets, offset: usize) {
        for (name, nodes) in &other.sets {
            let mut key = name.clone();
            let mut k = 1;
            while self.sets.contains_key(&key) {
                key = format!("{name}{k}");
                k += 1;
            }
            self.sets
                .insert(key, nodes.iter().map(|n| n + offset).collect());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remap_drops_removed_nodes() {
        let mut sets = NodeSets::new();
        sets.insert("fixed", vec![4, 1, 2, 2]);
        assert_eq!(sets.get("fixed"), Some(&[1, 2, 4][..]));
        let remap = vec![Some(0), None, Some(1), None, Some(2)];
        sets.remap(&remap);
        assert_eq!(sets.get("fixed"), Some(&[1, 2][..]));
        assert!(sets.contains_node(2));
        assert!(!sets.contains_node(4));
    }

    #[test]
    fn appended_names_do_not_collide() {
        let mut a = NodeSets::new();
        a.insert("load", vec![0]);
        let mut b = NodeSets::new();
        b.insert("load", vec![1]);
        a.append_shifted(&b, 10);
        assert_eq!(a.get("load"), Some(&[0][..]));
        assert_eq!(a.get("load1"), Some(&[11][..]));
    }
}
