//! Shared utilities for graph algorithms
//!
//! Provides a read-only, optimized view of an undirected graph for algorithm execution.

use std::collections::HashMap;
use std::hash::Hash;

/// A dense, integer-indexed view of an undirected graph using Compressed Sparse Row (CSR) format.
///
/// Every edge is stored in both directions. Neighbour slices are sorted by dense
/// index so that intersections can be computed with a linear merge.
#[derive(Debug, Clone)]
pub struct GraphView<K> {
    /// Number of nodes
    pub node_count: usize,
    /// Mapping from dense index (0..N) back to the caller's key
    pub index_to_node: Vec<K>,
    /// Mapping from key to dense index
    pub node_to_index: HashMap<K, usize>,

    /// Offsets into `targets`. Size = node_count + 1
    pub offsets: Vec<usize>,
    /// Contiguous array of neighbour indices
    pub targets: Vec<usize>,

    /// Per-node weight (mention count), used for ordering only
    pub counts: Vec<u64>,
}

impl<K: Clone + Eq + Hash> GraphView<K> {
    /// Build a view from an adjacency list keyed by the caller's node type.
    ///
    /// Nodes are indexed in iteration order, so an ordered input yields a
    /// deterministic view. Neighbours that never appear as keys are appended
    /// as extra nodes; self references are dropped.
    pub fn from_adjacency<'a, I, N>(adjacency: I, count_of: impl Fn(&K) -> u64) -> Self
    where
        K: 'a,
        I: IntoIterator<Item = (&'a K, N)>,
        N: IntoIterator<Item = &'a K>,
    {
        let mut index_to_node: Vec<K> = Vec::new();
        let mut node_to_index: HashMap<K, usize> = HashMap::new();
        let mut lists: Vec<Vec<usize>> = Vec::new();

        fn intern<K: Clone + Eq + Hash>(
            key: &K,
            index_to_node: &mut Vec<K>,
            node_to_index: &mut HashMap<K, usize>,
            lists: &mut Vec<Vec<usize>>,
        ) -> usize {
            if let Some(&idx) = node_to_index.get(key) {
                return idx;
            }
            let idx = index_to_node.len();
            index_to_node.push(key.clone());
            node_to_index.insert(key.clone(), idx);
            lists.push(Vec::new());
            idx
        }

        for (key, neighbours) in adjacency {
            let u = intern(key, &mut index_to_node, &mut node_to_index, &mut lists);
            for neighbour in neighbours {
                let v = intern(neighbour, &mut index_to_node, &mut node_to_index, &mut lists);
                if u != v {
                    lists[u].push(v);
                    lists[v].push(u);
                }
            }
        }

        let node_count = index_to_node.len();
        let mut offsets = Vec::with_capacity(node_count + 1);
        let mut targets = Vec::new();

        offsets.push(0);
        for mut list in lists {
            list.sort_unstable();
            list.dedup();
            targets.extend(list);
            offsets.push(targets.len());
        }

        let counts = index_to_node.iter().map(&count_of).collect();

        GraphView {
            node_count,
            index_to_node,
            node_to_index,
            offsets,
            targets,
            counts,
        }
    }

    /// Dense index of a key, if present
    pub fn index_of(&self, key: &K) -> Option<usize> {
        self.node_to_index.get(key).copied()
    }
}

impl<K> GraphView<K> {
    /// Get the degree of a node (by index)
    pub fn degree(&self, idx: usize) -> usize {
        self.offsets[idx + 1] - self.offsets[idx]
    }

    /// Get the neighbours of a node, sorted by index
    pub fn neighbors(&self, idx: usize) -> &[usize] {
        let start = self.offsets[idx];
        let end = self.offsets[idx + 1];
        &self.targets[start..end]
    }

    /// Whether `u` and `v` share an edge
    pub fn is_adjacent(&self, u: usize, v: usize) -> bool {
        self.neighbors(u).binary_search(&v).is_ok()
    }

    /// Total number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.targets.len() / 2
    }

    /// Sort indices by descending count, ties by ascending index
    pub fn sort_by_count_desc(&self, nodes: &mut [usize]) {
        nodes.sort_by(|&a, &b| self.counts[b].cmp(&self.counts[a]).then(a.cmp(&b)));
    }
}

/// Intersection of two sorted index slices
pub fn sorted_intersection(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}
