//! Community detection algorithms
//!
//! Connected components of an undirected co-occurrence graph.

use super::common::GraphView;

/// Result of the connected components algorithm
#[derive(Debug, Clone, Default)]
pub struct ComponentResult {
    /// Components as lists of node indices, largest first.
    /// Members inside a component are in ascending index order.
    pub components: Vec<Vec<usize>>,
    /// Node index -> position in `components` (None for isolated nodes)
    pub node_component: Vec<Option<usize>>,
}

/// Union-Find data structure
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        UnionFind {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression
        let mut cur = i;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, i: usize, j: usize) {
        let root_i = self.find(i);
        let root_j = self.find(j);

        if root_i != root_j {
            if self.rank[root_i] < self.rank[root_j] {
                self.parent[root_i] = root_j;
            } else if self.rank[root_i] > self.rank[root_j] {
                self.parent[root_j] = root_i;
            } else {
                self.parent[root_j] = root_i;
                self.rank[root_i] += 1;
            }
        }
    }
}

/// Connected components
///
/// Partitions every node with at least one edge into exactly one component.
/// Nodes of degree zero belong to no component. Components are sorted by
/// member count, descending; equal sizes keep the order of their smallest
/// member index, so the result is deterministic for a fixed view.
pub fn connected_components<K>(view: &GraphView<K>) -> ComponentResult {
    let n = view.node_count;
    let mut uf = UnionFind::new(n);

    for u in 0..n {
        for &v in view.neighbors(u) {
            if v > u {
                uf.union(u, v);
            }
        }
    }

    // Group by root, in order of first (smallest) member
    let mut root_slot: Vec<Option<usize>> = vec![None; n];
    let mut components: Vec<Vec<usize>> = Vec::new();
    for u in 0..n {
        if view.degree(u) == 0 {
            continue;
        }
        let root = uf.find(u);
        let slot = match root_slot[root] {
            Some(slot) => slot,
            None => {
                components.push(Vec::new());
                root_slot[root] = Some(components.len() - 1);
                components.len() - 1
            }
        };
        components[slot].push(u);
    }

    // Stable sort keeps first-member order among equal sizes
    components.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut node_component = vec![None; n];
    for (c, members) in components.iter().enumerate() {
        for &u in members {
            node_component[u] = Some(c);
        }
    }

    ComponentResult {
        components,
        node_component,
    }
}
