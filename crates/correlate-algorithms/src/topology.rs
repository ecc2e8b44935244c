//! Graph topology analysis algorithms
//!
//! Common-neighbour enumeration for non-adjacent node pairs.

use super::common::{sorted_intersection, GraphView};
use rayon::prelude::*;

/// A non-adjacent pair with at least one shared neighbour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonNeighbors {
    /// Smaller index of the pair
    pub a: usize,
    /// Larger index of the pair
    pub b: usize,
    /// Shared neighbour indices, ascending
    pub shared: Vec<usize>,
}

/// Enumerate every unordered pair of distinct `members` that is not an edge
/// but whose neighbour sets intersect.
///
/// Each pair is visited once (`a < b`). The result is sorted by shared
/// neighbour count, descending, then by `(a, b)`. Cost is quadratic in the
/// number of members.
pub fn common_neighbor_pairs<K: Sync>(view: &GraphView<K>, members: &[usize]) -> Vec<CommonNeighbors> {
    let mut members: Vec<usize> = members.to_vec();
    members.sort_unstable();
    members.dedup();

    let mut pairs: Vec<CommonNeighbors> = members
        .par_iter()
        .enumerate()
        .flat_map_iter(|(i, &a)| {
            let a_neighbors = view.neighbors(a);
            members[i + 1..].iter().filter_map(move |&b| {
                if view.is_adjacent(a, b) {
                    return None;
                }
                let shared = sorted_intersection(a_neighbors, view.neighbors(b));
                if shared.is_empty() {
                    None
                } else {
                    Some(CommonNeighbors { a, b, shared })
                }
            })
        })
        .collect();

    pairs.sort_by(|x, y| {
        y.shared
            .len()
            .cmp(&x.shared.len())
            .then(x.a.cmp(&y.a))
            .then(x.b.cmp(&y.b))
    });
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::tests::view_from_edges;

    #[test]
    fn test_path_graph_pairs() {
        // a-b-c-d: (a,c) share b, (b,d) share c
        let view = view_from_edges(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "d")]);
        let members: Vec<usize> = (0..view.node_count).collect();
        let pairs = common_neighbor_pairs(&view, &members);

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], CommonNeighbors { a: 0, b: 2, shared: vec![1] });
        assert_eq!(pairs[1], CommonNeighbors { a: 1, b: 3, shared: vec![2] });
    }

    #[test]
    fn test_pairs_sorted_by_overlap() {
        // x and y both touch p, q, r; z touches only p
        let view = view_from_edges(
            &["x", "y", "z", "p", "q", "r"],
            &[("x", "p"), ("x", "q"), ("x", "r"), ("y", "p"), ("y", "q"), ("y", "r"), ("z", "p")],
        );
        let members: Vec<usize> = (0..view.node_count).collect();
        let pairs = common_neighbor_pairs(&view, &members);

        assert_eq!(pairs[0].a, 0);
        assert_eq!(pairs[0].b, 1);
        assert_eq!(pairs[0].shared.len(), 3);
        for window in pairs.windows(2) {
            assert!(window[0].shared.len() >= window[1].shared.len());
        }
        for pair in &pairs {
            assert!(!view.is_adjacent(pair.a, pair.b));
        }
    }

    #[test]
    fn test_members_restrict_pairs() {
        let view = view_from_edges(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        assert!(common_neighbor_pairs(&view, &[0, 1]).is_empty());
    }
}
