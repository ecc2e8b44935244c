//! Chain finding between entities
//!
//! Breadth-first chain-length layering and the bounded chain search, mapped
//! onto entities. Invalid queries (unknown entity, identical endpoints,
//! endpoints on different islands) produce empty results, never errors.

use super::{EntityView, Islands};
use crate::graph::Entity;
use correlate_algorithms::{bfs_layers, bounded_chain, ChainLimits};
use serde::Serialize;

/// Entities first reached at `distance` hops from the root, most mentioned first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainLayer {
    pub distance: usize,
    pub entities: Vec<Entity>,
}

/// BFS layers from `root`. Empty when `root` has no edges.
pub fn chain_lengths(view: &EntityView, root: &Entity) -> Vec<ChainLayer> {
    let Some(root_idx) = view.index_of(root) else {
        return Vec::new();
    };

    bfs_layers(view, root_idx)
        .into_iter()
        .map(|layer| ChainLayer {
            distance: layer.distance,
            entities: layer
                .nodes
                .iter()
                .map(|&idx| view.index_to_node[idx].clone())
                .collect(),
        })
        .collect()
}

/// A short chain of adjacent entities from `from` to `to`.
///
/// The chain length is capped by the number of BFS layers around `to`, and
/// the search stops after `max_expansions` partial chains. Returns an empty
/// chain for identical or unknown endpoints, or endpoints on different islands.
pub fn chain_between(
    view: &EntityView,
    islands: &Islands,
    from: &Entity,
    to: &Entity,
    max_expansions: usize,
) -> Vec<Entity> {
    if from == to || !islands.same_island(from, to) {
        return Vec::new();
    }
    let (Some(source), Some(target)) = (view.index_of(from), view.index_of(to)) else {
        return Vec::new();
    };

    let limits = ChainLimits {
        max_len: bfs_layers(view, target).len(),
        max_expansions,
    };

    bounded_chain(view, source, target, limits)
        .map(|chain| {
            chain
                .into_iter()
                .map(|idx| view.index_to_node[idx].clone())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::build_view;
    use crate::algo::tests::{graph_from_edges, graph_with_counts};

    fn e(key: &str) -> Entity {
        Entity::new(key)
    }

    fn path_graph() -> (EntityView, Islands) {
        let graph = graph_from_edges(&[("a", "b"), ("b", "c"), ("c", "d")]);
        let view = build_view(&graph);
        let islands = Islands::compute(&view);
        (view, islands)
    }

    #[test]
    fn test_chain_lengths_on_path() {
        let (view, _) = path_graph();
        let layers = chain_lengths(&view, &e("a"));

        let expected: Vec<ChainLayer> = ["a", "b", "c", "d"]
            .iter()
            .enumerate()
            .map(|(distance, key)| ChainLayer {
                distance,
                entities: vec![e(key)],
            })
            .collect();
        assert_eq!(layers, expected);
    }

    #[test]
    fn test_chain_lengths_orders_layer_by_count() {
        let graph = graph_with_counts(
            &[("hub", "x"), ("hub", "y"), ("hub", "z")],
            &[("x", 2), ("y", 20), ("z", 11)],
        );
        let view = build_view(&graph);
        let layers = chain_lengths(&view, &e("hub"));
        assert_eq!(layers[1].entities, vec![e("y"), e("z"), e("x")]);
    }

    #[test]
    fn test_chain_lengths_unknown_root() {
        let (view, _) = path_graph();
        assert!(chain_lengths(&view, &e("zzz")).is_empty());
    }

    #[test]
    fn test_chain_between_on_path() {
        let (view, islands) = path_graph();
        let chain = chain_between(&view, &islands, &e("a"), &e("d"), 1000);
        assert_eq!(chain, vec![e("a"), e("b"), e("c"), e("d")]);
    }

    #[test]
    fn test_chain_between_adjacent() {
        let (view, islands) = path_graph();
        let chain = chain_between(&view, &islands, &e("c"), &e("b"), 1000);
        assert_eq!(chain, vec![e("c"), e("b")]);
    }

    #[test]
    fn test_chain_between_invalid_queries_are_empty() {
        let graph = graph_from_edges(&[("a", "b"), ("x", "y")]);
        let view = build_view(&graph);
        let islands = Islands::compute(&view);

        assert!(chain_between(&view, &islands, &e("a"), &e("a"), 1000).is_empty());
        assert!(chain_between(&view, &islands, &e("a"), &e("nope"), 1000).is_empty());
        assert!(chain_between(&view, &islands, &e("a"), &e("y"), 1000).is_empty());
    }

    #[test]
    fn test_chain_between_is_valid_on_dense_island() {
        let graph = graph_from_edges(&[
            ("a", "b"),
            ("a", "c"),
            ("b", "d"),
            ("c", "d"),
            ("d", "e"),
            ("c", "f"),
            ("f", "e"),
            ("e", "g"),
            ("b", "g"),
        ]);
        let view = build_view(&graph);
        let islands = Islands::compute(&view);

        let chain = chain_between(&view, &islands, &e("a"), &e("g"), 1000);
        assert_eq!(chain.first(), Some(&e("a")));
        assert_eq!(chain.last(), Some(&e("g")));
        for pair in chain.windows(2) {
            assert!(graph.has_edge(&pair[0], &pair[1]));
        }
        let mut unique = chain.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), chain.len());
    }

    #[test]
    fn test_chain_between_on_long_island() {
        let n = 50_000;
        let keys: Vec<String> = (0..n).map(|i| format!("people:p{}", i)).collect();
        let edges: Vec<(&str, &str)> = keys
            .windows(2)
            .map(|w| (w[0].as_str(), w[1].as_str()))
            .collect();
        let graph = graph_from_edges(&edges);
        let view = build_view(&graph);
        let islands = Islands::compute(&view);

        let chain = chain_between(&view, &islands, &e(&keys[0]), &e(&keys[n - 1]), 200_000);
        assert_eq!(chain.len(), n);
        assert_eq!(chain.last(), Some(&e(&keys[n - 1])));
    }
}
