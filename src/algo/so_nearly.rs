//! So-nearly analysis
//!
//! Within the main island, finds entity pairs that were never co-mentioned
//! but share at least one neighbour, and indexes them by entity and by
//! overlap size.

use super::{EntityView, Island};
use crate::graph::Entity;
use correlate_algorithms::common_neighbor_pairs;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A non-adjacent pair with its shared neighbours
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoNearlyPair {
    /// The pair, in key order
    pub entities: [Entity; 2],
    /// Shared neighbours, in key order
    pub intersection_list: Vec<Entity>,
    pub intersection_size: usize,
}

/// Entity -> partner -> shared neighbours
pub type ByEntity = BTreeMap<Entity, BTreeMap<Entity, Vec<Entity>>>;
/// Entity -> overlap size -> partners
pub type ByOverlap = BTreeMap<Entity, BTreeMap<usize, BTreeSet<Entity>>>;

/// So-nearly pairs of the main island plus their two lookup indexes
#[derive(Debug, Clone, Default)]
pub struct SoNearlyIndex {
    pairs: Vec<SoNearlyPair>,
    by_entity: ByEntity,
    by_overlap: ByOverlap,
}

impl SoNearlyIndex {
    /// Enumerate so-nearly pairs of `main_island` and build both indexes.
    /// Pairs are ranked by intersection size, descending, then by key.
    pub fn compute(view: &EntityView, main_island: Option<&Island>) -> Self {
        let Some(island) = main_island else {
            return Self::default();
        };

        let members: Vec<usize> = island
            .entities()
            .filter_map(|entity| view.index_of(entity))
            .collect();

        let mut pairs: Vec<SoNearlyPair> = common_neighbor_pairs(view, &members)
            .into_iter()
            .map(|found| {
                let x = view.index_to_node[found.a].clone();
                let y = view.index_to_node[found.b].clone();
                let entities = if x <= y { [x, y] } else { [y, x] };
                let mut intersection_list: Vec<Entity> = found
                    .shared
                    .iter()
                    .map(|&idx| view.index_to_node[idx].clone())
                    .collect();
                intersection_list.sort();
                SoNearlyPair {
                    entities,
                    intersection_size: intersection_list.len(),
                    intersection_list,
                }
            })
            .collect();

        pairs.sort_by(|p, q| {
            q.intersection_size
                .cmp(&p.intersection_size)
                .then_with(|| p.entities.cmp(&q.entities))
        });

        let mut by_entity: ByEntity = BTreeMap::new();
        let mut by_overlap: ByOverlap = BTreeMap::new();
        for pair in &pairs {
            let [x, y] = &pair.entities;
            for (me, other) in [(x, y), (y, x)] {
                by_entity
                    .entry(me.clone())
                    .or_default()
                    .insert(other.clone(), pair.intersection_list.clone());
                by_overlap
                    .entry(me.clone())
                    .or_default()
                    .entry(pair.intersection_size)
                    .or_default()
                    .insert(other.clone());
            }
        }

        SoNearlyIndex {
            pairs,
            by_entity,
            by_overlap,
        }
    }

    /// All pairs, largest overlap first
    pub fn pairs(&self) -> &[SoNearlyPair] {
        &self.pairs
    }

    pub fn by_entity(&self) -> &ByEntity {
        &self.by_entity
    }

    pub fn by_overlap(&self) -> &ByOverlap {
        &self.by_overlap
    }

    /// Partners of `entity` with their shared neighbours
    pub fn partners(&self, entity: &Entity) -> Option<&BTreeMap<Entity, Vec<Entity>>> {
        self.by_entity.get(entity)
    }

    /// Whether `entity` is part of any so-nearly pair
    pub fn contains(&self, entity: &Entity) -> bool {
        self.by_entity.contains_key(entity)
    }

    /// Indexed entities, in key order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.by_entity.keys()
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::tests::graph_from_edges;
    use crate::algo::{build_view, Islands};

    fn e(key: &str) -> Entity {
        Entity::new(key)
    }

    fn index_for(edges: &[(&str, &str)]) -> SoNearlyIndex {
        let graph = graph_from_edges(edges);
        let view = build_view(&graph);
        let islands = Islands::compute(&view);
        SoNearlyIndex::compute(&view, islands.main())
    }

    #[test]
    fn test_path_graph_so_nearlies() {
        let index = index_for(&[("a", "b"), ("b", "c"), ("c", "d")]);

        assert_eq!(index.len(), 2);
        let ac = index
            .pairs()
            .iter()
            .find(|p| p.entities == [e("a"), e("c")])
            .unwrap();
        assert_eq!(ac.intersection_list, vec![e("b")]);
        assert_eq!(ac.intersection_size, 1);

        assert_eq!(index.partners(&e("c")).unwrap().get(&e("a")), Some(&vec![e("b")]));
        assert!(index.by_overlap()[&e("d")][&1].contains(&e("b")));
    }

    #[test]
    fn test_pairs_ranked_by_overlap() {
        // x and y share p, q; z shares only p with them
        let index = index_for(&[
            ("x", "p"),
            ("x", "q"),
            ("y", "p"),
            ("y", "q"),
            ("z", "p"),
        ]);

        let top = &index.pairs()[0];
        assert_eq!(top.intersection_size, 2);
        for window in index.pairs().windows(2) {
            assert!(window[0].intersection_size >= window[1].intersection_size);
        }
    }

    #[test]
    fn test_only_main_island_is_processed() {
        // main island a-b-c-d, second island x-y-z would give (x,z)
        let index = index_for(&[("a", "b"), ("b", "c"), ("c", "d"), ("x", "y"), ("y", "z")]);
        assert!(!index.contains(&e("x")));
        assert!(!index.contains(&e("z")));
        assert!(index.contains(&e("a")));
    }

    #[test]
    fn test_adjacent_pairs_are_excluded() {
        // triangle a-b-c: every pair is adjacent
        let index = index_for(&[("a", "b"), ("b", "c"), ("c", "a")]);
        assert!(index.is_empty());
    }

    #[test]
    fn test_intersections_are_exact() {
        let edges = [
            ("a", "m"),
            ("a", "n"),
            ("b", "m"),
            ("b", "n"),
            ("b", "o"),
            ("c", "o"),
            ("c", "a"),
        ];
        let graph = graph_from_edges(&edges);
        let view = build_view(&graph);
        let islands = Islands::compute(&view);
        let index = SoNearlyIndex::compute(&view, islands.main());

        for pair in index.pairs() {
            let [x, y] = &pair.entities;
            assert!(!graph.has_edge(x, y));
            let expected: Vec<Entity> = graph
                .neighbors(x)
                .unwrap()
                .intersection(graph.neighbors(y).unwrap())
                .cloned()
                .collect();
            assert_eq!(pair.intersection_list, expected);
        }
    }

    #[test]
    fn test_pair_serializes_camel_case() {
        let index = index_for(&[("a", "b"), ("b", "c")]);
        let json = serde_json::to_value(&index.pairs()[0]).unwrap();
        assert_eq!(json["intersectionSize"], 1);
        assert_eq!(json["intersectionList"][0], "b");
    }
}
