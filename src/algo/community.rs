//! Island discovery
//!
//! Islands are the connected components of the co-occurrence graph, largest
//! first. Index 0 is the main island.

use super::EntityView;
use crate::graph::Entity;
use correlate_algorithms::connected_components;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// A maximal connected set of entities, each paired with its Registry count
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Island {
    members: BTreeMap<Entity, u64>,
}

impl Island {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, entity: &Entity) -> bool {
        self.members.contains_key(entity)
    }

    /// Member -> Registry count
    pub fn members(&self) -> &BTreeMap<Entity, u64> {
        &self.members
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.members.keys()
    }
}

/// All islands of one graph snapshot plus an entity -> island index
#[derive(Debug, Clone, Default)]
pub struct Islands {
    islands: Vec<Island>,
    membership: HashMap<Entity, usize>,
}

impl Islands {
    /// Partition every entity of the view into islands
    pub fn compute(view: &EntityView) -> Self {
        let result = connected_components(view);

        let mut membership = HashMap::with_capacity(view.node_count);
        let islands = result
            .components
            .iter()
            .enumerate()
            .map(|(position, component)| {
                let members = component
                    .iter()
                    .map(|&idx| {
                        let entity = view.index_to_node[idx].clone();
                        membership.insert(entity.clone(), position);
                        (entity, view.counts[idx])
                    })
                    .collect();
                Island { members }
            })
            .collect();

        Islands {
            islands,
            membership,
        }
    }

    /// Islands ordered largest first
    pub fn all(&self) -> &[Island] {
        &self.islands
    }

    /// The largest island
    pub fn main(&self) -> Option<&Island> {
        self.islands.first()
    }

    /// Position of the island holding `entity`
    pub fn index_of(&self, entity: &Entity) -> Option<usize> {
        self.membership.get(entity).copied()
    }

    /// The island holding `entity`
    pub fn island_of(&self, entity: &Entity) -> Option<&Island> {
        self.index_of(entity).and_then(|i| self.islands.get(i))
    }

    /// Whether both entities belong to the same island
    pub fn same_island(&self, a: &Entity, b: &Entity) -> bool {
        match (self.index_of(a), self.index_of(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.islands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.islands.is_empty()
    }

    /// Entity -> island position, for cross-checking
    pub fn membership(&self) -> &HashMap<Entity, usize> {
        &self.membership
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::build_view;
    use crate::algo::tests::{graph_from_edges, graph_with_counts};

    fn e(key: &str) -> Entity {
        Entity::new(key)
    }

    #[test]
    fn test_islands_sorted_largest_first() {
        let graph = graph_from_edges(&[("a", "b"), ("c", "d"), ("d", "e"), ("e", "f")]);
        let islands = Islands::compute(&build_view(&graph));

        assert_eq!(islands.len(), 2);
        assert_eq!(islands.all()[0].len(), 4);
        assert_eq!(islands.all()[1].len(), 2);
        assert!(islands.main().unwrap().contains(&e("f")));
    }

    #[test]
    fn test_islands_carry_counts() {
        let graph = graph_with_counts(&[("a", "b")], &[("a", 5), ("b", 2)]);
        let islands = Islands::compute(&build_view(&graph));
        let main = islands.main().unwrap();
        assert_eq!(main.members().get(&e("a")), Some(&5));
        assert_eq!(main.members().get(&e("b")), Some(&2));
    }

    #[test]
    fn test_membership_index() {
        let graph = graph_from_edges(&[("a", "b"), ("b", "c"), ("x", "y")]);
        let islands = Islands::compute(&build_view(&graph));

        assert_eq!(islands.index_of(&e("a")), Some(0));
        assert_eq!(islands.index_of(&e("y")), Some(1));
        assert!(islands.same_island(&e("a"), &e("c")));
        assert!(!islands.same_island(&e("a"), &e("x")));
        assert!(islands.island_of(&e("nobody")).is_none());
    }

    #[test]
    fn test_partition_invariant() {
        let graph = graph_from_edges(&[
            ("a", "b"),
            ("c", "d"),
            ("b", "d"),
            ("p", "q"),
            ("r", "s"),
            ("s", "p"),
            ("z", "y"),
        ]);
        let islands = Islands::compute(&build_view(&graph));

        let total: usize = islands.all().iter().map(Island::len).sum();
        assert_eq!(total, graph.member_count());
        for entity in graph.adjacency().keys() {
            let holders = islands.all().iter().filter(|i| i.contains(entity)).count();
            assert_eq!(holders, 1, "{} must be in exactly one island", entity);
        }
    }

    #[test]
    fn test_island_serializes_as_map() {
        let graph = graph_with_counts(&[("a", "b")], &[("a", 1)]);
        let islands = Islands::compute(&build_view(&graph));
        let json = serde_json::to_value(islands.main().unwrap()).unwrap();
        assert_eq!(json["a"], 1);
        assert_eq!(json["b"], 0);
    }
}
