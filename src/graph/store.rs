//! In-memory co-occurrence graph storage
//!
//! Holds the entity Registry (entity -> cumulative mention count) and the
//! symmetric Adjacency Structure. Both only grow; the only writer is
//! [`CoocGraph::apply_delta`].

use super::types::{Entity, IgnoreSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// One ingestion window's worth of facet data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetDelta {
    /// Mentions of each entity within the window
    pub counts: BTreeMap<Entity, u64>,
    /// Co-mentioned entities for each looked-up entity within the window
    pub neighbors: BTreeMap<Entity, Vec<Entity>>,
}

impl FacetDelta {
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty() && self.neighbors.is_empty()
    }
}

/// Outcome of merging one delta
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaStats {
    /// Entities seen for the first time
    pub new_entity_count: usize,
    /// Unordered pairs linked for the first time
    pub new_edge_count: usize,
    /// Undirected edges in the graph after the merge
    pub total_edge_count: usize,
}

/// Registry + Adjacency Structure
///
/// Uses ordered maps so that every derived result (islands, exports,
/// tie-breaks) is deterministic for a given graph:
/// - registry: Entity -> cumulative count
/// - adjacency: Entity -> set of neighbours (symmetric, no self edges)
#[derive(Debug, Clone, Default)]
pub struct CoocGraph {
    registry: BTreeMap<Entity, u64>,
    adjacency: BTreeMap<Entity, BTreeSet<Entity>>,
    edge_count: usize,
}

impl CoocGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a fetched delta into the Registry and Adjacency Structure.
    ///
    /// Counts accumulate additively; edges are idempotent. Ignored entities
    /// never enter either structure. Neighbours that are not yet registered
    /// are registered with a count of zero.
    pub fn apply_delta(&mut self, delta: &FacetDelta, ignore: &IgnoreSet) -> DeltaStats {
        let mut stats = DeltaStats::default();

        for (entity, &count) in &delta.counts {
            if ignore.contains(entity) {
                continue;
            }
            if self.register(entity) {
                stats.new_entity_count += 1;
            }
            if let Some(total) = self.registry.get_mut(entity) {
                *total += count;
            }
        }

        for (entity, neighbors) in &delta.neighbors {
            if ignore.contains(entity) {
                continue;
            }
            if self.register(entity) {
                stats.new_entity_count += 1;
            }
            for neighbor in neighbors {
                if neighbor == entity || ignore.contains(neighbor) {
                    continue;
                }
                if self.register(neighbor) {
                    stats.new_entity_count += 1;
                }
                if self.link(entity, neighbor) {
                    stats.new_edge_count += 1;
                }
            }
        }

        stats.total_edge_count = self.edge_count;
        debug!(
            new_entities = stats.new_entity_count,
            new_edges = stats.new_edge_count,
            total_edges = stats.total_edge_count,
            "applied facet delta"
        );
        stats
    }

    /// Returns true when the entity was not registered before
    fn register(&mut self, entity: &Entity) -> bool {
        if self.registry.contains_key(entity) {
            return false;
        }
        self.registry.insert(entity.clone(), 0);
        true
    }

    /// Add both directed entries. Returns true when the unordered pair is new.
    fn link(&mut self, a: &Entity, b: &Entity) -> bool {
        let forward = self.adjacency.entry(a.clone()).or_default().insert(b.clone());
        let backward = self.adjacency.entry(b.clone()).or_default().insert(a.clone());
        let is_new = forward || backward;
        if is_new {
            self.edge_count += 1;
        }
        is_new
    }

    /// Walk the Adjacency Structure and Registry and describe every asymmetric
    /// edge, self edge, or reference to an unregistered entity.
    pub fn check_symmetry(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for (entity, neighbors) in &self.adjacency {
            if !self.registry.contains_key(entity) {
                violations.push(format!("adjacency key {} is not a registered entity", entity));
            }
            for neighbor in neighbors {
                if neighbor == entity {
                    violations.push(format!("{} lists itself as a neighbour", entity));
                    continue;
                }
                if !self.registry.contains_key(neighbor) {
                    violations.push(format!(
                        "{} lists unregistered neighbour {}",
                        entity, neighbor
                    ));
                }
                let mirrored = self
                    .adjacency
                    .get(neighbor)
                    .map_or(false, |back| back.contains(entity));
                if !mirrored {
                    violations.push(format!(
                        "edge {} -> {} has no reverse entry",
                        entity, neighbor
                    ));
                }
            }
        }

        for violation in &violations {
            warn!(violation = %violation, "co-occurrence symmetry check failed");
        }
        violations
    }

    /// Cumulative mention count, if registered
    pub fn count(&self, entity: &Entity) -> Option<u64> {
        self.registry.get(entity).copied()
    }

    /// Neighbour set of an entity, if it has any edges
    pub fn neighbors(&self, entity: &Entity) -> Option<&BTreeSet<Entity>> {
        self.adjacency.get(entity)
    }

    /// Whether the unordered pair is an edge
    pub fn has_edge(&self, a: &Entity, b: &Entity) -> bool {
        self.adjacency.get(a).map_or(false, |n| n.contains(b))
    }

    /// Whether the entity has at least one co-occurrence edge
    pub fn is_member(&self, entity: &Entity) -> bool {
        self.adjacency.get(entity).map_or(false, |n| !n.is_empty())
    }

    pub fn registry(&self) -> &BTreeMap<Entity, u64> {
        &self.registry
    }

    pub fn adjacency(&self) -> &BTreeMap<Entity, BTreeSet<Entity>> {
        &self.adjacency
    }

    /// Number of registered entities (linked or not)
    pub fn entity_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of entities with at least one edge
    pub fn member_count(&self) -> usize {
        self.adjacency.values().filter(|n| !n.is_empty()).count()
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Insert a single directed entry, bypassing the symmetric update path
    #[cfg(test)]
    pub(crate) fn insert_directed_for_test(&mut self, from: &Entity, to: &Entity) {
        self.adjacency.entry(from.clone()).or_default().insert(to.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(key: &str) -> Entity {
        Entity::new(key)
    }

    fn delta(counts: &[(&str, u64)], neighbors: &[(&str, &[&str])]) -> FacetDelta {
        FacetDelta {
            counts: counts.iter().map(|(k, c)| (e(k), *c)).collect(),
            neighbors: neighbors
                .iter()
                .map(|(k, ns)| (e(k), ns.iter().map(|n| e(n)).collect()))
                .collect(),
        }
    }

    #[test]
    fn test_apply_delta_builds_symmetric_edges() {
        let mut graph = CoocGraph::new();
        let stats = graph.apply_delta(
            &delta(&[("a", 5), ("b", 3)], &[("a", &["b", "c"])]),
            &IgnoreSet::new(),
        );

        assert_eq!(stats.new_entity_count, 3);
        assert_eq!(stats.new_edge_count, 2);
        assert_eq!(stats.total_edge_count, 2);
        assert!(graph.has_edge(&e("b"), &e("a")));
        assert!(graph.has_edge(&e("c"), &e("a")));
        assert_eq!(graph.count(&e("c")), Some(0));
        assert!(graph.check_symmetry().is_empty());
    }

    #[test]
    fn test_reapplying_delta_accumulates_counts_not_edges() {
        let mut graph = CoocGraph::new();
        let d = delta(&[("a", 5), ("b", 3)], &[("a", &["b"])]);

        graph.apply_delta(&d, &IgnoreSet::new());
        let second = graph.apply_delta(&d, &IgnoreSet::new());

        assert_eq!(graph.count(&e("a")), Some(10));
        assert_eq!(graph.count(&e("b")), Some(6));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(second.new_edge_count, 0);
        assert_eq!(second.new_entity_count, 0);
    }

    #[test]
    fn test_reverse_listing_is_not_a_new_edge() {
        let mut graph = CoocGraph::new();
        let stats = graph.apply_delta(
            &delta(&[("a", 1), ("b", 1)], &[("a", &["b"]), ("b", &["a"])]),
            &IgnoreSet::new(),
        );
        assert_eq!(stats.new_edge_count, 1);
    }

    #[test]
    fn test_self_and_ignored_neighbors_are_skipped() {
        let mut graph = CoocGraph::new();
        let ignore: IgnoreSet = ["noise"].into_iter().collect();
        graph.apply_delta(
            &delta(&[("a", 1), ("noise", 9)], &[("a", &["a", "noise", "b"])]),
            &ignore,
        );

        assert!(!graph.has_edge(&e("a"), &e("a")));
        assert_eq!(graph.count(&e("noise")), None);
        assert!(graph.neighbors(&e("noise")).is_none());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_unlinked_entities_are_registered_but_not_members() {
        let mut graph = CoocGraph::new();
        graph.apply_delta(&delta(&[("lonely", 4)], &[]), &IgnoreSet::new());

        assert_eq!(graph.entity_count(), 1);
        assert_eq!(graph.member_count(), 0);
        assert!(!graph.is_member(&e("lonely")));
    }

    #[test]
    fn test_check_symmetry_reports_one_way_edges() {
        let mut graph = CoocGraph::new();
        graph.apply_delta(&delta(&[("a", 1), ("b", 1)], &[]), &IgnoreSet::new());
        graph.insert_directed_for_test(&e("a"), &e("b"));

        let violations = graph.check_symmetry();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("no reverse entry"));
    }

    #[test]
    fn test_check_symmetry_reports_unknown_entities() {
        let mut graph = CoocGraph::new();
        graph.insert_directed_for_test(&e("x"), &e("y"));
        graph.insert_directed_for_test(&e("y"), &e("x"));

        let violations = graph.check_symmetry();
        assert!(violations.iter().any(|v| v.contains("adjacency key x")));
        assert!(violations.iter().any(|v| v.contains("unregistered neighbour y")));
    }
}
