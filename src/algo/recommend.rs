//! Recommendations built on so-nearlies and co-occurrences

use super::{EntityView, SoNearlyIndex};
use crate::graph::Entity;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A recommended entity and how many query entities point at it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub entity: Entity,
    pub tally: usize,
}

/// Both recommendation lists for one query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub so_nearlies: Vec<Candidate>,
    pub coocs: Vec<Candidate>,
}

/// Query entities present in the so-nearly index, deduplicated, input order kept
fn known_entities<'q>(index: &SoNearlyIndex, entities: &'q [Entity]) -> Vec<&'q Entity> {
    let mut seen = HashSet::new();
    entities
        .iter()
        .filter(|entity| index.contains(entity) && seen.insert(*entity))
        .collect()
}

/// Cold start: the first `limit` indexed entities, untallied
fn cold_start(index: &SoNearlyIndex, limit: usize) -> Vec<Candidate> {
    index
        .entities()
        .take(limit)
        .map(|entity| Candidate {
            entity: entity.clone(),
            tally: 0,
        })
        .collect()
}

/// Rank by tally, then Registry count, then key; truncate to `limit`
fn rank(view: &EntityView, tallies: HashMap<&Entity, usize>, limit: usize) -> Vec<Candidate> {
    let count_of = |entity: &Entity| view.index_of(entity).map_or(0, |idx| view.counts[idx]);

    let mut ranked: Vec<(&Entity, usize)> = tallies.into_iter().collect();
    ranked.sort_by(|(a, ta), (b, tb)| {
        tb.cmp(ta)
            .then_with(|| count_of(*b).cmp(&count_of(*a)))
            .then_with(|| a.cmp(b))
    });

    ranked
        .into_iter()
        .take(limit)
        .map(|(entity, tally)| Candidate {
            entity: entity.clone(),
            tally,
        })
        .collect()
}

/// Entities that are so-nearly to the query set but not yet linked to any of it
pub fn recommend_so_nearlies(
    view: &EntityView,
    index: &SoNearlyIndex,
    entities: &[Entity],
    limit: usize,
) -> Vec<Candidate> {
    let known = known_entities(index, entities);
    if known.is_empty() {
        return cold_start(index, limit);
    }

    let query: HashSet<&Entity> = entities.iter().collect();
    // Every input entity with edges counts, indexed as a so-nearly or not
    let linked: Vec<usize> = entities.iter().filter_map(|e| view.index_of(e)).collect();
    let is_linked_to_query = |candidate: &Entity| {
        let Some(c) = view.index_of(candidate) else {
            return false;
        };
        linked.iter().any(|&q| view.is_adjacent(q, c))
    };

    let mut tallies: HashMap<&Entity, usize> = HashMap::new();
    for entity in &known {
        let Some(partners) = index.partners(entity) else {
            continue;
        };
        for partner in partners.keys() {
            if query.contains(partner) || is_linked_to_query(partner) {
                continue;
            }
            *tallies.entry(partner).or_insert(0) += 1;
        }
    }

    rank(view, tallies, limit)
}

/// Entities most often co-mentioned with the query set
pub fn recommend_coocs(
    view: &EntityView,
    index: &SoNearlyIndex,
    entities: &[Entity],
    limit: usize,
) -> Vec<Candidate> {
    let known = known_entities(index, entities);
    if known.is_empty() {
        return cold_start(index, limit);
    }

    let query: HashSet<&Entity> = entities.iter().collect();
    let mut tallies: HashMap<&Entity, usize> = HashMap::new();
    for entity in &known {
        let Some(idx) = view.index_of(entity) else {
            continue;
        };
        for &neighbor in view.neighbors(idx) {
            let candidate = &view.index_to_node[neighbor];
            if query.contains(candidate) {
                continue;
            }
            *tallies.entry(candidate).or_insert(0) += 1;
        }
    }

    rank(view, tallies, limit)
}
