//! Consistency checks across the graph and its derived analysis
//!
//! Nothing here is fatal. Every violation becomes one human-readable line,
//! logged and returned to the caller.

use crate::algo::Analysis;
use crate::graph::CoocGraph;
use std::collections::HashMap;
use tracing::warn;

/// Symmetry of the Adjacency Structure, then island and so-nearly cross-checks
pub fn consistency_check(graph: &CoocGraph, analysis: &Analysis) -> Vec<String> {
    let mut violations = graph.check_symmetry();
    let derived_start = violations.len();

    check_islands(graph, analysis, &mut violations);
    check_so_nearlies(graph, analysis, &mut violations);

    for violation in &violations[derived_start..] {
        warn!(violation = %violation, "consistency check");
    }
    violations
}

fn check_islands(graph: &CoocGraph, analysis: &Analysis, violations: &mut Vec<String>) {
    let islands = &analysis.islands;

    let mut holders: HashMap<_, Vec<usize>> = HashMap::new();
    for (position, island) in islands.all().iter().enumerate() {
        for entity in island.entities() {
            holders.entry(entity).or_default().push(position);
            if !graph.is_member(entity) {
                violations.push(format!(
                    "island {position}: member {entity} has no adjacency"
                ));
            }
            if islands.index_of(entity) != Some(position) {
                violations.push(format!(
                    "island {position}: membership index places {entity} in {:?}",
                    islands.index_of(entity)
                ));
            }
        }
    }

    for (entity, positions) in &holders {
        if positions.len() > 1 {
            violations.push(format!("{entity} appears in islands {positions:?}"));
        }
    }

    for entity in graph.adjacency().keys() {
        if !holders.contains_key(entity) {
            violations.push(format!("{entity} has adjacency but belongs to no island"));
        }
    }

    for (position, pair) in islands.all().windows(2).enumerate() {
        if pair[0].len() < pair[1].len() {
            violations.push(format!(
                "island {position} ({} members) is smaller than island {} ({} members)",
                pair[0].len(),
                position + 1,
                pair[1].len()
            ));
        }
    }
}

fn check_so_nearlies(graph: &CoocGraph, analysis: &Analysis, violations: &mut Vec<String>) {
    let main = analysis.islands.main();

    for pair in analysis.so_nearly.pairs() {
        let [a, b] = &pair.entities;
        let in_main = main.is_some_and(|island| island.contains(a) && island.contains(b));
        if !in_main {
            violations.push(format!("so-nearly ({a}, {b}) is not within the main island"));
        }
        if graph.has_edge(a, b) {
            violations.push(format!("so-nearly ({a}, {b}) is already an edge"));
        }
        if pair.intersection_list.is_empty() || pair.intersection_size != pair.intersection_list.len() {
            violations.push(format!(
                "so-nearly ({a}, {b}) has intersection size {} for {} shared neighbours",
                pair.intersection_size,
                pair.intersection_list.len()
            ));
        }
    }
}
