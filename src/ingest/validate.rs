//! Entity identifier shape checks
//!
//! Upstream facets sometimes carry malformed names. An entity is kept only if
//! it has the `ontology:value` form with both parts present, and, for
//! ontologies ending in `Id`, a hex or UUID value.

use crate::graph::Entity;
use regex::Regex;
use std::sync::LazyLock;

static ONTOLOGY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid regex"));

static ID_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}|[0-9a-fA-F]+)$",
    )
    .expect("valid regex")
});

/// Whether `entity` looks like an identifier the graph should hold
pub fn is_well_formed(entity: &Entity) -> bool {
    let Some((ontology, value)) = entity.as_str().split_once(':') else {
        return false;
    };
    if !ONTOLOGY_RE.is_match(ontology) || value.trim().is_empty() {
        return false;
    }
    if ontology.ends_with("Id") {
        return ID_VALUE_RE.is_match(value);
    }
    true
}
