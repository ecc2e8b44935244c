//! Core type definitions for the correlation graph

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A named entity, keyed as `ontology:value` (e.g. `people:Jane Doe`).
///
/// Equality is plain string equality; the key is never normalised.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Entity(String);

impl Entity {
    pub fn new(key: impl Into<String>) -> Self {
        Entity(key.into())
    }

    /// Build the key from its two parts
    pub fn from_parts(ontology: &str, value: &str) -> Self {
        Entity(format!("{}:{}", ontology, value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Category part, before the first `:`. Empty when the key has no `:`.
    pub fn ontology(&self) -> &str {
        self.0.split_once(':').map(|(o, _)| o).unwrap_or("")
    }

    /// Value part, after the first `:`. The whole key when there is no `:`.
    pub fn value(&self) -> &str {
        self.0.split_once(':').map(|(_, v)| v).unwrap_or(&self.0)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Entity {
    fn from(s: String) -> Self {
        Entity(s)
    }
}

impl From<&str> for Entity {
    fn from(s: &str) -> Self {
        Entity(s.to_string())
    }
}

/// Entities excluded from ingestion and graph membership
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet(HashSet<Entity>);

impl IgnoreSet {
    pub fn new() -> Self {
        IgnoreSet(HashSet::new())
    }

    pub fn contains(&self, entity: &Entity) -> bool {
        self.0.contains(entity)
    }

    pub fn insert(&mut self, entity: Entity) -> bool {
        self.0.insert(entity)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<E: Into<Entity>> FromIterator<E> for IgnoreSet {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        IgnoreSet(iter.into_iter().map(Into::into).collect())
    }
}
