//! In-memory set of posting identifiers that were already handled.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Append-only set of seen posting identifiers.
///
/// Serializes as a flat, sorted JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SeenSet {
    ids: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Record an identifier. Returns `true` if it was not present before.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers in sorted order.
    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }
}

impl From<Vec<String>> for SeenSet {
    fn from(ids: Vec<String>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }
}

impl From<SeenSet> for Vec<String> {
    fn from(set: SeenSet) -> Self {
        set.to_sorted_vec()
    }
}

impl FromIterator<String> for SeenSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
