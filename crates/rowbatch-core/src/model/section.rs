//! Hierarchical content snapshots
//!
//! A snapshot is an ordered `Vec` of sections, each owning an ordered item
//! sequence. Sections are matched across snapshots by identity, items by
//! equality.

use serde::{Deserialize, Serialize};

/// A section value the nested diff can match and descend into
pub trait DiffSection {
    type Item: PartialEq;

    /// True when both values denote the same section, regardless of content
    fn same_section(&self, other: &Self) -> bool;

    /// The section's ordered items
    fn items(&self) -> &[Self::Item];
}

/// Keyed section: identity is `key`, content is `items`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section<K, T> {
    pub key: K,
    pub items: Vec<T>,
}

impl<K, T> Section<K, T> {
    pub fn new(key: K, items: Vec<T>) -> Self {
        Self { key, items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<K: PartialEq, T: PartialEq> DiffSection for Section<K, T> {
    type Item = T;

    fn same_section(&self, other: &Self) -> bool {
        self.key == other.key
    }

    fn items(&self) -> &[T] {
        &self.items
    }
}

/// Per-section item counts of a snapshot
pub fn item_counts<S: DiffSection>(sections: &[S]) -> Vec<usize> {
    sections.iter().map(|s| s.items().len()).collect()
}
