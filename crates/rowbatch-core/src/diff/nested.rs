//! Section-then-item diff between two hierarchical snapshots.

use std::collections::BTreeSet;

use serde::Serialize;

use super::myers::diff_by;
use crate::model::{DiffSection, IndexPath};

/// Structural delta between two snapshots
///
/// Deletions are expressed against the old snapshot, insertions against the
/// new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NestedDiff {
    /// New-snapshot positions of sections absent from old
    pub inserted_sections: BTreeSet<usize>,
    /// Old-snapshot positions of sections absent from new
    pub deleted_sections: BTreeSet<usize>,
    /// Item insertions inside surviving sections, new coordinates, ascending
    pub inserted_items: Vec<IndexPath>,
    /// Item deletions inside surviving sections, old coordinates, ascending
    pub deleted_items: Vec<IndexPath>,
}

impl NestedDiff {
    pub fn is_empty(&self) -> bool {
        self.inserted_sections.is_empty()
            && self.deleted_sections.is_empty()
            && self.inserted_items.is_empty()
            && self.deleted_items.is_empty()
    }
}

/// Diff two snapshots of [`DiffSection`] values
pub fn nested_diff<S: DiffSection>(old: &[S], new: &[S]) -> NestedDiff {
    nested_diff_by(old, new, S::same_section, S::items)
}

/// Diff two snapshots with explicit section identity and item accessor
///
/// Sections are aligned first; only sections matched on both sides are
/// descended into, so a section that is itself inserted or deleted never
/// produces item edits.
pub fn nested_diff_by<S, T, FS, FI>(old: &[S], new: &[S], same_section: FS, items: FI) -> NestedDiff
where
    T: PartialEq,
    FS: Fn(&S, &S) -> bool,
    FI: Fn(&S) -> &[T],
{
    let sections = diff_by(old, new, same_section);
    let mut result = NestedDiff {
        inserted_sections: sections.inserted.into_iter().collect(),
        deleted_sections: sections.deleted.into_iter().collect(),
        ..NestedDiff::default()
    };

    for (old_section, new_section) in sections.matched {
        let item_diff = diff_by(items(&old[old_section]), items(&new[new_section]), |a, b| {
            a == b
        });
        result.deleted_items.extend(
            item_diff
                .deleted
                .into_iter()
                .map(|item| IndexPath::new(old_section, item)),
        );
        result.inserted_items.extend(
            item_diff
                .inserted
                .into_iter()
                .map(|item| IndexPath::new(new_section, item)),
        );
    }

    tracing::debug!(
        inserted_sections = result.inserted_sections.len(),
        deleted_sections = result.deleted_sections.len(),
        inserted_items = result.inserted_items.len(),
        deleted_items = result.deleted_items.len(),
        "nested diff computed"
    );

    result
}
