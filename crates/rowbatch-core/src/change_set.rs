//! Per-transaction accumulator of structural edits
//!
//! A `ChangeSet` is created when the outermost transaction opens and is
//! consumed exactly once, either by [`ChangeSet::into_flush_plan`] or by
//! draining its completion handlers on an early exit.
//!
//! ## Coordinate spaces
//!
//! Deletes and reloads address the collection as it was when the transaction
//! opened; inserts address it as it will be after the commit. A position may
//! be scheduled for at most one of delete/reload. Recording the same kind
//! twice for a position is idempotent and keeps the first animation.

use std::collections::{BTreeMap, BTreeSet};

use rowbatch_core_types::TransactionId;
use serde::{Deserialize, Serialize};

use crate::diff::NestedDiff;
use crate::errors::{BatchError, Coordinate, Result};
use crate::flush::FlushPlan;
use crate::model::{IndexPath, RowAnimation};
use crate::surface::Completion;

/// Kind of structural edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    Insert,
    Delete,
    Reload,
}

impl EditKind {
    /// Delete and reload share the old coordinate space and exclude each other
    fn conflicts_with(self, other: EditKind) -> bool {
        matches!(
            (self, other),
            (EditKind::Delete, EditKind::Reload) | (EditKind::Reload, EditKind::Delete)
        )
    }
}

impl std::fmt::Display for EditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditKind::Insert => write!(f, "insert"),
            EditKind::Delete => write!(f, "delete"),
            EditKind::Reload => write!(f, "reload"),
        }
    }
}

/// The four phase sets after reloads are expanded and subsumed edits dropped
#[derive(Debug, Default)]
struct Normalized {
    deleted_items: BTreeMap<IndexPath, RowAnimation>,
    deleted_sections: BTreeMap<usize, RowAnimation>,
    inserted_sections: BTreeMap<usize, RowAnimation>,
    inserted_items: BTreeMap<IndexPath, RowAnimation>,
}

/// Pending edits and completion handlers of one open transaction
pub struct ChangeSet {
    txn_id: TransactionId,
    old_item_counts: Vec<usize>,
    new_item_counts: Option<Vec<usize>>,
    section_edits: BTreeMap<EditKind, BTreeMap<usize, RowAnimation>>,
    item_edits: BTreeMap<EditKind, BTreeMap<IndexPath, RowAnimation>>,
    completion_handlers: Vec<Completion>,
}

impl ChangeSet {
    /// Open a change set over the counts observed at transaction start
    pub fn new(old_item_counts: Vec<usize>) -> Self {
        Self {
            txn_id: TransactionId::new(),
            old_item_counts,
            new_item_counts: None,
            section_edits: BTreeMap::new(),
            item_edits: BTreeMap::new(),
            completion_handlers: Vec::new(),
        }
    }

    pub fn txn_id(&self) -> &TransactionId {
        &self.txn_id
    }

    pub fn old_section_count(&self) -> usize {
        self.old_item_counts.len()
    }

    pub fn old_item_counts(&self) -> &[usize] {
        &self.old_item_counts
    }

    pub fn new_item_counts(&self) -> Option<&[usize]> {
        self.new_item_counts.as_deref()
    }

    /// Record the post-edit counts; only the first call takes effect
    pub fn record_new_counts(&mut self, counts: Vec<usize>) {
        if self.new_item_counts.is_some() {
            tracing::debug!(txn_id = %self.txn_id, "new counts already recorded");
            return;
        }
        self.new_item_counts = Some(counts);
    }

    /// Schedule `kind` for every section in `sections`
    ///
    /// Either every section is recorded or none is.
    ///
    /// # Errors
    ///
    /// `ConflictingSectionEdit` if a section is already scheduled under an
    /// exclusive kind.
    pub fn record_sections<I>(
        &mut self,
        kind: EditKind,
        sections: I,
        animation: RowAnimation,
    ) -> Result<()>
    where
        I: IntoIterator<Item = usize>,
    {
        let sections: BTreeSet<usize> = sections.into_iter().collect();
        for section in &sections {
            for (existing, bucket) in &self.section_edits {
                if kind.conflicts_with(*existing) && bucket.contains_key(section) {
                    return Err(BatchError::ConflictingSectionEdit {
                        section: *section,
                        kind,
                        existing: *existing,
                    });
                }
            }
        }

        let bucket = self.section_edits.entry(kind).or_default();
        for section in sections {
            bucket.entry(section).or_insert(animation);
        }
        Ok(())
    }

    /// Schedule `kind` for every item in `items`
    ///
    /// Either every item is recorded or none is.
    ///
    /// # Errors
    ///
    /// `ConflictingItemEdit` if an item is already scheduled under an
    /// exclusive kind.
    pub fn record_items<I>(
        &mut self,
        kind: EditKind,
        items: I,
        animation: RowAnimation,
    ) -> Result<()>
    where
        I: IntoIterator<Item = IndexPath>,
    {
        let items: BTreeSet<IndexPath> = items.into_iter().collect();
        for path in &items {
            for (existing, bucket) in &self.item_edits {
                if kind.conflicts_with(*existing) && bucket.contains_key(path) {
                    return Err(BatchError::ConflictingItemEdit {
                        path: *path,
                        kind,
                        existing: *existing,
                    });
                }
            }
        }

        let bucket = self.item_edits.entry(kind).or_default();
        for path in items {
            bucket.entry(path).or_insert(animation);
        }
        Ok(())
    }

    /// Record every non-empty result set of a diff under one animation
    pub fn record_nested_diff(
        &mut self,
        diff: &NestedDiff,
        animation: RowAnimation,
    ) -> Result<()> {
        if !diff.deleted_items.is_empty() {
            self.record_items(
                EditKind::Delete,
                diff.deleted_items.iter().copied(),
                animation,
            )?;
        }
        if !diff.deleted_sections.is_empty() {
            self.record_sections(
                EditKind::Delete,
                diff.deleted_sections.iter().copied(),
                animation,
            )?;
        }
        if !diff.inserted_sections.is_empty() {
            self.record_sections(
                EditKind::Insert,
                diff.inserted_sections.iter().copied(),
                animation,
            )?;
        }
        if !diff.inserted_items.is_empty() {
            self.record_items(
                EditKind::Insert,
                diff.inserted_items.iter().copied(),
                animation,
            )?;
        }
        Ok(())
    }

    /// Queue a completion handler; `None` is accepted and ignored
    pub fn add_completion(&mut self, completion: Option<Completion>) {
        if let Some(completion) = completion {
            self.completion_handlers.push(completion);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.completion_handlers.len()
    }

    /// Sections scheduled under `kind`, ascending
    pub fn sections(&self, kind: EditKind) -> impl Iterator<Item = (usize, RowAnimation)> + '_ {
        self.section_edits
            .get(&kind)
            .into_iter()
            .flat_map(|bucket| bucket.iter().map(|(s, a)| (*s, *a)))
    }

    /// Items scheduled under `kind`, ascending
    pub fn items(
        &self,
        kind: EditKind,
    ) -> impl Iterator<Item = (IndexPath, RowAnimation)> + '_ {
        self.item_edits
            .get(&kind)
            .into_iter()
            .flat_map(|bucket| bucket.iter().map(|(p, a)| (*p, *a)))
    }

    /// Total number of scheduled positions across all kinds
    pub fn edit_count(&self) -> usize {
        self.section_edits.values().map(BTreeMap::len).sum::<usize>()
            + self.item_edits.values().map(BTreeMap::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.edit_count() == 0
    }

    /// Remove and return every queued handler, in registration order
    pub fn take_completion_handlers(&mut self) -> Vec<Completion> {
        std::mem::take(&mut self.completion_handlers)
    }

    /// Consume the change set into its flush plan
    ///
    /// Handlers are always handed back so the caller can report the outcome.
    /// With `validate` set, positions are range-checked and the recorded edits
    /// must account for the difference between old and new counts.
    pub fn into_flush_plan(mut self, validate: bool) -> (Vec<Completion>, Result<FlushPlan>) {
        let handlers = self.take_completion_handlers();
        let plan = self.build_plan(validate);
        (handlers, plan)
    }

    fn build_plan(&self, validate: bool) -> Result<FlushPlan> {
        // Reload expansion maps old positions, so they are range-checked first.
        if validate {
            self.check_old_positions()?;
        }
        let normalized = self.normalize();
        if validate {
            self.validate(&normalized)?;
        }
        Ok(FlushPlan::from_phases(
            &normalized.deleted_items,
            &normalized.deleted_sections,
            &normalized.inserted_sections,
            &normalized.inserted_items,
        ))
    }

    fn check_old_positions(&self) -> Result<()> {
        let old = &self.old_item_counts;
        for kind in [EditKind::Delete, EditKind::Reload] {
            for (section, _) in self.sections(kind) {
                check_section(section, old, Coordinate::Old)?;
            }
            for (path, _) in self.items(kind) {
                check_item(path, old, Coordinate::Old)?;
            }
        }
        Ok(())
    }

    fn section_bucket(&self, kind: EditKind) -> BTreeMap<usize, RowAnimation> {
        self.section_edits.get(&kind).cloned().unwrap_or_default()
    }

    fn item_bucket(&self, kind: EditKind) -> BTreeMap<IndexPath, RowAnimation> {
        self.item_edits.get(&kind).cloned().unwrap_or_default()
    }

    fn normalize(&self) -> Normalized {
        let mut deleted_sections = self.section_bucket(EditKind::Delete);
        let mut inserted_sections = self.section_bucket(EditKind::Insert);
        let reloaded_sections = self.section_bucket(EditKind::Reload);
        let recorded_deleted_items = self.item_bucket(EditKind::Delete);
        let recorded_inserted_items = self.item_bucket(EditKind::Insert);
        let reloaded_items = self.item_bucket(EditKind::Reload);

        let section_deletes: BTreeSet<usize> = deleted_sections.keys().copied().collect();
        let section_inserts: BTreeSet<usize> = inserted_sections.keys().copied().collect();

        // Whole-section edits subsume item edits inside them.
        let mut deleted_items: BTreeMap<IndexPath, RowAnimation> = recorded_deleted_items
            .iter()
            .filter(|(p, _)| {
                !section_deletes.contains(&p.section) && !reloaded_sections.contains_key(&p.section)
            })
            .map(|(p, a)| (*p, *a))
            .collect();

        let mut reload_targets = BTreeSet::new();
        for (section, animation) in &reloaded_sections {
            let target = map_position(*section, &section_deletes, &section_inserts);
            deleted_sections.insert(*section, *animation);
            inserted_sections.insert(target, *animation);
            reload_targets.insert(target);
        }

        let mut inserted_items: BTreeMap<IndexPath, RowAnimation> = recorded_inserted_items
            .iter()
            .filter(|(p, _)| {
                !section_inserts.contains(&p.section) && !reload_targets.contains(&p.section)
            })
            .map(|(p, a)| (*p, *a))
            .collect();

        for (path, animation) in &reloaded_items {
            if section_deletes.contains(&path.section)
                || reloaded_sections.contains_key(&path.section)
            {
                continue;
            }
            let section_target = map_position(path.section, &section_deletes, &section_inserts);
            let item_deletes = items_in_section(&recorded_deleted_items, path.section);
            let item_inserts = items_in_section(&recorded_inserted_items, section_target);
            let item_target = map_position(path.item, &item_deletes, &item_inserts);
            deleted_items.insert(*path, *animation);
            inserted_items.insert(IndexPath::new(section_target, item_target), *animation);
        }

        Normalized {
            deleted_items,
            deleted_sections,
            inserted_sections,
            inserted_items,
        }
    }

    fn validate(&self, edits: &Normalized) -> Result<()> {
        let old = &self.old_item_counts;
        let new = self
            .new_item_counts
            .as_ref()
            .ok_or_else(|| BatchError::Internal {
                message: "new counts must be recorded before validation".to_string(),
            })?;

        for section in edits.deleted_sections.keys() {
            check_section(*section, old, Coordinate::Old)?;
        }
        for section in edits.inserted_sections.keys() {
            check_section(*section, new, Coordinate::New)?;
        }
        for path in edits.deleted_items.keys() {
            check_item(*path, old, Coordinate::Old)?;
        }
        for path in edits.inserted_items.keys() {
            check_item(*path, new, Coordinate::New)?;
        }

        let expected_sections =
            old.len() - edits.deleted_sections.len() + edits.inserted_sections.len();
        if expected_sections != new.len() {
            return Err(BatchError::InconsistentUpdate {
                reason: format!(
                    "{} sections after update, expected {} ({} old - {} deleted + {} inserted)",
                    new.len(),
                    expected_sections,
                    old.len(),
                    edits.deleted_sections.len(),
                    edits.inserted_sections.len()
                ),
            });
        }

        let survivors_old = (0..old.len()).filter(|s| !edits.deleted_sections.contains_key(s));
        let survivors_new = (0..new.len()).filter(|t| !edits.inserted_sections.contains_key(t));
        for (old_section, new_section) in survivors_old.zip(survivors_new) {
            let deleted = items_in_section(&edits.deleted_items, old_section).len();
            let inserted = items_in_section(&edits.inserted_items, new_section).len();
            let expected = old[old_section] + inserted - deleted;
            if expected != new[new_section] {
                return Err(BatchError::InconsistentUpdate {
                    reason: format!(
                        "section {} has {} items after update, expected {} ({} old - {} deleted + {} inserted)",
                        new_section,
                        new[new_section],
                        expected,
                        old[old_section],
                        deleted,
                        inserted
                    ),
                });
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for ChangeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeSet")
            .field("txn_id", &self.txn_id)
            .field("old_item_counts", &self.old_item_counts)
            .field("new_item_counts", &self.new_item_counts)
            .field("section_edits", &self.section_edits)
            .field("item_edits", &self.item_edits)
            .field("completion_handlers", &self.completion_handlers.len())
            .finish()
    }
}

/// New position of surviving old position `old`
///
/// `old` must not be in `deleted`. Survivors keep their relative order, and
/// new positions in `inserted` are taken by insertions.
fn map_position(old: usize, deleted: &BTreeSet<usize>, inserted: &BTreeSet<usize>) -> usize {
    let mut target = old - deleted.range(..old).count();
    // Each insertion at or before the running target pushes it one slot right.
    for slot in inserted {
        if *slot > target {
            break;
        }
        target = target.saturating_add(1);
    }
    target
}

fn items_in_section(
    items: &BTreeMap<IndexPath, RowAnimation>,
    section: usize,
) -> BTreeSet<usize> {
    items
        .range(IndexPath::new(section, 0)..=IndexPath::new(section, usize::MAX))
        .map(|(p, _)| p.item)
        .collect()
}

fn check_section(section: usize, counts: &[usize], coordinate: Coordinate) -> Result<()> {
    if section >= counts.len() {
        return Err(BatchError::SectionOutOfRange {
            coordinate,
            section,
            count: counts.len(),
        });
    }
    Ok(())
}

fn check_item(path: IndexPath, counts: &[usize], coordinate: Coordinate) -> Result<()> {
    let count = counts
        .get(path.section)
        .copied()
        .ok_or(BatchError::SectionOutOfRange {
            coordinate,
            section: path.section,
            count: counts.len(),
        })?;
    if path.item >= count {
        return Err(BatchError::ItemOutOfRange {
            coordinate,
            path,
            count,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flush::FlushPhase;

    fn ip(section: usize, item: usize) -> IndexPath {
        IndexPath::new(section, item)
    }

    fn plan_of(change_set: ChangeSet, new_counts: Vec<usize>) -> Result<FlushPlan> {
        let mut change_set = change_set;
        change_set.record_new_counts(new_counts);
        change_set.into_flush_plan(true).1
    }

    #[test]
    fn test_delete_then_reload_conflicts() {
        let mut cs = ChangeSet::new(vec![3]);
        cs.record_items(EditKind::Delete, [ip(0, 1)], RowAnimation::Fade)
            .unwrap();
        let err = cs
            .record_items(EditKind::Reload, [ip(0, 2), ip(0, 1)], RowAnimation::Fade)
            .unwrap_err();
        assert_eq!(
            err,
            BatchError::ConflictingItemEdit {
                path: ip(0, 1),
                kind: EditKind::Reload,
                existing: EditKind::Delete,
            }
        );
        // Nothing from the rejected call was recorded
        assert_eq!(cs.items(EditKind::Reload).count(), 0);
    }

    #[test]
    fn test_insert_and_delete_at_same_index_do_not_conflict() {
        let mut cs = ChangeSet::new(vec![2]);
        cs.record_sections(EditKind::Delete, [0], RowAnimation::Automatic)
            .unwrap();
        cs.record_sections(EditKind::Insert, [0], RowAnimation::Automatic)
            .unwrap();
        assert_eq!(cs.edit_count(), 2);
    }

    #[test]
    fn test_same_kind_twice_keeps_first_animation() {
        let mut cs = ChangeSet::new(vec![]);
        cs.record_sections(EditKind::Insert, [0], RowAnimation::Fade)
            .unwrap();
        cs.record_sections(EditKind::Insert, [0], RowAnimation::Left)
            .unwrap();
        let recorded: Vec<_> = cs.sections(EditKind::Insert).collect();
        assert_eq!(recorded, vec![(0, RowAnimation::Fade)]);
    }

    #[test]
    fn test_completion_handlers_keep_order() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut cs = ChangeSet::new(vec![]);
        for n in 0..3 {
            let log = log.clone();
            cs.add_completion(Some(Box::new(move |_| log.borrow_mut().push(n))));
        }
        cs.add_completion(None);
        assert_eq!(cs.handler_count(), 3);

        for handler in cs.take_completion_handlers() {
            handler(true);
        }
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_item_edits_inside_deleted_section_are_dropped() {
        let mut cs = ChangeSet::new(vec![2, 1]);
        cs.record_sections(EditKind::Delete, [0], RowAnimation::Automatic)
            .unwrap();
        cs.record_items(EditKind::Delete, [ip(0, 1)], RowAnimation::Automatic)
            .unwrap();
        let plan = plan_of(cs, vec![1]).unwrap();
        assert!(plan.items_in(FlushPhase::DeleteItems).is_empty());
        assert_eq!(plan.sections_in(FlushPhase::DeleteSections), vec![0]);
    }

    #[test]
    fn test_item_inserts_inside_inserted_section_are_dropped() {
        let mut cs = ChangeSet::new(vec![1]);
        cs.record_sections(EditKind::Insert, [0], RowAnimation::Automatic)
            .unwrap();
        cs.record_items(EditKind::Insert, [ip(0, 0), ip(0, 1)], RowAnimation::Automatic)
            .unwrap();
        let plan = plan_of(cs, vec![2, 1]).unwrap();
        assert!(plan.items_in(FlushPhase::InsertItems).is_empty());
        assert_eq!(plan.sections_in(FlushPhase::InsertSections), vec![0]);
    }

    #[test]
    fn test_section_reload_expands_to_mapped_delete_and_insert() {
        // old: s0 s1 s2; delete s0, insert new section at 0 and 1, reload s2
        let mut cs = ChangeSet::new(vec![1, 1, 1]);
        cs.record_sections(EditKind::Delete, [0], RowAnimation::Automatic)
            .unwrap();
        cs.record_sections(EditKind::Insert, [0, 1], RowAnimation::Automatic)
            .unwrap();
        cs.record_sections(EditKind::Reload, [2], RowAnimation::Fade)
            .unwrap();
        let plan = plan_of(cs, vec![1, 1, 1, 1]).unwrap();
        assert_eq!(plan.sections_in(FlushPhase::DeleteSections), vec![0, 2]);
        // survivors s1 -> 2, s2 -> 3
        assert_eq!(plan.sections_in(FlushPhase::InsertSections), vec![0, 1, 3]);
    }

    #[test]
    fn test_item_reload_expands_with_shifted_target() {
        // section 0: delete item 0, insert two items at 0 and 1, reload item 2
        let mut cs = ChangeSet::new(vec![3]);
        cs.record_items(EditKind::Delete, [ip(0, 0)], RowAnimation::Automatic)
            .unwrap();
        cs.record_items(EditKind::Insert, [ip(0, 0), ip(0, 1)], RowAnimation::Automatic)
            .unwrap();
        cs.record_items(EditKind::Reload, [ip(0, 2)], RowAnimation::None)
            .unwrap();
        let plan = plan_of(cs, vec![4]).unwrap();
        assert_eq!(plan.items_in(FlushPhase::DeleteItems), vec![ip(0, 0), ip(0, 2)]);
        assert_eq!(
            plan.items_in(FlushPhase::InsertItems),
            vec![ip(0, 0), ip(0, 1), ip(0, 3)]
        );
    }

    #[test]
    fn test_validation_rejects_count_mismatch() {
        let mut cs = ChangeSet::new(vec![2]);
        cs.record_items(EditKind::Insert, [ip(0, 2)], RowAnimation::Automatic)
            .unwrap();
        let err = plan_of(cs, vec![4]).unwrap_err();
        assert!(matches!(err, BatchError::InconsistentUpdate { .. }));
    }

    #[test]
    fn test_validation_rejects_section_count_mismatch() {
        let cs = ChangeSet::new(vec![2]);
        let err = plan_of(cs, vec![2, 0]).unwrap_err();
        assert!(matches!(err, BatchError::InconsistentUpdate { .. }));
    }

    #[test]
    fn test_validation_rejects_out_of_range_delete() {
        let mut cs = ChangeSet::new(vec![2]);
        cs.record_items(EditKind::Delete, [ip(0, 5)], RowAnimation::Automatic)
            .unwrap();
        let err = plan_of(cs, vec![1]).unwrap_err();
        assert_eq!(
            err,
            BatchError::ItemOutOfRange {
                coordinate: Coordinate::Old,
                path: ip(0, 5),
                count: 2,
            }
        );
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let mut cs = ChangeSet::new(vec![2]);
        cs.record_items(EditKind::Insert, [ip(0, 9)], RowAnimation::Automatic)
            .unwrap();
        let (_, plan) = cs.into_flush_plan(false);
        assert_eq!(plan.unwrap().items_in(FlushPhase::InsertItems), vec![ip(0, 9)]);
    }

    #[test]
    fn test_huge_reload_positions_are_range_checked_before_expansion() {
        let mut cs = ChangeSet::new(vec![1]);
        cs.record_items(EditKind::Reload, [ip(usize::MAX, 0)], RowAnimation::Fade)
            .unwrap();
        let err = plan_of(cs, vec![1]).unwrap_err();
        assert_eq!(
            err,
            BatchError::SectionOutOfRange {
                coordinate: Coordinate::Old,
                section: usize::MAX,
                count: 1,
            }
        );
    }

    #[test]
    fn test_huge_reload_positions_expand_without_validation() {
        let mut cs = ChangeSet::new(vec![1]);
        cs.record_items(EditKind::Reload, [ip(usize::MAX, 3)], RowAnimation::Fade)
            .unwrap();
        cs.record_items(EditKind::Insert, [ip(usize::MAX, 0)], RowAnimation::Fade)
            .unwrap();
        let plan = cs.into_flush_plan(false).1.unwrap();
        assert_eq!(plan.items_in(FlushPhase::DeleteItems), vec![ip(usize::MAX, 3)]);
        assert_eq!(
            plan.items_in(FlushPhase::InsertItems),
            vec![ip(usize::MAX, 0), ip(usize::MAX, 4)]
        );
    }

    #[test]
    fn test_map_position_skips_clustered_insertions() {
        // survivors fill the slots the insertions leave free
        let inserted = BTreeSet::from([0, 1, 2, 5]);
        assert_eq!(map_position(0, &BTreeSet::new(), &inserted), 3);
        assert_eq!(map_position(1, &BTreeSet::new(), &inserted), 4);
        assert_eq!(map_position(2, &BTreeSet::new(), &inserted), 6);
        assert_eq!(map_position(usize::MAX, &BTreeSet::new(), &inserted), usize::MAX);
    }

    #[test]
    fn test_map_position() {
        let deleted = BTreeSet::from([1]);
        let inserted = BTreeSet::from([0, 2]);
        // old: 0 1 2 3 -> survivors 0 2 3 -> new slots 1 3 4
        assert_eq!(map_position(0, &deleted, &inserted), 1);
        assert_eq!(map_position(2, &deleted, &inserted), 3);
        assert_eq!(map_position(3, &deleted, &inserted), 4);
    }
}
