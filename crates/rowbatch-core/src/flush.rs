//! Ordered replay of a consolidated change set.
//!
//! ## Ordering contract
//!
//! 1. Item deletions (old coordinates)
//! 2. Section deletions (old coordinates)
//! 3. Section insertions (new coordinates)
//! 4. Item insertions (new coordinates)
//!
//! Within a phase, positions are grouped by animation directive and emitted
//! in ascending order. All positions of a phase are interpreted against the
//! same coordinate space, so grouping never renumbers anything.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::diff::NestedDiff;
use crate::errors::{BatchError, Coordinate, Result};
use crate::model::{IndexPath, RowAnimation, Section};
use crate::surface::CollectionSurface;

/// One of the four replay phases, in replay order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPhase {
    DeleteItems,
    DeleteSections,
    InsertSections,
    InsertItems,
}

/// A primitive surface call produced by a flush
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SurfaceOp {
    DeleteItems {
        items: Vec<IndexPath>,
        animation: RowAnimation,
    },
    DeleteSections {
        sections: Vec<usize>,
        animation: RowAnimation,
    },
    InsertSections {
        sections: Vec<usize>,
        animation: RowAnimation,
    },
    InsertItems {
        items: Vec<IndexPath>,
        animation: RowAnimation,
    },
}

impl SurfaceOp {
    pub fn phase(&self) -> FlushPhase {
        match self {
            SurfaceOp::DeleteItems { .. } => FlushPhase::DeleteItems,
            SurfaceOp::DeleteSections { .. } => FlushPhase::DeleteSections,
            SurfaceOp::InsertSections { .. } => FlushPhase::InsertSections,
            SurfaceOp::InsertItems { .. } => FlushPhase::InsertItems,
        }
    }

    pub fn animation(&self) -> RowAnimation {
        match self {
            SurfaceOp::DeleteItems { animation, .. }
            | SurfaceOp::DeleteSections { animation, .. }
            | SurfaceOp::InsertSections { animation, .. }
            | SurfaceOp::InsertItems { animation, .. } => *animation,
        }
    }

    /// Number of positions this call touches
    pub fn len(&self) -> usize {
        match self {
            SurfaceOp::DeleteItems { items, .. } | SurfaceOp::InsertItems { items, .. } => {
                items.len()
            }
            SurfaceOp::DeleteSections { sections, .. }
            | SurfaceOp::InsertSections { sections, .. } => sections.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn apply_to<C: CollectionSurface>(&self, surface: &mut C) {
        match self {
            SurfaceOp::DeleteItems { items, animation } => surface.delete_items(items, *animation),
            SurfaceOp::DeleteSections {
                sections,
                animation,
            } => surface.delete_sections(sections, *animation),
            SurfaceOp::InsertSections {
                sections,
                animation,
            } => surface.insert_sections(sections, *animation),
            SurfaceOp::InsertItems { items, animation } => surface.insert_items(items, *animation),
        }
    }
}

fn join<P: std::fmt::Display>(positions: &[P]) -> String {
    positions
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl std::fmt::Display for SurfaceOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceOp::DeleteItems { items, animation } => {
                write!(f, "delete items [{}] ({})", join(items), animation)
            }
            SurfaceOp::DeleteSections {
                sections,
                animation,
            } => write!(f, "delete sections [{}] ({})", join(sections), animation),
            SurfaceOp::InsertSections {
                sections,
                animation,
            } => write!(f, "insert sections [{}] ({})", join(sections), animation),
            SurfaceOp::InsertItems { items, animation } => {
                write!(f, "insert items [{}] ({})", join(items), animation)
            }
        }
    }
}

/// The consolidated, phase-ordered sequence of surface calls for one commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlushPlan {
    ops: Vec<SurfaceOp>,
}

fn group_by_animation<P: Copy>(
    positions: &BTreeMap<P, RowAnimation>,
) -> BTreeMap<RowAnimation, Vec<P>> {
    let mut groups: BTreeMap<RowAnimation, Vec<P>> = BTreeMap::new();
    for (position, animation) in positions {
        groups.entry(*animation).or_default().push(*position);
    }
    groups
}

impl FlushPlan {
    /// Build a plan from the four phase sets
    pub fn from_phases(
        deleted_items: &BTreeMap<IndexPath, RowAnimation>,
        deleted_sections: &BTreeMap<usize, RowAnimation>,
        inserted_sections: &BTreeMap<usize, RowAnimation>,
        inserted_items: &BTreeMap<IndexPath, RowAnimation>,
    ) -> Self {
        let mut ops = Vec::new();
        for (animation, items) in group_by_animation(deleted_items) {
            ops.push(SurfaceOp::DeleteItems { items, animation });
        }
        for (animation, sections) in group_by_animation(deleted_sections) {
            ops.push(SurfaceOp::DeleteSections {
                sections,
                animation,
            });
        }
        for (animation, sections) in group_by_animation(inserted_sections) {
            ops.push(SurfaceOp::InsertSections {
                sections,
                animation,
            });
        }
        for (animation, items) in group_by_animation(inserted_items) {
            ops.push(SurfaceOp::InsertItems { items, animation });
        }
        Self { ops }
    }

    /// Plan for a diff result, every position sharing one animation
    pub fn from_nested_diff(diff: &NestedDiff, animation: RowAnimation) -> Self {
        let deleted_items = diff.deleted_items.iter().map(|p| (*p, animation)).collect();
        let deleted_sections = diff.deleted_sections.iter().map(|s| (*s, animation)).collect();
        let inserted_sections = diff
            .inserted_sections
            .iter()
            .map(|s| (*s, animation))
            .collect();
        let inserted_items = diff.inserted_items.iter().map(|p| (*p, animation)).collect();
        Self::from_phases(
            &deleted_items,
            &deleted_sections,
            &inserted_sections,
            &inserted_items,
        )
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of surface calls
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Number of positions touched across all calls
    pub fn position_count(&self) -> usize {
        self.ops.iter().map(SurfaceOp::len).sum()
    }

    /// All item positions of one item phase, ascending
    pub fn items_in(&self, phase: FlushPhase) -> Vec<IndexPath> {
        let mut items: Vec<IndexPath> = self
            .ops
            .iter()
            .filter(|op| op.phase() == phase)
            .flat_map(|op| match op {
                SurfaceOp::DeleteItems { items, .. } | SurfaceOp::InsertItems { items, .. } => {
                    items.clone()
                }
                _ => Vec::new(),
            })
            .collect();
        items.sort();
        items
    }

    /// All section positions of one section phase, ascending
    pub fn sections_in(&self, phase: FlushPhase) -> Vec<usize> {
        let mut sections: Vec<usize> = self
            .ops
            .iter()
            .filter(|op| op.phase() == phase)
            .flat_map(|op| match op {
                SurfaceOp::DeleteSections { sections, .. }
                | SurfaceOp::InsertSections { sections, .. } => sections.clone(),
                _ => Vec::new(),
            })
            .collect();
        sections.sort();
        sections
    }

    /// Issue every call, in order, against `surface`
    pub fn apply_to<C: CollectionSurface>(&self, surface: &mut C) {
        for op in &self.ops {
            op.apply_to(surface);
        }
    }

    /// Replay the plan against an in-memory snapshot
    ///
    /// Inserted sections and items take their content from `new`. Returns the
    /// resulting snapshot, which equals `new` whenever the plan is correct.
    ///
    /// # Errors
    ///
    /// `SectionOutOfRange` / `ItemOutOfRange` when a position does not exist
    /// in the snapshot it is interpreted against.
    pub fn apply_to_snapshot<K: Clone, T: Clone>(
        &self,
        old: &[Section<K, T>],
        new: &[Section<K, T>],
    ) -> Result<Vec<Section<K, T>>> {
        let mut sections = old.to_vec();

        for path in self.items_in(FlushPhase::DeleteItems).into_iter().rev() {
            let section = sections
                .get_mut(path.section)
                .ok_or(BatchError::SectionOutOfRange {
                    coordinate: Coordinate::Old,
                    section: path.section,
                    count: old.len(),
                })?;
            if path.item >= section.items.len() {
                return Err(BatchError::ItemOutOfRange {
                    coordinate: Coordinate::Old,
                    path,
                    count: section.items.len(),
                });
            }
            section.items.remove(path.item);
        }

        for index in self.sections_in(FlushPhase::DeleteSections).into_iter().rev() {
            if index >= sections.len() {
                return Err(BatchError::SectionOutOfRange {
                    coordinate: Coordinate::Old,
                    section: index,
                    count: old.len(),
                });
            }
            sections.remove(index);
        }

        for index in self.sections_in(FlushPhase::InsertSections) {
            let section = new.get(index).ok_or(BatchError::SectionOutOfRange {
                coordinate: Coordinate::New,
                section: index,
                count: new.len(),
            })?;
            if index > sections.len() {
                return Err(BatchError::SectionOutOfRange {
                    coordinate: Coordinate::New,
                    section: index,
                    count: sections.len(),
                });
            }
            sections.insert(index, section.clone());
        }

        for path in self.items_in(FlushPhase::InsertItems) {
            let item = new
                .get(path.section)
                .and_then(|s| s.items.get(path.item))
                .ok_or(BatchError::ItemOutOfRange {
                    coordinate: Coordinate::New,
                    path,
                    count: new.get(path.section).map_or(0, |s| s.items.len()),
                })?;
            let count = sections.len();
            let target = sections
                .get_mut(path.section)
                .ok_or(BatchError::SectionOutOfRange {
                    coordinate: Coordinate::New,
                    section: path.section,
                    count,
                })?;
            if path.item > target.items.len() {
                return Err(BatchError::ItemOutOfRange {
                    coordinate: Coordinate::New,
                    path,
                    count: target.items.len(),
                });
            }
            target.items.insert(path.item, item.clone());
        }

        Ok(sections)
    }
}
