//! Two-level structural diff.
//!
//! Computes which sections and items were inserted or deleted between two
//! hierarchical snapshots.
//!
//! ## Entry point
//!
//! ```
//! use rowbatch_core::diff::nested_diff;
//! use rowbatch_core::model::{IndexPath, Section};
//!
//! let old = vec![Section::new("a", vec![1, 2]), Section::new("b", vec![3])];
//! let new = vec![Section::new("a", vec![1]), Section::new("c", vec![4])];
//!
//! let diff = nested_diff(&old, &new);
//! assert_eq!(diff.deleted_items, vec![IndexPath::new(0, 1)]);
//! assert!(diff.deleted_sections.contains(&1));
//! assert!(diff.inserted_sections.contains(&1));
//! ```
//!
//! ## Guarantees
//!
//! - **Determinism**: identical inputs produce identical output.
//! - **Subsumption**: inserted/deleted sections never carry item edits.
//! - **Round trip**: applying the deletes (old indices) then the inserts
//!   (new indices) to the old snapshot reproduces the new one.

pub mod myers;
pub mod nested;

pub use myers::{diff_by, SequenceDiff};
pub use nested::{nested_diff, nested_diff_by, NestedDiff};
