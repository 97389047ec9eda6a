//! rowbatch core - batched structural updates for sectioned collections
//!
//! This crate provides:
//! - A transaction [`Coordinator`] that coalesces nested edits into one
//!   atomic, phase-ordered flush per outermost transaction
//! - Imperative and declarative (diff-driven) reconciliation
//! - A nested Myers diff over sections and items
//! - The [`DataSource`] and [`CollectionSurface`] boundaries, plus an
//!   in-memory snapshot source and a recording surface
//! - Structured errors and a logging facility

pub mod change_set;
pub mod config;
pub mod coordinator;
pub mod data_source;
pub mod diff;
pub mod errors;
pub mod flush;
pub mod logging_facility;
pub mod model;
pub mod surface;

pub use rowbatch_core_types as core_types;

// Re-export commonly used types
pub use change_set::{ChangeSet, EditKind};
pub use config::{CoordinatorConfig, ReconcileMode};
pub use coordinator::Coordinator;
pub use data_source::{DataSource, DeclarativeDataSource, SnapshotDataSource};
pub use diff::{nested_diff, NestedDiff};
pub use errors::{BatchError, ExError, ExErrorKind, Result};
pub use flush::{FlushPhase, FlushPlan, SurfaceOp};
pub use model::{DiffSection, IndexPath, RowAnimation, Section};
pub use surface::{CollectionSurface, Completion, RecordingSurface, SurfaceCall};
