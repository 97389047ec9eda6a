//! Batch update coordinator
//!
//! Owns the transaction depth, the open change set and the reconciliation
//! strategy. Edits recorded at any nesting depth are flushed to the surface
//! exactly once, when the outermost transaction closes.
//!
//! ## Logging
//!
//! - `log_op_start!` / `log_op_end!` around every commit, with `txn_id`
//! - `log_op_error!` for rejected commits and unbalanced `end_updates`
//! - `tracing::debug!` for transactions absorbed before the initial load
//!
//! ## Example
//!
//! ```
//! use rowbatch_core::{Coordinator, IndexPath, RecordingSurface, RowAnimation};
//!
//! let mut coordinator = Coordinator::imperative(vec![2], RecordingSurface::new());
//! coordinator.reload_data(None).unwrap();
//!
//! coordinator.begin_updates();
//! *coordinator.data_source_mut() = vec![3];
//! coordinator
//!     .insert_rows([IndexPath::new(0, 2)], RowAnimation::Fade)
//!     .unwrap();
//! coordinator.end_updates(true, None).unwrap();
//!
//! assert_eq!(coordinator.surface().structural_calls().len(), 1);
//! ```

use std::time::Instant;

use crate::change_set::{ChangeSet, EditKind};
use crate::config::{CoordinatorConfig, ReconcileMode};
use crate::data_source::{DataSource, DeclarativeDataSource};
use crate::diff::{nested_diff, NestedDiff};
use crate::errors::{BatchError, Result};
use crate::model::{IndexPath, RowAnimation};
use crate::surface::{CollectionSurface, Completion};
use crate::{log_op_end, log_op_error, log_op_start};

/// Strategy fixed at construction
enum Reconciler<D> {
    Imperative,
    Declarative {
        diff: fn(&mut D) -> NestedDiff,
        refresh: fn(&mut D),
    },
}

impl<D> Reconciler<D> {
    fn mode(&self) -> ReconcileMode {
        match self {
            Reconciler::Imperative => ReconcileMode::Imperative,
            Reconciler::Declarative { .. } => ReconcileMode::Declarative,
        }
    }
}

fn refresh_and_diff<D: DeclarativeDataSource>(source: &mut D) -> NestedDiff {
    let old = source.content().to_vec();
    source.refresh_content();
    nested_diff(&old, source.content())
}

fn refresh_only<D: DeclarativeDataSource>(source: &mut D) {
    source.refresh_content();
}

/// Coalesces structural edits into one atomic flush per outermost transaction
///
/// Not thread-safe; all calls must come from the thread that owns the
/// surface. Dropping a coordinator with an open transaction panics.
pub struct Coordinator<D: DataSource, C: CollectionSurface> {
    data_source: D,
    surface: C,
    config: CoordinatorConfig,
    reconciler: Reconciler<D>,
    depth: usize,
    change_set: Option<ChangeSet>,
    has_performed_initial_load: bool,
}

impl<D: DataSource, C: CollectionSurface> Coordinator<D, C> {
    /// Coordinator whose edits are recorded explicitly by the caller
    pub fn imperative(data_source: D, surface: C) -> Self {
        Self::with_reconciler(
            data_source,
            surface,
            CoordinatorConfig::default(),
            Reconciler::Imperative,
        )
    }

    fn with_reconciler(
        data_source: D,
        surface: C,
        config: CoordinatorConfig,
        reconciler: Reconciler<D>,
    ) -> Self {
        let config = CoordinatorConfig {
            mode: reconciler.mode(),
            ..config
        };
        Self {
            data_source,
            surface,
            config,
            reconciler,
            depth: 0,
            change_set: None,
            has_performed_initial_load: false,
        }
    }

    /// Replace the tunables of this coordinator
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `config.mode` differs from the mode chosen at
    /// construction.
    pub fn with_config(mut self, config: CoordinatorConfig) -> Result<Self> {
        if config.mode != self.config.mode {
            return Err(BatchError::InvalidInput {
                message: format!(
                    "config mode '{}' does not match coordinator mode '{}'",
                    config.mode, self.config.mode
                ),
            });
        }
        self.config = config;
        Ok(self)
    }

    pub fn mode(&self) -> ReconcileMode {
        self.config.mode
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn data_source(&self) -> &D {
        &self.data_source
    }

    /// Mutate the model; pair with an open transaction so counts line up
    pub fn data_source_mut(&mut self) -> &mut D {
        &mut self.data_source
    }

    pub fn surface(&self) -> &C {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut C {
        &mut self.surface
    }

    /// True while at least one transaction is open
    pub fn is_batch_updating(&self) -> bool {
        self.depth != 0
    }

    pub fn transaction_depth(&self) -> usize {
        self.depth
    }

    pub fn has_performed_initial_load(&self) -> bool {
        self.has_performed_initial_load
    }

    /// The change set of the open transaction, if any
    pub fn pending_changes(&self) -> Option<&ChangeSet> {
        self.change_set.as_ref()
    }

    /// Open a (possibly nested) transaction
    pub fn begin_updates(&mut self) {
        if self.depth == 0 {
            let change_set = ChangeSet::new(self.data_source.section_item_counts());
            tracing::debug!(
                txn_id = %change_set.txn_id(),
                sections = change_set.old_section_count(),
                "transaction opened"
            );
            self.change_set = Some(change_set);
        }
        self.depth += 1;
    }

    /// Close the innermost transaction
    ///
    /// `completion` is queued even for nested calls; all queued handlers run
    /// once, in order, after the outermost commit.
    ///
    /// # Errors
    ///
    /// - `UnbalancedTransaction` if no transaction is open; nothing changes.
    /// - `IndexOutOfRange` / `InconsistentUpdate` if count validation rejects
    ///   the commit; handlers are invoked with `false`.
    pub fn end_updates(&mut self, animated: bool, completion: Option<Completion>) -> Result<()> {
        if self.depth == 0 {
            let err = BatchError::UnbalancedTransaction;
            log_op_error!("end_updates", err.clone(), duration_ms = 0u64);
            return Err(err);
        }

        let change_set = self.change_set.as_mut().ok_or_else(|| BatchError::Internal {
            message: format!("no change set at depth {}", self.depth),
        })?;
        change_set.add_completion(completion);
        self.depth -= 1;
        if self.depth > 0 {
            return Ok(());
        }

        match self.change_set.take() {
            Some(change_set) => self.commit(change_set, animated),
            None => Err(BatchError::Internal {
                message: "change set released before commit".to_string(),
            }),
        }
    }

    fn commit(&mut self, mut change_set: ChangeSet, animated: bool) -> Result<()> {
        if !self.has_performed_initial_load {
            let handlers = change_set.take_completion_handlers();
            tracing::debug!(
                txn_id = %change_set.txn_id(),
                dropped_edits = change_set.edit_count(),
                handler_count = handlers.len(),
                "update before initial load absorbed"
            );
            for handler in handlers {
                handler(true);
            }
            return Ok(());
        }

        let txn_id = change_set.txn_id().clone();
        log_op_start!(
            "commit_updates",
            txn_id = %txn_id,
            mode = %self.config.mode,
            animated = animated
        );
        let start = Instant::now();

        let op_count = self.commit_impl(change_set, animated).map_err(|e| {
            log_op_error!(
                "commit_updates",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                txn_id = %txn_id
            );
            e
        })?;

        log_op_end!(
            "commit_updates",
            duration_ms = start.elapsed().as_millis() as u64,
            txn_id = %txn_id,
            op_count = op_count as u64
        );
        Ok(())
    }

    fn commit_impl(&mut self, mut change_set: ChangeSet, animated: bool) -> Result<usize> {
        if let Reconciler::Declarative { diff, .. } = &self.reconciler {
            let diff = *diff;
            let changes = diff(&mut self.data_source);
            if let Err(e) =
                change_set.record_nested_diff(&changes, self.config.declarative_animation)
            {
                for handler in change_set.take_completion_handlers() {
                    handler(false);
                }
                return Err(e);
            }
        }

        change_set.record_new_counts(self.data_source.section_item_counts());
        let (handlers, plan) = change_set.into_flush_plan(self.config.validate_counts);
        let plan = match plan {
            Ok(plan) => plan,
            Err(e) => {
                for handler in handlers {
                    handler(false);
                }
                return Err(e);
            }
        };

        let op_count = plan.len();
        let completion: Completion = Box::new(move |finished| {
            for handler in handlers {
                handler(finished);
            }
        });
        self.surface
            .apply_batch(animated, |surface| plan.apply_to(surface), completion);
        Ok(op_count)
    }

    /// Discard every pending change and re-read the data source
    ///
    /// Marks the initial load as performed; until then, transactions are
    /// absorbed without touching the surface.
    ///
    /// # Errors
    ///
    /// `TransactionOpen` if called inside a transaction; `completion` is then
    /// invoked with `false`.
    pub fn reload_data(&mut self, completion: Option<Completion>) -> Result<()> {
        if self.depth > 0 {
            if let Some(completion) = completion {
                completion(false);
            }
            return Err(BatchError::TransactionOpen {
                op: "reload_data".to_string(),
                depth: self.depth,
            });
        }

        if let Reconciler::Declarative { refresh, .. } = &self.reconciler {
            let refresh = *refresh;
            refresh(&mut self.data_source);
        }
        self.surface.reload_data();
        self.has_performed_initial_load = true;
        tracing::debug!(
            sections = self.data_source.section_item_counts().len(),
            "full reload"
        );

        if let Some(completion) = completion {
            completion(true);
        }
        Ok(())
    }

    /// Block until the surface has fired every deferred completion
    ///
    /// Ignored (with a warning) while a transaction is open.
    pub fn wait_until_all_updates_committed(&mut self) {
        if self.depth > 0 {
            tracing::warn!(
                depth = self.depth,
                "wait_until_all_updates_committed called during a batch update; ignoring"
            );
            return;
        }
        self.surface.wait_until_all_updates_committed();
    }

    pub fn insert_sections<I>(&mut self, sections: I, animation: RowAnimation) -> Result<()>
    where
        I: IntoIterator<Item = usize>,
    {
        self.perform_edit("insert_sections", |cs| {
            cs.record_sections(EditKind::Insert, sections, animation)
        })
    }

    pub fn delete_sections<I>(&mut self, sections: I, animation: RowAnimation) -> Result<()>
    where
        I: IntoIterator<Item = usize>,
    {
        self.perform_edit("delete_sections", |cs| {
            cs.record_sections(EditKind::Delete, sections, animation)
        })
    }

    pub fn reload_sections<I>(&mut self, sections: I, animation: RowAnimation) -> Result<()>
    where
        I: IntoIterator<Item = usize>,
    {
        self.perform_edit("reload_sections", |cs| {
            cs.record_sections(EditKind::Reload, sections, animation)
        })
    }

    /// Delete at `from` (old coordinates) and insert at `to` (new), unanimated
    pub fn move_section(&mut self, from: usize, to: usize) -> Result<()> {
        self.perform_edit("move_section", |cs| {
            cs.record_sections(EditKind::Delete, [from], RowAnimation::None)?;
            cs.record_sections(EditKind::Insert, [to], RowAnimation::None)
        })
    }

    pub fn insert_rows<I>(&mut self, rows: I, animation: RowAnimation) -> Result<()>
    where
        I: IntoIterator<Item = IndexPath>,
    {
        self.perform_edit("insert_rows", |cs| {
            cs.record_items(EditKind::Insert, rows, animation)
        })
    }

    pub fn delete_rows<I>(&mut self, rows: I, animation: RowAnimation) -> Result<()>
    where
        I: IntoIterator<Item = IndexPath>,
    {
        self.perform_edit("delete_rows", |cs| {
            cs.record_items(EditKind::Delete, rows, animation)
        })
    }

    pub fn reload_rows<I>(&mut self, rows: I, animation: RowAnimation) -> Result<()>
    where
        I: IntoIterator<Item = IndexPath>,
    {
        self.perform_edit("reload_rows", |cs| {
            cs.record_items(EditKind::Reload, rows, animation)
        })
    }

    /// Delete at `from` (old coordinates) and insert at `to` (new), unanimated
    pub fn move_row(&mut self, from: IndexPath, to: IndexPath) -> Result<()> {
        self.perform_edit("move_row", |cs| {
            cs.record_items(EditKind::Delete, [from], RowAnimation::None)?;
            cs.record_items(EditKind::Insert, [to], RowAnimation::None)
        })
    }

    /// Run `record` as its own one-edit transaction
    ///
    /// Declarative coordinators derive edits at commit, so `record` is
    /// skipped for them. The transaction is closed even if recording fails.
    fn perform_edit<F>(&mut self, op: &'static str, record: F) -> Result<()>
    where
        F: FnOnce(&mut ChangeSet) -> Result<()>,
    {
        self.begin_updates();
        let recorded = match (&self.reconciler, self.change_set.as_mut()) {
            (Reconciler::Declarative { .. }, _) => {
                tracing::debug!(op, "explicit edit ignored in declarative mode");
                Ok(())
            }
            (Reconciler::Imperative, Some(change_set)) => record(change_set),
            (Reconciler::Imperative, None) => Err(BatchError::Internal {
                message: format!("no change set open for {}", op),
            }),
        };
        if let Err(e) = &recorded {
            tracing::debug!(op, error = %e, "edit rejected");
        }
        let ended = self.end_updates(false, None);
        recorded.and(ended)
    }
}

impl<D: DeclarativeDataSource, C: CollectionSurface> Coordinator<D, C> {
    /// Coordinator that derives edits by diffing the data source's content
    pub fn declarative(data_source: D, surface: C) -> Self {
        Self::with_reconciler(
            data_source,
            surface,
            CoordinatorConfig::default(),
            Reconciler::Declarative {
                diff: refresh_and_diff::<D>,
                refresh: refresh_only::<D>,
            },
        )
    }

    /// Coordinator whose strategy and tunables come from `config`
    pub fn from_config(data_source: D, surface: C, config: CoordinatorConfig) -> Self {
        let reconciler = match config.mode {
            ReconcileMode::Imperative => Reconciler::Imperative,
            ReconcileMode::Declarative => Reconciler::Declarative {
                diff: refresh_and_diff::<D>,
                refresh: refresh_only::<D>,
            },
        };
        Self::with_reconciler(data_source, surface, config, reconciler)
    }
}

impl<D: DataSource, C: CollectionSurface> Drop for Coordinator<D, C> {
    fn drop(&mut self) {
        if self.depth > 0 && !std::thread::panicking() {
            let err = BatchError::ReentrantDestruction { depth: self.depth };
            tracing::error!(depth = self.depth, "{}", err);
            panic!("{}", err);
        }
    }
}

impl<D, C> std::fmt::Debug for Coordinator<D, C>
where
    D: DataSource + std::fmt::Debug,
    C: CollectionSurface + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("data_source", &self.data_source)
            .field("surface", &self.surface)
            .field("config", &self.config)
            .field("depth", &self.depth)
            .field("change_set", &self.change_set)
            .field("has_performed_initial_load", &self.has_performed_initial_load)
            .finish()
    }
}
