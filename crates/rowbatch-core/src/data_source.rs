//! Data source boundary
//!
//! The coordinator asks the data source for counts when a transaction opens
//! and closes. In declarative mode it also reads the materialized content
//! before and after asking the source to refresh it.

use crate::model::section::item_counts;
use crate::model::{DiffSection, Section};

/// Supplies the current shape of the collection
pub trait DataSource {
    /// Ordered per-section item counts as of now
    fn section_item_counts(&self) -> Vec<usize>;
}

/// A data source whose content is the single source of truth
pub trait DeclarativeDataSource: DataSource {
    type Section: DiffSection + Clone;

    /// The currently materialized snapshot
    fn content(&self) -> &[Self::Section];

    /// Recompute the materialized snapshot from the source's model
    fn refresh_content(&mut self);
}

/// Plain counts; useful when only imperative edits are issued
impl DataSource for Vec<usize> {
    fn section_item_counts(&self) -> Vec<usize> {
        self.clone()
    }
}

/// In-memory data source over keyed sections
///
/// The materialized snapshot changes only through [`refresh_content`]
/// (declarative mode) or [`sections_mut`] (imperative mode). New content for
/// the next refresh is handed over with [`stage`].
///
/// [`refresh_content`]: DeclarativeDataSource::refresh_content
/// [`sections_mut`]: SnapshotDataSource::sections_mut
/// [`stage`]: SnapshotDataSource::stage
#[derive(Debug, Clone, Default)]
pub struct SnapshotDataSource<K, T> {
    current: Vec<Section<K, T>>,
    staged: Option<Vec<Section<K, T>>>,
}

impl<K, T> SnapshotDataSource<K, T> {
    pub fn new(sections: Vec<Section<K, T>>) -> Self {
        Self {
            current: sections,
            staged: None,
        }
    }

    pub fn sections(&self) -> &[Section<K, T>] {
        &self.current
    }

    /// Direct access for imperative edits
    pub fn sections_mut(&mut self) -> &mut Vec<Section<K, T>> {
        &mut self.current
    }

    /// Content to materialize on the next refresh
    pub fn stage(&mut self, sections: Vec<Section<K, T>>) {
        self.staged = Some(sections);
    }

    pub fn has_staged(&self) -> bool {
        self.staged.is_some()
    }
}

impl<K: PartialEq, T: PartialEq> DataSource for SnapshotDataSource<K, T> {
    fn section_item_counts(&self) -> Vec<usize> {
        item_counts(&self.current)
    }
}

impl<K, T> DeclarativeDataSource for SnapshotDataSource<K, T>
where
    K: PartialEq + Clone,
    T: PartialEq + Clone,
{
    type Section = Section<K, T>;

    fn content(&self) -> &[Section<K, T>] {
        &self.current
    }

    fn refresh_content(&mut self) {
        if let Some(next) = self.staged.take() {
            self.current = next;
        }
    }
}
