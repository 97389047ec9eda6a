use std::cell::RefCell;
use std::rc::Rc;

use rowbatch_core::{Completion, Coordinator, RecordingSurface, Section, SnapshotDataSource};

pub type Snapshot = Vec<Section<&'static str, char>>;

/// Build a keyed snapshot from `(key, "items")` pairs
#[allow(dead_code)]
pub fn snapshot(sections: &[(&'static str, &str)]) -> Snapshot {
    sections
        .iter()
        .map(|(key, items)| Section::new(*key, items.chars().collect()))
        .collect()
}

/// Imperative coordinator over plain counts, initial load already done
#[allow(dead_code)]
pub fn loaded_imperative(counts: Vec<usize>) -> Coordinator<Vec<usize>, RecordingSurface> {
    let mut coordinator = Coordinator::imperative(counts, RecordingSurface::new());
    coordinator.reload_data(None).unwrap();
    coordinator.surface_mut().take_calls();
    coordinator
}

/// Declarative coordinator over `initial`, initial load already done
#[allow(dead_code)]
pub fn loaded_declarative(
    initial: Snapshot,
) -> Coordinator<SnapshotDataSource<&'static str, char>, RecordingSurface> {
    let mut coordinator =
        Coordinator::declarative(SnapshotDataSource::new(initial), RecordingSurface::new());
    coordinator.reload_data(None).unwrap();
    coordinator.surface_mut().take_calls();
    coordinator
}

/// Completion handler that appends `(tag, finished)` to a shared log
#[allow(dead_code)]
pub fn logging_completion(
    log: &Rc<RefCell<Vec<(&'static str, bool)>>>,
    tag: &'static str,
) -> Option<Completion> {
    let log = log.clone();
    Some(Box::new(move |finished| log.borrow_mut().push((tag, finished))))
}

#[allow(dead_code)]
pub fn completion_log() -> Rc<RefCell<Vec<(&'static str, bool)>>> {
    Rc::new(RefCell::new(Vec::new()))
}
