//! Collection surface boundary
//!
//! The surface is the presentation layer that actually applies structural
//! edits. The coordinator only ever talks to it through [`CollectionSurface`].

use serde::Serialize;

use crate::model::{IndexPath, RowAnimation};

/// Callback invoked once with the success flag of a commit
pub type Completion = Box<dyn FnOnce(bool)>;

/// Presentation layer consuming flushed change sets
///
/// Positions handed to the primitive calls are already phase-ordered by the
/// caller; deletions are in old coordinates, insertions in new ones.
pub trait CollectionSurface {
    fn insert_sections(&mut self, sections: &[usize], animation: RowAnimation);

    fn delete_sections(&mut self, sections: &[usize], animation: RowAnimation);

    fn insert_items(&mut self, items: &[IndexPath], animation: RowAnimation);

    fn delete_items(&mut self, items: &[IndexPath], animation: RowAnimation);

    /// Discard everything and re-read the data source
    fn reload_data(&mut self);

    /// Transaction envelope around one flush
    ///
    /// `body` issues the primitive calls. `completion` must be invoked exactly
    /// once after they have been applied; surfaces that animate may defer it.
    fn apply_batch<F>(&mut self, animated: bool, body: F, completion: Completion)
    where
        F: FnOnce(&mut Self),
        Self: Sized,
    {
        let _ = animated;
        body(self);
        completion(true);
    }

    /// Block until every deferred completion has fired
    fn wait_until_all_updates_committed(&mut self) {}
}

/// A call observed by [`RecordingSurface`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum SurfaceCall {
    BeginBatch {
        animated: bool,
    },
    EndBatch,
    InsertSections {
        sections: Vec<usize>,
        animation: RowAnimation,
    },
    DeleteSections {
        sections: Vec<usize>,
        animation: RowAnimation,
    },
    InsertItems {
        items: Vec<IndexPath>,
        animation: RowAnimation,
    },
    DeleteItems {
        items: Vec<IndexPath>,
        animation: RowAnimation,
    },
    ReloadData,
    WaitUntilCommitted,
}

impl SurfaceCall {
    /// True for the four structural edit calls
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            SurfaceCall::InsertSections { .. }
                | SurfaceCall::DeleteSections { .. }
                | SurfaceCall::InsertItems { .. }
                | SurfaceCall::DeleteItems { .. }
        )
    }
}

/// Headless surface that records every call it receives
///
/// With `defer_completions` set, batch completions are queued until
/// [`CollectionSurface::wait_until_all_updates_committed`] drains them,
/// which mimics a surface whose animations finish later.
#[derive(Default)]
pub struct RecordingSurface {
    calls: Vec<SurfaceCall>,
    defer_completions: bool,
    pending: Vec<Completion>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface whose batch completions fire only when drained
    pub fn deferred() -> Self {
        Self {
            defer_completions: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    /// Only the structural edit calls, in order
    pub fn structural_calls(&self) -> Vec<&SurfaceCall> {
        self.calls.iter().filter(|c| c.is_structural()).collect()
    }

    /// Number of batch envelopes opened so far
    pub fn batch_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, SurfaceCall::BeginBatch { .. }))
            .count()
    }

    pub fn pending_completions(&self) -> usize {
        self.pending.len()
    }

    pub fn take_calls(&mut self) -> Vec<SurfaceCall> {
        std::mem::take(&mut self.calls)
    }
}

impl std::fmt::Debug for RecordingSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingSurface")
            .field("calls", &self.calls)
            .field("defer_completions", &self.defer_completions)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl CollectionSurface for RecordingSurface {
    fn insert_sections(&mut self, sections: &[usize], animation: RowAnimation) {
        self.calls.push(SurfaceCall::InsertSections {
            sections: sections.to_vec(),
            animation,
        });
    }

    fn delete_sections(&mut self, sections: &[usize], animation: RowAnimation) {
        self.calls.push(SurfaceCall::DeleteSections {
            sections: sections.to_vec(),
            animation,
        });
    }

    fn insert_items(&mut self, items: &[IndexPath], animation: RowAnimation) {
        self.calls.push(SurfaceCall::InsertItems {
            items: items.to_vec(),
            animation,
        });
    }

    fn delete_items(&mut self, items: &[IndexPath], animation: RowAnimation) {
        self.calls.push(SurfaceCall::DeleteItems {
            items: items.to_vec(),
            animation,
        });
    }

    fn reload_data(&mut self) {
        self.calls.push(SurfaceCall::ReloadData);
    }

    fn apply_batch<F>(&mut self, animated: bool, body: F, completion: Completion)
    where
        F: FnOnce(&mut Self),
        Self: Sized,
    {
        self.calls.push(SurfaceCall::BeginBatch { animated });
        body(self);
        self.calls.push(SurfaceCall::EndBatch);
        if self.defer_completions {
            self.pending.push(completion);
        } else {
            completion(true);
        }
    }

    fn wait_until_all_updates_committed(&mut self) {
        self.calls.push(SurfaceCall::WaitUntilCommitted);
        for completion in self.pending.drain(..) {
            completion(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_default_apply_batch_runs_body_then_completion() {
        struct Counting(usize);
        impl CollectionSurface for Counting {
            fn insert_sections(&mut self, _: &[usize], _: RowAnimation) {
                self.0 += 1;
            }
            fn delete_sections(&mut self, _: &[usize], _: RowAnimation) {}
            fn insert_items(&mut self, _: &[IndexPath], _: RowAnimation) {}
            fn delete_items(&mut self, _: &[IndexPath], _: RowAnimation) {}
            fn reload_data(&mut self) {}
        }

        let done = Rc::new(Cell::new(None));
        let observed = done.clone();
        let mut surface = Counting(0);
        surface.apply_batch(
            true,
            |s| s.insert_sections(&[0], RowAnimation::Automatic),
            Box::new(move |ok| observed.set(Some(ok))),
        );
        assert_eq!(surface.0, 1);
        assert_eq!(done.get(), Some(true));
    }

    #[test]
    fn test_deferred_completions_fire_on_wait() {
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let mut surface = RecordingSurface::deferred();
        surface.apply_batch(false, |_| {}, Box::new(move |_| counter.set(counter.get() + 1)));
        assert_eq!(fired.get(), 0);
        assert_eq!(surface.pending_completions(), 1);

        surface.wait_until_all_updates_committed();
        assert_eq!(fired.get(), 1);
        assert_eq!(surface.pending_completions(), 0);
    }
}
