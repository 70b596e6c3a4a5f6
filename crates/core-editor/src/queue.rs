//! FIFO queue of work deferred past the current host call.

use std::collections::VecDeque;
use tracing::trace;

/// A unit of deferred work. Tasks run in submission order on `Editor::tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Task {
    /// Serialize the document, commit on change, notify the host.
    Resync,
    /// Re-enable content sync after a direct value replacement.
    ClearGuard,
    /// Re-derive the format snapshot for the host toolbar.
    RecomputeFormat,
}

#[derive(Debug, Default)]
pub(crate) struct DeferredQueue {
    tasks: VecDeque<Task>,
}

impl DeferredQueue {
    pub(crate) fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }

    pub(crate) fn push(&mut self, task: Task) {
        trace!(target: "editor.sync", ?task, depth = self.tasks.len() + 1, "task_queued");
        self.tasks.push_back(task);
    }

    pub(crate) fn pop(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }
}
