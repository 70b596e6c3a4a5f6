use tracing::trace;

/// Default number of committed values retained for undo.
pub const HISTORY_CAPACITY_DEFAULT: usize = 50;

/// Bounded undo/redo stacks over committed markup strings.
///
/// The engine stores whole committed values, not deltas. A fresh edit clears
/// the redo stack even when the corresponding undo push is skipped by the
/// dedupe or empty-previous rules, so redo never replays across an edit.
pub struct HistoryEngine {
    undo_stack: Vec<String>,
    redo_stack: Vec<String>,
    capacity: usize,
}

impl Default for HistoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryEngine {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY_DEFAULT)
    }

    /// A capacity below one retains nothing undoable; clamp to one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the retention bound, evicting oldest entries immediately.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.undo_stack.len() > self.capacity {
            let _ = self.undo_stack.remove(0);
        }
        trace!(target: "state.history", capacity = self.capacity, undo_depth = self.undo_stack.len(), "capacity_set");
    }

    /// Record a fresh edit transitioning `previous` -> `next`. Returns whether
    /// `previous` was pushed onto the undo stack: an empty previous value, an
    /// unchanged value, or a value already on top of the stack is skipped.
    pub fn record(&mut self, previous: &str, next: &str) -> bool {
        self.redo_stack.clear();
        if previous == next || previous.is_empty() {
            trace!(target: "state.history", undo_depth = self.undo_stack.len(), "record_skip_empty_or_unchanged");
            return false;
        }
        if self.undo_stack.last().is_some_and(|top| top == previous) {
            trace!(target: "state.history", undo_depth = self.undo_stack.len(), "record_dedupe_skip");
            return false;
        }
        self.undo_stack.push(previous.to_string());
        if self.undo_stack.len() > self.capacity {
            let _ = self.undo_stack.remove(0);
            trace!(target: "state.history", "undo_stack_trimmed");
        }
        trace!(target: "state.history", undo_depth = self.undo_stack.len(), "record_push");
        true
    }

    /// Pop the most recent prior value, moving `current` onto the redo stack.
    pub fn undo(&mut self, current: &str) -> Option<String> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current.to_string());
        trace!(target: "state.history", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "undo_pop");
        Some(previous)
    }

    /// Pop the most recently undone value, moving `current` back to undo.
    pub fn redo(&mut self, current: &str) -> Option<String> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current.to_string());
        if self.undo_stack.len() > self.capacity {
            let _ = self.undo_stack.remove(0);
        }
        trace!(target: "state.history", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "redo_pop");
        Some(next)
    }
}
