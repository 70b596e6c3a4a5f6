//! Editor state: the committed markup value, the live document, the
//! selection, and bounded undo/redo history.
//!
//! The committed value is the canonical serialization last exposed to the
//! host. Mutations edit the live `Document` and then call `commit_surface`,
//! which serializes, compares against the committed value, applies the
//! history push rule on change, and reports the new value for host
//! notification. Undo/redo and external value updates go through
//! `load_value`, which replaces both document and committed value without
//! growing history.
//!
//! Selections are linear character offsets over run text in document order;
//! block boundaries carry no width. Assignment clamps out-of-range offsets,
//! and a saved selection that no longer resolves is skipped rather than
//! clamped.
//!
//! A mark toggle at a collapsed selection cannot edit any text; it records
//! pending caret marks instead. The next insertion at that caret consumes
//! them, and any selection movement or other content change discards them.

use core_doc::{Document, Mark, Marks, markup};
use tracing::{debug, trace, warn};

pub mod format;
pub mod history;

pub use format::FormatState;
pub use history::{HISTORY_CAPACITY_DEFAULT, HistoryEngine};

/// Selection endpoints in linear character offsets. `anchor` is where the
/// selection started, `head` where it ends; `head < anchor` is a backwards
/// selection and is preserved as such.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn caret(at: usize) -> Self {
        Self {
            anchor: at,
            head: at,
        }
    }

    pub fn range(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_caret(&self) -> bool {
        self.anchor == self.head
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_empty(&self) -> bool {
        self.is_caret()
    }

    fn clamped(self, max: usize) -> Self {
        Self {
            anchor: self.anchor.min(max),
            head: self.head.min(max),
        }
    }
}

/// Top-level editing state for one editor instance.
pub struct EditorState {
    /// Live document tree. Mutations flow through `core_doc` primitives and
    /// are surfaced by `commit_surface`.
    pub doc: Document,
    committed: String,
    selection: Selection,
    saved_selection: Option<Selection>,
    pending_marks: Option<Marks>,
    format: FormatState,
    history: HistoryEngine,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorState {
    pub fn new() -> Self {
        Self::from_value("")
    }

    /// Build state from a host-provided initial value. The committed value is
    /// the canonical serialization, not the raw input.
    pub fn from_value(initial: &str) -> Self {
        let doc = parse_or_plain(initial);
        let committed = doc.to_markup();
        let selection = Selection::caret(0);
        let format = FormatState::derive(&doc, selection, None);
        Self {
            doc,
            committed,
            selection,
            saved_selection: None,
            pending_marks: None,
            format,
            history: HistoryEngine::new(),
        }
    }

    pub fn committed(&self) -> &str {
        &self.committed
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn format(&self) -> FormatState {
        self.format
    }

    pub fn char_len(&self) -> usize {
        self.doc.char_len()
    }

    /// Move the selection, clamping to the document length. Movement away
    /// from the current selection discards pending caret marks.
    pub fn set_selection(&mut self, selection: Selection) {
        let clamped = selection.clamped(self.doc.char_len());
        if clamped != self.selection {
            if self.pending_marks.take().is_some() {
                trace!(target: "state.marks", "pending_marks_discarded_on_move");
            }
            self.selection = clamped;
        }
        self.recompute_format();
    }

    pub fn save_selection(&mut self) {
        self.saved_selection = Some(self.selection);
    }

    pub fn saved_selection(&self) -> Option<Selection> {
        self.saved_selection
    }

    /// Re-apply the saved selection. A selection that no longer resolves
    /// against the current content is skipped, never clamped or an error.
    pub fn restore_saved_selection(&mut self) -> bool {
        let Some(saved) = self.saved_selection else {
            return false;
        };
        if saved.end() > self.doc.char_len() {
            debug!(target: "state.selection", anchor = saved.anchor, head = saved.head, len = self.doc.char_len(), "saved_selection_unresolvable");
            return false;
        }
        self.set_selection(saved);
        true
    }

    pub fn pending_marks(&self) -> Option<Marks> {
        self.pending_marks
    }

    /// Record a caret-only mark toggle. The base is the outstanding pending
    /// set when present, else the marks of the run ending at the caret.
    pub fn toggle_pending_mark(&mut self, mark: Mark) {
        let base = self
            .pending_marks
            .unwrap_or_else(|| format::caret_marks(&self.doc, self.selection.start()));
        let toggled = base ^ mark.flag();
        self.pending_marks = Some(toggled);
        trace!(target: "state.marks", ?mark, ?toggled, "pending_marks_toggled");
        self.recompute_format();
    }

    /// Consume pending caret marks for an insertion.
    pub fn take_pending_marks(&mut self) -> Option<Marks> {
        self.pending_marks.take()
    }

    /// Serialize the live document and commit it when it differs from the
    /// committed value. On change the previous value is recorded into history
    /// (subject to the push rule), the committed value is replaced, and the
    /// new value is returned for exactly one host notification. Unchanged
    /// content returns `None` with no history growth.
    pub fn commit_surface(&mut self) -> Option<String> {
        let next = self.doc.to_markup();
        if next == self.committed {
            trace!(target: "state.commit", "surface_unchanged");
            return None;
        }
        let pushed = self.history.record(&self.committed, &next);
        trace!(target: "state.commit", pushed, prev_len = self.committed.len(), next_len = next.len(), "surface_committed");
        self.committed = next.clone();
        self.pending_marks = None;
        self.selection = self.selection.clamped(self.doc.char_len());
        self.recompute_format();
        Some(next)
    }

    /// Replace document and committed value in one step, bypassing history.
    /// This is the application path for undo/redo and external value updates.
    pub fn load_value(&mut self, value: &str) {
        self.doc = parse_or_plain(value);
        self.committed = self.doc.to_markup();
        self.selection = self.selection.clamped(self.doc.char_len());
        self.pending_marks = None;
        self.recompute_format();
        trace!(target: "state.commit", len = self.committed.len(), "value_loaded");
    }

    /// Step back one committed value. Returns false when there is nothing to
    /// undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.undo(&self.committed) else {
            return false;
        };
        self.load_value(&previous);
        true
    }

    /// Step forward one undone value. Returns false when there is nothing to
    /// redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.history.redo(&self.committed) else {
            return false;
        };
        self.load_value(&next);
        true
    }

    pub fn set_history_capacity(&mut self, capacity: usize) {
        self.history.set_capacity(capacity);
    }

    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }

    /// Recompute the derived format snapshot from the current content and
    /// selection.
    pub fn refresh_format(&mut self) {
        self.recompute_format();
    }

    fn recompute_format(&mut self) {
        self.format = FormatState::derive(&self.doc, self.selection, self.pending_marks);
    }
}

/// Canonical serialization of a host payload, without touching any state.
pub fn normalize_value(value: &str) -> String {
    parse_or_plain(value).to_markup()
}

/// Parse host markup, falling back to a plain-text interpretation when the
/// payload is truncated mid-tag.
fn parse_or_plain(value: &str) -> Document {
    match markup::parse(value) {
        Ok(doc) => doc,
        Err(err) => {
            warn!(target: "state.commit", %err, "markup parse failed, treating value as plain text");
            Document::from_plain_text(value)
        }
    }
}
