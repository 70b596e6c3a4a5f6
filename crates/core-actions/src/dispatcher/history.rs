//! Undo / redo dispatch.
//!
//! Traversal replaces the committed value directly through
//! `EditorState::load_value`, so a `changed` outcome here means the
//! committed value already moved; there is nothing left to re-sync.

use core_state::EditorState;

use super::DispatchOutcome;

pub(crate) fn handle_undo(state: &mut EditorState) -> DispatchOutcome {
    if state.undo() {
        tracing::trace!(target: "actions.dispatch", op = "undo", depth = state.undo_depth(), "undo applied");
        DispatchOutcome::changed()
    } else {
        tracing::trace!(target: "actions.dispatch", op = "undo", "nothing to undo");
        DispatchOutcome::clean()
    }
}

pub(crate) fn handle_redo(state: &mut EditorState) -> DispatchOutcome {
    if state.redo() {
        tracing::trace!(target: "actions.dispatch", op = "redo", depth = state.redo_depth(), "redo applied");
        DispatchOutcome::changed()
    } else {
        tracing::trace!(target: "actions.dispatch", op = "redo", "nothing to redo");
        DispatchOutcome::clean()
    }
}
