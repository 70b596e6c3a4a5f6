//! Inline mark commands.
//!
//! A mark toggle over a non-empty selection edits run attributes directly.
//! At a caret there is no text to edit, so the toggle is recorded as pending
//! marks on the state; the next insertion at that caret consumes them.

use core_doc::Mark;
use core_state::EditorState;

use super::DispatchOutcome;

pub(crate) fn handle_toggle_mark(mark: Mark, state: &mut EditorState) -> DispatchOutcome {
    let sel = state.selection();
    if sel.is_caret() {
        state.toggle_pending_mark(mark);
        tracing::trace!(target: "actions.dispatch", op = "toggle_mark", ?mark, caret = sel.start(), "pending marks armed");
        return DispatchOutcome::moved();
    }
    let applied = state.doc.toggle_mark(sel.start(), sel.end(), mark);
    tracing::trace!(target: "actions.dispatch", op = "toggle_mark", ?mark, start = sel.start(), end = sel.end(), applied, "range toggled");
    DispatchOutcome::changed()
}
