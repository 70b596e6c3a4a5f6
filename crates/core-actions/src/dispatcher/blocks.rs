//! Block-level structure commands: list kinds and quote containers.

use core_doc::BlockKind;
use core_state::EditorState;

use super::DispatchOutcome;

pub(crate) fn handle_toggle_block(kind: BlockKind, state: &mut EditorState) -> DispatchOutcome {
    let sel = state.selection();
    let set = state.doc.toggle_block_kind(sel.start(), sel.end(), kind);
    tracing::trace!(target: "actions.dispatch", op = "toggle_block", ?kind, start = sel.start(), end = sel.end(), set, "block kind toggled");
    DispatchOutcome::changed()
}

pub(crate) fn handle_toggle_quote(state: &mut EditorState) -> DispatchOutcome {
    let sel = state.selection();
    let toggle = state.doc.toggle_quote(sel.start(), sel.end());
    tracing::trace!(target: "actions.dispatch", op = "toggle_quote", ?toggle, start = sel.start(), end = sel.end(), "quote toggled");
    DispatchOutcome::changed()
}
