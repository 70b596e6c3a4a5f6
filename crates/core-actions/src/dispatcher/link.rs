//! Link commands.
//!
//! URL validation and scheme policy live in the embedding layer; by the time
//! a link command reaches the dispatcher its URL is final.

use core_state::{EditorState, Selection};

use super::DispatchOutcome;

pub(crate) fn handle_apply_link(
    url: &str,
    text: Option<&str>,
    state: &mut EditorState,
) -> DispatchOutcome {
    let sel = state.selection();
    if sel.is_caret() {
        let display = match text {
            Some(t) if !t.is_empty() => t,
            _ => url,
        };
        let inserted = state.doc.insert_link(sel.start(), display, url);
        state.set_selection(Selection::caret(sel.start() + inserted));
        tracing::trace!(target: "actions.dispatch", op = "apply_link", url, inserted, "linked text inserted");
        return DispatchOutcome::changed();
    }
    state.doc.apply_link(sel.start(), sel.end(), url);
    tracing::trace!(target: "actions.dispatch", op = "apply_link", url, start = sel.start(), end = sel.end(), "selection linked");
    DispatchOutcome::changed()
}

pub(crate) fn handle_remove_link(state: &mut EditorState) -> DispatchOutcome {
    let sel = state.selection();
    let cleared = state.doc.clear_link(sel.start(), sel.end());
    tracing::trace!(target: "actions.dispatch", op = "remove_link", start = sel.start(), end = sel.end(), cleared, "link cleared");
    if cleared {
        DispatchOutcome::changed()
    } else {
        DispatchOutcome::clean()
    }
}
