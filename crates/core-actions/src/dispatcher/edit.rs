//! Content mutation commands: typing, paragraph breaks, deletion, paste.

use core_state::{EditorState, Selection};

use super::DispatchOutcome;

pub(crate) fn handle_insert_text(text: &str, state: &mut EditorState) -> DispatchOutcome {
    let sel = state.selection();
    // Pending marks are consumed before any other mutation so the insertion
    // styles itself even when it also replaces a selection.
    let marks = state.take_pending_marks();
    if !sel.is_caret() {
        state.doc.delete_range(sel.start(), sel.end());
    }
    let inserted = state.doc.insert_text(sel.start(), text, marks);
    if sel.is_caret() && inserted == 0 {
        return DispatchOutcome::clean();
    }
    state.set_selection(Selection::caret(sel.start() + inserted));
    tracing::trace!(target: "actions.dispatch", op = "insert_text", at = sel.start(), inserted, "text inserted");
    DispatchOutcome::changed()
}

pub(crate) fn handle_insert_paragraph(state: &mut EditorState) -> DispatchOutcome {
    let sel = state.selection();
    if !sel.is_caret() {
        state.doc.delete_range(sel.start(), sel.end());
    }
    state.doc.split_block(sel.start());
    state.set_selection(Selection::caret(sel.start()));
    tracing::trace!(target: "actions.dispatch", op = "insert_paragraph", at = sel.start(), "block split");
    DispatchOutcome::changed()
}

pub(crate) fn handle_delete_backward(state: &mut EditorState) -> DispatchOutcome {
    let sel = state.selection();
    if !sel.is_caret() {
        state.doc.delete_range(sel.start(), sel.end());
        state.set_selection(Selection::caret(sel.start()));
        tracing::trace!(target: "actions.dispatch", op = "delete_backward", start = sel.start(), end = sel.end(), "selection removed");
        return DispatchOutcome::changed();
    }
    match state.doc.delete_backward(sel.start()) {
        Some(caret) => {
            state.set_selection(Selection::caret(caret));
            tracing::trace!(target: "actions.dispatch", op = "delete_backward", caret, "deleted before caret");
            DispatchOutcome::changed()
        }
        None => DispatchOutcome::clean(),
    }
}

pub(crate) fn handle_delete_forward(state: &mut EditorState) -> DispatchOutcome {
    let sel = state.selection();
    if !sel.is_caret() {
        state.doc.delete_range(sel.start(), sel.end());
        state.set_selection(Selection::caret(sel.start()));
        tracing::trace!(target: "actions.dispatch", op = "delete_forward", start = sel.start(), end = sel.end(), "selection removed");
        return DispatchOutcome::changed();
    }
    if state.doc.delete_forward(sel.start()) {
        state.set_selection(Selection::caret(sel.start()));
        tracing::trace!(target: "actions.dispatch", op = "delete_forward", caret = sel.start(), "deleted after caret");
        DispatchOutcome::changed()
    } else {
        DispatchOutcome::clean()
    }
}

pub(crate) fn handle_paste(text: &str, state: &mut EditorState) -> DispatchOutcome {
    let plain = extract_plain_text(text);
    let sel = state.selection();
    if sel.is_caret() && plain.is_empty() {
        return DispatchOutcome::clean();
    }
    if !sel.is_caret() {
        state.doc.delete_range(sel.start(), sel.end());
    }
    let inserted = state.doc.insert_plain_text(sel.start(), &plain);
    state.set_selection(Selection::caret(sel.start() + inserted));
    tracing::trace!(target: "actions.dispatch", op = "paste", at = sel.start(), inserted, "plain text pasted");
    DispatchOutcome::changed()
}

/// Reduce a paste payload to plain text. Payloads without any tag opener are
/// taken verbatim; anything else is parsed as markup and its text content
/// extracted, falling back to the raw payload when parsing fails.
fn extract_plain_text(payload: &str) -> String {
    if !payload.contains('<') {
        return payload.to_string();
    }
    match core_doc::markup::parse(payload) {
        Ok(doc) => doc.plain_text(),
        Err(err) => {
            tracing::debug!(target: "actions.dispatch", %err, "paste payload kept as raw text");
            payload.to_string()
        }
    }
}
