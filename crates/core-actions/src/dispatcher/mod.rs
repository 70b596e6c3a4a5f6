//! Dispatcher applying `Command` to mutable editor state.
//!
//! Decomposed into focused sub-modules:
//! * `marks`   - inline mark toggles and pending caret marks
//! * `blocks`  - block kind and quote container toggles
//! * `link`    - link apply / insert / remove
//! * `edit`    - text mutation (typing, paragraph breaks, deletion, paste)
//! * `history` - undo / redo traversal
//!
//! Every handler mutates `EditorState` through `core_doc` primitives and
//! returns a `DispatchOutcome`. None of them serialize or commit; the
//! embedding layer owns that step.

use core_state::EditorState;

use crate::Command;

mod blocks;
mod edit;
mod history;
mod link;
mod marks;

/// Result of dispatching a single `Command`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Document content may differ from the committed value and a re-sync
    /// is warranted.
    pub changed: bool,
    /// The selection or pending formatting moved without a content change.
    pub selection_moved: bool,
}

impl DispatchOutcome {
    pub fn changed() -> Self {
        Self {
            changed: true,
            selection_moved: true,
        }
    }

    pub fn moved() -> Self {
        Self {
            changed: false,
            selection_moved: true,
        }
    }

    pub fn clean() -> Self {
        Self {
            changed: false,
            selection_moved: false,
        }
    }
}

/// Apply a command to editor state. Returns a `DispatchOutcome` describing
/// whether content may have changed (`changed`) or only the selection and
/// formatting state moved (`selection_moved`).
pub fn dispatch(command: Command, state: &mut EditorState) -> DispatchOutcome {
    match command {
        Command::ToggleMark(mark) => marks::handle_toggle_mark(mark, state),
        Command::ToggleBlock(kind) => blocks::handle_toggle_block(kind, state),
        Command::ToggleQuote => blocks::handle_toggle_quote(state),
        Command::ApplyLink { url, text } => link::handle_apply_link(&url, text.as_deref(), state),
        Command::RemoveLink => link::handle_remove_link(state),
        Command::InsertText(text) => edit::handle_insert_text(&text, state),
        Command::InsertParagraph => edit::handle_insert_paragraph(state),
        Command::DeleteBackward => edit::handle_delete_backward(state),
        Command::DeleteForward => edit::handle_delete_forward(state),
        Command::Paste(text) => edit::handle_paste(&text, state),
        Command::Undo => history::handle_undo(state),
        Command::Redo => history::handle_redo(state),
    }
}
