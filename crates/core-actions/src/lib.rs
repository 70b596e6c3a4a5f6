//! Editing commands and the dispatcher that applies them.
//!
//! [`Command`] is the vocabulary of operations an embedding layer can run
//! against a [`core_state::EditorState`]: inline mark toggles, block and
//! quote structure changes, link edits, typing, deletions, paste, and
//! history traversal. [`dispatch`] applies one command and reports a
//! [`DispatchOutcome`] so the caller can decide whether the committed value
//! needs to be re-synced and the host notified.
//!
//! Dispatch never commits. Serializing the document, recording history, and
//! notifying the host belong to the embedding layer, which runs them after
//! the command (and any commands batched with it) has mutated the state.

use core_doc::{BlockKind, Mark};

pub mod dispatcher;

pub use dispatcher::{DispatchOutcome, dispatch};

/// A single editing operation over the document and selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Toggle an inline mark over the selection; at a caret this arms
    /// pending marks for the next insertion instead.
    ToggleMark(Mark),
    /// Toggle the block kind of every block touched by the selection.
    ToggleBlock(BlockKind),
    /// Wrap the selection in a quote container, or unwrap the nearest one.
    ToggleQuote,
    /// Link the selected text. At a caret, insert new linked text: the
    /// display text when given and non-empty, else the URL itself.
    ApplyLink { url: String, text: Option<String> },
    /// Strip link attributes from the selection.
    RemoveLink,
    /// Insert text at the caret, replacing the selection first.
    InsertText(String),
    /// Split the current block at the caret.
    InsertParagraph,
    /// Delete the selection, or one position before the caret.
    DeleteBackward,
    /// Delete the selection, or one position after the caret.
    DeleteForward,
    /// Insert external text. Markup payloads are reduced to their text
    /// content; newlines become paragraph breaks.
    Paste(String),
    Undo,
    Redo,
}
