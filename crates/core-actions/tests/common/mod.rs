//! Shared helpers for dispatcher integration tests.

#![allow(dead_code)]

use core_actions::Command;
use core_state::{EditorState, Selection};

/// State seeded from markup with the caret at offset zero.
pub fn state_of(markup: &str) -> EditorState {
    EditorState::from_value(markup)
}

/// State seeded from markup with an explicit selection.
pub fn with_selection(markup: &str, anchor: usize, head: usize) -> EditorState {
    let mut state = EditorState::from_value(markup);
    state.set_selection(Selection::range(anchor, head));
    state
}

/// Dispatch one command, then run the commit step the embedding layer
/// performs after dispatch. Returns the newly committed value, if any.
pub fn apply(state: &mut EditorState, command: Command) -> Option<String> {
    core_actions::dispatch(command, state);
    state.commit_surface()
}
