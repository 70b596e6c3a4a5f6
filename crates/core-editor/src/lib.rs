//! Host-facing editor facade.
//!
//! `Editor` ties the workspace together for one editing surface: it owns the
//! `EditorState`, the shortcut map, the loaded configuration, and the
//! deferred-work queue. Hosts drive it with discrete calls (operations,
//! `select`, `handle_key`, `sync_value`) and flush deferred work with
//! `tick()` once per host frame.
//!
//! Every operation follows one protocol: ensure the surface has focus,
//! restore the most recently saved selection (it is lost whenever a toolbar
//! control or dialog takes focus), apply the mutation, save the resulting
//! selection, and schedule a deferred resync. The resync serializes and
//! commits the document and notifies the host of each distinct committed
//! value exactly once.
//!
//! Undo, redo, and external value updates replace content directly. They run
//! under a reentrancy guard so the replacement is not mistaken for a user
//! edit; the guard is cleared by a zero-delay deferred task on the next
//! `tick()`, and `commit_surface`/`sync_value` are skipped while it is set.

use core_actions::{Command, DispatchOutcome, dispatch};
use core_config::Config;
use core_doc::{BlockKind, Mark};
use core_keymap::{KeyInput, Shortcut, ShortcutMap};
use core_state::{EditorState, FormatState, Selection};
use tracing::{debug, trace, warn};

mod dialog;
mod queue;

pub use dialog::{DialogState, LinkDraft};

use queue::{DeferredQueue, Task};

/// Change callback implemented by the host. Called with each distinct
/// committed value, exactly once per change.
pub trait HostNotifier {
    fn value_changed(&mut self, value: &str);
}

/// Notifier for hosts that poll `committed()` instead of subscribing.
pub struct NoopNotifier;

impl HostNotifier for NoopNotifier {
    fn value_changed(&mut self, _value: &str) {}
}

pub struct Editor {
    state: EditorState,
    config: Config,
    keymap: ShortcutMap,
    notifier: Box<dyn HostNotifier>,
    queue: DeferredQueue,
    guard: bool,
    focused: bool,
    link_dialog: Option<LinkDraft>,
}

impl Editor {
    pub fn new(initial: &str, mut config: Config, notifier: Box<dyn HostNotifier>) -> Self {
        config.apply_limits();
        let mut state = EditorState::from_value(initial);
        state.set_history_capacity(config.effective_history_capacity);
        Self {
            state,
            config,
            keymap: ShortcutMap::new(),
            notifier,
            queue: DeferredQueue::new(),
            guard: false,
            focused: false,
            link_dialog: None,
        }
    }

    /// Editor with default configuration and no change subscriber.
    pub fn with_defaults(initial: &str) -> Self {
        Self::new(initial, Config::default(), Box::new(NoopNotifier))
    }

    pub fn committed(&self) -> &str {
        self.state.committed()
    }

    pub fn format(&self) -> FormatState {
        self.state.format()
    }

    pub fn selection(&self) -> Selection {
        self.state.selection()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// The placeholder shows only while the document is empty and the
    /// surface is unfocused.
    pub fn placeholder_visible(&self) -> bool {
        self.state.committed().is_empty() && !self.focused
    }

    pub fn pending_deferred(&self) -> usize {
        self.queue.len()
    }

    pub fn focus(&mut self) {
        if !self.focused {
            self.focused = true;
            trace!(target: "editor.sync", "focused");
        }
    }

    pub fn blur(&mut self) {
        if self.focused {
            self.focused = false;
            trace!(target: "editor.sync", "blurred");
        }
    }

    /// Record a selection reported by the host surface. The saved slot is
    /// what operations restore after focus moves to a toolbar control.
    pub fn select(&mut self, anchor: usize, head: usize) {
        self.state.set_selection(Selection::range(anchor, head));
        self.state.save_selection();
    }

    pub fn toggle_bold(&mut self) {
        self.run_operation(Command::ToggleMark(Mark::Bold));
    }

    pub fn toggle_italic(&mut self) {
        self.run_operation(Command::ToggleMark(Mark::Italic));
    }

    pub fn toggle_underline(&mut self) {
        self.run_operation(Command::ToggleMark(Mark::Underline));
    }

    pub fn toggle_bulleted(&mut self) {
        self.run_operation(Command::ToggleBlock(BlockKind::Bulleted));
    }

    pub fn toggle_numbered(&mut self) {
        self.run_operation(Command::ToggleBlock(BlockKind::Numbered));
    }

    pub fn toggle_quote(&mut self) {
        self.run_operation(Command::ToggleQuote);
    }

    pub fn insert_text(&mut self, text: &str) {
        self.run_operation(Command::InsertText(text.to_string()));
    }

    pub fn insert_paragraph(&mut self) {
        self.run_operation(Command::InsertParagraph);
    }

    pub fn delete_backward(&mut self) {
        self.run_operation(Command::DeleteBackward);
    }

    pub fn delete_forward(&mut self) {
        self.run_operation(Command::DeleteForward);
    }

    /// Insert clipboard content as plain text, truncating payloads over the
    /// configured cap.
    pub fn paste(&mut self, payload: &str) {
        let payload = self.cap_paste(payload);
        self.run_operation(Command::Paste(payload));
    }

    pub fn undo(&mut self) -> bool {
        self.run_operation(Command::Undo).changed
    }

    pub fn redo(&mut self) -> bool {
        self.run_operation(Command::Redo).changed
    }

    /// Resolve a key chord and run its operation. Returns true when the
    /// chord was consumed; the host suppresses its default handling then.
    pub fn handle_key(&mut self, input: KeyInput) -> bool {
        let Some(shortcut) = self.keymap.resolve(input) else {
            return false;
        };
        match shortcut {
            Shortcut::Bold => self.toggle_bold(),
            Shortcut::Italic => self.toggle_italic(),
            Shortcut::Underline => self.toggle_underline(),
            Shortcut::Link => self.open_link_dialog(),
            Shortcut::Undo => {
                self.undo();
            }
            Shortcut::Redo => {
                self.redo();
            }
        }
        true
    }

    /// Open the link dialog, capturing the current selection and pre-filling
    /// the draft text with the selected text.
    pub fn open_link_dialog(&mut self) {
        self.focus();
        self.state.restore_saved_selection();
        let selection = self.state.selection();
        self.state.save_selection();
        let text = self
            .state
            .doc
            .text_in_range(selection.start(), selection.end());
        trace!(target: "editor.sync", prefilled = !text.is_empty(), "link_dialog_opened");
        self.link_dialog = Some(LinkDraft::new(selection, text));
    }

    pub fn link_draft(&self) -> Option<&LinkDraft> {
        self.link_dialog.as_ref()
    }

    /// Replace the draft fields while the dialog is open.
    pub fn update_link_draft(&mut self, url: &str, text: &str) {
        if let Some(draft) = self.link_dialog.as_mut() {
            draft.url = url.to_string();
            draft.text = text.to_string();
        }
    }

    /// Validate the draft and apply it at the captured selection. An empty
    /// URL keeps the dialog open; a scheme outside the configured allowlist
    /// is rejected and keeps it open. Scheme-less input is promoted to
    /// `https://`.
    pub fn confirm_link_dialog(&mut self) -> DialogState {
        let Some(draft) = self.link_dialog.take() else {
            return DialogState::Closed;
        };
        if draft.url.trim().is_empty() {
            trace!(target: "editor.sync", "link_confirm_empty_url");
            self.link_dialog = Some(draft);
            return DialogState::Open;
        }
        let url = dialog::ensure_scheme(draft.url.trim());
        let scheme = dialog::scheme_of(&url).unwrap_or("");
        if !self.config.allows_scheme(scheme) {
            warn!(target: "editor.sync", scheme, "link_scheme_rejected");
            self.link_dialog = Some(draft);
            return DialogState::Open;
        }
        let text = Some(draft.text.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        self.state.set_selection(draft.selection);
        self.state.save_selection();
        self.run_operation(Command::ApplyLink { url, text });
        DialogState::Closed
    }

    /// Discard the draft and return focus to the surface without mutating.
    pub fn cancel_link_dialog(&mut self) {
        if self.link_dialog.take().is_some() {
            self.focus();
            self.state.restore_saved_selection();
            trace!(target: "editor.sync", "link_dialog_cancelled");
        }
    }

    pub fn remove_link(&mut self) {
        self.run_operation(Command::RemoveLink);
    }

    /// Apply a host-driven value change. Skipped while an internally
    /// originated update is being applied, and when the payload normalizes
    /// to the committed value. A focused editor keeps its caret at the same
    /// linear offset when the new content is long enough.
    pub fn sync_value(&mut self, incoming: &str) {
        if self.guard {
            trace!(target: "editor.sync", "sync_value_skipped_guard");
            return;
        }
        if core_state::normalize_value(incoming) == self.state.committed() {
            trace!(target: "editor.sync", "sync_value_unchanged");
            return;
        }
        let caret = self.focused.then(|| self.state.selection().start());
        self.guard = true;
        self.state.load_value(incoming);
        if let Some(offset) = caret {
            if offset <= self.state.char_len() {
                self.state.set_selection(Selection::caret(offset));
            } else {
                debug!(
                    target: "editor.sync",
                    offset,
                    len = self.state.char_len(),
                    "caret_restore_skipped"
                );
            }
            self.state.save_selection();
        }
        self.queue.push(Task::ClearGuard);
        self.queue.push(Task::RecomputeFormat);
        debug!(target: "editor.sync", len = incoming.len(), "external_value_applied");
    }

    /// Flush deferred work in FIFO order. Returns the number of tasks run.
    pub fn tick(&mut self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.queue.pop() {
            ran += 1;
            match task {
                Task::Resync => self.resync(),
                Task::ClearGuard => {
                    self.guard = false;
                    trace!(target: "editor.sync", "guard_cleared");
                }
                Task::RecomputeFormat => self.state.refresh_format(),
            }
        }
        ran
    }

    fn run_operation(&mut self, command: Command) -> DispatchOutcome {
        self.focus();
        self.state.restore_saved_selection();
        let direct = matches!(command, Command::Undo | Command::Redo);
        if direct {
            self.guard = true;
            trace!(target: "editor.sync", "guard_set");
        }
        let outcome = dispatch(command, &mut self.state);
        self.state.save_selection();
        if direct {
            if outcome.changed {
                let value = self.state.committed().to_string();
                self.notifier.value_changed(&value);
            }
            self.queue.push(Task::ClearGuard);
            self.queue.push(Task::RecomputeFormat);
        } else {
            self.queue.push(Task::Resync);
        }
        outcome
    }

    fn resync(&mut self) {
        if self.guard {
            trace!(target: "editor.sync", "resync_skipped_guard");
            return;
        }
        if let Some(value) = self.state.commit_surface() {
            debug!(target: "editor.sync", len = value.len(), "content_committed");
            self.notifier.value_changed(&value);
        }
        self.state.refresh_format();
    }

    fn cap_paste(&self, payload: &str) -> String {
        let max = self.config.effective_paste_max;
        let chars = payload.chars().count();
        if chars <= max {
            return payload.to_string();
        }
        warn!(target: "editor.sync", chars, max, "paste_truncated");
        payload.chars().take(max).collect()
    }
}
