//! External value updates: guard suppression and caret preservation.

mod common;

use common::editor_with_recorder;
use core_editor::Editor;
use core_state::Selection;
use pretty_assertions::assert_eq;

#[test]
fn external_value_replaces_content_without_history() {
    let (mut ed, rec) = editor_with_recorder("<p>a</p>");
    ed.sync_value("<p>fresh</p>");
    assert_eq!(ed.committed(), "<p>fresh</p>");
    assert_eq!(ed.state().undo_depth(), 0);
    assert!(!ed.undo());
    assert_eq!(rec.count(), 0, "host-driven changes are not echoed back");
}

#[test]
fn payloads_normalizing_to_committed_are_ignored() {
    let mut ed = Editor::with_defaults("<p>a</p>");
    ed.sync_value("<div>a</div>");
    assert_eq!(ed.committed(), "<p>a</p>");
    assert_eq!(ed.pending_deferred(), 0, "the skip path queues nothing");
}

#[test]
fn focused_editor_keeps_its_caret_offset() {
    let mut ed = Editor::with_defaults("<p>abcdef</p>");
    ed.focus();
    ed.select(3, 3);
    ed.sync_value("<p>ab</p><p>zzzz</p>");
    assert_eq!(ed.selection(), Selection::caret(3));
}

#[test]
fn caret_restore_skips_when_content_is_too_short() {
    let mut ed = Editor::with_defaults("<p>abcdef</p>");
    ed.focus();
    ed.select(6, 6);
    ed.sync_value("<p>ab</p>");
    assert_eq!(ed.selection(), Selection::caret(2));
}

#[test]
fn sync_during_guard_is_dropped() {
    let mut ed = Editor::with_defaults("<p>a</p>");
    ed.select(1, 1);
    ed.insert_text("b");
    ed.tick();
    assert!(ed.undo());
    // The host echoes a change back before the guard clears.
    ed.sync_value("<p>echo</p>");
    assert_eq!(ed.committed(), "<p>a</p>");
    ed.tick();
    ed.sync_value("<p>echo</p>");
    assert_eq!(ed.committed(), "<p>echo</p>");
}

#[test]
fn sync_itself_guards_until_the_next_tick() {
    let mut ed = Editor::with_defaults("<p>a</p>");
    ed.sync_value("<p>b</p>");
    ed.sync_value("<p>c</p>");
    assert_eq!(ed.committed(), "<p>b</p>", "second sync arrives under guard");
    assert_eq!(ed.tick(), 2);
    ed.sync_value("<p>c</p>");
    assert_eq!(ed.committed(), "<p>c</p>");
}

#[test]
fn malformed_payload_falls_back_to_plain_text() {
    let mut ed = Editor::with_defaults("");
    ed.sync_value("<p>a</p><stro");
    assert_eq!(ed.committed(), "<p>&lt;p&gt;a&lt;/p&gt;&lt;stro</p>");
}

#[test]
fn edits_resume_cleanly_after_an_external_load() {
    let (mut ed, rec) = editor_with_recorder("");
    ed.sync_value("<p>ticket body</p>");
    ed.tick();
    ed.select(11, 11);
    ed.insert_text("!");
    ed.tick();
    assert_eq!(ed.committed(), "<p>ticket body!</p>");
    assert_eq!(rec.values(), vec!["<p>ticket body!</p>".to_string()]);
    // The externally loaded value is the undo floor for this session.
    assert!(ed.undo());
    assert_eq!(ed.committed(), "<p>ticket body</p>");
    assert!(!ed.undo());
}
