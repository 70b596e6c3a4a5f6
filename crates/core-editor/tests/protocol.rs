//! Operation protocol and change notification behavior.

mod common;

use common::editor_with_recorder;
use core_editor::Editor;
use pretty_assertions::assert_eq;

#[test]
fn notification_fires_once_per_distinct_change() {
    let (mut ed, rec) = editor_with_recorder("<p>a</p>");
    ed.select(1, 1);
    ed.insert_text("b");
    ed.tick();
    assert_eq!(rec.values(), vec!["<p>ab</p>".to_string()]);
    ed.tick();
    assert_eq!(rec.count(), 1, "a redundant tick must not re-notify");
}

#[test]
fn keystrokes_coalesce_into_one_commit_per_tick() {
    let (mut ed, rec) = editor_with_recorder("");
    ed.insert_text("a");
    ed.insert_text("b");
    ed.tick();
    assert_eq!(rec.values(), vec!["<p>ab</p>".to_string()]);
}

#[test]
fn caret_mark_toggle_notifies_nothing() {
    let (mut ed, rec) = editor_with_recorder("<p>a</p>");
    ed.select(1, 1);
    ed.toggle_bold();
    ed.tick();
    assert_eq!(rec.count(), 0);
    assert_eq!(ed.committed(), "<p>a</p>");
    assert!(ed.format().bold, "pending marks still color the format state");
}

#[test]
fn normalizing_surface_forms_commit_to_the_empty_string() {
    let (mut ed, rec) = editor_with_recorder("<p>a</p>");
    ed.select(0, 1);
    ed.delete_backward();
    ed.tick();
    assert_eq!(rec.values(), vec![String::new()]);
    assert_eq!(ed.committed(), "");
}

#[test]
fn empty_surface_sentinels_normalize_on_construction() {
    assert_eq!(Editor::with_defaults("<br>").committed(), "");
    assert_eq!(Editor::with_defaults("<p><br/></p>").committed(), "");
    assert_eq!(Editor::with_defaults("<p>   </p>").committed(), "");
}

#[test]
fn selection_restored_for_toolbar_operations() {
    let (mut ed, _rec) = editor_with_recorder("<p>hello</p>");
    ed.select(0, 5);
    // Clicking a toolbar control blurs the surface; the saved selection is
    // what the operation must act on.
    ed.blur();
    ed.toggle_bold();
    ed.tick();
    assert_eq!(ed.committed(), "<p><strong>hello</strong></p>");
    assert!(ed.is_focused());
}

#[test]
fn guard_suppresses_stale_resync_after_undo() {
    let (mut ed, rec) = editor_with_recorder("<p>a</p>");
    ed.select(1, 1);
    ed.insert_text("b");
    ed.tick();
    assert_eq!(rec.values(), vec!["<p>ab</p>".to_string()]);

    // An uncommitted keystroke is still in flight when undo runs; its
    // queued resync must not commit the undone-over content.
    ed.insert_text("c");
    assert!(ed.undo());
    assert_eq!(rec.last(), Some("<p>a</p>".to_string()));
    ed.tick();
    assert_eq!(ed.committed(), "<p>a</p>");
    assert_eq!(rec.count(), 2);

    assert!(ed.redo());
    assert_eq!(ed.committed(), "<p>ab</p>");
}

#[test]
fn undo_notifies_inline_before_any_tick() {
    let (mut ed, rec) = editor_with_recorder("<p>a</p>");
    ed.select(1, 1);
    ed.insert_text("b");
    ed.tick();
    ed.undo();
    assert_eq!(rec.last(), Some("<p>a</p>".to_string()));
}

#[test]
fn structural_toggles_round_trip_through_the_facade() {
    let (mut ed, _rec) = editor_with_recorder("<p>ab</p>");
    ed.select(0, 2);
    ed.toggle_quote();
    ed.tick();
    assert_eq!(ed.committed(), "<blockquote><p>ab</p></blockquote>");
    ed.toggle_quote();
    ed.tick();
    assert_eq!(ed.committed(), "<p>ab</p>");
}

#[test]
fn list_toggle_converts_and_reverts() {
    let (mut ed, _rec) = editor_with_recorder("<p>a</p><p>b</p>");
    ed.select(0, 2);
    ed.toggle_bulleted();
    ed.tick();
    assert_eq!(ed.committed(), "<ul><li>a</li><li>b</li></ul>");
    ed.toggle_bulleted();
    ed.tick();
    assert_eq!(ed.committed(), "<p>a</p><p>b</p>");
}

#[test]
fn paste_is_stripped_and_split_into_paragraphs() {
    let (mut ed, _rec) = editor_with_recorder("");
    ed.paste("<p>one <strong>bold</strong></p><p>two</p>");
    ed.tick();
    assert_eq!(ed.committed(), "<p>one bold</p><p>two</p>");
}
