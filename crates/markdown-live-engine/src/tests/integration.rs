use super::*;
use crate::editing::{Block, ListKind, RawEdit, Transform, format_outline};
use crate::io::{self, SessionState};

#[test]
fn user_workflow_write_outline_from_scratch() {
    // Given a fresh session
    let mut editor = Editor::new();

    // When the user types a heading, a list and a nested item
    editor.type_text("# Plan");
    editor.edit(RawEdit::SplitBlock);
    editor.type_text("- first");
    editor.edit(RawEdit::SplitBlock);
    editor.type_text("second");
    assert!(editor.indent());

    // Then the tree reflects every rewrite
    insta::assert_snapshot!(format_outline(editor.document()), @r#"
    Heading(1) "<s>Plan"
    List(Unordered)
      - "first"
        List(Unordered)
          - "second"
    "#);
    assert_eq!(editor.markup(), "# Plan\n\n- first\n  - second");
    assert_eq!(editor.caret_offset(), 19);
}

#[test]
fn user_workflow_save_and_resume_session() {
    // Given a session with a styled paragraph
    let dir = create_state_dir();
    let path = dir.path().join("session.toml");
    let mut editor = editor_at("", 0);
    editor.type_text("note **b");
    editor.type_text(" done");
    assert_eq!(editor.markup(), "note **b** done");

    // When it is saved and restored
    io::save_state(&path, &editor.state()).unwrap();
    let state = io::load_state(&path).unwrap().unwrap();
    let mut resumed = Editor::from_state(&state, EditorOptions::default());

    // Then the caret is where it was and editing continues
    assert_eq!(resumed.caret_offset(), editor.caret_offset());
    resumed.type_text("!");
    assert_eq!(resumed.markup(), "note **b** done!");
}

#[test]
fn user_workflow_corrupt_state_is_reported() {
    let dir = create_state_dir();
    let path = create_state_file(&dir, "session.toml", "markup = [");

    let result = io::load_state(&path);

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("session.toml"));
}

#[test]
fn user_workflow_undo_whole_session() {
    // Given a few formatting steps
    let mut editor = editor_at("", 0);
    editor.type_text("1. a");
    let steps = editor.history().undo_len();

    // When everything is undone
    for _ in 0..steps {
        assert!(editor.undo());
    }

    // Then the document is back to its empty start
    assert!(!editor.undo());
    assert_eq!(editor.markup(), "");
    assert_eq!(
        editor.state(),
        SessionState {
            markup: String::new(),
            caret: 0
        }
    );

    // And redoing it all restores the list
    while editor.redo() {}
    assert!(matches!(
        editor.document().blocks().next(),
        Some((_, Block::List(list))) if list.kind == ListKind::Ordered
    ));
}

#[test]
fn user_workflow_heading_backspace_then_retype() {
    let mut editor = editor_at("## Title", 3);

    let reverted = editor.edit(RawEdit::DeleteBackward);
    assert_eq!(reverted.transform, Some(Transform::HeadingReverted { count: 1 }));
    assert_eq!(editor.markup(), "\\#\\#Title");

    let restored = editor.edit(RawEdit::InsertText(" ".into()));
    assert_eq!(restored.transform, Some(Transform::HeadingCreated { level: 2 }));
    assert_eq!(editor.markup(), "## Title");
    assert_eq!(editor.caret_offset(), 3);
}
