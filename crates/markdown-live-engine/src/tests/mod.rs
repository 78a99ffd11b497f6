use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::editing::{Editor, EditorOptions};
use crate::tree_from_markup;

mod integration;

/// Create a temporary directory for session state files
pub fn create_state_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Write a raw state file into the directory
pub fn create_state_file(dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = dir.path().join(filename);
    fs::write(&file_path, content).unwrap();
    file_path
}

/// Session over `markup` with the caret at an absolute offset
pub fn editor_at(markup: &str, caret: usize) -> Editor {
    let mut editor = Editor::from_document(tree_from_markup(markup), EditorOptions::default());
    editor.set_caret_offset(caret);
    editor
}
