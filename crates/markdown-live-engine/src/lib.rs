pub mod convert;
pub mod editing;
pub mod io;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use convert::{markup_from_tree, tree_from_markup};
pub use editing::{
    Block, BlockId, Document, EditError, Editor, EditorOptions, Inline, ListKind, Location,
    Patch, RawEdit, Style, Transform,
};
pub use io::*;
