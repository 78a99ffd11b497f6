/*!
 * # Editing Core Module
 *
 * Live formatting for a rich-text surface: the user types lightweight markup
 * and the tree is rewritten on the spot while the caret keeps its perceived
 * position.
 *
 * ## Architecture Overview
 *
 * ### 1. Arena Document
 * - Blocks live in slots addressed by a stable **`BlockId`**; an order vector
 *   gives document order
 * - Replacing a block reuses its slot, so ids held by the caret survive rewrites
 * - Heading bodies start with an **anchor sentinel** (U+200B); styled spans are
 *   followed by an **exit sentinel** so the caret can leave them
 *
 * ### 2. Two Coordinate Systems
 * - **Absolute offsets** count perceived chars in reading order; sentinels are
 *   invisible, breaks and block separators count one
 * - **Locations** point at a block, a slot inside it, a span path and a raw
 *   char offset
 * - `position` converts between the two and synthesizes landing runs when
 *   needed
 *
 * ### 3. Raw Edit, Then Settle
 * - `commands` applies what the host's editable region would do by itself
 * - `Editor::settle` runs afterwards and tries the formatting rules in order:
 *   broken heading revert, paragraph to heading, paragraph to list, inline style
 * - While a ranged selection is active, settling is held back
 *
 * ### 4. List Surgery
 * - `lists` indents and outdents items on a cloned container and writes it
 *   back only on success
 *
 * ### 5. Snapshot History
 * - Every settle, indent and outdent records a `{before, after}` pair of deep
 *   copies; undo and redo swap whole documents
 *
 * ## Usage Pattern
 *
 * ```rust
 * use markdown_live_engine::editing::*;
 *
 * let mut editor = Editor::new();
 * editor.type_text("# Hello");
 * assert!(matches!(
 *     editor.document().blocks().next(),
 *     Some((_, Block::Heading { level: 1, .. }))
 * ));
 * assert_eq!(editor.caret_offset(), 7);
 *
 * editor.undo();
 * assert_eq!(editor.markup(), "# Hell");
 * ```
 */

pub mod block_transform;
pub mod commands;
pub mod document;
pub mod editor;
pub mod error;
pub mod history;
pub mod inline_style;
pub mod inlines;
pub mod lists;
pub mod location;
pub mod patch;
pub mod position;

// Public API re-exports
pub use commands::RawEdit;
pub use document::{
    Block, BlockId, Document, Inline, ListChild, ListContainer, ListItem, ListKind, ListNode,
    SENTINEL, Style, format_outline,
};
pub use editor::{DEFAULT_HISTORY_LIMIT, Editor, EditorOptions, Selection};
pub use error::EditError;
pub use history::{History, Snapshot};
pub use lists::ItemTarget;
pub use location::{ItemPath, Location, Slot};
pub use patch::{Patch, Transform};
pub use position::{document_len, locate, to_absolute, to_structural};
