//! The editing session: one document, its caret, and its undo log.
//!
//! Hosts report direct input with [`Editor::apply_raw_edit`] (or
//! [`Editor::mutate`]) and then call [`Editor::settle`], which looks at the
//! tree only after the raw change is in place. Formatting rules, caret
//! recovery and history recording all happen in `settle`.

use crate::convert;
use crate::editing::block_transform;
use crate::editing::commands::{self, RawEdit};
use crate::editing::document::{Block, Document};
use crate::editing::history::{History, Snapshot};
use crate::editing::inline_style;
use crate::editing::inlines;
use crate::editing::lists::{self, ItemTarget};
use crate::editing::location::Location;
use crate::editing::patch::{Patch, Rewrite};
use crate::editing::position;
use crate::io::SessionState;

pub const DEFAULT_HISTORY_LIMIT: usize = 500;

type Rule = fn(&mut Document, &Location) -> Option<Rewrite>;

/// Formatting rules in the order they are tried. The first one to fire wins.
const RULES: [Rule; 4] = [
    block_transform::revert_broken_headings,
    block_transform::paragraph_to_heading,
    block_transform::paragraph_to_list,
    inline_style::apply_inline_style,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Location,
    pub focus: Location,
}

impl Selection {
    pub fn caret(location: Location) -> Self {
        Self {
            anchor: location.clone(),
            focus: location,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorOptions {
    /// Undo capacity; `None` keeps every entry
    pub history_limit: Option<usize>,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            history_limit: Some(DEFAULT_HISTORY_LIMIT),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Editor {
    document: Document,
    selection: Selection,
    history: History,
    /// Set while a multi-character selection is active
    selecting: bool,
    /// State before the first unsettled raw edit
    pending: Option<Snapshot>,
    /// Last caret offset known to resolve
    last_offset: usize,
    version: u64,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self::with_options(EditorOptions::default())
    }

    pub fn with_options(options: EditorOptions) -> Self {
        Self::from_document(Document::new(), options)
    }

    /// Start a session on `document` with the caret at its very beginning
    pub fn from_document(mut document: Document, options: EditorOptions) -> Self {
        let caret = position::to_structural(&mut document, 0);
        let history = match options.history_limit {
            Some(limit) => History::with_limit(limit),
            None => History::new(),
        };
        Self {
            document,
            selection: Selection::caret(caret),
            history,
            selecting: false,
            pending: None,
            last_offset: 0,
            version: 0,
        }
    }

    pub fn from_markup(markup: &str) -> Self {
        Self::from_document(convert::tree_from_markup(markup), EditorOptions::default())
    }

    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::from_markup(text))
    }

    /// Restore a persisted session. The caret offset is clamped to the document.
    pub fn from_state(state: &SessionState, options: EditorOptions) -> Self {
        let mut editor = Self::from_document(convert::tree_from_markup(&state.markup), options);
        editor.set_caret_offset(state.caret);
        editor
    }

    /// Default first-run document
    pub fn welcome() -> Self {
        let document = Document::from_blocks([
            Block::heading(1, "Welcome"),
            Block::paragraph(
                "Start a line with # for a heading or - for a list. Wrap a word in ** for bold.",
            ),
        ]);
        let mut editor = Self::from_document(document, EditorOptions::default());
        let end = position::document_len(&editor.document);
        editor.set_caret_offset(end);
        editor
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn caret(&self) -> &Location {
        &self.selection.focus
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Absolute offsets of the selection, ordered
    pub fn selection_offsets(&self) -> (usize, usize) {
        let focus = self.caret_offset();
        let anchor = position::to_absolute(&self.document, &self.selection.anchor).unwrap_or(focus);
        (anchor.min(focus), anchor.max(focus))
    }

    pub fn caret_offset(&self) -> usize {
        position::to_absolute(&self.document, self.caret()).unwrap_or(self.last_offset)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_selecting(&self) -> bool {
        self.selecting
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            document: self.document.clone(),
            caret: self.caret_offset(),
        }
    }

    pub fn markup(&self) -> String {
        convert::markup_from_tree(&self.document)
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            markup: self.markup(),
            caret: self.caret_offset(),
        }
    }

    fn capture_pending(&mut self) {
        if self.pending.is_none() {
            self.pending = Some(self.snapshot());
        }
    }

    fn place(&mut self, caret: Location) {
        if let Some(offset) = position::to_absolute(&self.document, &caret) {
            self.last_offset = offset;
        }
        self.selection = Selection::caret(caret);
        self.selecting = false;
    }

    /// Collapse a ranged selection before an edit. Returns `true` when the
    /// deletion of the range already was the whole edit.
    fn collapse_for(&mut self, edit: &RawEdit) -> bool {
        if !self.selecting {
            return false;
        }
        let Selection { anchor, focus } = self.selection.clone();
        match commands::delete_range(&mut self.document, &anchor, &focus) {
            Ok(Some(caret)) => {
                self.place(caret);
                matches!(edit, RawEdit::DeleteBackward | RawEdit::DeleteForward)
            }
            Ok(None) => {
                let a = position::to_absolute(&self.document, &anchor);
                let f = position::to_absolute(&self.document, &focus);
                let earlier = if a < f { anchor } else { focus };
                log::debug!("selection spans slots, collapsing to its earlier end");
                self.place(earlier);
                false
            }
            Err(err) => {
                log::debug!("range delete failed: {err}");
                self.place(focus);
                false
            }
        }
    }

    /// Apply direct input at the caret. Formatting waits for [`Editor::settle`].
    pub fn apply_raw_edit(&mut self, edit: RawEdit) -> bool {
        self.capture_pending();
        if self.collapse_for(&edit) {
            return true;
        }
        let caret = self.ensure_caret();
        match commands::apply(&mut self.document, &caret, &edit) {
            Ok(Some(caret)) => {
                self.place(caret);
                true
            }
            Ok(None) => false,
            Err(err) => {
                log::debug!("{edit:?} ignored: {err}");
                false
            }
        }
    }

    /// Run an arbitrary raw mutation. The closure returns the new caret, or
    /// `None` when it changed nothing.
    pub fn mutate<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&mut Document, &Location) -> Option<Location>,
    {
        self.capture_pending();
        let caret = self.ensure_caret();
        match f(&mut self.document, &caret) {
            Some(caret) => {
                self.place(caret);
                true
            }
            None => false,
        }
    }

    /// Apply one raw edit and settle right away
    pub fn edit(&mut self, edit: RawEdit) -> Patch {
        self.apply_raw_edit(edit);
        self.settle()
    }

    /// Type `text` one char at a time, settling after each
    pub fn type_text(&mut self, text: &str) -> Patch {
        let mut patch = self.idle_patch();
        for c in text.chars() {
            patch = self.edit(RawEdit::InsertText(c.to_string()));
        }
        patch
    }

    fn idle_patch(&self) -> Patch {
        Patch {
            transform: None,
            caret: self.caret_offset(),
            version: self.version,
            recorded: false,
        }
    }

    /// Look at the tree after raw input: fire the first matching formatting
    /// rule, re-derive the caret and record the change.
    pub fn settle(&mut self) -> Patch {
        if self.selecting {
            log::trace!("selection active, settle deferred");
            return self.idle_patch();
        }
        let before = match self.pending.take() {
            Some(before) => before,
            None => self.snapshot(),
        };
        let caret = self.ensure_caret();

        let rewrite = RULES
            .iter()
            .find_map(|rule| rule(&mut self.document, &caret));
        let transform = rewrite.as_ref().map(|rewrite| rewrite.transform);
        if let Some(rewrite) = rewrite {
            log::debug!("settle fired {:?}", rewrite.transform);
            self.place(rewrite.caret);
        }
        let caret = self.ensure_caret();
        self.place(caret);

        let recorded = self.commit(before);
        Patch {
            transform,
            caret: self.caret_offset(),
            version: self.version,
            recorded,
        }
    }

    /// Settle raw input that has not been looked at yet. A tree with nothing
    /// pending is left as it is, even if a rule would match it.
    fn settle_pending(&mut self) {
        if self.pending.is_some() {
            self.settle();
        }
    }

    fn commit(&mut self, before: Snapshot) -> bool {
        let recorded = self.history.record(before, self.snapshot());
        if recorded {
            self.version += 1;
        }
        recorded
    }

    /// The caret if it still resolves, otherwise the start of its block, or
    /// failing that the nearest surviving position.
    fn ensure_caret(&mut self) -> Location {
        let caret = self.caret().clone();
        if position::to_absolute(&self.document, &caret).is_some() {
            return caret;
        }
        let fallback = match position::start_of_block(&mut self.document, caret.block) {
            Some(start) => start,
            None => {
                let end = position::document_len(&self.document);
                position::to_structural(&mut self.document, self.last_offset.min(end))
            }
        };
        log::trace!("caret {caret:?} no longer resolves, using {fallback:?}");
        self.place(fallback.clone());
        fallback
    }

    /// Move the caret. Returns `false` when `caret` was rejected and a
    /// fallback position was used instead.
    pub fn set_caret(&mut self, caret: Location) -> bool {
        if position::to_absolute(&self.document, &caret).is_some() {
            self.place(caret);
            return true;
        }
        self.place(caret);
        self.ensure_caret();
        false
    }

    pub fn set_caret_offset(&mut self, offset: usize) {
        let offset = offset.min(position::document_len(&self.document));
        let caret = position::to_structural(&mut self.document, offset);
        self.place(caret);
    }

    /// Set a selection. A non-collapsed selection holds back formatting until
    /// it collapses again.
    pub fn set_selection(&mut self, anchor: Location, focus: Location) {
        let resolves = |location: &Location| position::to_absolute(&self.document, location);
        match (resolves(&anchor), resolves(&focus)) {
            (Some(a), Some(f)) if a != f => {
                self.last_offset = f;
                self.selection = Selection { anchor, focus };
                self.selecting = true;
            }
            (_, Some(_)) => self.place(focus),
            _ => {
                self.set_caret(focus);
            }
        }
    }

    pub fn set_selection_offsets(&mut self, anchor: usize, focus: usize) {
        let end = position::document_len(&self.document);
        let anchor = position::to_structural(&mut self.document, anchor.min(end));
        let focus = position::to_structural(&mut self.document, focus.min(end));
        self.set_selection(anchor, focus);
    }

    /// Nest the caret's list item under its previous sibling
    pub fn indent(&mut self) -> bool {
        self.settle_pending();
        let caret = self.caret().clone();
        let Some(path) = caret.item_path().cloned() else {
            return false;
        };
        let before = self.snapshot();
        match lists::indent(&mut self.document, caret.block, &path) {
            Ok(Some(new_path)) => {
                let target = ItemTarget::Item {
                    block: caret.block,
                    path: new_path,
                };
                let caret = lists::carry_caret(&mut self.document, &caret, &path, &target);
                self.place(caret);
                self.commit(before)
            }
            Ok(None) => false,
            Err(err) => {
                log::debug!("indent aborted: {err}");
                false
            }
        }
    }

    /// Move the caret's list item one level up
    pub fn outdent(&mut self) -> bool {
        self.settle_pending();
        let caret = self.caret().clone();
        let Some(path) = caret.item_path().cloned() else {
            return false;
        };
        let before = self.snapshot();
        match lists::outdent(&mut self.document, caret.block, &path) {
            Ok(target) => {
                let caret = lists::carry_caret(&mut self.document, &caret, &path, &target);
                self.place(caret);
                self.commit(before)
            }
            Err(err) => {
                log::debug!("outdent aborted: {err}");
                false
            }
        }
    }

    pub fn undo(&mut self) -> bool {
        self.settle_pending();
        match self.history.undo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.settle_pending();
        match self.history.redo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.document = snapshot.document;
        self.pending = None;
        self.set_caret_offset(snapshot.caret);
        self.version += 1;
    }

    /// Insert converted markup at the caret. An empty paragraph under the
    /// caret is replaced, otherwise the blocks go after the caret's block.
    pub fn paste_markup(&mut self, markup: &str) -> bool {
        self.settle_pending();
        let pasted = convert::tree_from_markup(markup);
        let blocks: Vec<Block> = pasted.blocks().map(|(_, block)| block.clone()).collect();
        if blocks.is_empty() {
            return false;
        }
        let before = self.snapshot();
        let current = self.caret().block;
        let empty_paragraph = matches!(
            self.document.block(current),
            Some(Block::Paragraph(content)) if inlines::perceived_len(content) == 0
        );

        let last = if empty_paragraph {
            self.document
                .splice(current, blocks)
                .and_then(|ids| ids.last().copied())
        } else {
            let mut after = Some(current);
            for block in blocks {
                after = after.and_then(|id| self.document.insert_after(id, block));
            }
            after
        };
        let Some(last) = last else {
            log::debug!("paste target {current:?} vanished");
            return false;
        };

        let end = position::block_start(&self.document, last).zip(
            self.document.block(last).map(position::block_len),
        );
        if let Some((start, len)) = end {
            self.set_caret_offset(start + len);
        }
        self.commit(before)
    }

    /// Replace the whole document. History starts over.
    pub fn load_markup(&mut self, markup: &str) {
        self.document = convert::tree_from_markup(markup);
        self.history.clear();
        self.pending = None;
        self.last_offset = 0;
        self.set_caret_offset(0);
        self.version += 1;
    }
}
