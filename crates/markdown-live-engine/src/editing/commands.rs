//! Raw edits: what a host's editable region does on its own before any
//! formatting rule looks at the result.

use crate::editing::document::{Block, BlockId, Document, Inline, SENTINEL};
use crate::editing::error::EditError;
use crate::editing::inlines;
use crate::editing::lists;
use crate::editing::location::{Location, Slot};
use crate::editing::position;

/// Direct input applied at the caret
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEdit {
    /// Insert text at the caret; `'\n'` splits the block
    InsertText(String),
    /// Backspace
    DeleteBackward,
    /// Delete
    DeleteForward,
    /// Hard break inside the block
    InsertLineBreak,
    /// Enter
    SplitBlock,
}

/// Apply a raw edit at `caret`.
///
/// Returns the caret after the edit, or `None` when the edit had nothing to do
/// (backspace at the very start of the document, for example).
pub fn apply(
    doc: &mut Document,
    caret: &Location,
    edit: &RawEdit,
) -> Result<Option<Location>, EditError> {
    let caret = editable(doc, caret)?;
    match edit {
        RawEdit::InsertText(text) => insert_text(doc, &caret, text).map(Some),
        RawEdit::DeleteBackward => delete_backward(doc, &caret),
        RawEdit::DeleteForward => delete_forward(doc, &caret),
        RawEdit::InsertLineBreak => insert_line_break(doc, &caret).map(Some),
        RawEdit::SplitBlock => split_block(doc, &caret).map(Some),
    }
}

/// Delete everything between two locations in the same slot.
///
/// Returns `None` when the locations are in different slots.
pub fn delete_range(
    doc: &mut Document,
    from: &Location,
    to: &Location,
) -> Result<Option<Location>, EditError> {
    if from.block != to.block || from.slot != to.slot {
        return Ok(None);
    }
    let a = raw_of(doc, from)?;
    let b = raw_of(doc, to)?;
    let (start, end) = (a.min(b), a.max(b));
    let seq = slot_mut(doc, from)?;
    for _ in start..end {
        inlines::remove_raw_char(seq, start);
    }
    inlines::normalize(seq);
    caret_at_raw(doc, from, start).map(Some)
}

/// The marker is never edited; input there goes to the start of the body
fn editable(doc: &mut Document, caret: &Location) -> Result<Location, EditError> {
    if caret.slot == Slot::Marker {
        return position::start_of_slot(doc, caret.block, &Slot::Body)
            .ok_or(EditError::UnresolvedLocation);
    }
    raw_of(doc, caret)?;
    Ok(caret.clone())
}

fn slot_mut<'a>(doc: &'a mut Document, caret: &Location) -> Result<&'a mut Vec<Inline>, EditError> {
    doc.inlines_mut(caret.block, &caret.slot)
        .ok_or(EditError::UnresolvedLocation)
}

fn raw_of(doc: &Document, caret: &Location) -> Result<usize, EditError> {
    doc.inlines(caret.block, &caret.slot)
        .and_then(|seq| inlines::raw_index(seq, &caret.path, caret.offset))
        .ok_or(EditError::UnresolvedLocation)
}

fn is_heading_body(doc: &Document, caret: &Location) -> bool {
    caret.slot == Slot::Body && matches!(doc.block(caret.block), Some(Block::Heading { .. }))
}

/// Location of a raw offset in the caret's slot, adding an empty anchor run
/// when no text run covers it
fn caret_at_raw(doc: &mut Document, caret: &Location, raw: usize) -> Result<Location, EditError> {
    let seq = slot_mut(doc, caret)?;
    if let Some((path, offset)) = inlines::location_for_raw(seq, raw) {
        return Ok(Location::new(caret.block, caret.slot.clone(), path, offset));
    }
    let mut seen = 0;
    let mut index = seq.len();
    for (candidate, inline) in seq.iter().enumerate() {
        if seen >= raw {
            index = candidate;
            break;
        }
        seen += inlines::raw_len(std::slice::from_ref(inline));
    }
    seq.insert(index, Inline::Text(String::new()));
    Ok(Location::new(caret.block, caret.slot.clone(), vec![index], 0))
}

fn start_of(doc: &mut Document, block: BlockId) -> Result<Location, EditError> {
    position::start_of_block(doc, block).ok_or(EditError::UnresolvedLocation)
}

fn insert_text(doc: &mut Document, caret: &Location, text: &str) -> Result<Location, EditError> {
    let mut caret = caret.clone();
    for (index, part) in text.split('\n').enumerate() {
        if index > 0 {
            caret = split_block(doc, &caret)?;
        }
        if !part.is_empty() {
            caret = insert_plain(doc, &caret, part)?;
        }
    }
    Ok(caret)
}

fn insert_plain(doc: &mut Document, caret: &Location, text: &str) -> Result<Location, EditError> {
    let caret = step_over_exit(doc, caret)?;
    let run = slot_mut(doc, &caret)
        .ok()
        .and_then(|seq| inlines::text_at_mut(seq, &caret.path))
        .ok_or(EditError::UnresolvedLocation)?;
    let byte = inlines::char_to_byte(run, caret.offset);
    run.insert_str(byte, text);
    Ok(Location {
        offset: caret.offset + text.chars().count(),
        ..caret
    })
}

/// Typing at the end of a span that is followed by its exit sentinel goes
/// after the sentinel, outside the span.
fn step_over_exit(doc: &Document, caret: &Location) -> Result<Location, EditError> {
    let seq = doc
        .inlines(caret.block, &caret.slot)
        .ok_or(EditError::UnresolvedLocation)?;
    let run_end = inlines::text_at(seq, &caret.path)
        .is_some_and(|run| run.chars().count() == caret.offset);
    if caret.path.len() < 2 || !run_end {
        return Ok(caret.clone());
    }
    let raw = raw_of(doc, caret)?;
    if inlines::raw_char_at(seq, raw) != Some(SENTINEL) {
        return Ok(caret.clone());
    }
    Ok(inlines::location_for_raw(seq, raw + 1)
        .map(|(path, offset)| Location::new(caret.block, caret.slot.clone(), path, offset))
        .unwrap_or_else(|| caret.clone()))
}

fn delete_backward(doc: &mut Document, caret: &Location) -> Result<Option<Location>, EditError> {
    let raw = raw_of(doc, caret)?;
    if raw == 0 {
        return backspace_at_slot_start(doc, caret);
    }
    let heading = is_heading_body(doc, caret);
    let seq = slot_mut(doc, caret)?;

    let target = if heading && raw == 1 && inlines::raw_char_at(seq, 0) == Some(SENTINEL) {
        // the anchor goes; the heading is reverted on the next settle
        inlines::remove_raw_char(seq, 0);
        0
    } else if inlines::raw_char_at(seq, raw - 1) == Some(SENTINEL) {
        inlines::remove_raw_char(seq, raw - 1);
        let floor = usize::from(heading);
        if raw >= 2 + floor {
            inlines::remove_raw_char(seq, raw - 2);
            raw - 2
        } else {
            raw - 1
        }
    } else {
        inlines::remove_raw_char(seq, raw - 1);
        raw - 1
    };
    inlines::normalize(seq);
    caret_at_raw(doc, caret, target).map(Some)
}

fn backspace_at_slot_start(
    doc: &mut Document,
    caret: &Location,
) -> Result<Option<Location>, EditError> {
    if let Slot::Item(path) = &caret.slot {
        let target = lists::outdent(doc, caret.block, path)?;
        return Ok(Some(lists::carry_caret(doc, caret, path, &target)));
    }
    if matches!(doc.block(caret.block), Some(Block::Paragraph(_))) {
        return merge_into_previous(doc, caret);
    }
    Ok(None)
}

/// Append the caret's paragraph to the last slot of the block before it
fn merge_into_previous(
    doc: &mut Document,
    caret: &Location,
) -> Result<Option<Location>, EditError> {
    let index = doc
        .position(caret.block)
        .ok_or(EditError::BlockNotFound(caret.block))?;
    let Some(previous) = index.checked_sub(1).and_then(|i| doc.id_at(i)) else {
        return Ok(None);
    };
    let Some(slot) = doc.slots(previous).pop() else {
        return Ok(None);
    };
    let Some(Block::Paragraph(moved)) = doc.block(caret.block).cloned() else {
        return Ok(None);
    };

    let target = doc
        .inlines_mut(previous, &slot)
        .ok_or(EditError::UnresolvedLocation)?;
    let join = inlines::raw_len(target);
    target.extend(moved);
    inlines::normalize(target);
    doc.remove(caret.block);

    let landing = Location::new(previous, slot, Vec::new(), 0);
    caret_at_raw(doc, &landing, join).map(Some)
}

fn delete_forward(doc: &mut Document, caret: &Location) -> Result<Option<Location>, EditError> {
    let raw = raw_of(doc, caret)?;
    let heading = is_heading_body(doc, caret);
    let seq = slot_mut(doc, caret)?;
    let len = inlines::raw_len(seq);
    if raw >= len {
        return merge_next(doc, caret);
    }

    if inlines::raw_char_at(seq, raw) == Some(SENTINEL) {
        // the sentinel goes together with the visible char after it
        if raw + 1 < len {
            inlines::remove_raw_char(seq, raw + 1);
        }
        if !(heading && raw == 0) {
            inlines::remove_raw_char(seq, raw);
        }
    } else {
        inlines::remove_raw_char(seq, raw);
    }
    inlines::normalize(seq);
    caret_at_raw(doc, caret, raw).map(Some)
}

/// Pull a following paragraph into the caret's slot when it is the block's last
fn merge_next(doc: &mut Document, caret: &Location) -> Result<Option<Location>, EditError> {
    if doc.slots(caret.block).last() != Some(&caret.slot) {
        return Ok(None);
    }
    let index = doc
        .position(caret.block)
        .ok_or(EditError::BlockNotFound(caret.block))?;
    let Some(next) = doc.id_at(index + 1) else {
        return Ok(None);
    };
    let Some(Block::Paragraph(moved)) = doc.block(next).cloned() else {
        return Ok(None);
    };

    let raw = raw_of(doc, caret)?;
    let target = slot_mut(doc, caret)?;
    target.extend(moved);
    inlines::normalize(target);
    doc.remove(next);
    caret_at_raw(doc, caret, raw).map(Some)
}

fn insert_line_break(doc: &mut Document, caret: &Location) -> Result<Location, EditError> {
    let (index, prefix) = caret
        .path
        .split_last()
        .ok_or(EditError::UnresolvedLocation)?;
    let seq = slot_mut(doc, caret)?;
    let parent = inlines::children_mut(seq, prefix).ok_or(EditError::UnresolvedLocation)?;
    let Some(Inline::Text(text)) = parent.get_mut(*index) else {
        return Err(EditError::UnresolvedLocation);
    };
    let tail = text.split_off(inlines::char_to_byte(text, caret.offset));
    parent.splice(
        index + 1..index + 1,
        [Inline::LineBreak, Inline::Text(tail)],
    );

    let mut path = prefix.to_vec();
    path.push(index + 2);
    Ok(Location::new(caret.block, caret.slot.clone(), path, 0))
}

fn split_block(doc: &mut Document, caret: &Location) -> Result<Location, EditError> {
    let raw = raw_of(doc, caret)?;
    let block = doc
        .block(caret.block)
        .cloned()
        .ok_or(EditError::BlockNotFound(caret.block))?;

    match (block, &caret.slot) {
        (Block::Paragraph(content), Slot::Body) => {
            let (head, tail) = split_normalized(&content, raw);
            doc.replace(caret.block, Block::Paragraph(head));
            let next = doc
                .insert_after(caret.block, Block::Paragraph(tail))
                .ok_or(EditError::BlockNotFound(caret.block))?;
            start_of(doc, next)
        }
        (Block::Heading { level, body }, Slot::Body) => {
            // the anchor always stays with the heading
            let (head, tail) = split_normalized(&body, raw.max(1));
            doc.replace(caret.block, Block::Heading { level, body: head });
            let next = doc
                .insert_after(caret.block, Block::Paragraph(tail))
                .ok_or(EditError::BlockNotFound(caret.block))?;
            start_of(doc, next)
        }
        (Block::List(list), Slot::Item(path)) => {
            let item = list
                .item(&path.0)
                .ok_or_else(|| EditError::NotAListItem(path.clone()))?;
            if inlines::perceived_len(&item.content) == 0 && item.sublist.is_none() {
                let target = lists::outdent(doc, caret.block, path)?;
                return Ok(lists::carry_caret(doc, caret, path, &target));
            }
            let new_path = lists::split_item(doc, caret.block, path, raw)?;
            position::start_of_slot(doc, caret.block, &Slot::Item(new_path))
                .ok_or(EditError::UnresolvedLocation)
        }
        _ => Err(EditError::UnresolvedLocation),
    }
}

fn split_normalized(seq: &[Inline], at: usize) -> (Vec<Inline>, Vec<Inline>) {
    let (mut head, mut tail) = inlines::split_at_raw(seq, at);
    inlines::normalize(&mut head);
    inlines::normalize(&mut tail);
    (head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::document::{ListKind, Style, format_outline};
    use crate::editing::location::ItemPath;
    use crate::editing::position::{to_absolute, to_structural};
    use pretty_assertions::assert_eq;

    fn at(blocks: Vec<Block>, abs: usize) -> (Document, Location) {
        let mut doc = Document::from_blocks(blocks);
        let caret = to_structural(&mut doc, abs);
        (doc, caret)
    }

    fn run(doc: &mut Document, caret: &Location, edit: RawEdit) -> Option<Location> {
        apply(doc, caret, &edit).unwrap()
    }

    #[test]
    fn test_insert_text_advances_caret() {
        let (mut doc, caret) = at(vec![Block::paragraph("ac")], 1);

        let caret = run(&mut doc, &caret, RawEdit::InsertText("b".into())).unwrap();

        assert_eq!(doc, Document::from_blocks([Block::paragraph("abc")]));
        assert_eq!(to_absolute(&doc, &caret), Some(2));
    }

    #[test]
    fn test_insert_text_with_newline_splits_block() {
        let (mut doc, caret) = at(vec![Block::paragraph("ad")], 1);

        let caret = run(&mut doc, &caret, RawEdit::InsertText("b\nc".into())).unwrap();

        assert_eq!(
            doc,
            Document::from_blocks([Block::paragraph("ab"), Block::paragraph("cd")])
        );
        assert_eq!(to_absolute(&doc, &caret), Some(4));
    }

    #[test]
    fn test_typing_after_fresh_span_leaves_it() {
        let mut doc = Document::from_blocks([Block::Paragraph(vec![
            Inline::span(Style::Bold, vec![Inline::text("b")]),
            Inline::text("\u{200B}"),
        ])]);
        let id = doc.id_at(0).unwrap();
        let caret = Location::body(id, vec![0, 0], 1);

        let caret = run(&mut doc, &caret, RawEdit::InsertText("c".into())).unwrap();

        assert_eq!(
            doc.block(id),
            Some(&Block::Paragraph(vec![
                Inline::span(Style::Bold, vec![Inline::text("b")]),
                Inline::text("\u{200B}c"),
            ]))
        );
        assert_eq!(caret, Location::body(id, vec![1], 2));
    }

    #[test]
    fn test_backspace_removes_previous_char() {
        let (mut doc, caret) = at(vec![Block::paragraph("abc")], 2);
        let caret = run(&mut doc, &caret, RawEdit::DeleteBackward).unwrap();
        assert_eq!(doc, Document::from_blocks([Block::paragraph("ac")]));
        assert_eq!(to_absolute(&doc, &caret), Some(1));
    }

    #[test]
    fn test_backspace_after_anchor_breaks_heading() {
        let (mut doc, caret) = at(vec![Block::heading(1, "")], 2);
        assert_eq!(caret.offset, 1);

        run(&mut doc, &caret, RawEdit::DeleteBackward).unwrap();

        assert_eq!(
            doc,
            Document::from_blocks([Block::Heading {
                level: 1,
                body: vec![Inline::text("")],
            }])
        );
    }

    #[test]
    fn test_backspace_over_exit_sentinel_takes_visible_char() {
        let mut doc = Document::from_blocks([Block::Paragraph(vec![
            Inline::span(Style::Bold, vec![Inline::text("b")]),
            Inline::text("\u{200B}c"),
        ])]);
        let id = doc.id_at(0).unwrap();
        let caret = Location::body(id, vec![1], 1);

        let caret = run(&mut doc, &caret, RawEdit::DeleteBackward).unwrap();

        assert_eq!(doc.block(id), Some(&Block::paragraph("c")));
        assert_eq!(caret, Location::body(id, vec![0], 0));
    }

    #[test]
    fn test_backspace_at_paragraph_start_merges_into_previous() {
        let (mut doc, caret) = at(
            vec![Block::heading(1, "ab"), Block::paragraph("cd")],
            5,
        );

        let caret = run(&mut doc, &caret, RawEdit::DeleteBackward).unwrap();

        assert_eq!(doc, Document::from_blocks([Block::heading(1, "abcd")]));
        assert_eq!(to_absolute(&doc, &caret), Some(4));
    }

    #[test]
    fn test_backspace_at_document_start_is_noop() {
        let (mut doc, caret) = at(vec![Block::paragraph("a")], 0);
        assert_eq!(run(&mut doc, &caret, RawEdit::DeleteBackward), None);
    }

    #[test]
    fn test_backspace_at_item_start_outdents() {
        let (mut doc, caret) = at(vec![Block::list(ListKind::Unordered, &["a", "b"])], 2);

        let caret = run(&mut doc, &caret, RawEdit::DeleteBackward).unwrap();

        assert_eq!(
            doc,
            Document::from_blocks([
                Block::list(ListKind::Unordered, &["a"]),
                Block::paragraph("b"),
            ])
        );
        assert_eq!(to_absolute(&doc, &caret), Some(2));
    }

    #[test]
    fn test_delete_forward_at_end_pulls_next_paragraph() {
        let (mut doc, caret) = at(
            vec![Block::list(ListKind::Ordered, &["a"]), Block::paragraph("b")],
            1,
        );

        let caret = run(&mut doc, &caret, RawEdit::DeleteForward).unwrap();

        assert_eq!(
            doc,
            Document::from_blocks([Block::list(ListKind::Ordered, &["ab"])])
        );
        assert_eq!(caret.slot, Slot::Item(ItemPath::new([0])));
        assert_eq!(to_absolute(&doc, &caret), Some(1));
    }

    #[test]
    fn test_delete_forward_inside_text() {
        let (mut doc, caret) = at(vec![Block::paragraph("abc")], 1);
        run(&mut doc, &caret, RawEdit::DeleteForward).unwrap();
        assert_eq!(doc, Document::from_blocks([Block::paragraph("ac")]));
    }

    #[test]
    fn test_line_break_splits_run() {
        let (mut doc, caret) = at(vec![Block::paragraph("ab")], 1);

        let caret = run(&mut doc, &caret, RawEdit::InsertLineBreak).unwrap();

        assert_eq!(
            doc,
            Document::from_blocks([Block::Paragraph(vec![
                Inline::text("a"),
                Inline::LineBreak,
                Inline::text("b"),
            ])])
        );
        assert_eq!(to_absolute(&doc, &caret), Some(2));
    }

    #[test]
    fn test_enter_in_heading_moves_tail_to_paragraph() {
        let (mut doc, caret) = at(vec![Block::heading(2, "Title")], 6);

        let caret = run(&mut doc, &caret, RawEdit::SplitBlock).unwrap();

        assert_eq!(
            doc,
            Document::from_blocks([Block::heading(2, "Tit"), Block::paragraph("le")])
        );
        assert_eq!(to_absolute(&doc, &caret), Some(7));
    }

    #[test]
    fn test_enter_in_item_adds_sibling() {
        let (mut doc, caret) = at(vec![Block::list(ListKind::Unordered, &["ab"])], 1);

        let caret = run(&mut doc, &caret, RawEdit::SplitBlock).unwrap();

        assert_eq!(
            doc,
            Document::from_blocks([Block::list(ListKind::Unordered, &["a", "b"])])
        );
        assert_eq!(caret.slot, Slot::Item(ItemPath::new([1])));
    }

    #[test]
    fn test_enter_on_empty_item_leaves_list() {
        let (mut doc, caret) = at(vec![Block::list(ListKind::Unordered, &["a", ""])], 2);

        run(&mut doc, &caret, RawEdit::SplitBlock).unwrap();

        insta::assert_snapshot!(format_outline(&doc), @r#"
        List(Unordered)
          - "a"
        Paragraph ""
        "#);
    }

    #[test]
    fn test_marker_caret_edits_body() {
        let mut doc = Document::from_blocks([Block::heading(1, "b")]);
        let id = doc.id_at(0).unwrap();
        let marker = Location::new(id, Slot::Marker, Vec::new(), 1);

        run(&mut doc, &marker, RawEdit::InsertText("a".into())).unwrap();

        assert_eq!(doc, Document::from_blocks([Block::heading(1, "ab")]));
    }

    #[test]
    fn test_delete_range_within_slot() {
        let (mut doc, from) = at(vec![Block::paragraph("abcdef")], 1);
        let to = to_structural(&mut doc, 4);

        let caret = delete_range(&mut doc, &to, &from).unwrap().unwrap();

        assert_eq!(doc, Document::from_blocks([Block::paragraph("aef")]));
        assert_eq!(to_absolute(&doc, &caret), Some(1));
    }

    #[test]
    fn test_delete_range_across_slots_is_refused() {
        let (mut doc, from) = at(vec![Block::paragraph("ab"), Block::paragraph("cd")], 1);
        let to = to_structural(&mut doc, 4);
        assert_eq!(delete_range(&mut doc, &from, &to), Ok(None));
    }

    #[test]
    fn test_unresolved_caret_is_an_error() {
        let mut doc = Document::from_blocks([Block::paragraph("a")]);
        let id = doc.id_at(0).unwrap();
        let bad = Location::body(id, vec![5], 0);
        assert_eq!(
            apply(&mut doc, &bad, &RawEdit::DeleteBackward),
            Err(EditError::UnresolvedLocation)
        );
    }
}
