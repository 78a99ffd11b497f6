//! Mapping between absolute caret offsets and structural locations.
//!
//! The absolute offset flattens the document in reading order: each block
//! contributes its perceived length plus one separator unit. Inside a block:
//!
//! - a paragraph is its inline content;
//! - a heading is `level` marker units, one separator unit, then its body;
//! - a list is its items depth-first with one separator unit between items.
//!
//! Sentinels never count. Offsets that fall inside a heading's marker prefix are
//! not reachable by the caret and resolve forward to the start of the body.

use crate::editing::document::{Block, BlockId, Document, Inline, SENTINEL};
use crate::editing::inlines::{self, Run};
use crate::editing::location::{ItemPath, Location, Slot};

/// Perceived layout of one block
#[derive(Debug, Clone)]
pub struct BlockLayout<'a> {
    pub len: usize,
    pub slots: Vec<SlotLayout<'a>>,
}

#[derive(Debug, Clone)]
pub struct SlotLayout<'a> {
    pub slot: Slot,
    /// Perceived start inside the block
    pub start: usize,
    pub len: usize,
    pub runs: Vec<Run<'a>>,
    pub editable: bool,
}

impl SlotLayout<'_> {
    fn covers(&self, inner: usize) -> bool {
        self.start <= inner && inner <= self.start + self.len
    }
}

pub fn layout(block: &Block) -> BlockLayout<'_> {
    match block {
        Block::Paragraph(inlines) => {
            let slot = content_slot(Slot::Body, 0, inlines);
            BlockLayout {
                len: slot.len,
                slots: vec![slot],
            }
        }
        Block::Heading { level, body } => {
            let level = usize::from(*level);
            let marker = SlotLayout {
                slot: Slot::Marker,
                start: 0,
                len: level,
                runs: Vec::new(),
                editable: false,
            };
            let body = content_slot(Slot::Body, level + 1, body);
            BlockLayout {
                len: body.start + body.len,
                slots: vec![marker, body],
            }
        }
        Block::List(list) => {
            let mut slots = Vec::new();
            let mut start = 0;
            for path in list.item_paths() {
                let Some(item) = list.item(&path) else {
                    continue;
                };
                if !slots.is_empty() {
                    start += 1;
                }
                let slot = content_slot(Slot::Item(ItemPath(path)), start, &item.content);
                start += slot.len;
                slots.push(slot);
            }
            BlockLayout { len: start, slots }
        }
    }
}

fn content_slot(slot: Slot, start: usize, inlines: &[Inline]) -> SlotLayout<'_> {
    SlotLayout {
        slot,
        start,
        len: inlines::perceived_len(inlines),
        runs: inlines::runs(inlines),
        editable: true,
    }
}

pub fn block_len(block: &Block) -> usize {
    layout(block).len
}

/// Total perceived length including block separators
pub fn document_len(doc: &Document) -> usize {
    doc.blocks()
        .map(|(_, block)| block_len(block) + 1)
        .sum::<usize>()
        .saturating_sub(1)
}

/// Absolute offset of the first position of a block
pub fn block_start(doc: &Document, id: BlockId) -> Option<usize> {
    let mut start = 0;
    for (candidate, block) in doc.blocks() {
        if candidate == id {
            return Some(start);
        }
        start += block_len(block) + 1;
    }
    None
}

/// Absolute offset of a structural location, or `None` when it does not resolve
pub fn to_absolute(doc: &Document, location: &Location) -> Option<usize> {
    let start = block_start(doc, location.block)?;
    let block = doc.block(location.block)?;
    let layout = layout(block);
    let slot = layout.slots.iter().find(|slot| slot.slot == location.slot)?;

    if !slot.editable {
        return (location.offset <= slot.len).then_some(start + slot.start + location.offset);
    }

    let run = slot.runs.iter().find(|run| run.path == location.path)?;
    if location.offset > run.chars() {
        return None;
    }
    let before = &run.text[..inlines::char_to_byte(run.text, location.offset)];
    Some(start + slot.start + run.perceived_start + inlines::text_perceived_len(before))
}

/// Where an absolute offset lands before any run is chosen
struct Landing {
    block: BlockId,
    slot: Slot,
    /// Perceived offset inside the slot
    rel: usize,
}

fn landing(doc: &Document, abs: usize) -> Option<Landing> {
    let mut start = 0;
    let mut last = None;
    for (id, block) in doc.blocks() {
        let layout = layout(block);
        if abs <= start + layout.len {
            return land_in_block(id, &layout, abs - start);
        }
        start += layout.len + 1;
        last = Some((id, layout));
    }
    let (id, layout) = last?;
    land_in_block(id, &layout, layout.len)
}

fn land_in_block(id: BlockId, layout: &BlockLayout<'_>, inner: usize) -> Option<Landing> {
    let editable = |slot: &&SlotLayout<'_>| slot.editable;
    let slot = layout
        .slots
        .iter()
        .filter(editable)
        .find(|slot| slot.covers(inner))
        .or_else(|| layout.slots.iter().filter(editable).find(|slot| slot.start >= inner))
        .or_else(|| layout.slots.iter().filter(editable).last())?;
    let rel = inner.clamp(slot.start, slot.start + slot.len) - slot.start;
    Some(Landing {
        block: id,
        slot: slot.slot.clone(),
        rel,
    })
}

/// Depth-first search over a block's runs. Slots rejected by `skip` are never
/// entered; the first run of a remaining slot covering the landing wins.
fn find_run<'a>(
    layout: &'a BlockLayout<'a>,
    landing: &Landing,
    skip: impl Fn(&SlotLayout<'_>) -> bool,
) -> Option<(&'a SlotLayout<'a>, &'a Run<'a>)> {
    layout
        .slots
        .iter()
        .filter(|slot| !skip(slot) && slot.slot == landing.slot)
        .find_map(|slot| {
            slot.runs
                .iter()
                .find(|run| {
                    run.perceived_start <= landing.rel
                        && landing.rel <= run.perceived_start + run.perceived_len()
                })
                .map(|run| (slot, run))
        })
}

/// Char offset inside `text` reaching `perceived` visible chars, stepped past
/// any sentinels that follow.
fn char_offset(text: &str, perceived: usize) -> usize {
    let mut seen = 0;
    let mut offset = 0;
    let mut chars = text.chars().peekable();
    while seen < perceived {
        match chars.next() {
            Some(c) => {
                offset += 1;
                if c != SENTINEL {
                    seen += 1;
                }
            }
            None => return offset,
        }
    }
    while chars.peek() == Some(&SENTINEL) {
        chars.next();
        offset += 1;
    }
    offset
}

/// Structural location for an absolute offset without touching the document.
///
/// Past the end the offset clamps to the end of the last block. Returns `None`
/// for an empty document or where no text run covers the offset.
pub fn locate(doc: &Document, abs: usize) -> Option<Location> {
    let landing = landing(doc, abs)?;
    let block = doc.block(landing.block)?;
    let layout = layout(block);
    let (_, run) = find_run(&layout, &landing, |slot| !slot.editable)?;
    let offset = char_offset(run.text, landing.rel - run.perceived_start);
    Some(Location::new(
        landing.block,
        landing.slot.clone(),
        run.path.clone(),
        offset,
    ))
}

/// Like [`locate`], but creates a landing target when there is none: an empty
/// paragraph for an empty document, or an empty text anchor where no run covers
/// the offset.
pub fn to_structural(doc: &mut Document, abs: usize) -> Location {
    if doc.is_empty() {
        let id = doc.push(Block::Paragraph(vec![Inline::Text(String::new())]));
        log::trace!("empty document, synthesized landing paragraph");
        return Location::body(id, vec![0], 0);
    }
    if let Some(location) = locate(doc, abs) {
        return location;
    }
    let anchored = landing(doc, abs).and_then(|landing| {
        let inlines = doc.inlines_mut(landing.block, &landing.slot)?;
        let index = anchor_index(inlines, landing.rel);
        inlines.insert(index, Inline::Text(String::new()));
        log::trace!("inserted caret anchor at {index} in {:?}", landing.slot);
        Some(Location::new(landing.block, landing.slot, vec![index], 0))
    });
    match anchored {
        Some(location) => location,
        // Only reachable for a block with no editable slot at all
        None => {
            let id = doc.push(Block::Paragraph(vec![Inline::Text(String::new())]));
            Location::body(id, vec![0], 0)
        }
    }
}

fn anchor_index(inlines: &[Inline], rel: usize) -> usize {
    let mut seen = 0;
    for (index, inline) in inlines.iter().enumerate() {
        if seen >= rel {
            return index;
        }
        seen += inlines::perceived_len(std::slice::from_ref(inline));
    }
    inlines.len()
}

/// Location of the first caret position of a block, creating an anchor if needed
pub fn start_of_block(doc: &mut Document, id: BlockId) -> Option<Location> {
    let start = block_start(doc, id)?;
    let location = to_structural(doc, start);
    (location.block == id).then_some(location)
}

/// Location of the first caret position of one slot
pub fn start_of_slot(doc: &mut Document, id: BlockId, slot: &Slot) -> Option<Location> {
    let start = block_start(doc, id)?;
    let inner = layout(doc.block(id)?)
        .slots
        .iter()
        .find(|candidate| candidate.slot == *slot)?
        .start;
    Some(to_structural(doc, start + inner))
}

/// Location of the last caret position of one slot
pub fn end_of_slot(doc: &mut Document, id: BlockId, slot: &Slot) -> Option<Location> {
    let start = block_start(doc, id)?;
    let end = layout(doc.block(id)?)
        .slots
        .iter()
        .find(|candidate| candidate.slot == *slot)
        .map(|candidate| candidate.start + candidate.len)?;
    Some(to_structural(doc, start + end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::document::{ListChild, ListContainer, ListItem, ListKind, Style};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn mixed() -> Document {
        // "# Title" (7) | "a **b**" (3) | "- x", "- yz" (4)
        Document::from_blocks([
            Block::heading(1, "Title"),
            Block::Paragraph(vec![
                Inline::text("a "),
                Inline::span(Style::Bold, vec![Inline::text("b")]),
            ]),
            Block::list(ListKind::Unordered, &["x", "yz"]),
        ])
    }

    #[test]
    fn test_document_len_counts_separators() {
        assert_eq!(document_len(&mixed()), 7 + 1 + 3 + 1 + 4);
        assert_eq!(document_len(&Document::new()), 0);
    }

    #[test]
    fn test_heading_caret_lands_after_anchor() {
        let doc = mixed();
        let heading = doc.id_at(0).unwrap();

        let location = locate(&doc, 2).unwrap();

        assert_eq!(location, Location::body(heading, vec![0], 1));
        assert_eq!(to_absolute(&doc, &location), Some(2));
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn test_marker_prefix_maps_forward_to_body(#[case] abs: usize) {
        let doc = mixed();
        let location = locate(&doc, abs).unwrap();
        assert_eq!(location.slot, Slot::Body);
        assert_eq!(location.offset, 1);
        assert_eq!(to_absolute(&doc, &location), Some(2));
    }

    #[test]
    fn test_marker_slot_is_addressable() {
        let doc = mixed();
        let heading = doc.id_at(0).unwrap();
        let marker = Location::new(heading, Slot::Marker, vec![], 1);
        assert_eq!(to_absolute(&doc, &marker), Some(1));
        let past = Location::new(heading, Slot::Marker, vec![], 2);
        assert_eq!(to_absolute(&doc, &past), None);
    }

    #[test]
    fn test_earliest_run_wins_at_span_boundary() {
        let doc = mixed();
        let paragraph = doc.id_at(1).unwrap();
        // "a " ends at 10 and the bold run starts there
        assert_eq!(
            locate(&doc, 10),
            Some(Location::body(paragraph, vec![0], 2))
        );
        assert_eq!(
            locate(&doc, 11),
            Some(Location::body(paragraph, vec![1, 0], 1))
        );
    }

    #[test]
    fn test_list_items_are_separated() {
        let doc = mixed();
        let list = doc.id_at(2).unwrap();
        assert_eq!(
            locate(&doc, 13),
            Some(Location::item(list, ItemPath::new([0]), vec![0], 1))
        );
        assert_eq!(
            locate(&doc, 14),
            Some(Location::item(list, ItemPath::new([1]), vec![0], 0))
        );
    }

    #[test]
    fn test_past_end_clamps_to_last_block() {
        let doc = mixed();
        let list = doc.id_at(2).unwrap();
        assert_eq!(
            locate(&doc, 500),
            Some(Location::item(list, ItemPath::new([1]), vec![0], 2))
        );
    }

    #[test]
    fn test_round_trip_over_reachable_offsets() {
        let mut doc = Document::from_blocks([
            Block::heading(3, "Deep"),
            Block::Paragraph(vec![
                Inline::text("one"),
                Inline::LineBreak,
                Inline::span(
                    Style::Italic,
                    vec![Inline::text("two"), Inline::span(Style::Bold, vec![Inline::text("x")])],
                ),
                Inline::text("\u{200B}tail"),
            ]),
            Block::List(ListContainer {
                kind: ListKind::Ordered,
                children: vec![
                    ListChild::Item(
                        ListItem::new(vec![Inline::text("a")]).with_sublist(
                            ListContainer::with_items(
                                ListKind::Unordered,
                                [ListItem::new(vec![Inline::text("b")])],
                            ),
                        ),
                    ),
                    ListChild::List(ListContainer::with_items(
                        ListKind::Ordered,
                        [ListItem::new(vec![Inline::text("c")])],
                    )),
                ],
            }),
        ]);
        let heading_prefix = 0..=3;

        for p in 0..=document_len(&doc) {
            if heading_prefix.contains(&p) {
                continue;
            }
            let location = to_structural(&mut doc, p);
            assert_eq!(to_absolute(&doc, &location), Some(p), "offset {p}");
        }
    }

    #[test]
    fn test_empty_document_gets_landing_paragraph() {
        let mut doc = Document::new();
        let location = to_structural(&mut doc, 5);
        assert_eq!(doc.len(), 1);
        assert_eq!(location.offset, 0);
        assert_eq!(to_absolute(&doc, &location), Some(0));
    }

    #[test]
    fn test_uncovered_offset_gets_anchor() {
        let mut doc = Document::from_blocks([Block::Paragraph(vec![
            Inline::LineBreak,
            Inline::LineBreak,
        ])]);
        assert!(locate(&doc, 1).is_none());

        let location = to_structural(&mut doc, 1);

        let id = doc.id_at(0).unwrap();
        assert_eq!(location, Location::body(id, vec![1], 0));
        assert_eq!(
            doc.block(id),
            Some(&Block::Paragraph(vec![
                Inline::LineBreak,
                Inline::text(""),
                Inline::LineBreak
            ]))
        );
        assert_eq!(to_absolute(&doc, &location), Some(1));
    }

    #[test]
    fn test_slot_bounds() {
        let mut doc = mixed();
        let list = doc.id_at(2).unwrap();
        let slot = Slot::Item(ItemPath::new([1]));

        let start = start_of_slot(&mut doc, list, &slot).unwrap();
        let end = end_of_slot(&mut doc, list, &slot).unwrap();

        assert_eq!(to_absolute(&doc, &start), Some(14));
        assert_eq!(to_absolute(&doc, &end), Some(16));
        assert_eq!(block_start(&doc, list), Some(12));
    }
}
