use std::fmt::Write;

/// Zero-width anchor placed at the start of a heading body and after a freshly
/// created style span. It is never counted in perceived caret offsets.
pub const SENTINEL: char = '\u{200B}';

/// Stable handle to a block slot in the document arena.
///
/// A handle keeps resolving to the same slot when the block is replaced in place,
/// and stops resolving once the block is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Inline emphasis applied by a style span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    Bold,
    Italic,
    Strike,
    BoldItalic,
}

/// A run of inline content inside a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Plain text; may contain [`SENTINEL`] characters
    Text(String),
    /// Styled wrapper around further inline runs
    Span { style: Style, children: Vec<Inline> },
    /// Hard line break inside a block
    LineBreak,
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text(text.into())
    }

    pub fn span(style: Style, children: Vec<Inline>) -> Self {
        Inline::Span { style, children }
    }

    /// True for a `Text` run holding nothing at all
    pub fn is_empty_text(&self) -> bool {
        matches!(self, Inline::Text(t) if t.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Ordered,
    Unordered,
}

/// One entry of a list: its own inline content plus an optional nested list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListItem {
    pub content: Vec<Inline>,
    pub sublist: Option<ListContainer>,
}

impl ListItem {
    pub fn new(content: Vec<Inline>) -> Self {
        Self {
            content,
            sublist: None,
        }
    }

    pub fn with_sublist(mut self, sublist: ListContainer) -> Self {
        self.sublist = Some(sublist);
        self
    }
}

/// Child of a list container.
///
/// `List` is the irregular list-directly-inside-list shape. Imported documents
/// can carry it, so every list operation tolerates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListChild {
    Item(ListItem),
    List(ListContainer),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListContainer {
    pub kind: ListKind,
    pub children: Vec<ListChild>,
}

/// Borrowed view of whatever an item path points at
#[derive(Debug, Clone, Copy)]
pub enum ListNode<'a> {
    Item(&'a ListItem),
    List(&'a ListContainer),
}

impl ListContainer {
    pub fn new(kind: ListKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_items(kind: ListKind, items: impl IntoIterator<Item = ListItem>) -> Self {
        Self {
            kind,
            children: items.into_iter().map(ListChild::Item).collect(),
        }
    }

    /// Resolve a child path.
    ///
    /// Each index selects a child of the current container. Landing on a nested
    /// container continues inside it. Landing on an item with indices left
    /// continues inside the item's sublist.
    pub fn node(&self, path: &[usize]) -> Option<ListNode<'_>> {
        let (first, rest) = path.split_first()?;
        match self.children.get(*first)? {
            ListChild::List(inner) if rest.is_empty() => Some(ListNode::List(inner)),
            ListChild::List(inner) => inner.node(rest),
            ListChild::Item(item) if rest.is_empty() => Some(ListNode::Item(item)),
            ListChild::Item(item) => item.sublist.as_ref()?.node(rest),
        }
    }

    pub fn item(&self, path: &[usize]) -> Option<&ListItem> {
        match self.node(path)? {
            ListNode::Item(item) => Some(item),
            ListNode::List(_) => None,
        }
    }

    pub fn item_mut(&mut self, path: &[usize]) -> Option<&mut ListItem> {
        let (first, rest) = path.split_first()?;
        match self.children.get_mut(*first)? {
            ListChild::List(inner) => inner.item_mut(rest),
            ListChild::Item(item) => {
                if rest.is_empty() {
                    Some(item)
                } else {
                    item.sublist.as_mut()?.item_mut(rest)
                }
            }
        }
    }

    /// The container addressed by `path`: `self` for an empty path, the nested
    /// container itself for a `List` child, or the sublist of an item.
    pub fn container_mut(&mut self, path: &[usize]) -> Option<&mut ListContainer> {
        let Some((first, rest)) = path.split_first() else {
            return Some(self);
        };
        match self.children.get_mut(*first)? {
            ListChild::List(inner) => inner.container_mut(rest),
            ListChild::Item(item) => item.sublist.as_mut()?.container_mut(rest),
        }
    }

    /// Every item path in depth-first (reading) order
    pub fn item_paths(&self) -> Vec<Vec<usize>> {
        let mut out = Vec::new();
        self.collect_item_paths(&mut Vec::new(), &mut out);
        out
    }

    fn collect_item_paths(&self, prefix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        for (index, child) in self.children.iter().enumerate() {
            prefix.push(index);
            match child {
                ListChild::Item(item) => {
                    out.push(prefix.clone());
                    if let Some(sublist) = &item.sublist {
                        sublist.collect_item_paths(prefix, out);
                    }
                }
                ListChild::List(inner) => inner.collect_item_paths(prefix, out),
            }
            prefix.pop();
        }
    }
}

/// Top-level structural unit of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    /// The marker (`"#" × level`) is implied by `level` and never stored in `body`.
    /// A well-formed body starts with a [`SENTINEL`].
    Heading { level: u8, body: Vec<Inline> },
    List(ListContainer),
}

impl Block {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph(vec![Inline::text(text)])
    }

    /// Heading with an anchored body
    pub fn heading(level: u8, text: &str) -> Self {
        Block::Heading {
            level,
            body: vec![Inline::Text(format!("{SENTINEL}{text}"))],
        }
    }

    pub fn list(kind: ListKind, items: &[&str]) -> Self {
        Block::List(ListContainer::with_items(
            kind,
            items.iter().map(|text| ListItem::new(vec![Inline::text(*text)])),
        ))
    }

    pub fn marker_text(level: u8) -> String {
        "#".repeat(usize::from(level))
    }
}

/// Arena-backed document tree.
///
/// Blocks live in slots addressed by [`BlockId`]; `order` holds the reading order.
/// Replacing a block reuses its slot, so handles held by a caret survive the
/// paragraph→heading style rewrites.
#[derive(Debug, Clone, Default)]
pub struct Document {
    slots: Vec<Option<Block>>,
    order: Vec<BlockId>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: impl IntoIterator<Item = Block>) -> Self {
        let mut doc = Self::new();
        for block in blocks {
            doc.push(block);
        }
        doc
    }

    /// Number of blocks in reading order
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn ids(&self) -> &[BlockId] {
        &self.order
    }

    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &Block)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.block(*id).map(|block| (*id, block)))
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.slots.get(id.0)?.as_ref()
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.slots.get_mut(id.0)?.as_mut()
    }

    /// Position of a block in reading order
    pub fn position(&self, id: BlockId) -> Option<usize> {
        self.order.iter().position(|candidate| *candidate == id)
    }

    pub fn id_at(&self, index: usize) -> Option<BlockId> {
        self.order.get(index).copied()
    }

    pub fn push(&mut self, block: Block) -> BlockId {
        let id = self.alloc(block);
        self.order.push(id);
        id
    }

    pub fn insert(&mut self, index: usize, block: Block) -> BlockId {
        let id = self.alloc(block);
        self.order.insert(index.min(self.order.len()), id);
        id
    }

    pub fn insert_after(&mut self, after: BlockId, block: Block) -> Option<BlockId> {
        let index = self.position(after)?;
        Some(self.insert(index + 1, block))
    }

    /// Swap the block stored under `id`, returning the previous one
    pub fn replace(&mut self, id: BlockId, block: Block) -> Option<Block> {
        let slot = self.slots.get_mut(id.0)?;
        if slot.is_none() {
            return None;
        }
        slot.replace(block)
    }

    pub fn remove(&mut self, id: BlockId) -> Option<Block> {
        let index = self.position(id)?;
        self.order.remove(index);
        self.slots.get_mut(id.0)?.take()
    }

    /// Replace one block with several. The first replacement keeps `id`;
    /// the rest get fresh handles. Returns the handles in order.
    pub fn splice(&mut self, id: BlockId, blocks: Vec<Block>) -> Option<Vec<BlockId>> {
        let index = self.position(id)?;
        let mut blocks = blocks.into_iter();
        let Some(first) = blocks.next() else {
            self.remove(id);
            return Some(Vec::new());
        };
        self.replace(id, first);
        let mut ids = vec![id];
        for (offset, block) in blocks.enumerate() {
            ids.push(self.insert(index + 1 + offset, block));
        }
        Some(ids)
    }

    fn alloc(&mut self, block: Block) -> BlockId {
        self.slots.push(Some(block));
        BlockId(self.slots.len() - 1)
    }
}

/// Documents compare by their blocks in reading order; handles are ignored
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .blocks()
                .zip(other.blocks())
                .all(|((_, a), (_, b))| a == b)
    }
}

impl Eq for Document {}

/// Render a document as an indented outline for tests and debug logging.
///
/// Sentinels are shown as `<s>`, hard breaks as `BR`.
pub fn format_outline(doc: &Document) -> String {
    let mut out = String::new();
    for (_, block) in doc.blocks() {
        match block {
            Block::Paragraph(inlines) => {
                writeln!(out, "Paragraph {}", format_inlines(inlines)).ok();
            }
            Block::Heading { level, body } => {
                writeln!(out, "Heading({level}) {}", format_inlines(body)).ok();
            }
            Block::List(list) => format_list(&mut out, list, 0),
        }
    }
    out
}

fn format_list(out: &mut String, list: &ListContainer, indent: usize) {
    let prefix = "  ".repeat(indent);
    writeln!(out, "{prefix}List({:?})", list.kind).ok();
    for child in &list.children {
        match child {
            ListChild::Item(item) => {
                writeln!(out, "{prefix}  - {}", format_inlines(&item.content)).ok();
                if let Some(sublist) = &item.sublist {
                    format_list(out, sublist, indent + 2);
                }
            }
            ListChild::List(inner) => format_list(out, inner, indent + 1),
        }
    }
}

fn format_inlines(inlines: &[Inline]) -> String {
    if inlines.is_empty() {
        return "(empty)".to_string();
    }
    inlines
        .iter()
        .map(|inline| match inline {
            Inline::Text(text) => format!("{:?}", text.replace(SENTINEL, "<s>")),
            Inline::Span { style, children } => format!("{style:?}({})", format_inlines(children)),
            Inline::LineBreak => "BR".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nested() -> ListContainer {
        // - a
        //   - b
        //     (list) - c
        // - d
        let inner = ListContainer {
            kind: ListKind::Unordered,
            children: vec![
                ListChild::Item(ListItem::new(vec![Inline::text("b")])),
                ListChild::List(ListContainer::with_items(
                    ListKind::Ordered,
                    [ListItem::new(vec![Inline::text("c")])],
                )),
            ],
        };
        ListContainer::with_items(
            ListKind::Unordered,
            [
                ListItem::new(vec![Inline::text("a")]).with_sublist(inner),
                ListItem::new(vec![Inline::text("d")]),
            ],
        )
    }

    #[test]
    fn test_item_paths_are_depth_first() {
        let list = nested();
        assert_eq!(
            list.item_paths(),
            vec![vec![0], vec![0, 0], vec![0, 1, 0], vec![1]]
        );
    }

    #[test]
    fn test_item_lookup_through_sublists_and_bare_lists() {
        let list = nested();
        assert_eq!(list.item(&[0, 1, 0]).unwrap().content, vec![Inline::text("c")]);
        assert!(list.item(&[0, 1]).is_none(), "path ends at a bare list");
        assert!(matches!(list.node(&[0, 1]), Some(ListNode::List(_))));
        assert!(list.item(&[1, 0]).is_none(), "d has no sublist");
    }

    #[test]
    fn test_item_mut_reaches_items_at_every_depth() {
        let mut list = nested();

        list.item_mut(&[0]).unwrap().content = vec![Inline::text("A")];
        list.item_mut(&[0, 0]).unwrap().content = vec![Inline::text("B")];
        list.item_mut(&[0, 1, 0]).unwrap().content = vec![Inline::text("C")];

        assert_eq!(list.item(&[0]).unwrap().content, vec![Inline::text("A")]);
        assert_eq!(list.item(&[0, 0]).unwrap().content, vec![Inline::text("B")]);
        assert_eq!(list.item(&[0, 1, 0]).unwrap().content, vec![Inline::text("C")]);
        assert!(list.item_mut(&[1, 0]).is_none(), "d has no sublist");
        assert!(list.item_mut(&[0, 1]).is_none(), "path ends at a bare list");
    }

    #[test]
    fn test_container_mut_resolves_item_sublists() {
        let mut list = nested();
        assert_eq!(list.container_mut(&[]).unwrap().children.len(), 2);
        assert_eq!(list.container_mut(&[0]).unwrap().children.len(), 2);
        assert_eq!(
            list.container_mut(&[0, 1]).unwrap().kind,
            ListKind::Ordered
        );
        assert!(list.container_mut(&[1]).is_none());
    }

    #[test]
    fn test_replace_keeps_handle() {
        let mut doc = Document::from_blocks([Block::paragraph("a"), Block::paragraph("b")]);
        let id = doc.id_at(1).unwrap();

        doc.replace(id, Block::heading(2, "b"));

        assert_eq!(doc.position(id), Some(1));
        assert_eq!(doc.block(id), Some(&Block::heading(2, "b")));
    }

    #[test]
    fn test_removed_handle_stops_resolving() {
        let mut doc = Document::from_blocks([Block::paragraph("a"), Block::paragraph("b")]);
        let id = doc.id_at(0).unwrap();

        assert!(doc.remove(id).is_some());

        assert!(doc.block(id).is_none());
        assert!(doc.replace(id, Block::paragraph("x")).is_none());
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_splice_keeps_first_handle() {
        let mut doc = Document::from_blocks([
            Block::paragraph("a"),
            Block::paragraph("b"),
            Block::paragraph("c"),
        ]);
        let id = doc.id_at(1).unwrap();

        let ids = doc
            .splice(id, vec![Block::paragraph("x"), Block::paragraph("y")])
            .unwrap();

        assert_eq!(ids[0], id);
        assert_eq!(
            doc,
            Document::from_blocks([
                Block::paragraph("a"),
                Block::paragraph("x"),
                Block::paragraph("y"),
                Block::paragraph("c"),
            ])
        );
    }

    #[test]
    fn test_equality_ignores_handles() {
        let mut a = Document::from_blocks([Block::paragraph("x"), Block::paragraph("y")]);
        let first = a.id_at(0).unwrap();
        a.remove(first);
        a.insert(0, Block::paragraph("x"));

        let b = Document::from_blocks([Block::paragraph("x"), Block::paragraph("y")]);
        assert_eq!(a, b);
        assert_ne!(a.ids(), b.ids());
    }

    #[test]
    fn test_format_outline() {
        let doc = Document::from_blocks([
            Block::heading(1, "Title"),
            Block::Paragraph(vec![
                Inline::text("a"),
                Inline::span(Style::Bold, vec![Inline::text("b")]),
                Inline::LineBreak,
            ]),
            Block::List(nested()),
        ]);

        insta::assert_snapshot!(format_outline(&doc), @r#"
        Heading(1) "<s>Title"
        Paragraph "a" Bold("b") BR
        List(Unordered)
          - "a"
            List(Unordered)
              - "b"
              List(Ordered)
                - "c"
          - "d"
        "#);
    }
}
