use crate::editing::document::{Block, BlockId, Document, Inline};

/// Child-index path from a list block's root container down to an item.
/// See [`crate::editing::ListContainer::node`] for how indices are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ItemPath(pub Vec<usize>);

impl ItemPath {
    pub fn new(path: impl Into<Vec<usize>>) -> Self {
        Self(path.into())
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// True when `self` is `other` or lies inside its subtree
    pub fn starts_with(&self, other: &ItemPath) -> bool {
        self.0.starts_with(&other.0)
    }
}

/// Which editable region of a block a location points into
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Paragraph inlines or heading body
    Body,
    /// Heading hash run. Addressable but never edited.
    Marker,
    /// Content of the list item at the given path
    Item(ItemPath),
}

/// Structural caret position.
///
/// `path` indexes through nested spans down to a `Text` run and `offset` counts
/// chars inside that run, sentinels included.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub block: BlockId,
    pub slot: Slot,
    pub path: Vec<usize>,
    pub offset: usize,
}

impl Location {
    pub fn new(block: BlockId, slot: Slot, path: Vec<usize>, offset: usize) -> Self {
        Self {
            block,
            slot,
            path,
            offset,
        }
    }

    pub fn body(block: BlockId, path: Vec<usize>, offset: usize) -> Self {
        Self::new(block, Slot::Body, path, offset)
    }

    pub fn item(block: BlockId, item: ItemPath, path: Vec<usize>, offset: usize) -> Self {
        Self::new(block, Slot::Item(item), path, offset)
    }

    pub fn item_path(&self) -> Option<&ItemPath> {
        match &self.slot {
            Slot::Item(path) => Some(path),
            _ => None,
        }
    }
}

impl Document {
    /// Inline sequence of a slot. The heading marker has none.
    pub fn inlines(&self, block: BlockId, slot: &Slot) -> Option<&Vec<Inline>> {
        match (self.block(block)?, slot) {
            (Block::Paragraph(inlines), Slot::Body) => Some(inlines),
            (Block::Heading { body, .. }, Slot::Body) => Some(body),
            (Block::List(list), Slot::Item(path)) => Some(&list.item(&path.0)?.content),
            _ => None,
        }
    }

    pub fn inlines_mut(&mut self, block: BlockId, slot: &Slot) -> Option<&mut Vec<Inline>> {
        match (self.block_mut(block)?, slot) {
            (Block::Paragraph(inlines), Slot::Body) => Some(inlines),
            (Block::Heading { body, .. }, Slot::Body) => Some(body),
            (Block::List(list), Slot::Item(path)) => Some(&mut list.item_mut(&path.0)?.content),
            _ => None,
        }
    }

    /// Editable slots of a block in reading order
    pub fn slots(&self, block: BlockId) -> Vec<Slot> {
        match self.block(block) {
            Some(Block::Paragraph(_)) | Some(Block::Heading { .. }) => vec![Slot::Body],
            Some(Block::List(list)) => list
                .item_paths()
                .into_iter()
                .map(|path| Slot::Item(ItemPath(path)))
                .collect(),
            None => Vec::new(),
        }
    }
}
