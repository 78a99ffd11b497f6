//! Indent and outdent surgery on list blocks.
//!
//! Every operation works on a clone of the block's root container and only
//! writes it back once the whole rewrite succeeded, so a malformed shape
//! leaves the document exactly as it was.

use crate::editing::document::{
    Block, BlockId, Document, Inline, ListChild, ListContainer, ListItem, ListNode,
};
use crate::editing::error::EditError;
use crate::editing::inlines;
use crate::editing::location::{ItemPath, Location, Slot};
use crate::editing::position;

/// Where an item ended up after a list operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemTarget {
    Item { block: BlockId, path: ItemPath },
    /// The item left the list and became this paragraph
    Paragraph { block: BlockId },
}

fn list_root(doc: &Document, block: BlockId) -> Result<ListContainer, EditError> {
    match doc.block(block) {
        Some(Block::List(list)) => Ok(list.clone()),
        Some(_) => Err(EditError::NotAList(block)),
        None => Err(EditError::BlockNotFound(block)),
    }
}

fn take_item(
    children: &mut Vec<ListChild>,
    index: usize,
    path: &ItemPath,
) -> Result<ListItem, EditError> {
    if !matches!(children.get(index), Some(ListChild::Item(_))) {
        return Err(EditError::NotAListItem(path.clone()));
    }
    match children.remove(index) {
        ListChild::Item(item) => Ok(item),
        ListChild::List(_) => Err(EditError::NotAListItem(path.clone())),
    }
}

fn extend_path(prefix: &[usize], tail: &[usize]) -> ItemPath {
    let mut path = prefix.to_vec();
    path.extend_from_slice(tail);
    ItemPath(path)
}

/// Nest the item at `path` under its previous sibling.
///
/// Returns the item's new path, or `None` when it has no previous sibling.
pub fn indent(
    doc: &mut Document,
    block: BlockId,
    path: &ItemPath,
) -> Result<Option<ItemPath>, EditError> {
    let mut root = list_root(doc, block)?;
    let (k, parent) = path
        .0
        .split_last()
        .ok_or_else(|| EditError::NotAListItem(path.clone()))?;
    let k = *k;
    let container = root
        .container_mut(parent)
        .ok_or_else(|| EditError::MissingContainer(path.clone()))?;
    let kind = container.kind;

    if !matches!(container.children.get(k), Some(ListChild::Item(_))) {
        return Err(EditError::NotAListItem(path.clone()));
    }
    if k == 0 {
        return Ok(None);
    }
    let mut item = take_item(&mut container.children, k, path)?;

    let previous = container
        .children
        .get_mut(k - 1)
        .ok_or_else(|| EditError::MissingContainer(path.clone()))?;
    let index = match previous {
        ListChild::Item(previous) => {
            let nested = item.sublist.take();
            let sublist = previous
                .sublist
                .get_or_insert_with(|| ListContainer::new(kind));
            sublist.children.push(ListChild::Item(item));
            let index = sublist.children.len() - 1;
            // one level of nesting is never duplicated
            if let Some(nested) = nested {
                sublist.children.extend(nested.children);
            }
            index
        }
        ListChild::List(previous) => {
            previous.children.push(ListChild::Item(item));
            previous.children.len() - 1
        }
    };

    doc.replace(block, Block::List(root));
    let new_path = extend_path(parent, &[k - 1, index]);
    log::debug!("indented {path:?} to {new_path:?}");
    Ok(Some(new_path))
}

/// Move the item at `path` one level up
pub fn outdent(
    doc: &mut Document,
    block: BlockId,
    path: &ItemPath,
) -> Result<ItemTarget, EditError> {
    let mut root = list_root(doc, block)?;
    let (k, parent) = path
        .0
        .split_last()
        .ok_or_else(|| EditError::NotAListItem(path.clone()))?;
    let Some((p, grand)) = parent.split_last() else {
        return outdent_top_level(doc, block, root, *k, path);
    };

    let new_path = match root.node(parent) {
        Some(ListNode::Item(_)) => promote_from_item(&mut root, grand, *p, *k, path)?,
        Some(ListNode::List(_)) => lift_from_list(&mut root, grand, *p, *k, path)?,
        None => return Err(EditError::MissingContainer(path.clone())),
    };
    doc.replace(block, Block::List(root));
    log::debug!("outdented {path:?} to {new_path:?}");
    Ok(ItemTarget::Item {
        block,
        path: new_path,
    })
}

/// The item lives in the sublist of item `j`: it becomes `j`'s next sibling
/// and takes the items that followed it as its own sublist.
fn promote_from_item(
    root: &mut ListContainer,
    grand: &[usize],
    j: usize,
    k: usize,
    path: &ItemPath,
) -> Result<ItemPath, EditError> {
    let missing = || EditError::MissingContainer(path.clone());
    let container = root.container_mut(grand).ok_or_else(missing)?;
    let Some(ListChild::Item(parent_item)) = container.children.get_mut(j) else {
        return Err(missing());
    };
    let sublist = parent_item.sublist.as_mut().ok_or_else(missing)?;
    let kind = sublist.kind;
    let mut item = take_item(&mut sublist.children, k, path)?;
    let following = sublist.children.split_off(k);
    if sublist.children.is_empty() {
        parent_item.sublist = None;
    }

    if !following.is_empty() {
        item.sublist
            .get_or_insert_with(|| ListContainer::new(kind))
            .children
            .extend(following);
    }
    container.children.insert(j + 1, ListChild::Item(item));
    Ok(extend_path(grand, &[j + 1]))
}

/// The item lives in a list nested directly in another list: that list is
/// split around the item, which takes its place in the outer list.
fn lift_from_list(
    root: &mut ListContainer,
    grand: &[usize],
    l: usize,
    k: usize,
    path: &ItemPath,
) -> Result<ItemPath, EditError> {
    let container = root
        .container_mut(grand)
        .ok_or_else(|| EditError::MissingContainer(path.clone()))?;
    let Some(ListChild::List(inner)) = container.children.get_mut(l) else {
        return Err(EditError::MissingContainer(path.clone()));
    };
    let kind = inner.kind;
    let mut before = std::mem::take(&mut inner.children);
    let item = take_item(&mut before, k, path)?;
    let after = before.split_off(k);

    let mut replacement = Vec::new();
    if !before.is_empty() {
        replacement.push(ListChild::List(ListContainer {
            kind,
            children: before,
        }));
    }
    let index = l + replacement.len();
    replacement.push(ListChild::Item(item));
    if !after.is_empty() {
        replacement.push(ListChild::List(ListContainer {
            kind,
            children: after,
        }));
    }
    container.children.splice(l..=l, replacement);
    Ok(extend_path(grand, &[index]))
}

/// A top-level item leaves the list and becomes a paragraph. The list is split
/// around it and the item's own sublist follows the paragraph.
fn outdent_top_level(
    doc: &mut Document,
    block: BlockId,
    root: ListContainer,
    k: usize,
    path: &ItemPath,
) -> Result<ItemTarget, EditError> {
    let kind = root.kind;
    let mut before = root.children;
    let item = take_item(&mut before, k, path)?;
    let mut after = before.split_off(k);

    let mut blocks = Vec::new();
    if !before.is_empty() {
        blocks.push(Block::List(ListContainer {
            kind,
            children: before,
        }));
    }
    let paragraph_index = blocks.len();
    let content = if item.content.is_empty() {
        vec![Inline::Text(String::new())]
    } else {
        item.content
    };
    blocks.push(Block::Paragraph(content));
    match item.sublist {
        Some(sublist) if sublist.kind == kind => {
            let mut merged = sublist.children;
            merged.append(&mut after);
            after = merged;
        }
        Some(sublist) => blocks.push(Block::List(sublist)),
        None => {}
    }
    if !after.is_empty() {
        blocks.push(Block::List(ListContainer {
            kind,
            children: after,
        }));
    }

    let ids = doc
        .splice(block, blocks)
        .ok_or(EditError::BlockNotFound(block))?;
    let paragraph = ids
        .get(paragraph_index)
        .copied()
        .ok_or(EditError::BlockNotFound(block))?;
    log::debug!("outdented top-level item {path:?} into a paragraph");
    Ok(ItemTarget::Paragraph { block: paragraph })
}

/// Split the item at `path` at a raw content offset. The tail becomes the next
/// sibling; any sublist stays with the original item.
pub fn split_item(
    doc: &mut Document,
    block: BlockId,
    path: &ItemPath,
    at: usize,
) -> Result<ItemPath, EditError> {
    let mut root = list_root(doc, block)?;
    let (k, parent) = path
        .0
        .split_last()
        .ok_or_else(|| EditError::NotAListItem(path.clone()))?;
    let container = root
        .container_mut(parent)
        .ok_or_else(|| EditError::MissingContainer(path.clone()))?;
    let Some(ListChild::Item(item)) = container.children.get_mut(*k) else {
        return Err(EditError::NotAListItem(path.clone()));
    };

    let (mut head, mut tail) = inlines::split_at_raw(&item.content, at);
    inlines::normalize(&mut head);
    inlines::normalize(&mut tail);
    item.content = head;
    container
        .children
        .insert(k + 1, ListChild::Item(ListItem::new(tail)));

    doc.replace(block, Block::List(root));
    Ok(extend_path(parent, &[k + 1]))
}

/// Carry a caret that sat inside the moved item (or its subtree) over to the
/// item's new home. Anything that no longer resolves falls back to the start
/// of the target.
pub fn carry_caret(
    doc: &mut Document,
    caret: &Location,
    from: &ItemPath,
    target: &ItemTarget,
) -> Location {
    let relative = caret
        .item_path()
        .filter(|item| item.starts_with(from))
        .map(|item| item.0[from.0.len()..].to_vec());

    if let Some(relative) = relative {
        let candidate = match target {
            ItemTarget::Item { block, path } => Some(Location::item(
                *block,
                extend_path(&path.0, &relative),
                caret.path.clone(),
                caret.offset,
            )),
            ItemTarget::Paragraph { block } if relative.is_empty() => Some(Location::body(
                *block,
                caret.path.clone(),
                caret.offset,
            )),
            ItemTarget::Paragraph { .. } => None,
        };
        if let Some(candidate) = candidate.filter(|c| position::to_absolute(doc, c).is_some()) {
            return candidate;
        }
    }

    log::trace!("caret fell back to start of {target:?}");
    let fallback = match target {
        ItemTarget::Item { block, path } => {
            position::start_of_slot(doc, *block, &Slot::Item(path.clone()))
        }
        ItemTarget::Paragraph { block } => position::start_of_block(doc, *block),
    };
    fallback.unwrap_or_else(|| position::to_structural(doc, 0))
}
