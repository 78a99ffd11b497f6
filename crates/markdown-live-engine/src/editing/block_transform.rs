//! Block-level rewrites driven by typed prefixes.
//!
//! A paragraph whose text starts with `#`..`######` and a space becomes a
//! heading; one starting with a bullet or ordinal marker becomes a single-item
//! list. Headings that lost their leading sentinel are turned back into
//! paragraphs so the user can keep editing the hash run as plain text.

use std::sync::OnceLock;

use regex::Regex;

use crate::editing::document::{
    Block, BlockId, Document, Inline, ListContainer, ListItem, ListKind, SENTINEL,
};
use crate::editing::inlines;
use crate::editing::location::Location;
use crate::editing::patch::{Rewrite, Transform};
use crate::editing::position;

static HEADING_PREFIX: OnceLock<Regex> = OnceLock::new();
static LIST_PREFIX: OnceLock<Regex> = OnceLock::new();

fn heading_prefix() -> &'static Regex {
    HEADING_PREFIX
        .get_or_init(|| Regex::new(r"^(#{1,6})[ \u{00A0}]").expect("Invalid heading regex"))
}

fn list_prefix() -> &'static Regex {
    LIST_PREFIX.get_or_init(|| {
        Regex::new(r"^[ \t]*([-*+]|[0-9]+[.)])[ \u{00A0}]").expect("Invalid list marker regex")
    })
}

/// Perceived caret offset inside its block, with the block's absolute start
fn caret_in_block(doc: &Document, caret: &Location) -> Option<(usize, usize)> {
    let start = position::block_start(doc, caret.block)?;
    let abs = position::to_absolute(doc, caret)?;
    Some((start, abs - start))
}

/// Turn the caret's paragraph into a heading when it starts with a hash prefix
pub fn paragraph_to_heading(doc: &mut Document, caret: &Location) -> Option<Rewrite> {
    let Some(Block::Paragraph(inlines)) = doc.block(caret.block) else {
        return None;
    };
    let raw = inlines::raw_text(inlines);
    let captures = heading_prefix().captures(&raw)?;
    let level = u8::try_from(captures[1].len()).ok()?;
    let prefix = usize::from(level) + 1;

    let (_, mut body) = inlines::split_at_raw(inlines, prefix);
    match body.first_mut() {
        Some(Inline::Text(text)) => text.insert(0, SENTINEL),
        _ => body.insert(0, Inline::Text(SENTINEL.to_string())),
    }
    inlines::normalize(&mut body);

    let (start, inner) = caret_in_block(doc, caret)?;
    let visible = inlines::perceived_len(&body);
    let typed = inner.saturating_sub(prefix).min(visible);

    doc.replace(caret.block, Block::Heading { level, body });
    let caret = position::to_structural(doc, start + prefix + typed);
    log::debug!("paragraph became heading level {level}");
    Some(Rewrite {
        transform: Transform::HeadingCreated { level },
        caret,
    })
}

/// Turn the caret's paragraph into a one-item list when it starts with a marker
pub fn paragraph_to_list(doc: &mut Document, caret: &Location) -> Option<Rewrite> {
    let Some(Block::Paragraph(inlines)) = doc.block(caret.block) else {
        return None;
    };
    let raw = inlines::raw_text(inlines);
    let captures = list_prefix().captures(&raw)?;
    let matched = captures.get(0)?.as_str().chars().count();
    let kind = if captures[1].starts_with(|c: char| c.is_ascii_digit()) {
        ListKind::Ordered
    } else {
        ListKind::Unordered
    };

    let (_, mut content) = inlines::split_at_raw(inlines, matched);
    inlines::normalize(&mut content);
    let visible = inlines::perceived_len(&content);
    let start = position::block_start(doc, caret.block)?;

    doc.replace(
        caret.block,
        Block::List(ListContainer::with_items(kind, [ListItem::new(content)])),
    );
    let caret = position::to_structural(doc, start + visible);
    log::debug!("paragraph became {kind:?} list");
    Some(Rewrite {
        transform: Transform::ListCreated { kind },
        caret,
    })
}

/// A heading body is broken when its anchor sentinel is gone or a line break
/// directly follows the marker.
pub fn is_broken(body: &[Inline]) -> bool {
    let mut rest = body.iter().filter(|inline| !inline.is_empty_text());
    match rest.next() {
        None | Some(Inline::LineBreak) | Some(Inline::Span { .. }) => true,
        Some(Inline::Text(text)) if !text.starts_with(SENTINEL) => true,
        Some(Inline::Text(text)) => {
            inlines::text_perceived_len(text) == 0 && matches!(rest.next(), Some(Inline::LineBreak))
        }
    }
}

fn reverted_inlines(level: u8, mut body: Vec<Inline>) -> Vec<Inline> {
    let first = inlines::runs(&body).first().map(|run| run.path.clone());
    if let Some(text) = first.and_then(|path| inlines::text_at_mut(&mut body, &path)) {
        *text = inlines::strip_sentinels(text);
    }
    let mut out = vec![Inline::Text(Block::marker_text(level))];
    out.extend(body);
    inlines::normalize(&mut out);
    out
}

/// Revert every broken heading in the document to a paragraph holding the
/// marker text followed by the remaining body.
///
/// A caret inside a reverted heading moves to just after the marker text;
/// a caret elsewhere keeps its location.
pub fn revert_broken_headings(doc: &mut Document, caret: &Location) -> Option<Rewrite> {
    let broken: Vec<(BlockId, u8)> = doc
        .blocks()
        .filter_map(|(id, block)| match block {
            Block::Heading { level, body } if is_broken(body) => Some((id, *level)),
            _ => None,
        })
        .collect();
    if broken.is_empty() {
        return None;
    }

    let mut caret_level = None;
    for (id, level) in &broken {
        let Some(Block::Heading { body, .. }) = doc.block(*id).cloned() else {
            continue;
        };
        doc.replace(*id, Block::Paragraph(reverted_inlines(*level, body)));
        if *id == caret.block {
            caret_level = Some(*level);
        }
    }

    let caret = match caret_level {
        Some(level) => {
            let start = position::block_start(doc, caret.block)?;
            position::to_structural(doc, start + usize::from(level))
        }
        None => caret.clone(),
    };
    log::debug!("reverted {} broken heading(s)", broken.len());
    Some(Rewrite {
        transform: Transform::HeadingReverted {
            count: broken.len(),
        },
        caret,
    })
}
