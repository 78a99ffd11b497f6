use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::editing::document::{
    Block, Document, Inline, ListChild, ListContainer, ListItem, ListKind, SENTINEL, Style,
};
use crate::editing::inlines;

/// Parse markup into a document tree.
///
/// Headings get their leading anchor sentinel. Code and HTML blocks become
/// paragraphs with hard breaks, block quotes are flattened, and link or image
/// markup keeps only its text.
pub fn tree_from_markup(markup: &str) -> Document {
    let mut builder = TreeBuilder::new();
    for event in Parser::new_ext(markup, Options::ENABLE_STRIKETHROUGH) {
        builder.process_event(event);
    }
    builder.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeafKind {
    Paragraph,
    Heading(u8),
    /// Code or HTML block: newlines are hard breaks
    Preformatted,
}

/// A container that is still open while walking parser events
#[derive(Debug)]
enum Frame {
    Leaf { kind: LeafKind, inlines: Vec<Inline> },
    Span { style: Style, children: Vec<Inline> },
    List(ListContainer),
    Item(ListItem),
}

struct TreeBuilder {
    blocks: Vec<Block>,
    stack: Vec<Frame>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            blocks: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn process_event(&mut self, event: Event) {
        match event {
            Event::Start(Tag::Paragraph) => self.open_leaf(LeafKind::Paragraph),
            Event::Start(Tag::Heading { level, .. }) => {
                self.open_leaf(LeafKind::Heading(level as u8))
            }
            Event::Start(Tag::CodeBlock(_)) | Event::Start(Tag::HtmlBlock) => {
                self.open_leaf(LeafKind::Preformatted)
            }
            Event::End(
                TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::CodeBlock | TagEnd::HtmlBlock,
            ) => self.close_leaf(),
            Event::Start(Tag::List(first_number)) => {
                let kind = if first_number.is_some() {
                    ListKind::Ordered
                } else {
                    ListKind::Unordered
                };
                self.stack.push(Frame::List(ListContainer::new(kind)));
            }
            Event::End(TagEnd::List(_)) => self.close_list(),
            Event::Start(Tag::Item) => self.stack.push(Frame::Item(ListItem::default())),
            Event::End(TagEnd::Item) => self.close_item(),
            Event::Start(Tag::Emphasis) => self.open_span(Style::Italic),
            Event::Start(Tag::Strong) => self.open_span(Style::Bold),
            Event::Start(Tag::Strikethrough) => self.open_span(Style::Strike),
            Event::End(TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough) => {
                self.close_span()
            }
            Event::Text(text) | Event::Code(text) | Event::InlineHtml(text) | Event::Html(text) => {
                self.text(&text)
            }
            // Soft breaks render as spaces
            Event::SoftBreak => self.push_inline(Inline::text(" ")),
            Event::HardBreak => self.push_inline(Inline::LineBreak),
            Event::Rule => self.push_block(LeafKind::Paragraph, vec![Inline::text("---")]),
            _ => {}
        }
    }

    fn open_leaf(&mut self, kind: LeafKind) {
        self.stack.push(Frame::Leaf {
            kind,
            inlines: Vec::new(),
        });
    }

    fn open_span(&mut self, style: Style) {
        self.stack.push(Frame::Span {
            style,
            children: Vec::new(),
        });
    }

    /// Sentinels never come from markup; `&#8203;` only holds an empty line
    fn text(&mut self, text: &str) {
        let text = inlines::strip_sentinels(text);
        if text.is_empty() {
            return;
        }
        let preformatted = matches!(
            self.stack.last(),
            Some(Frame::Leaf {
                kind: LeafKind::Preformatted,
                ..
            })
        );
        if !preformatted {
            self.push_inline(Inline::text(text));
            return;
        }
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                self.push_inline(Inline::LineBreak);
            }
            if !line.is_empty() {
                self.push_inline(Inline::text(line));
            }
        }
    }

    fn push_inline(&mut self, inline: Inline) {
        match self.stack.last_mut() {
            Some(Frame::Leaf { inlines, .. }) => inlines.push(inline),
            Some(Frame::Span { children, .. }) => children.push(inline),
            // Tight list items carry their text without a paragraph
            Some(Frame::Item(item)) => item.content.push(inline),
            Some(Frame::List(_)) | None => self.push_block(LeafKind::Paragraph, vec![inline]),
        }
    }

    fn close_span(&mut self) {
        let Some(Frame::Span { style, children }) = self.stack.pop() else {
            log::warn!("span end without an open span");
            return;
        };
        let span = match (style, children.as_slice()) {
            (
                Style::Italic,
                [
                    Inline::Span {
                        style: Style::Bold,
                        children: inner,
                    },
                ],
            )
            | (
                Style::Bold,
                [
                    Inline::Span {
                        style: Style::Italic,
                        children: inner,
                    },
                ],
            ) => Inline::span(Style::BoldItalic, inner.clone()),
            _ => Inline::span(style, children),
        };
        self.push_inline(span);
    }

    fn close_leaf(&mut self) {
        let Some(Frame::Leaf { kind, mut inlines }) = self.stack.pop() else {
            log::warn!("block end without an open block");
            return;
        };
        if kind == LeafKind::Preformatted {
            while matches!(inlines.last(), Some(Inline::LineBreak)) {
                inlines.pop();
            }
        }
        self.push_block(kind, inlines);
    }

    /// Attach finished block content to the innermost open item, or to the
    /// document when no item is open.
    fn push_block(&mut self, kind: LeafKind, inlines: Vec<Inline>) {
        if let Some(Frame::Item(item)) = self.stack.last_mut() {
            if !item.content.is_empty() {
                item.content.push(Inline::LineBreak);
            }
            item.content.extend(inlines);
            return;
        }
        let block = match kind {
            LeafKind::Heading(level) => {
                let mut body = vec![Inline::Text(SENTINEL.to_string())];
                body.extend(inlines);
                inlines::normalize(&mut body);
                Block::Heading { level, body }
            }
            LeafKind::Paragraph | LeafKind::Preformatted => {
                let mut content = inlines;
                inlines::normalize(&mut content);
                Block::Paragraph(content)
            }
        };
        self.blocks.push(block);
    }

    fn close_item(&mut self) {
        let Some(Frame::Item(mut item)) = self.stack.pop() else {
            log::warn!("item end without an open item");
            return;
        };
        inlines::normalize(&mut item.content);
        match self.stack.last_mut() {
            Some(Frame::List(list)) => list.children.push(ListChild::Item(item)),
            _ => log::warn!("list item outside of a list dropped"),
        }
    }

    fn close_list(&mut self) {
        let Some(Frame::List(list)) = self.stack.pop() else {
            log::warn!("list end without an open list");
            return;
        };
        match self.stack.last_mut() {
            Some(Frame::Item(item)) => match &mut item.sublist {
                Some(existing) => existing.children.push(ListChild::List(list)),
                None => item.sublist = Some(list),
            },
            Some(Frame::List(parent)) => parent.children.push(ListChild::List(list)),
            _ => self.blocks.push(Block::List(list)),
        }
    }

    fn finish(mut self) -> Document {
        while !self.stack.is_empty() {
            match self.stack.last() {
                Some(Frame::Leaf { .. }) => self.close_leaf(),
                Some(Frame::Span { .. }) => self.close_span(),
                Some(Frame::Item(_)) => self.close_item(),
                Some(Frame::List(_)) => self.close_list(),
                None => break,
            }
        }
        Document::from_blocks(self.blocks)
    }
}
