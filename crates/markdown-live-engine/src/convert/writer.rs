use crate::editing::document::{Block, Document, Inline, ListChild, ListContainer, ListKind, Style};
use crate::editing::inlines;

/// Chars that always get a backslash
const ESCAPED: [char; 11] = ['\\', '*', '_', '~', '`', '[', ']', '<', '>', '&', '#'];

/// Chars that only start a block construct at the beginning of a line
const LINE_START_ESCAPED: [char; 3] = ['-', '+', '='];

/// Reads back as a sentinel, which the reader drops. Holds a line that would
/// otherwise be empty: an empty paragraph, or the far side of an edge break.
const EMPTY_LINE: &str = "&#8203;";

/// Serialize a document tree to markup.
///
/// Sentinels are dropped and lists are always written tight. A document that
/// is a single empty paragraph writes as empty markup.
pub fn markup_from_tree(doc: &Document) -> String {
    let mut chunks: Vec<String> = Vec::new();
    // Kind of the list written just before, and whether it used the alternate markers
    let mut previous_list: Option<(ListKind, bool)> = None;

    for (_, block) in doc.blocks() {
        match block {
            Block::Paragraph(content) => {
                let text = write_inlines(content, 0, false);
                if text.is_empty() {
                    chunks.push(EMPTY_LINE.to_string());
                } else {
                    chunks.push(text);
                }
                previous_list = None;
            }
            Block::Heading { level, body } => {
                let marker = Block::marker_text(*level);
                let body = write_inlines(body, 0, true);
                chunks.push(format!("{marker} {body}").trim_end().to_string());
                previous_list = None;
            }
            Block::List(list) => {
                // Adjacent lists of one kind only stay apart with different markers
                let alternate = matches!(previous_list, Some((kind, false)) if kind == list.kind);
                let mut lines = Vec::new();
                write_list(&mut lines, list, 0, alternate);
                chunks.push(lines.join("\n"));
                previous_list = Some((list.kind, alternate));
            }
        }
    }
    if chunks.len() == 1 && chunks[0] == EMPTY_LINE {
        return String::new();
    }
    chunks.join("\n\n")
}

fn list_marker(kind: ListKind, number: usize, alternate: bool) -> String {
    match (kind, alternate) {
        (ListKind::Unordered, false) => "-".to_string(),
        (ListKind::Unordered, true) => "*".to_string(),
        (ListKind::Ordered, false) => format!("{number}."),
        (ListKind::Ordered, true) => format!("{number})"),
    }
}

fn write_list(lines: &mut Vec<String>, list: &ListContainer, indent: usize, alternate: bool) {
    let pad = " ".repeat(indent);
    let mut number = 0;
    let mut content_indent = indent + 2;

    for child in &list.children {
        match child {
            ListChild::Item(item) => {
                number += 1;
                let marker = list_marker(list.kind, number, alternate);
                content_indent = indent + marker.len() + 1;
                let content = write_inlines(&item.content, content_indent, false);
                lines.push(format!("{pad}{marker} {content}").trim_end().to_string());
                if let Some(sublist) = &item.sublist {
                    write_list(lines, sublist, content_indent, false);
                }
            }
            // Markup has no list directly inside a list; nest it under the
            // previous item, or under an empty one when there is none
            ListChild::List(inner) => {
                if number == 0 {
                    number += 1;
                    let marker = list_marker(list.kind, number, alternate);
                    content_indent = indent + marker.len() + 1;
                    lines.push(format!("{pad}{marker}"));
                }
                write_list(lines, inner, content_indent, false);
            }
        }
    }
}

fn write_inlines(seq: &[Inline], indent: usize, heading: bool) -> String {
    let prepared = prepare(seq, heading);
    let edges = edge_blanks(&prepared);
    let mut writer = InlineWriter {
        out: String::new(),
        line_start: true,
        indent,
        raw: 0,
        total: edges.len(),
        edges,
    };
    writer.inlines(&prepared);
    writer.out
}

struct InlineWriter {
    out: String,
    line_start: bool,
    /// Continuation indent after a hard break
    indent: usize,
    /// Raw chars written so far, breaks included
    raw: usize,
    total: usize,
    /// Per raw char: a blank at a line edge
    edges: Vec<bool>,
}

impl InlineWriter {
    fn inlines(&mut self, seq: &[Inline]) {
        for inline in seq {
            match inline {
                Inline::Text(text) => self.text(text),
                Inline::LineBreak => {
                    if self.raw == 0 {
                        self.out.push_str(EMPTY_LINE);
                    }
                    self.out.push_str("\\\n");
                    self.out.push_str(&" ".repeat(self.indent));
                    self.line_start = true;
                    self.raw += 1;
                    if self.raw == self.total {
                        self.out.push_str(EMPTY_LINE);
                    }
                }
                Inline::Span { style, children } => {
                    let delimiter = delimiter(*style);
                    self.out.push_str(delimiter);
                    self.line_start = false;
                    self.inlines(children);
                    self.out.push_str(delimiter);
                }
            }
        }
    }

    fn text(&mut self, text: &str) {
        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if self.edges.get(self.raw).copied().unwrap_or(false) {
                self.out.push_str(blank_reference(c));
                self.raw += 1;
                i += 1;
                continue;
            }
            if self.line_start {
                self.line_start = false;
                if LINE_START_ESCAPED.contains(&c) {
                    self.out.push('\\');
                } else if c.is_ascii_digit() {
                    // "12." or "12)" would open an ordered list
                    let digits = chars[i..].iter().take_while(|c| c.is_ascii_digit()).count();
                    if let Some(&close @ ('.' | ')')) = chars.get(i + digits) {
                        self.out.extend(&chars[i..i + digits]);
                        self.out.push('\\');
                        self.out.push(close);
                        i += digits + 1;
                        self.raw += digits + 1;
                        continue;
                    }
                }
            }
            if ESCAPED.contains(&c) {
                self.out.push('\\');
            }
            self.out.push(c);
            i += 1;
            self.raw += 1;
        }
    }
}

/// The parser drops blanks at line edges; a character reference keeps them
fn blank_reference(c: char) -> &'static str {
    if c == '\t' { "&#9;" } else { "&#32;" }
}

fn delimiter(style: Style) -> &'static str {
    match style {
        Style::Italic => "*",
        Style::Bold => "**",
        Style::BoldItalic => "***",
        Style::Strike => "~~",
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Reshape inline content into something the parser reads back the same way
fn prepare(seq: &[Inline], heading: bool) -> Vec<Inline> {
    let mut out = merge_spans(strip(seq, heading));
    inlines::normalize(&mut out);
    let mut out = hoist_whitespace(out);
    inlines::normalize(&mut out);
    out
}

/// Drop sentinels. Headings are one line, so their breaks become spaces.
fn strip(seq: &[Inline], heading: bool) -> Vec<Inline> {
    seq.iter()
        .map(|inline| match inline {
            Inline::Text(text) => Inline::Text(inlines::strip_sentinels(text).replace('\n', " ")),
            Inline::Span { style, children } => Inline::span(*style, strip(children, heading)),
            Inline::LineBreak if heading => Inline::text(" "),
            Inline::LineBreak => Inline::LineBreak,
        })
        .collect()
}

/// Adjacent spans of one style would write as `**a****b**`
fn merge_spans(seq: Vec<Inline>) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::with_capacity(seq.len());
    for inline in seq {
        let inline = match inline {
            Inline::Span { style, children } => Inline::span(style, merge_spans(children)),
            other => other,
        };
        if let (
            Some(Inline::Span {
                style: previous,
                children: existing,
            }),
            Inline::Span { style, children },
        ) = (out.last_mut(), &inline)
        {
            if previous == style {
                existing.extend(children.iter().cloned());
                continue;
            }
        }
        out.push(inline);
    }
    out
}

/// Raw positions holding a blank at the start or end of a line
fn edge_blanks(seq: &[Inline]) -> Vec<bool> {
    let chars: Vec<char> = inlines::raw_text(seq).chars().collect();
    let mut edges = vec![false; chars.len()];
    let mut line_start = 0;
    for end in (0..=chars.len()).filter(|&i| i == chars.len() || chars[i] == '\n') {
        let line = &chars[line_start..end];
        let lead = line.iter().take_while(|c| is_blank(**c)).count();
        let trail = line.iter().rev().take_while(|c| is_blank(**c)).count();
        edges[line_start..line_start + lead].fill(true);
        edges[end - trail..end].fill(true);
        line_start = end + 1;
    }
    edges
}

/// Move blanks at the edges of a span outside of it: `** a **` is not emphasis
fn hoist_whitespace(seq: Vec<Inline>) -> Vec<Inline> {
    let mut out = Vec::with_capacity(seq.len());
    for inline in seq {
        let Inline::Span { style, children } = inline else {
            out.push(inline);
            continue;
        };
        let mut children = hoist_whitespace(children);
        let text: Vec<char> = inlines::raw_text(&children).chars().collect();
        let lead = text.iter().take_while(|c| is_blank(**c)).count();
        if lead == text.len() {
            out.push(Inline::Text(text.into_iter().collect()));
            continue;
        }
        let trail = text.iter().rev().take_while(|c| is_blank(**c)).count();
        for at in (text.len() - trail..text.len()).rev() {
            inlines::remove_raw_char(&mut children, at);
        }
        for _ in 0..lead {
            inlines::remove_raw_char(&mut children, 0);
        }

        if lead > 0 {
            out.push(Inline::Text(text[..lead].iter().collect()));
        }
        out.push(Inline::span(style, children));
        if trail > 0 {
            out.push(Inline::Text(text[text.len() - trail..].iter().collect()));
        }
    }
    out
}
