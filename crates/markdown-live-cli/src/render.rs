//! Paints the live document into terminal lines and finds the caret cell.
//!
//! The painter walks blocks in reading order and counts perceived offsets the
//! same way the engine does, so the caret and selection can be placed without
//! asking the engine for screen geometry.

use markdown_live_engine::editing::{
    Block, Document, Inline, ListChild, ListContainer, ListKind, SENTINEL, Style,
};
use ratatui::{
    style::{Color, Modifier, Style as TuiStyle},
    text::{Line, Span},
};

pub struct Rendered {
    pub lines: Vec<Line<'static>>,
    /// Caret cell as `(column, row)` relative to the first line
    pub cursor: (u16, u16),
}

pub fn render(document: &Document, caret: usize, selection: (usize, usize)) -> Rendered {
    let mut painter = Painter::new(caret, selection);
    for (index, (_, block)) in document.blocks().enumerate() {
        if index > 0 {
            painter.block_separator();
        }
        match block {
            Block::Paragraph(content) => painter.inlines(content, TuiStyle::default()),
            Block::Heading { level, body } => {
                let marker = TuiStyle::default().fg(Color::DarkGray);
                for _ in 0..*level {
                    painter.unit('#', marker);
                }
                painter.unit(' ', marker);
                let style = TuiStyle::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD);
                painter.inlines(body, style);
            }
            Block::List(list) => {
                let mut first = true;
                painter.list(list, 0, &mut first);
            }
        }
    }
    painter.finish()
}

fn modifier(style: Style) -> Modifier {
    match style {
        Style::Bold => Modifier::BOLD,
        Style::Italic => Modifier::ITALIC,
        Style::Strike => Modifier::CROSSED_OUT,
        Style::BoldItalic => Modifier::BOLD | Modifier::ITALIC,
    }
}

struct Painter {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    col: usize,
    /// Continuation indent after a hard break inside a list item
    hang: usize,
    offset: usize,
    caret: usize,
    selection: (usize, usize),
    cursor: Option<(u16, u16)>,
}

impl Painter {
    fn new(caret: usize, selection: (usize, usize)) -> Self {
        Self {
            lines: Vec::new(),
            spans: Vec::new(),
            col: 0,
            hang: 0,
            offset: 0,
            caret,
            selection,
            cursor: None,
        }
    }

    fn mark(&mut self) {
        if self.cursor.is_none() && self.offset == self.caret {
            let col = u16::try_from(self.col).unwrap_or(u16::MAX);
            let row = u16::try_from(self.lines.len()).unwrap_or(u16::MAX);
            self.cursor = Some((col, row));
        }
    }

    fn selected(&self) -> bool {
        let (start, end) = self.selection;
        start <= self.offset && self.offset < end
    }

    /// One perceived unit of text
    fn unit(&mut self, c: char, style: TuiStyle) {
        self.mark();
        let style = if self.selected() {
            style.add_modifier(Modifier::REVERSED)
        } else {
            style
        };
        self.push(c.to_string(), style);
        self.offset += 1;
    }

    /// Text that is shown but takes no caret position
    fn decoration(&mut self, text: &str, style: TuiStyle) {
        self.push(text.to_string(), style);
    }

    fn push(&mut self, text: String, style: TuiStyle) {
        self.col += text.chars().count();
        if let Some(last) = self.spans.last_mut()
            && last.style == style
        {
            last.content.to_mut().push_str(&text);
            return;
        }
        self.spans.push(Span::styled(text, style));
    }

    fn end_line(&mut self) {
        let spans = std::mem::take(&mut self.spans);
        self.lines.push(Line::from(spans));
        self.col = 0;
    }

    /// A separator unit that also ends the visual line
    fn line_unit(&mut self) {
        self.mark();
        self.end_line();
        self.offset += 1;
    }

    fn block_separator(&mut self) {
        self.line_unit();
        self.lines.push(Line::default());
        self.hang = 0;
    }

    fn inlines(&mut self, content: &[Inline], style: TuiStyle) {
        for inline in content {
            match inline {
                Inline::Text(text) => {
                    for c in text.chars().filter(|c| *c != SENTINEL) {
                        self.unit(c, style);
                    }
                }
                Inline::Span {
                    style: span_style,
                    children,
                } => self.inlines(children, style.add_modifier(modifier(*span_style))),
                Inline::LineBreak => {
                    self.line_unit();
                    let hang = " ".repeat(self.hang);
                    self.decoration(&hang, TuiStyle::default());
                }
            }
        }
    }

    fn list(&mut self, list: &ListContainer, depth: usize, first: &mut bool) {
        let mut number = 0;
        for child in &list.children {
            match child {
                ListChild::Item(item) => {
                    number += 1;
                    if !*first {
                        self.line_unit();
                    }
                    *first = false;
                    let bullet = match list.kind {
                        ListKind::Unordered => "• ".to_string(),
                        ListKind::Ordered => format!("{number}. "),
                    };
                    let indent = "  ".repeat(depth);
                    self.hang = indent.chars().count() + bullet.chars().count();
                    self.decoration(&indent, TuiStyle::default());
                    self.decoration(&bullet, TuiStyle::default().fg(Color::Yellow));
                    self.inlines(&item.content, TuiStyle::default());
                    if let Some(sublist) = &item.sublist {
                        self.list(sublist, depth + 1, first);
                    }
                }
                ListChild::List(inner) => self.list(inner, depth + 1, first),
            }
        }
    }

    fn finish(mut self) -> Rendered {
        self.mark();
        self.end_line();
        Rendered {
            cursor: self.cursor.unwrap_or((0, 0)),
            lines: self.lines,
        }
    }
}
