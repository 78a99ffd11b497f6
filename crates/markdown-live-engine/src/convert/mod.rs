/*!
# Markdown ↔ tree conversion

Pure functions used for import, paste and export. Neither direction knows
about the caret.

Reading goes through `pulldown-cmark` with strikethrough enabled and keeps
only what the tree can hold: paragraphs, ATX headings, nested lists, hard
breaks and the four emphasis styles. Writing produces a normalized form:

- `#` headings, `-` and `1.` list markers, tight lists;
- `*`, `**`, `***` and `~~` delimiters with blanks kept outside them;
- `\` line ends for hard breaks;
- a backslash before every char that could start markup;
- `&#32;` or `&#9;` for a blank at the start or end of a line;
- `&#8203;` for a line that would be empty: an empty paragraph, or the
  line before a leading or after a trailing hard break.

The reader drops every `U+200B` it meets, so the empty-line marker reads
back as nothing. Written markup is a fixpoint: reading it back and writing
again gives the same text.
*/

mod reader;
mod writer;

pub use reader::tree_from_markup;
pub use writer::markup_from_tree;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::document::{
        Block, Document, Inline, ListChild, ListContainer, ListItem, ListKind, Style,
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("# Title\n\nSome **bold** and *italic* text.")]
    #[case("- a\n- b\n  - c\n    1. d\n- e")]
    #[case("1. one\n2. two\n\n1) three")]
    #[case("line one\\\nline two\n\n~~struck~~ ***both***")]
    #[case("a **b** c\n\n## Second\n\n- x\\\n  y")]
    #[case("2024. was a year\n\n\\- dash\n\n\\# hash")]
    #[case("  messy   **  spaced  **   text  \n\n\n\n* star list\n+ plus list")]
    #[case("```\ncode\n  indented\n```\n\n> quote")]
    #[case("***")]
    fn test_export_is_fixpoint(#[case] markup: &str) {
        let first = markup_from_tree(&tree_from_markup(markup));
        let second = markup_from_tree(&tree_from_markup(&first));
        assert_eq!(second, first);
    }

    #[test]
    fn test_regular_tree_round_trips() {
        let doc = Document::from_blocks([
            Block::heading(1, "Title"),
            Block::Paragraph(vec![
                Inline::text("plain "),
                Inline::span(Style::Bold, vec![Inline::text("bold")]),
                Inline::text(" "),
                Inline::span(
                    Style::Italic,
                    vec![
                        Inline::text("it "),
                        Inline::span(Style::Strike, vec![Inline::text("gone")]),
                    ],
                ),
                Inline::LineBreak,
                Inline::text("next [line] #3"),
            ]),
            Block::List(ListContainer::with_items(
                ListKind::Unordered,
                [
                    ListItem::new(vec![Inline::text("a")]).with_sublist(
                        ListContainer::with_items(
                            ListKind::Ordered,
                            [
                                ListItem::new(vec![Inline::text("b")]),
                                ListItem::new(vec![Inline::text("c")]),
                            ],
                        ),
                    ),
                    ListItem::new(vec![Inline::span(
                        Style::BoldItalic,
                        vec![Inline::text("d")],
                    )]),
                ],
            )),
            Block::list(ListKind::Unordered, &["e"]),
            Block::heading(3, "End"),
        ]);

        let restored = tree_from_markup(&markup_from_tree(&doc));

        assert_eq!(restored, doc);
    }

    #[test]
    fn test_irregular_list_exports_as_nested_item() {
        let doc = Document::from_blocks([Block::List(ListContainer {
            kind: ListKind::Unordered,
            children: vec![
                ListChild::Item(ListItem::new(vec![Inline::text("a")])),
                ListChild::List(ListContainer::with_items(
                    ListKind::Unordered,
                    [ListItem::new(vec![Inline::text("b")])],
                )),
            ],
        })]);

        let markup = markup_from_tree(&doc);

        assert_eq!(markup, "- a\n  - b");
        assert_eq!(
            tree_from_markup(&markup),
            Document::from_blocks([Block::List(ListContainer::with_items(
                ListKind::Unordered,
                [ListItem::new(vec![Inline::text("a")]).with_sublist(
                    ListContainer::with_items(
                        ListKind::Unordered,
                        [ListItem::new(vec![Inline::text("b")])]
                    )
                )],
            ))])
        );
    }
}
