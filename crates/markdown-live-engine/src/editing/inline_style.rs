//! Inline emphasis created from typed markers.
//!
//! When the text just before the caret reads `marker + char` the marker is
//! consumed and the char is wrapped in a style span, followed by a sentinel
//! that marks the exit point of the span.

use crate::editing::document::{Document, Inline, SENTINEL, Style};
use crate::editing::inlines;
use crate::editing::location::Location;
use crate::editing::patch::{Rewrite, Transform};

/// Markers in match priority order
pub const MARKERS: [(&str, Style); 4] = [
    ("***", Style::BoldItalic),
    ("**", Style::Bold),
    ("__", Style::Italic),
    ("~~", Style::Strike),
];

const MARKER_CHARS: [char; 3] = ['*', '_', '~'];

fn is_wrappable(c: char) -> bool {
    !c.is_whitespace() && !MARKER_CHARS.contains(&c) && c != SENTINEL
}

#[derive(Debug, PartialEq, Eq)]
struct MarkerMatch {
    style: Style,
    before: String,
    wrapped: char,
    after: String,
}

fn find_marker(text: &str, offset: usize) -> Option<MarkerMatch> {
    let chars: Vec<char> = text.chars().collect();
    if offset > chars.len() {
        return None;
    }
    let wrapped = *chars.get(offset.checked_sub(1)?)?;
    if !is_wrappable(wrapped) {
        return None;
    }
    MARKERS.iter().find_map(|(marker, style)| {
        let start = offset.checked_sub(marker.len() + 1)?;
        let window: String = chars[start..offset - 1].iter().collect();
        (window == *marker).then(|| MarkerMatch {
            style: *style,
            before: chars[..start].iter().collect(),
            wrapped,
            after: chars[offset..].iter().collect(),
        })
    })
}

/// Apply the first marker matching the caret's trailing window.
///
/// Inside an existing span the match breaks out of it: the span is cut at the
/// marker, the new span and its exit sentinel become siblings, and whatever
/// followed the caret inside the old span is rewrapped in the old style.
pub fn apply_inline_style(doc: &mut Document, caret: &Location) -> Option<Rewrite> {
    let seq = doc.inlines_mut(caret.block, &caret.slot)?;
    let found = find_marker(inlines::text_at(seq, &caret.path)?, caret.offset)?;
    let (index, prefix) = caret.path.split_last()?;
    let index = *index;
    let span = Inline::span(found.style, vec![Inline::Text(found.wrapped.to_string())]);

    let caret_path = match prefix.split_last() {
        None => {
            let mut replacement = Vec::new();
            if !found.before.is_empty() {
                replacement.push(Inline::Text(found.before));
            }
            let span_index = index + replacement.len();
            replacement.push(span);
            replacement.push(Inline::Text(format!("{SENTINEL}{}", found.after)));
            seq.splice(index..=index, replacement);
            vec![span_index, 0]
        }
        Some((outer_index, outer_prefix)) => {
            let outer_index = *outer_index;
            let parent = inlines::children_mut(seq, outer_prefix)?;
            let Some(Inline::Span {
                style: outer_style,
                children,
            }) = parent.get(outer_index).cloned()
            else {
                return None;
            };

            let mut left = children.get(..index)?.to_vec();
            if !found.before.is_empty() {
                left.push(Inline::Text(found.before));
            }
            let mut right = Vec::new();
            if !found.after.is_empty() {
                right.push(Inline::Text(found.after));
            }
            right.extend(children.iter().skip(index + 1).cloned());

            let mut replacement = Vec::new();
            if inlines::raw_len(&left) > 0 {
                replacement.push(Inline::span(outer_style, left));
            }
            let span_index = outer_index + replacement.len();
            replacement.push(span);
            replacement.push(Inline::Text(SENTINEL.to_string()));
            if inlines::raw_len(&right) > 0 {
                replacement.push(Inline::span(outer_style, right));
            }
            parent.splice(outer_index..=outer_index, replacement);

            let mut path = outer_prefix.to_vec();
            path.extend([span_index, 0]);
            path
        }
    };

    log::debug!("applied {:?} span", found.style);
    Some(Rewrite {
        transform: Transform::StyleApplied(found.style),
        caret: Location::new(caret.block, caret.slot.clone(), caret_path, 1),
    })
}
