//! Helpers over inline sequences.
//!
//! Two coordinate systems are used here. *Raw* offsets count every char of
//! every text run (sentinels included) and one unit per `LineBreak`. *Perceived*
//! offsets are the same but skip sentinels, matching what the user sees.

use crate::editing::document::{Inline, SENTINEL};

/// A text run found by a depth-first walk over an inline sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run<'a> {
    /// Index path through spans down to the `Text`
    pub path: Vec<usize>,
    pub text: &'a str,
    pub raw_start: usize,
    pub perceived_start: usize,
}

impl Run<'_> {
    pub fn chars(&self) -> usize {
        self.text.chars().count()
    }

    pub fn perceived_len(&self) -> usize {
        text_perceived_len(self.text)
    }
}

pub fn text_perceived_len(text: &str) -> usize {
    text.chars().filter(|c| *c != SENTINEL).count()
}

pub fn strip_sentinels(text: &str) -> String {
    text.chars().filter(|c| *c != SENTINEL).collect()
}

/// Byte index of the `index`th char, or the string length past the end
pub fn char_to_byte(text: &str, index: usize) -> usize {
    text.char_indices()
        .nth(index)
        .map_or(text.len(), |(byte, _)| byte)
}

pub fn raw_len(seq: &[Inline]) -> usize {
    seq.iter()
        .map(|inline| match inline {
            Inline::Text(text) => text.chars().count(),
            Inline::Span { children, .. } => raw_len(children),
            Inline::LineBreak => 1,
        })
        .sum()
}

pub fn perceived_len(seq: &[Inline]) -> usize {
    seq.iter()
        .map(|inline| match inline {
            Inline::Text(text) => text_perceived_len(text),
            Inline::Span { children, .. } => perceived_len(children),
            Inline::LineBreak => 1,
        })
        .sum()
}

/// Flattened raw text, with line breaks as `'\n'`
pub fn raw_text(seq: &[Inline]) -> String {
    let mut out = String::new();
    push_raw_text(seq, &mut out);
    out
}

fn push_raw_text(seq: &[Inline], out: &mut String) {
    for inline in seq {
        match inline {
            Inline::Text(text) => out.push_str(text),
            Inline::Span { children, .. } => push_raw_text(children, out),
            Inline::LineBreak => out.push('\n'),
        }
    }
}

pub fn raw_char_at(seq: &[Inline], at: usize) -> Option<char> {
    raw_text(seq).chars().nth(at)
}

/// Every text run in reading order
pub fn runs(seq: &[Inline]) -> Vec<Run<'_>> {
    let mut out = Vec::new();
    let mut raw = 0;
    let mut perceived = 0;
    collect_runs(seq, &mut Vec::new(), &mut raw, &mut perceived, &mut out);
    out
}

fn collect_runs<'a>(
    seq: &'a [Inline],
    prefix: &mut Vec<usize>,
    raw: &mut usize,
    perceived: &mut usize,
    out: &mut Vec<Run<'a>>,
) {
    for (index, inline) in seq.iter().enumerate() {
        prefix.push(index);
        match inline {
            Inline::Text(text) => {
                let run = Run {
                    path: prefix.clone(),
                    text,
                    raw_start: *raw,
                    perceived_start: *perceived,
                };
                *raw += run.chars();
                *perceived += run.perceived_len();
                out.push(run);
            }
            Inline::Span { children, .. } => collect_runs(children, prefix, raw, perceived, out),
            Inline::LineBreak => {
                *raw += 1;
                *perceived += 1;
            }
        }
        prefix.pop();
    }
}

/// Raw offset of a (run path, char offset) position
pub fn raw_index(seq: &[Inline], path: &[usize], offset: usize) -> Option<usize> {
    runs(seq)
        .into_iter()
        .find(|run| run.path == path)
        .filter(|run| offset <= run.chars())
        .map(|run| run.raw_start + offset)
}

/// Earliest run covering a raw offset, as (run path, char offset)
pub fn location_for_raw(seq: &[Inline], raw: usize) -> Option<(Vec<usize>, usize)> {
    runs(seq)
        .into_iter()
        .find(|run| run.raw_start <= raw && raw <= run.raw_start + run.chars())
        .map(|run| {
            let offset = raw - run.raw_start;
            (run.path, offset)
        })
}

pub fn text_at<'a>(seq: &'a [Inline], path: &[usize]) -> Option<&'a String> {
    let (first, rest) = path.split_first()?;
    match seq.get(*first)? {
        Inline::Text(text) if rest.is_empty() => Some(text),
        Inline::Span { children, .. } => text_at(children, rest),
        _ => None,
    }
}

pub fn text_at_mut<'a>(seq: &'a mut [Inline], path: &[usize]) -> Option<&'a mut String> {
    let (first, rest) = path.split_first()?;
    match seq.get_mut(*first)? {
        Inline::Text(text) if rest.is_empty() => Some(text),
        Inline::Span { children, .. } => text_at_mut(children, rest),
        _ => None,
    }
}

/// Child sequence of the span at `prefix`, or `seq` itself for an empty prefix
pub fn children_mut<'a>(seq: &'a mut Vec<Inline>, prefix: &[usize]) -> Option<&'a mut Vec<Inline>> {
    let Some((first, rest)) = prefix.split_first() else {
        return Some(seq);
    };
    match seq.get_mut(*first)? {
        Inline::Span { children, .. } => children_mut(children, rest),
        _ => None,
    }
}

/// Split at a raw offset. Spans straddling the cut are split into two spans of
/// the same style; formatting on both sides is kept.
pub fn split_at_raw(seq: &[Inline], at: usize) -> (Vec<Inline>, Vec<Inline>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut pos = 0;
    for inline in seq {
        let len = raw_len(std::slice::from_ref(inline));
        if pos + len <= at {
            left.push(inline.clone());
        } else if pos >= at {
            right.push(inline.clone());
        } else {
            match inline {
                Inline::Text(text) => {
                    let byte = char_to_byte(text, at - pos);
                    left.push(Inline::Text(text[..byte].to_string()));
                    right.push(Inline::Text(text[byte..].to_string()));
                }
                Inline::Span { style, children } => {
                    let (l, r) = split_at_raw(children, at - pos);
                    left.push(Inline::span(*style, l));
                    right.push(Inline::span(*style, r));
                }
                Inline::LineBreak => right.push(Inline::LineBreak),
            }
        }
        pos += len;
    }
    (left, right)
}

/// Remove the raw char at `at`, returning it (`'\n'` for a line break)
pub fn remove_raw_char(seq: &mut Vec<Inline>, at: usize) -> Option<char> {
    let mut pos = 0;
    for index in 0..seq.len() {
        let len = raw_len(&seq[index..=index]);
        if at < pos + len {
            return match &mut seq[index] {
                Inline::Text(text) => {
                    let byte = char_to_byte(text, at - pos);
                    Some(text.remove(byte))
                }
                Inline::Span { children, .. } => remove_raw_char(children, at - pos),
                Inline::LineBreak => {
                    seq.remove(index);
                    Some('\n')
                }
            };
        }
        pos += len;
    }
    None
}

/// Merge adjacent text runs and drop empty runs and spans.
///
/// An empty sequence becomes a single empty text run so it still offers a
/// caret landing spot.
pub fn normalize(seq: &mut Vec<Inline>) {
    let mut out: Vec<Inline> = Vec::with_capacity(seq.len());
    for mut inline in seq.drain(..) {
        if let Inline::Span { children, .. } = &mut inline {
            normalize(children);
            if raw_len(children) == 0 {
                continue;
            }
        }
        match (out.last_mut(), inline) {
            (Some(Inline::Text(prev)), Inline::Text(next)) => prev.push_str(&next),
            (_, Inline::Text(text)) if text.is_empty() => {}
            (_, inline) => out.push(inline),
        }
    }
    if out.is_empty() {
        out.push(Inline::Text(String::new()));
    }
    *seq = out;
}
