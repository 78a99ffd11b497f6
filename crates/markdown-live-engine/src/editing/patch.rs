use crate::editing::document::{ListKind, Style};
use crate::editing::location::Location;

/// Structural rewrite performed by a settle pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    HeadingCreated { level: u8 },
    ListCreated { kind: ListKind },
    /// Broken headings turned back into paragraphs
    HeadingReverted { count: usize },
    StyleApplied(Style),
}

/// Result of settling the session after an edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// The rewrite that fired, if any
    pub transform: Option<Transform>,
    /// Absolute caret offset after the pass
    pub caret: usize,
    pub version: u64,
    /// Whether an undo entry was recorded
    pub recorded: bool,
}

/// A fired rewrite together with where the caret belongs afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub transform: Transform,
    pub caret: Location,
}
