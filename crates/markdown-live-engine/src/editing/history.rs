use crate::editing::document::Document;

/// Owned copy of the document plus the absolute caret offset at that moment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub document: Document,
    pub caret: usize,
}

#[derive(Debug, Clone)]
struct Entry {
    before: Snapshot,
    after: Snapshot,
}

/// Undo/redo log of before/after snapshot pairs.
///
/// Recording a new pair clears the redo stack. With a limit set, the oldest
/// entries are dropped once the undo stack grows past it.
#[derive(Debug, Clone, Default)]
pub struct History {
    undo: Vec<Entry>,
    redo: Vec<Entry>,
    limit: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Push a before/after pair. Returns false when nothing changed.
    pub fn record(&mut self, before: Snapshot, after: Snapshot) -> bool {
        if before == after {
            return false;
        }
        self.redo.clear();
        self.undo.push(Entry { before, after });
        if let Some(limit) = self.limit {
            let excess = self.undo.len().saturating_sub(limit);
            self.undo.drain(..excess);
        }
        true
    }

    /// Snapshot to restore for an undo, or `None` when there is nothing to undo
    pub fn undo(&mut self) -> Option<Snapshot> {
        let entry = self.undo.pop()?;
        let restore = entry.before.clone();
        self.redo.push(entry);
        Some(restore)
    }

    /// Snapshot to restore for a redo, or `None` when there is nothing to redo
    pub fn redo(&mut self) -> Option<Snapshot> {
        let entry = self.redo.pop()?;
        let restore = entry.after.clone();
        self.undo.push(entry);
        Some(restore)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
