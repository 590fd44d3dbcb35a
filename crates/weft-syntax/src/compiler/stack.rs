//! Stack of nodes opened but not yet closed.

use crate::kind::NodeKind;

/// One open node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StackEntry {
    pub(crate) kind: NodeKind,
    /// Start of the chunk that opened the node.
    pub(crate) from: u32,
    /// Length of the record buffer when the node was opened.
    pub(crate) first_record: usize,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CompileStack {
    entries: Vec<StackEntry>,
}

impl CompileStack {
    pub(crate) fn push(&mut self, kind: NodeKind, from: u32, first_record: usize) {
        self.entries.push(StackEntry {
            kind,
            from,
            first_record,
        });
    }

    /// Pops the topmost entry of `kind`, dropping every entry above it.
    /// Returns `None` and leaves the stack untouched when `kind` is not open.
    pub(crate) fn close(&mut self, kind: NodeKind) -> Option<StackEntry> {
        let index = self.entries.iter().rposition(|entry| entry.kind == kind)?;
        let entry = self.entries[index];
        self.entries.truncate(index);
        Some(entry)
    }

    pub(crate) fn pop(&mut self) -> Option<StackEntry> {
        self.entries.pop()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
