//! The flat postfix record buffer.
//!
//! Every record is a `(kind, from, to, size)` quad of `i32`s. Children are
//! written before their parent, so a parent's `size` is its own quad plus the
//! footprint of everything written since it was opened.

use crate::kind::NodeKind;

/// Number of `i32`s in one record.
pub(crate) const RECORD: usize = 4;

/// `size` of a leaf record.
pub(crate) const LEAF_SIZE: i32 = 4;

/// `size` marking a record whose kind slot indexes the reused-tree list.
pub(crate) const REUSED: i32 = -1;

/// Append-only postfix record buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct NodeRecords {
    data: Vec<i32>,
    growth: usize,
}

impl NodeRecords {
    pub(crate) fn new(growth: usize) -> Self {
        Self {
            data: Vec::new(),
            growth: growth.max(1) * RECORD,
        }
    }

    fn push(&mut self, quad: [i32; 4]) {
        if self.data.len() + RECORD > self.data.capacity() {
            self.data.reserve_exact(self.growth.max(RECORD));
        }
        self.data.extend_from_slice(&quad);
    }

    pub(crate) fn leaf(&mut self, kind: NodeKind, from: u32, to: u32) {
        self.push([kind.raw(), offset(from), offset(to), LEAF_SIZE]);
    }

    /// `size` is measured in `i32`s and includes the node's own quad.
    pub(crate) fn node(&mut self, kind: NodeKind, from: u32, to: u32, size: usize) {
        let size = i32::try_from(size).unwrap_or(i32::MAX);
        self.push([kind.raw(), offset(from), offset(to), size]);
    }

    pub(crate) fn reused(&mut self, index: usize, from: u32, to: u32) {
        let index = i32::try_from(index).unwrap_or(i32::MAX);
        self.push([index, offset(from), offset(to), REUSED]);
    }

    /// Length in `i32`s.
    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn as_slice(&self) -> &[i32] {
        &self.data
    }
}

fn offset(pos: u32) -> i32 {
    i32::try_from(pos).unwrap_or(i32::MAX)
}

/// Read-only view of one record.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Record {
    pub(crate) kind: i32,
    pub(crate) from: u32,
    pub(crate) to: u32,
    pub(crate) size: i32,
}

impl Record {
    /// Reads the record whose quad starts at `at`.
    pub(crate) fn at(records: &[i32], at: usize) -> Self {
        Self {
            kind: records[at],
            from: u32::try_from(records[at + 1]).unwrap_or_default(),
            to: u32::try_from(records[at + 2]).unwrap_or_default(),
            size: records[at + 3],
        }
    }

    pub(crate) fn is_reused(self) -> bool {
        self.size == REUSED
    }

    /// Number of `i32`s the record and its descendants occupy.
    pub(crate) fn footprint(self) -> usize {
        if self.is_reused() {
            RECORD
        } else {
            usize::try_from(self.size).unwrap_or(RECORD).max(RECORD)
        }
    }

    pub(crate) fn node_kind(self) -> NodeKind {
        NodeKind::from_raw(self.kind)
    }

    pub(crate) fn reuse_index(self) -> usize {
        usize::try_from(self.kind).unwrap_or_default()
    }
}
