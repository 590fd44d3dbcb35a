//! Flat encoding for runs of small subtrees.

use crate::compiler::{Record, RECORD};
use crate::kind::NodeKind;
use crate::tree::Side;

/// A dense run of nodes stored as prefix-ordered `(kind, from, to, end)`
/// quads. Positions are relative to the start of the buffer; `end` is the
/// offset of the first quad after the node's subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeBuffer {
    data: Vec<u32>,
    length: u32,
}

impl TreeBuffer {
    /// Packs the postfix records of `roots`, a run of sibling subtrees, into
    /// a buffer starting at `start`.
    pub(crate) fn from_postfix(records: &[i32], roots: &[std::ops::Range<usize>], start: u32) -> Self {
        let nodes: usize = roots.iter().map(|range| range.len() / RECORD).sum();
        let mut data = Vec::with_capacity(nodes * RECORD);
        let mut length = 0;
        for range in roots {
            copy_prefix(records, range.clone(), start, &mut data);
            length = length.max(Record::at(records, range.end - RECORD).to.saturating_sub(start));
        }
        Self { data, length }
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.length
    }

    /// Returns `true` if the buffer spans no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Raw quads.
    #[must_use]
    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Number of nodes in the buffer.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.data.len() / RECORD
    }

    /// Kind of the node at quad offset `index`.
    #[must_use]
    pub fn kind(&self, index: usize) -> NodeKind {
        NodeKind(u16::try_from(self.data[index]).unwrap_or_default())
    }

    /// Relative start of the node at `index`.
    #[must_use]
    pub fn from(&self, index: usize) -> u32 {
        self.data[index + 1]
    }

    /// Relative end of the node at `index`.
    #[must_use]
    pub fn to(&self, index: usize) -> u32 {
        self.data[index + 2]
    }

    /// Offset just past the subtree of the node at `index`.
    #[must_use]
    pub fn end(&self, index: usize) -> usize {
        self.data[index + 3] as usize
    }

    /// Finds a child among the siblings starting at `start` and ending before
    /// `end`. With `dir > 0` the first match is taken, otherwise the last.
    /// `offset` is the absolute position of the buffer, so `pos` is absolute.
    pub(crate) fn find_child(
        &self,
        start: usize,
        end: usize,
        dir: isize,
        pos: u32,
        side: Side,
        offset: u32,
    ) -> Option<usize> {
        let mut pick = None;
        let mut index = start;
        while index < end {
            if side.check(pos, offset + self.from(index), offset + self.to(index)) {
                pick = Some(index);
                if dir > 0 {
                    break;
                }
            }
            index = self.end(index);
        }
        pick
    }
}

/// Rewrites the postfix subtree in `range` as prefix quads.
fn copy_prefix(records: &[i32], range: std::ops::Range<usize>, start: u32, data: &mut Vec<u32>) {
    let own = range.end - RECORD;
    let record = Record::at(records, own);
    let at = data.len();
    data.extend_from_slice(&[
        u32::from(record.node_kind().0),
        record.from.saturating_sub(start),
        record.to.saturating_sub(start),
        0,
    ]);
    for child in super::build::siblings(records, range.start..own) {
        copy_prefix(records, child, start, data);
    }
    data[at + 3] = u32::try_from(data.len()).unwrap_or(u32::MAX);
}
