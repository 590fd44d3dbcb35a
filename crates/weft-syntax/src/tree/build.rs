//! Bottom-up tree construction from postfix records.

use std::ops::Range;
use std::sync::Arc;

use crate::compiler::{Record, RECORD};
use crate::config::SyntaxConfig;
use crate::kind::NodeKind;
use crate::tree::{Tree, TreeBuffer, TreeChild};

/// Splits `range` into the record ranges of its top-level subtrees, in
/// document order. Reads back to front, skipping each subtree by its
/// footprint.
pub(crate) fn siblings(records: &[i32], range: Range<usize>) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut end = range.end;
    while end >= range.start + RECORD {
        let footprint = Record::at(records, end - RECORD).footprint();
        let start = end.saturating_sub(footprint).max(range.start);
        out.push(start..end);
        end = start;
    }
    out.reverse();
    out
}

pub(crate) struct Builder<'a> {
    records: &'a [i32],
    reused: &'a [Arc<Tree>],
    max_buffer: usize,
    branch_factor: usize,
}

impl<'a> Builder<'a> {
    pub(crate) fn new(records: &'a [i32], reused: &'a [Arc<Tree>], config: &SyntaxConfig) -> Self {
        Self {
            records,
            reused,
            max_buffer: (config.max_buffer_length as usize).max(1),
            branch_factor: (config.branch_factor as usize).max(2),
        }
    }

    /// Builds a node of `kind` starting at absolute `base` whose children are
    /// the records in `children`.
    pub(crate) fn node(&self, kind: NodeKind, base: u32, length: u32, children: Range<usize>) -> Arc<Tree> {
        let mut out = Vec::new();
        let mut positions = Vec::new();
        let mut run: Vec<Range<usize>> = Vec::new();
        let mut run_nodes = 0;

        for range in siblings(self.records, children) {
            let record = Record::at(self.records, range.end - RECORD);
            let nodes = range.len() / RECORD;

            if !record.is_reused() && nodes <= self.max_buffer && !self.has_reused(&range) {
                if run_nodes + nodes > self.max_buffer {
                    self.flush(&mut run, base, &mut out, &mut positions);
                    run_nodes = 0;
                }
                run.push(range);
                run_nodes += nodes;
                continue;
            }

            self.flush(&mut run, base, &mut out, &mut positions);
            run_nodes = 0;
            if record.is_reused() {
                if let Some(tree) = self.reused.get(record.reuse_index()) {
                    out.push(TreeChild::Tree(Arc::clone(tree)));
                    positions.push(record.from.saturating_sub(base));
                }
            } else {
                let inner = self.node(
                    record.node_kind(),
                    record.from,
                    record.to.saturating_sub(record.from),
                    range.start..range.end - RECORD,
                );
                out.push(TreeChild::Tree(inner));
                positions.push(record.from.saturating_sub(base));
            }
        }
        self.flush(&mut run, base, &mut out, &mut positions);

        let (children, positions) = self.balance(out, positions);
        Arc::new(Tree::new(kind, children, positions, length))
    }

    fn has_reused(&self, range: &Range<usize>) -> bool {
        self.records[range.clone()]
            .chunks_exact(RECORD)
            .any(|quad| Record::at(quad, 0).is_reused())
    }

    fn flush(
        &self,
        run: &mut Vec<Range<usize>>,
        base: u32,
        out: &mut Vec<TreeChild>,
        positions: &mut Vec<u32>,
    ) {
        let Some(first) = run.first() else {
            return;
        };
        let start = Record::at(self.records, first.end - RECORD).from;
        out.push(TreeChild::Buffer(Arc::new(TreeBuffer::from_postfix(
            self.records,
            run,
            start,
        ))));
        positions.push(start.saturating_sub(base));
        run.clear();
    }

    /// Regroups children into anonymous nodes until no more than
    /// `branch_factor` remain.
    fn balance(&self, mut children: Vec<TreeChild>, mut positions: Vec<u32>) -> (Vec<TreeChild>, Vec<u32>) {
        while children.len() > self.branch_factor {
            let mut grouped = Vec::with_capacity(children.len().div_ceil(self.branch_factor));
            let mut grouped_positions = Vec::with_capacity(grouped.capacity());
            for (group, offsets) in children
                .chunks(self.branch_factor)
                .zip(positions.chunks(self.branch_factor))
            {
                let start = offsets[0];
                if let [single] = group {
                    grouped.push(single.clone());
                    grouped_positions.push(start);
                    continue;
                }
                let end = group
                    .iter()
                    .zip(offsets)
                    .map(|(child, offset)| offset + child.len())
                    .max()
                    .unwrap_or(start);
                let tree = Tree::new(
                    NodeKind::ANONYMOUS,
                    group.to_vec(),
                    offsets.iter().map(|offset| offset - start).collect(),
                    end - start,
                );
                grouped.push(TreeChild::Tree(Arc::new(tree)));
                grouped_positions.push(start);
            }
            children = grouped;
            positions = grouped_positions;
        }
        (children, positions)
    }
}
