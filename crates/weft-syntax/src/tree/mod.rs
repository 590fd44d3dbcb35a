//! Immutable syntax trees and their navigation API.
//!
//! A [`Tree`] has two kinds of children: nested trees and flat
//! [`TreeBuffer`]s. Both are reference counted, so a tree built after an edit
//! points at the untouched parts of the previous one. [`SyntaxNode`] and
//! [`TreeCursor`] hide the difference between the two representations.

mod buffer;
pub(crate) mod build;
mod cursor;
mod node;
mod print;

pub use buffer::TreeBuffer;
pub use cursor::TreeCursor;
pub use node::{BufferNode, Children, Navigate, SyntaxNode, TreeNode};
pub use print::print_tree;

use std::sync::Arc;

use text_size::{TextRange, TextSize};

use crate::config::SyntaxConfig;
use crate::kind::NodeKind;
use build::Builder;

/// A child of a [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeChild {
    /// A nested tree.
    Tree(Arc<Tree>),
    /// A packed run of nodes.
    Buffer(Arc<TreeBuffer>),
}

impl TreeChild {
    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> u32 {
        match self {
            TreeChild::Tree(tree) => tree.len(),
            TreeChild::Buffer(buffer) => buffer.len(),
        }
    }

    /// Returns `true` if the child spans no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An immutable node with positioned children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    kind: NodeKind,
    children: Vec<TreeChild>,
    positions: Vec<u32>,
    length: u32,
}

impl Tree {
    /// Creates a tree. `positions` are relative to the tree's own start and
    /// parallel to `children`.
    #[must_use]
    pub fn new(kind: NodeKind, children: Vec<TreeChild>, positions: Vec<u32>, length: u32) -> Self {
        debug_assert_eq!(children.len(), positions.len());
        Self {
            kind,
            children,
            positions,
            length,
        }
    }

    /// A childless tree.
    #[must_use]
    pub fn empty(kind: NodeKind, length: u32) -> Arc<Self> {
        Arc::new(Self::new(kind, Vec::new(), Vec::new(), length))
    }

    /// Builds a tree from postfix records in a single backward pass.
    ///
    /// Runs of siblings without reuse records are packed into
    /// [`TreeBuffer`]s of at most `max_buffer_length` nodes; reuse records
    /// splice in the matching entry of `reused`; nodes with more than
    /// `branch_factor` children get anonymous intermediate nodes.
    #[must_use]
    pub fn build(
        records: &[i32],
        reused: &[Arc<Tree>],
        kind: NodeKind,
        length: u32,
        config: &SyntaxConfig,
    ) -> Arc<Self> {
        Builder::new(records, reused, config).node(kind, 0, length, 0..records.len())
    }

    /// The node kind.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.length
    }

    /// Returns `true` if the tree spans no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Direct children.
    #[must_use]
    pub fn children(&self) -> &[TreeChild] {
        &self.children
    }

    /// Child offsets relative to this tree's start.
    #[must_use]
    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    /// Returns `true` if any child is visible to navigation.
    pub(crate) fn has_child(&self) -> bool {
        self.children.iter().any(|child| match child {
            TreeChild::Buffer(_) => true,
            TreeChild::Tree(tree) => !tree.kind.is_anonymous() || tree.has_child(),
        })
    }

    /// The root as a navigable node.
    #[must_use]
    pub fn top_node(self: &Arc<Self>) -> SyntaxNode {
        SyntaxNode::Tree(TreeNode::root(Arc::clone(self)))
    }

    /// A cursor positioned on the root.
    #[must_use]
    pub fn cursor(self: &Arc<Self>) -> TreeCursor {
        TreeCursor::new(self.top_node())
    }

    /// Finds the innermost node covering `pos`. With `side < 0` a node ending
    /// at `pos` qualifies, with `side > 0` a node starting there; with `0` the
    /// node must strictly contain `pos`.
    #[must_use]
    pub fn resolve(self: &Arc<Self>, pos: u32, side: i8) -> SyntaxNode {
        self.top_node().resolve(pos, side)
    }

    /// Like [`Tree::resolve`], but starts from the node found by the previous
    /// call with the same cache, which is cheap for nearby positions.
    #[must_use]
    pub fn resolve_inner(self: &Arc<Self>, cache: &mut ResolveCache, pos: u32, side: i8) -> SyntaxNode {
        let start = match &cache.last {
            Some((tree, node)) if Arc::ptr_eq(tree, self) => node.clone(),
            _ => self.top_node(),
        };
        let node = start.resolve(pos, side);
        cache.last = Some((Arc::clone(self), node.clone()));
        node
    }

    /// Kind and range of every visible node, in document order.
    #[must_use]
    pub fn preorder(self: &Arc<Self>) -> Vec<(NodeKind, TextRange)> {
        let mut cursor = self.cursor();
        let mut out = Vec::new();
        loop {
            out.push((
                cursor.kind(),
                TextRange::new(TextSize::from(cursor.from()), TextSize::from(cursor.to())),
            ));
            if !cursor.next() {
                return out;
            }
        }
    }
}

/// Memo of the last node resolved on a tree, passed explicitly to
/// [`Tree::resolve_inner`].
#[derive(Debug, Clone, Default)]
pub struct ResolveCache {
    last: Option<(Arc<Tree>, SyntaxNode)>,
}

impl ResolveCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets the memoized node.
    pub fn clear(&mut self) {
        self.last = None;
    }
}

/// Which nodes around a position a child search accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Nodes starting before the position.
    Before,
    /// Nodes starting before and ending at or after the position.
    AtOrBefore,
    /// Nodes strictly containing the position.
    Around,
    /// Nodes starting at or before and ending after the position.
    AtOrAfter,
    /// Nodes ending after the position.
    After,
    /// Any node.
    DontCare,
}

impl Side {
    /// Maps a resolve bias (`-1`, `0`, `1`) to the side used for entering
    /// children.
    #[must_use]
    pub fn from_bias(bias: i8) -> Self {
        match bias.signum() {
            -1 => Side::AtOrBefore,
            0 => Side::Around,
            _ => Side::AtOrAfter,
        }
    }

    pub(crate) fn check(self, pos: u32, from: u32, to: u32) -> bool {
        match self {
            Side::Before => from < pos,
            Side::AtOrBefore => to >= pos && from < pos,
            Side::Around => from < pos && to > pos,
            Side::AtOrAfter => from <= pos && to > pos,
            Side::After => to > pos,
            Side::DontCare => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_checks() {
        assert!(Side::Before.check(5, 4, 5));
        assert!(!Side::Before.check(5, 5, 6));
        assert!(Side::AtOrBefore.check(5, 4, 5));
        assert!(!Side::Around.check(5, 4, 5));
        assert!(Side::Around.check(5, 4, 6));
        assert!(Side::AtOrAfter.check(5, 5, 6));
        assert!(!Side::AtOrAfter.check(5, 4, 5));
        assert!(Side::After.check(5, 0, 6));
        assert!(Side::DontCare.check(5, 9, 9));
    }

    #[test]
    fn empty_tree_has_only_a_root() {
        let tree = Tree::empty(NodeKind::DOCUMENT, 7);
        assert_eq!(
            tree.preorder(),
            vec![(NodeKind::DOCUMENT, TextRange::new(0.into(), 7.into()))]
        );
        assert!(!tree.has_child());
    }

    #[test]
    fn anonymous_only_children_are_invisible() {
        let hidden = Arc::new(Tree::new(NodeKind::ANONYMOUS, Vec::new(), Vec::new(), 2));
        let tree = Arc::new(Tree::new(
            NodeKind::DOCUMENT,
            vec![TreeChild::Tree(hidden)],
            vec![1],
            4,
        ));
        assert!(!tree.has_child());
        assert!(tree.top_node().first_child().is_none());
    }
}
