//! Positioned views of tree nodes.
//!
//! A node is a tree plus enough context to find its parent and siblings:
//! [`TreeNode`] wraps a nested [`Tree`], [`BufferNode`] points into a
//! [`TreeBuffer`]. Both are cheap `Arc` handles. Anonymous nodes are never
//! returned; navigation looks straight through them.

use std::fmt;
use std::sync::Arc;

use text_size::{TextRange, TextSize};

use crate::compiler::RECORD;
use crate::kind::NodeKind;
use crate::tree::{Side, Tree, TreeBuffer, TreeChild, TreeCursor};

/// Navigation shared by every node representation.
pub trait Navigate {
    /// The node kind.
    fn kind(&self) -> NodeKind;

    /// Absolute start.
    fn from(&self) -> u32;

    /// Absolute end.
    fn to(&self) -> u32;

    /// The closest visible ancestor.
    fn parent(&self) -> Option<SyntaxNode>;

    /// The first or last child (`dir > 0` or `dir < 0`) accepted by `side` at
    /// `pos`.
    fn child(&self, dir: isize, pos: u32, side: Side) -> Option<SyntaxNode>;

    /// The next visible sibling.
    fn next_sibling(&self) -> Option<SyntaxNode>;

    /// The previous visible sibling.
    fn prev_sibling(&self) -> Option<SyntaxNode>;

    /// The span of the node.
    fn text_range(&self) -> TextRange {
        TextRange::new(TextSize::from(self.from()), TextSize::from(self.to()))
    }

    /// The first child.
    fn first_child(&self) -> Option<SyntaxNode> {
        self.child(1, 0, Side::DontCare)
    }

    /// The last child.
    fn last_child(&self) -> Option<SyntaxNode> {
        self.child(-1, 0, Side::DontCare)
    }

    /// The first child ending after `pos`.
    fn child_after(&self, pos: u32) -> Option<SyntaxNode> {
        self.child(1, pos, Side::After)
    }

    /// The last child starting before `pos`.
    fn child_before(&self, pos: u32) -> Option<SyntaxNode> {
        self.child(-1, pos, Side::Before)
    }

    /// The first child around `pos` accepted by `side`.
    fn enter(&self, pos: u32, side: Side) -> Option<SyntaxNode> {
        self.child(1, pos, side)
    }
}

/// A node backed by a nested [`Tree`].
#[derive(Clone)]
pub struct TreeNode(Arc<TreeNodeData>);

struct TreeNodeData {
    tree: Arc<Tree>,
    from: u32,
    /// Index in the parent's children; `None` for the root.
    index: Option<usize>,
    parent: Option<TreeNode>,
}

impl TreeNode {
    pub(crate) fn root(tree: Arc<Tree>) -> Self {
        Self::new(tree, 0, None, None)
    }

    fn new(tree: Arc<Tree>, from: u32, index: Option<usize>, parent: Option<TreeNode>) -> Self {
        Self(Arc::new(TreeNodeData {
            tree,
            from,
            index,
            parent,
        }))
    }

    /// The underlying tree.
    #[must_use]
    pub fn tree(&self) -> &Arc<Tree> {
        &self.0.tree
    }

    pub(crate) fn index(&self) -> Option<usize> {
        self.0.index
    }

    /// The direct parent, anonymous or not.
    pub(crate) fn raw_parent(&self) -> Option<&TreeNode> {
        self.0.parent.as_ref()
    }

    pub(crate) fn next_significant_parent(&self) -> TreeNode {
        let mut node = self.clone();
        while node.kind().is_anonymous() {
            match node.0.parent.clone() {
                Some(parent) => node = parent,
                None => break,
            }
        }
        node
    }

    pub(crate) fn parent_node(&self) -> Option<TreeNode> {
        self.0
            .parent
            .as_ref()
            .map(TreeNode::next_significant_parent)
    }

    fn last_index(&self) -> isize {
        len_isize(self.0.tree.children().len()) - 1
    }

    /// Searches the children from index `i` in direction `dir`. Anonymous
    /// children are entered; when an anonymous node runs out of children the
    /// search continues in its parent.
    pub(crate) fn next_child(&self, mut i: isize, dir: isize, pos: u32, side: Side) -> Option<SyntaxNode> {
        let mut parent = self.clone();
        loop {
            let tree = Arc::clone(parent.tree());
            let end = if dir > 0 { len_isize(tree.children().len()) } else { -1 };
            while i != end {
                let Ok(index) = usize::try_from(i) else {
                    break;
                };
                i += dir;

                let child = &tree.children()[index];
                let start = parent.0.from + tree.positions()[index];
                if !side.check(pos, start, start + child.len()) {
                    continue;
                }
                match child {
                    TreeChild::Buffer(buffer) => {
                        let found = buffer.find_child(0, buffer.data().len(), dir, pos, side, start);
                        if let Some(found) = found {
                            let context = Arc::new(BufferContext {
                                parent: parent.clone(),
                                buffer: Arc::clone(buffer),
                                index,
                                start,
                            });
                            return Some(SyntaxNode::Buffer(BufferNode::new(context, None, found)));
                        }
                    }
                    TreeChild::Tree(inner) => {
                        if !inner.kind().is_anonymous() || inner.has_child() {
                            let node = TreeNode::new(Arc::clone(inner), start, Some(index), Some(parent.clone()));
                            if !inner.kind().is_anonymous() {
                                return Some(SyntaxNode::Tree(node));
                            }
                            let first = if dir < 0 { node.last_index() } else { 0 };
                            return node.next_child(first, dir, pos, side);
                        }
                    }
                }
            }

            if !parent.kind().is_anonymous() {
                return None;
            }
            let grand = parent.0.parent.clone()?;
            i = match parent.0.index {
                Some(index) => len_isize(index) + dir,
                None if dir < 0 => -1,
                None => len_isize(grand.tree().children().len()),
            };
            parent = grand;
        }
    }
}

fn len_isize(len: usize) -> isize {
    isize::try_from(len).unwrap_or(isize::MAX)
}

impl Navigate for TreeNode {
    fn kind(&self) -> NodeKind {
        self.0.tree.kind()
    }

    fn from(&self) -> u32 {
        self.0.from
    }

    fn to(&self) -> u32 {
        self.0.from + self.0.tree.len()
    }

    fn parent(&self) -> Option<SyntaxNode> {
        self.parent_node().map(SyntaxNode::Tree)
    }

    fn child(&self, dir: isize, pos: u32, side: Side) -> Option<SyntaxNode> {
        let first = if dir < 0 { self.last_index() } else { 0 };
        self.next_child(first, dir, pos, side)
    }

    fn next_sibling(&self) -> Option<SyntaxNode> {
        let parent = self.0.parent.as_ref()?;
        parent.next_child(len_isize(self.0.index?) + 1, 1, 0, Side::DontCare)
    }

    fn prev_sibling(&self) -> Option<SyntaxNode> {
        let parent = self.0.parent.as_ref()?;
        parent.next_child(len_isize(self.0.index?) - 1, -1, 0, Side::DontCare)
    }
}

/// Where a [`TreeBuffer`] sits in its parent tree.
pub(crate) struct BufferContext {
    pub(crate) parent: TreeNode,
    pub(crate) buffer: Arc<TreeBuffer>,
    /// Index of the buffer in the parent's children.
    pub(crate) index: usize,
    /// Absolute start of the buffer.
    pub(crate) start: u32,
}

impl BufferContext {
    /// A sibling of the whole buffer in the parent tree.
    pub(crate) fn external_sibling(&self, dir: isize) -> Option<SyntaxNode> {
        self.parent
            .next_child(len_isize(self.index) + dir, dir, 0, Side::DontCare)
    }
}

/// A node stored inside a [`TreeBuffer`].
#[derive(Clone)]
pub struct BufferNode(Arc<BufferNodeData>);

struct BufferNodeData {
    context: Arc<BufferContext>,
    index: usize,
    parent: Option<BufferNode>,
}

impl BufferNode {
    pub(crate) fn new(context: Arc<BufferContext>, parent: Option<BufferNode>, index: usize) -> Self {
        Self(Arc::new(BufferNodeData {
            context,
            index,
            parent,
        }))
    }

    pub(crate) fn context(&self) -> &Arc<BufferContext> {
        &self.0.context
    }

    pub(crate) fn index(&self) -> usize {
        self.0.index
    }

    pub(crate) fn buffer_parent(&self) -> Option<&BufferNode> {
        self.0.parent.as_ref()
    }

    fn buffer(&self) -> &TreeBuffer {
        &self.0.context.buffer
    }
}

impl Navigate for BufferNode {
    fn kind(&self) -> NodeKind {
        self.buffer().kind(self.0.index)
    }

    fn from(&self) -> u32 {
        self.0.context.start + self.buffer().from(self.0.index)
    }

    fn to(&self) -> u32 {
        self.0.context.start + self.buffer().to(self.0.index)
    }

    fn parent(&self) -> Option<SyntaxNode> {
        match &self.0.parent {
            Some(parent) => Some(SyntaxNode::Buffer(parent.clone())),
            None => Some(SyntaxNode::Tree(
                self.0.context.parent.next_significant_parent(),
            )),
        }
    }

    fn child(&self, dir: isize, pos: u32, side: Side) -> Option<SyntaxNode> {
        let buffer = self.buffer();
        let index = buffer.find_child(
            self.0.index + RECORD,
            buffer.end(self.0.index),
            dir,
            pos,
            side,
            self.0.context.start,
        )?;
        Some(SyntaxNode::Buffer(BufferNode::new(
            Arc::clone(&self.0.context),
            Some(self.clone()),
            index,
        )))
    }

    fn next_sibling(&self) -> Option<SyntaxNode> {
        let buffer = self.buffer();
        let after = buffer.end(self.0.index);
        let limit = self
            .0
            .parent
            .as_ref()
            .map_or(buffer.data().len(), |parent| buffer.end(parent.0.index));
        if after < limit {
            return Some(SyntaxNode::Buffer(BufferNode::new(
                Arc::clone(&self.0.context),
                self.0.parent.clone(),
                after,
            )));
        }
        match self.0.parent {
            Some(_) => None,
            None => self.0.context.external_sibling(1),
        }
    }

    fn prev_sibling(&self) -> Option<SyntaxNode> {
        let parent_start = self
            .0
            .parent
            .as_ref()
            .map_or(0, |parent| parent.0.index + RECORD);
        if self.0.index == parent_start {
            return match self.0.parent {
                Some(_) => None,
                None => self.0.context.external_sibling(-1),
            };
        }
        let index = self
            .buffer()
            .find_child(parent_start, self.0.index, -1, 0, Side::DontCare, 0)?;
        Some(SyntaxNode::Buffer(BufferNode::new(
            Arc::clone(&self.0.context),
            self.0.parent.clone(),
            index,
        )))
    }
}

/// A node in either representation.
#[derive(Clone)]
pub enum SyntaxNode {
    /// A node backed by a nested tree.
    Tree(TreeNode),
    /// A node inside a tree buffer.
    Buffer(BufferNode),
}

impl SyntaxNode {
    /// Finds the innermost node covering `pos`, starting from this node. The
    /// search first climbs to an ancestor that holds the position, then
    /// descends. See [`Tree::resolve`] for the meaning of `side`.
    #[must_use]
    pub fn resolve(&self, pos: u32, side: i8) -> SyntaxNode {
        let mut node = self.clone();
        loop {
            let (from, to) = (node.from(), node.to());
            let outside = from == to
                || if side < 1 { from >= pos } else { from > pos }
                || if side > -1 { to <= pos } else { to < pos };
            if !outside {
                break;
            }
            let parent = match &node {
                SyntaxNode::Tree(tree) if tree.index().is_none() => None,
                _ => node.parent(),
            };
            match parent {
                Some(parent) => node = parent,
                None => return node,
            }
        }

        let side = Side::from_bias(side);
        while let Some(inner) = node.enter(pos, side) {
            node = inner;
        }
        node
    }

    /// A cursor positioned on this node.
    #[must_use]
    pub fn cursor(&self) -> TreeCursor {
        TreeCursor::new(self.clone())
    }

    /// Iterates over the visible children.
    #[must_use]
    pub fn children(&self) -> Children {
        Children {
            next: self.first_child(),
        }
    }

    /// Returns `true` if the node has no visible children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.first_child().is_none()
    }

    fn as_navigate(&self) -> &dyn Navigate {
        match self {
            SyntaxNode::Tree(node) => node,
            SyntaxNode::Buffer(node) => node,
        }
    }
}

impl Navigate for SyntaxNode {
    fn kind(&self) -> NodeKind {
        self.as_navigate().kind()
    }

    fn from(&self) -> u32 {
        self.as_navigate().from()
    }

    fn to(&self) -> u32 {
        self.as_navigate().to()
    }

    fn parent(&self) -> Option<SyntaxNode> {
        self.as_navigate().parent()
    }

    fn child(&self, dir: isize, pos: u32, side: Side) -> Option<SyntaxNode> {
        self.as_navigate().child(dir, pos, side)
    }

    fn next_sibling(&self) -> Option<SyntaxNode> {
        self.as_navigate().next_sibling()
    }

    fn prev_sibling(&self) -> Option<SyntaxNode> {
        self.as_navigate().prev_sibling()
    }
}

impl PartialEq for SyntaxNode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SyntaxNode::Tree(a), SyntaxNode::Tree(b)) => {
                Arc::ptr_eq(a.tree(), b.tree()) && a.from() == b.from()
            }
            (SyntaxNode::Buffer(a), SyntaxNode::Buffer(b)) => {
                Arc::ptr_eq(&a.context().buffer, &b.context().buffer)
                    && a.context().start == b.context().start
                    && a.index() == b.index()
            }
            _ => false,
        }
    }
}

impl Eq for SyntaxNode {}

impl fmt::Debug for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}..{}", self.kind(), self.from(), self.to())
    }
}

impl fmt::Debug for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}..{}", self.kind(), self.from(), self.to())
    }
}

impl fmt::Debug for BufferNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}..{}", self.kind(), self.from(), self.to())
    }
}

/// Iterator over the visible children of a node.
#[derive(Debug, Clone)]
pub struct Children {
    next: Option<SyntaxNode>,
}

impl Iterator for Children {
    type Item = SyntaxNode;

    fn next(&mut self) -> Option<SyntaxNode> {
        let node = self.next.take()?;
        self.next = node.next_sibling();
        Some(node)
    }
}
