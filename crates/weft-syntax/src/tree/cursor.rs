//! A mutable cursor over a tree.

use std::sync::Arc;

use crate::compiler::RECORD;
use crate::kind::NodeKind;
use crate::tree::node::{BufferContext, BufferNode, Navigate, SyntaxNode, TreeNode};
use crate::tree::Side;

/// Walks a tree without allocating a node object per step while inside a
/// [`TreeBuffer`](crate::TreeBuffer). Cloning a cursor forks it.
#[derive(Clone)]
pub struct TreeCursor {
    tree: TreeNode,
    buffer: Option<Arc<BufferContext>>,
    /// Quad offsets of the buffer ancestors of the current buffer node.
    stack: Vec<usize>,
    index: usize,
    kind: NodeKind,
    from: u32,
    to: u32,
}

impl TreeCursor {
    /// Creates a cursor on `node`.
    #[must_use]
    pub fn new(node: SyntaxNode) -> Self {
        match node {
            SyntaxNode::Tree(tree) => Self {
                kind: tree.kind(),
                from: tree.from(),
                to: tree.to(),
                tree,
                buffer: None,
                stack: Vec::new(),
                index: 0,
            },
            SyntaxNode::Buffer(node) => {
                let mut stack = Vec::new();
                let mut parent = node.buffer_parent();
                while let Some(ancestor) = parent {
                    stack.push(ancestor.index());
                    parent = ancestor.buffer_parent();
                }
                stack.reverse();
                let context = Arc::clone(node.context());
                Self {
                    kind: node.kind(),
                    from: node.from(),
                    to: node.to(),
                    tree: context.parent.clone(),
                    buffer: Some(context),
                    stack,
                    index: node.index(),
                }
            }
        }
    }

    /// Kind of the current node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Start of the current node.
    #[must_use]
    pub fn from(&self) -> u32 {
        self.from
    }

    /// End of the current node.
    #[must_use]
    pub fn to(&self) -> u32 {
        self.to
    }

    /// The current node as a [`SyntaxNode`].
    #[must_use]
    pub fn node(&self) -> SyntaxNode {
        let Some(context) = &self.buffer else {
            return SyntaxNode::Tree(self.tree.clone());
        };
        let mut parent = None;
        for &index in &self.stack {
            parent = Some(BufferNode::new(Arc::clone(context), parent, index));
        }
        SyntaxNode::Buffer(BufferNode::new(Arc::clone(context), parent, self.index))
    }

    fn set_tree(&mut self, node: TreeNode) -> bool {
        self.kind = node.kind();
        self.from = node.from();
        self.to = node.to();
        self.tree = node;
        true
    }

    fn set_buffer_index(&mut self, index: usize) -> bool {
        let Some(context) = &self.buffer else {
            return false;
        };
        self.kind = context.buffer.kind(index);
        self.from = context.start + context.buffer.from(index);
        self.to = context.start + context.buffer.to(index);
        self.index = index;
        true
    }

    /// Moves to `node`, which came from a tree-level search.
    fn set_node(&mut self, node: Option<SyntaxNode>) -> bool {
        match node {
            None => false,
            Some(SyntaxNode::Tree(node)) => {
                self.buffer = None;
                self.stack.clear();
                self.set_tree(node)
            }
            Some(SyntaxNode::Buffer(node)) => {
                let context = Arc::clone(node.context());
                self.tree = context.parent.clone();
                self.buffer = Some(context);
                self.stack.clear();
                self.set_buffer_index(node.index())
            }
        }
    }

    fn enter_child(&mut self, dir: isize, pos: u32, side: Side) -> bool {
        let Some(context) = &self.buffer else {
            let node = self.tree.child(dir, pos, side);
            return self.set_node(node);
        };
        let buffer = &context.buffer;
        let Some(index) = buffer.find_child(
            self.index + RECORD,
            buffer.end(self.index),
            dir,
            pos,
            side,
            context.start,
        ) else {
            return false;
        };
        self.stack.push(self.index);
        self.set_buffer_index(index)
    }

    /// Moves to the first child.
    pub fn first_child(&mut self) -> bool {
        self.enter_child(1, 0, Side::DontCare)
    }

    /// Moves to the last child.
    pub fn last_child(&mut self) -> bool {
        self.enter_child(-1, 0, Side::DontCare)
    }

    /// Moves to the first child ending after `pos`.
    pub fn child_after(&mut self, pos: u32) -> bool {
        self.enter_child(1, pos, Side::After)
    }

    /// Moves to the last child starting before `pos`.
    pub fn child_before(&mut self, pos: u32) -> bool {
        self.enter_child(-1, pos, Side::Before)
    }

    /// Moves to the first child around `pos` accepted by `side`.
    pub fn enter(&mut self, pos: u32, side: Side) -> bool {
        self.enter_child(1, pos, side)
    }

    /// Moves to the parent.
    pub fn parent(&mut self) -> bool {
        let Some(context) = self.buffer.clone() else {
            return match self.tree.parent_node() {
                Some(parent) => self.set_tree(parent),
                None => false,
            };
        };
        if let Some(index) = self.stack.pop() {
            return self.set_buffer_index(index);
        }
        self.buffer = None;
        self.set_tree(context.parent.next_significant_parent())
    }

    fn sibling(&mut self, dir: isize) -> bool {
        let Some(context) = self.buffer.clone() else {
            let (Some(parent), Some(index)) = (self.tree.raw_parent(), self.tree.index()) else {
                return false;
            };
            let index = isize::try_from(index).unwrap_or(isize::MAX);
            let node = parent.next_child(index + dir, dir, 0, Side::DontCare);
            return self.set_node(node);
        };

        let buffer = &context.buffer;
        let enclosing = self.stack.last().copied();
        if dir < 0 {
            let parent_start = enclosing.map_or(0, |parent| parent + RECORD);
            if self.index != parent_start {
                if let Some(index) =
                    buffer.find_child(parent_start, self.index, -1, 0, Side::DontCare, 0)
                {
                    return self.set_buffer_index(index);
                }
            }
        } else {
            let after = buffer.end(self.index);
            let limit = enclosing.map_or(buffer.data().len(), |parent| buffer.end(parent));
            if after < limit {
                return self.set_buffer_index(after);
            }
        }

        match enclosing {
            Some(_) => false,
            None => self.set_node(context.external_sibling(dir)),
        }
    }

    /// Moves to the next sibling.
    pub fn next_sibling(&mut self) -> bool {
        self.sibling(1)
    }

    /// Moves to the previous sibling.
    pub fn prev_sibling(&mut self) -> bool {
        self.sibling(-1)
    }

    fn step(&mut self, dir: isize, enter: bool) -> bool {
        if enter && self.enter_child(dir, 0, Side::DontCare) {
            return true;
        }
        let saved = self.clone();
        loop {
            if self.sibling(dir) {
                return true;
            }
            if !self.parent() {
                *self = saved;
                return false;
            }
        }
    }

    /// Moves to the next node in pre-order. Returns `false`, leaving the
    /// cursor in place, at the end of the tree.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        self.step(1, true)
    }

    /// Moves to the next node in pre-order without entering the current
    /// node's children.
    pub fn next_skip_children(&mut self) -> bool {
        self.step(1, false)
    }

    /// Moves to the previous node in a last-to-first pre-order traversal.
    pub fn prev(&mut self) -> bool {
        self.step(-1, true)
    }
}

impl std::fmt::Debug for TreeCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeCursor")
            .field("kind", &self.kind)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("in_buffer", &self.buffer.is_some())
            .finish()
    }
}
