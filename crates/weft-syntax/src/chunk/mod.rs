//! Chunks: runs of tokens that are reused as a unit.
//!
//! A chunk stores its tokens relative to its own start so that sliding it
//! after an edit is a single addition. Scope events (opens and closes) only
//! ever sit at chunk edges; see [`ChunkBuffer::add`] for the rules that keep
//! them there.

mod buffer;

pub use buffer::ChunkBuffer;

use std::sync::Arc;

use crate::compiler::NodeRecords;
use crate::config::SyntaxConfig;
use crate::error::{Error, Result};
use crate::kind::NodeKind;
use crate::tree::Tree;

/// A token stored relative to the start of its chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkToken {
    /// The token kind.
    pub kind: NodeKind,
    /// Start, relative to the chunk.
    pub from: u32,
    /// End, relative to the chunk.
    pub to: u32,
}

#[derive(Debug, Clone, Default)]
enum CachedTree {
    #[default]
    Unknown,
    Unavailable,
    Ready(Arc<Tree>),
}

/// An ordered run of tokens plus the scope events at its edges.
#[derive(Debug, Clone)]
pub struct Chunk {
    from: u32,
    length: u32,
    tokens: Vec<ChunkToken>,
    open: Option<Vec<NodeKind>>,
    close: Option<Vec<NodeKind>>,
    scopes: Arc<[NodeKind]>,
    settled: bool,
    tree: CachedTree,
}

impl Chunk {
    /// Creates an empty chunk at `from`. `scopes` is the scope stack in effect
    /// before `open` is applied.
    #[must_use]
    pub fn new(from: u32, scopes: Arc<[NodeKind]>, open: Option<Vec<NodeKind>>) -> Self {
        Self {
            from,
            length: 0,
            tokens: Vec::new(),
            open: open.filter(|kinds| !kinds.is_empty()),
            close: None,
            scopes,
            settled: true,
            tree: CachedTree::Unknown,
        }
    }

    /// Absolute start offset.
    #[must_use]
    pub fn from(&self) -> u32 {
        self.from
    }

    /// Absolute end offset.
    #[must_use]
    pub fn to(&self) -> u32 {
        self.from + self.length
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.length
    }

    /// Returns `true` if the chunk spans no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Tokens, relative to [`Chunk::from`].
    #[must_use]
    pub fn tokens(&self) -> &[ChunkToken] {
        &self.tokens
    }

    /// Kinds opened where this chunk starts.
    #[must_use]
    pub fn open(&self) -> Option<&[NodeKind]> {
        self.open.as_deref()
    }

    /// Kinds closed where this chunk ends.
    #[must_use]
    pub fn close(&self) -> Option<&[NodeKind]> {
        self.close.as_deref()
    }

    /// Scope stack active when this chunk starts, before its opens.
    #[must_use]
    pub fn scopes(&self) -> &[NodeKind] {
        &self.scopes
    }

    /// Returns `true` if the chunk ends exactly where a grammar match ended.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Returns `true` if the close list mirrors the open list, so that the
    /// scope stack after the chunk equals [`Chunk::scopes`].
    #[must_use]
    pub fn is_pure(&self) -> bool {
        let open = self.open().unwrap_or_default();
        let close = self.close().unwrap_or_default();
        open.len() == close.len() && open.iter().rev().eq(close.iter())
    }

    pub(crate) fn push(&mut self, kind: NodeKind, from: u32, to: u32, growth: usize) {
        if self.tokens.len() == self.tokens.capacity() {
            self.tokens.reserve_exact(growth.max(1));
        }
        let from = from.saturating_sub(self.from);
        let to = to.saturating_sub(self.from).max(from);
        self.tokens.push(ChunkToken { kind, from, to });
        self.length = self.length.max(to);
        self.settled = true;
        self.tree = CachedTree::Unknown;
    }

    pub(crate) fn push_close(&mut self, kinds: &[NodeKind]) {
        self.close.get_or_insert_with(Vec::new).extend_from_slice(kinds);
        self.tree = CachedTree::Unknown;
    }

    pub(crate) fn settle(&mut self, end: u32, settled: bool) {
        self.length = self.length.max(end.saturating_sub(self.from));
        self.settled = settled;
        self.tree = CachedTree::Unknown;
    }

    pub(crate) fn shift(&mut self, offset: i32) -> Result<()> {
        self.from = self
            .from
            .checked_add_signed(offset)
            .filter(|from| from.checked_add(self.length).is_some())
            .ok_or(Error::SlideOverflow {
                from: self.from,
                offset,
            })?;
        Ok(())
    }

    /// Returns this chunk as a standalone tree, if it is self-contained: pure
    /// and holding at least two tokens. The result is cached until the chunk
    /// changes.
    pub fn tree(&mut self, config: &SyntaxConfig) -> Option<Arc<Tree>> {
        if matches!(self.tree, CachedTree::Unknown) {
            self.tree = match self.build_tree(config) {
                Some(tree) => CachedTree::Ready(tree),
                None => CachedTree::Unavailable,
            };
        }
        match &self.tree {
            CachedTree::Ready(tree) => Some(Arc::clone(tree)),
            CachedTree::Unknown | CachedTree::Unavailable => None,
        }
    }

    fn build_tree(&self, config: &SyntaxConfig) -> Option<Arc<Tree>> {
        if self.tokens.len() < 2 || !self.is_pure() {
            return None;
        }

        let (root, inner) = match self.open().and_then(<[NodeKind]>::split_first) {
            Some((root, inner)) => (*root, inner),
            None => (NodeKind::ANONYMOUS, &[][..]),
        };

        let mut records = NodeRecords::new(config.growth());
        for token in &self.tokens {
            if !token.kind.is_anonymous() {
                records.leaf(token.kind, token.from, token.to);
            }
        }
        // Innermost wrapper first: postfix order.
        for kind in inner.iter().rev() {
            records.node(*kind, 0, self.length, records.len() + 4);
        }

        Some(Tree::build(records.as_slice(), &[], root, self.length, config))
    }
}

/// Pops `kind` off `stack`, discarding anything opened above it. Returns
/// `false` and leaves the stack untouched when `kind` is not open.
pub(crate) fn close_scope(stack: &mut Vec<NodeKind>, kind: NodeKind) -> bool {
    match stack.iter().rposition(|open| *open == kind) {
        Some(index) => {
            stack.truncate(index);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeChild;

    const BLOCK: NodeKind = NodeKind(4);
    const WORD: NodeKind = NodeKind(5);

    fn chunk(from: u32, open: Option<Vec<NodeKind>>) -> Chunk {
        Chunk::new(from, Arc::from(Vec::new()), open)
    }

    #[test]
    fn tokens_are_relative() {
        let mut chunk = chunk(10, None);
        chunk.push(WORD, 10, 12, 4);
        chunk.push(WORD, 13, 15, 4);
        assert_eq!(chunk.from(), 10);
        assert_eq!(chunk.to(), 15);
        assert_eq!(
            chunk.tokens()[1],
            ChunkToken {
                kind: WORD,
                from: 3,
                to: 5
            }
        );
    }

    #[test]
    fn purity_requires_mirrored_events() {
        let mut plain = chunk(0, None);
        plain.push(WORD, 0, 1, 4);
        assert!(plain.is_pure());

        let mut opened = chunk(0, Some(vec![BLOCK]));
        opened.push(WORD, 0, 1, 4);
        assert!(!opened.is_pure());

        opened.push_close(&[BLOCK]);
        assert!(opened.is_pure());

        let mut stray = chunk(0, None);
        stray.push_close(&[BLOCK]);
        assert!(!stray.is_pure());
    }

    #[test]
    fn single_token_chunk_has_no_tree() {
        let mut chunk = chunk(0, None);
        chunk.push(WORD, 0, 1, 4);
        assert!(chunk.tree(&SyntaxConfig::default()).is_none());
    }

    #[test]
    fn balanced_chunk_becomes_tree() {
        let config = SyntaxConfig::default();
        let mut chunk = chunk(3, Some(vec![BLOCK]));
        chunk.push(NodeKind::ANONYMOUS, 3, 4, 4);
        chunk.push(WORD, 4, 5, 4);
        chunk.push(NodeKind::ANONYMOUS, 5, 6, 4);
        chunk.push_close(&[BLOCK]);

        let tree = chunk.tree(&config).unwrap();
        assert_eq!(tree.kind(), BLOCK);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.positions(), &[1]);
        assert!(matches!(tree.children()[0], TreeChild::Buffer(_)));

        // Cached until the chunk changes.
        let again = chunk.tree(&config).unwrap();
        assert!(Arc::ptr_eq(&tree, &again));
        chunk.push(WORD, 6, 7, 4);
        assert!(chunk.tree(&config).is_some_and(|fresh| !Arc::ptr_eq(&tree, &fresh)));
    }

    #[test]
    fn shift_rejects_negative_start() {
        let mut chunk = chunk(2, None);
        chunk.push(WORD, 2, 3, 4);
        assert!(chunk.shift(-3).is_err());
        chunk.shift(5).unwrap();
        assert_eq!(chunk.from(), 7);
        assert_eq!(chunk.to(), 8);
    }

    #[test]
    fn close_scope_discards_inner_entries() {
        let mut stack = vec![BLOCK, WORD, NodeKind(6)];
        assert!(close_scope(&mut stack, WORD));
        assert_eq!(stack, vec![BLOCK]);
        assert!(!close_scope(&mut stack, WORD));
        assert_eq!(stack, vec![BLOCK]);
    }
}
