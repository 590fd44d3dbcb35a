//! Incremental reparsing.
//!
//! A parse tokenizes the document through a [`Grammar`], collects the tokens
//! in a [`ChunkBuffer`] and compiles the buffer into a [`Tree`]. The buffer is
//! kept in a [`SyntaxCache`]; after an edit, the next parse keeps the chunks in
//! front of the edit, re-tokenizes the edited region, and splices the chunks
//! behind it back in once tokenizing reaches one of their starts in the same
//! scope state.

mod parser;
mod session;

pub use parser::IncrementalParser;
pub use session::ParseSession;

use std::borrow::Cow;
use std::sync::Arc;

use crate::chunk::ChunkBuffer;
use crate::config::SyntaxConfig;
use crate::error::Result;
use crate::kind::{NodeKind, NodeSet};
use crate::token::GrammarToken;
use crate::tree::Tree;

/// A tokenizer producing scope-annotated tokens.
pub trait Grammar {
    /// Names of every kind the grammar produces.
    fn node_set(&self) -> &NodeSet;

    /// Matches at byte `at` of `window`, whose first byte sits at document
    /// offset `offset`. `scopes` is the stack of kinds open at this point.
    ///
    /// Returns `None` when nothing matches; the caller then skips one
    /// character as an unrecognized token. Token offsets in the match are
    /// absolute.
    fn match_token(&self, scopes: &[NodeKind], window: &str, at: usize, offset: u32) -> Option<Match>;
}

/// One grammar match: the bytes consumed and the tokens they produce. A match
/// may consume text without producing any token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Match {
    /// Bytes consumed from the match position.
    pub length: u32,
    /// Tokens in document order.
    pub tokens: Vec<GrammarToken>,
}

impl Match {
    /// Creates a match.
    #[must_use]
    pub fn new(length: u32, tokens: Vec<GrammarToken>) -> Self {
        Self { length, tokens }
    }

    /// Bytes consumed.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.length
    }

    /// Returns `true` if the match consumed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The tokens of the match.
    #[must_use]
    pub fn compile(self) -> Vec<GrammarToken> {
        self.tokens
    }
}

/// Read access to a document that need not be contiguous in memory.
pub trait Input {
    /// Length in bytes.
    fn len(&self) -> u32;

    /// Returns `true` for an empty document.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The text between two character boundaries.
    fn read(&self, from: u32, to: u32) -> Cow<'_, str>;

    /// Some non-empty text starting at `from`, unless `from` is the end.
    fn chunk(&self, from: u32) -> &str;

    /// The closest character boundary at or before `pos`.
    fn floor_boundary(&self, pos: u32) -> u32;
}

impl Input for str {
    fn len(&self) -> u32 {
        u32::try_from(str::len(self)).unwrap_or(u32::MAX)
    }

    fn read(&self, from: u32, to: u32) -> Cow<'_, str> {
        Cow::Borrowed(self.get(from as usize..to as usize).unwrap_or_default())
    }

    fn chunk(&self, from: u32) -> &str {
        self.get(from as usize..).unwrap_or_default()
    }

    fn floor_boundary(&self, pos: u32) -> u32 {
        let mut pos = (pos as usize).min(str::len(self));
        while !self.is_char_boundary(pos) {
            pos -= 1;
        }
        u32::try_from(pos).unwrap_or(u32::MAX)
    }
}

impl Input for String {
    fn len(&self) -> u32 {
        Input::len(self.as_str())
    }

    fn read(&self, from: u32, to: u32) -> Cow<'_, str> {
        self.as_str().read(from, to)
    }

    fn chunk(&self, from: u32) -> &str {
        self.as_str().chunk(from)
    }

    fn floor_boundary(&self, pos: u32) -> u32 {
        self.as_str().floor_boundary(pos)
    }
}

/// A change to the document, in coordinates of the document before it.
///
/// `from..to` is the replaced range; `offset` is the change in document
/// length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edit {
    /// Start of the replaced range.
    pub from: u32,
    /// End of the replaced range.
    pub to: u32,
    /// Inserted length minus removed length.
    pub offset: i32,
}

impl Edit {
    /// Replaces `from..to` with `inserted` bytes.
    #[must_use]
    pub fn replace(from: u32, to: u32, inserted: u32) -> Self {
        let removed = i64::from(to) - i64::from(from);
        let offset = i64::from(inserted) - removed;
        Self {
            from,
            to,
            offset: i32::try_from(offset).unwrap_or(if offset < 0 { i32::MIN } else { i32::MAX }),
        }
    }

    /// Inserts `len` bytes at `at`.
    #[must_use]
    pub fn insert(at: u32, len: u32) -> Self {
        Self::replace(at, at, len)
    }

    /// Deletes `from..to`.
    #[must_use]
    pub fn delete(from: u32, to: u32) -> Self {
        Self::replace(from, to, 0)
    }

    /// End of the replaced range in the new document.
    #[must_use]
    pub fn new_to(&self) -> u32 {
        self.to.saturating_add_signed(self.offset)
    }

    /// Combines non-overlapping edits, sorted by position and all in
    /// coordinates of the same old document, into one covering edit.
    #[must_use]
    pub fn merge(edits: &[Edit]) -> Option<Edit> {
        let (first, rest) = edits.split_first()?;
        Some(rest.iter().fold(*first, |merged, edit| Edit {
            from: merged.from.min(edit.from),
            to: merged.to.max(edit.to),
            offset: merged.offset.saturating_add(edit.offset),
        }))
    }
}

/// State kept between parses of the same document. Opaque outside this
/// module.
#[derive(Debug, Clone)]
pub struct SyntaxCache {
    pub(crate) buffer: ChunkBuffer,
    pub(crate) ahead: Vec<ChunkBuffer>,
    pub(crate) length: u32,
}

impl SyntaxCache {
    /// Length of the document the cache was built for.
    #[must_use]
    pub fn document_length(&self) -> u32 {
        self.length
    }

    /// The chunk buffer of the last parse.
    #[must_use]
    pub fn buffer(&self) -> &ChunkBuffer {
        &self.buffer
    }

    /// Chunks past the last parse's stop position, kept for later parses.
    #[must_use]
    pub fn ahead(&self) -> &[ChunkBuffer] {
        &self.ahead
    }
}

/// Counters describing how much of the previous parse was reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReuseStats {
    /// Chunks kept in front of the edit.
    pub chunks_behind: usize,
    /// Chunks spliced back in after the edit.
    pub chunks_ahead: usize,
    /// Grammar matches run.
    pub matches: usize,
    /// Characters skipped as unrecognized.
    pub unrecognized: usize,
    /// Chunks the compiler emitted as standalone subtrees, whether their
    /// tree was cached from an earlier parse or built during this one.
    pub chunk_trees: usize,
}

/// The result of a parse.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    /// The tree, rooted at a `DOCUMENT` node.
    pub tree: Arc<Tree>,
    /// State for the next parse.
    pub cache: SyntaxCache,
    /// Reuse counters.
    pub stats: ReuseStats,
}

/// Parses a whole document from scratch.
pub fn parse<G, I>(grammar: &G, input: &I, config: &SyntaxConfig) -> Result<ParseOutput>
where
    G: Grammar + ?Sized,
    I: Input + ?Sized,
{
    ParseSession::new(grammar, input, config).finish()
}

/// Reparses a document after `edits`, reusing `cache` from the parse of the
/// previous version.
pub fn reparse<G, I>(
    grammar: &G,
    input: &I,
    config: &SyntaxConfig,
    cache: SyntaxCache,
    edits: &[Edit],
) -> Result<ParseOutput>
where
    G: Grammar + ?Sized,
    I: Input + ?Sized,
{
    ParseSession::new(grammar, input, config)
        .reuse(cache, edits)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_computes_offset() {
        assert_eq!(Edit::replace(3, 5, 4).offset, 2);
        assert_eq!(Edit::delete(3, 5).offset, -2);
        assert_eq!(Edit::insert(3, 1).new_to(), 4);
    }

    #[test]
    fn merge_covers_all_edits() {
        let merged = Edit::merge(&[Edit::insert(2, 3), Edit::delete(8, 10)]).unwrap();
        assert_eq!(
            merged,
            Edit {
                from: 2,
                to: 10,
                offset: 1
            }
        );
        assert!(Edit::merge(&[]).is_none());
    }

    #[test]
    fn str_input_reads_on_boundaries() {
        let text = "aé{";
        assert_eq!(Input::len(text), 4);
        assert_eq!(text.floor_boundary(2), 1);
        assert_eq!(text.read(1, 3), "é");
        assert_eq!(text.chunk(3), "{");
        assert_eq!(text.chunk(9), "");
    }
}
