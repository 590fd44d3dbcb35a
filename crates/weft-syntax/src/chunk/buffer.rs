//! The chunk buffer: the incremental token store.

use std::sync::Arc;

use crate::chunk::{close_scope, Chunk};
use crate::config::SyntaxConfig;
use crate::error::{Error, Result};
use crate::kind::NodeKind;
use crate::token::GrammarToken;

/// An ordered sequence of chunks plus the scope stack at the buffer's end.
///
/// The scope stack is always the fold of every chunk's open and close lists,
/// applied in order.
#[derive(Debug, Clone)]
pub struct ChunkBuffer {
    chunks: Vec<Chunk>,
    scopes: Vec<NodeKind>,
    max_chunk_tokens: usize,
    growth: usize,
}

impl ChunkBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new(config: &SyntaxConfig) -> Self {
        Self {
            chunks: Vec::new(),
            scopes: Vec::new(),
            max_chunk_tokens: config.max_chunk_tokens as usize,
            growth: config.growth(),
        }
    }

    fn empty_like(&self) -> Self {
        Self {
            chunks: Vec::new(),
            scopes: Vec::new(),
            max_chunk_tokens: self.max_chunk_tokens,
            growth: self.growth,
        }
    }

    /// The chunks, in document order.
    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub(crate) fn chunk_mut(&mut self, index: usize) -> Option<&mut Chunk> {
        self.chunks.get_mut(index)
    }

    /// Number of chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns `true` if the buffer holds no chunks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The last chunk.
    #[must_use]
    pub fn last(&self) -> Option<&Chunk> {
        self.chunks.last()
    }

    /// Scope stack at the end of the buffer.
    #[must_use]
    pub fn scopes(&self) -> &[NodeKind] {
        &self.scopes
    }

    /// Start of the first chunk, or 0.
    #[must_use]
    pub fn from(&self) -> u32 {
        self.chunks.first().map_or(0, Chunk::from)
    }

    /// End of the last chunk, or 0.
    #[must_use]
    pub fn to(&self) -> u32 {
        self.chunks.last().map_or(0, Chunk::to)
    }

    /// Adds a token, starting a new chunk when the scope rules require one.
    ///
    /// A new chunk starts when the buffer is empty, when no scope is open,
    /// when the token opens scopes, when the previous chunk closed scopes or
    /// when the previous chunk is full. Opens therefore always sit at the
    /// start of a chunk and closes at its end.
    ///
    /// Returns `true` if a chunk was created.
    pub fn add(&mut self, token: &GrammarToken) -> bool {
        let open = token.open.as_deref().filter(|kinds| !kinds.is_empty());
        let starts_chunk = open.is_some()
            || self.scopes.is_empty()
            || self.chunks.last().map_or(true, |last| {
                last.close().is_some() || last.tokens().len() >= self.max_chunk_tokens
            });

        if starts_chunk {
            let snapshot: Arc<[NodeKind]> = Arc::from(self.scopes.as_slice());
            self.chunks
                .push(Chunk::new(token.from, snapshot, open.map(<[NodeKind]>::to_vec)));
            if let Some(open) = open {
                self.scopes.extend_from_slice(open);
            }
        }

        // Either a chunk was just pushed or `starts_chunk` saw a last chunk.
        let index = self.chunks.len() - 1;
        let chunk = &mut self.chunks[index];
        chunk.push(token.kind, token.from, token.to, self.growth);

        if let Some(close) = token.close.as_deref().filter(|kinds| !kinds.is_empty()) {
            for kind in close {
                close_scope(&mut self.scopes, *kind);
            }
            chunk.push_close(close);
        }

        starts_chunk
    }

    /// Adds every token of one grammar match that ended at `end`.
    ///
    /// Only the chunk holding the last token is marked as settled: chunk
    /// edges created in the middle of the match are not valid restart points.
    /// Returns the number of chunks created.
    pub fn add_match(&mut self, tokens: &[GrammarToken], end: u32) -> usize {
        let Some((head, rest)) = tokens.split_first() else {
            return 0;
        };

        let mut created = usize::from(self.add(head));
        let first = self.chunks.len() - 1;
        for token in rest {
            if self.add(token) {
                created += 1;
            }
        }

        let last = self.chunks.len() - 1;
        for chunk in &mut self.chunks[first..last] {
            chunk.settle(chunk.to(), false);
        }
        if let Some(chunk) = self.chunks.last_mut() {
            chunk.settle(end, true);
        }
        created
    }

    /// Index of the last chunk starting at or before `pos`.
    #[must_use]
    pub fn search(&self, pos: u32) -> Option<usize> {
        self.chunks
            .partition_point(|chunk| chunk.from() <= pos)
            .checked_sub(1)
    }

    /// Finds the rightmost chunk ending at or before `pos` that can be kept
    /// unconditionally: pure, so the scope stack after it is its snapshot, and
    /// settled, so tokenizing can resume exactly at its end.
    #[must_use]
    pub fn find_behind_split_point(&self, pos: u32) -> Option<(&Chunk, usize)> {
        let mut index = self
            .chunks
            .partition_point(|chunk| chunk.to() <= pos)
            .checked_sub(1)?;
        loop {
            let chunk = &self.chunks[index];
            if chunk.is_pure() && chunk.is_settled() {
                return Some((chunk, index));
            }
            index = index.checked_sub(1)?;
        }
    }

    /// Finds the first chunk starting at or after `pos` that can be spliced
    /// back verbatim: one whose predecessor ended a match, so that the chunk
    /// starts where a match started. Whether its scope snapshot fits is up to
    /// the caller.
    #[must_use]
    pub fn find_ahead_split_point(&self, pos: u32) -> Option<(&Chunk, usize)> {
        let start = self.chunks.partition_point(|chunk| chunk.from() < pos);
        self.next_ahead_candidate(start)
            .map(|index| (&self.chunks[index], index))
    }

    /// Index of the first splice candidate at or after `index`.
    pub(crate) fn next_ahead_candidate(&self, index: usize) -> Option<usize> {
        (index..self.chunks.len()).find(|&index| self.is_ahead_candidate(index))
    }

    fn is_ahead_candidate(&self, index: usize) -> bool {
        index
            .checked_sub(1)
            .map_or(true, |prev| self.chunks[prev].is_settled())
    }

    /// Index of the first chunk at or after `index` that is not pure.
    ///
    /// Pure chunks leave the scope stack untouched, so every chunk from
    /// `index` up to and including the result shares one scope snapshot.
    #[must_use]
    pub fn find_next_unpure_chunk(&self, index: usize) -> Option<usize> {
        (index..self.chunks.len()).find(|&index| !self.chunks[index].is_pure())
    }

    /// Splits into the chunks before `index` and the chunks from `index` on.
    /// A single-chunk buffer splits into itself and an empty buffer.
    pub fn split(self, index: usize) -> Result<(ChunkBuffer, ChunkBuffer)> {
        if index > self.chunks.len() {
            return Err(Error::SplitOutOfBounds {
                index,
                len: self.chunks.len(),
            });
        }
        if self.chunks.len() == 1 {
            let empty = self.empty_like();
            return Ok((self, empty));
        }

        let mut left = self;
        let mut right = left.empty_like();
        right.chunks = left.chunks.split_off(index);
        right.scopes = std::mem::take(&mut left.scopes);
        left.scopes = right
            .chunks
            .first()
            .map_or_else(|| right.scopes.clone(), |chunk| chunk.scopes().to_vec());
        Ok((left, right))
    }

    /// Moves every chunk at or after `index` by `offset`. With `cut_left`, the
    /// chunks before `index` are dropped.
    pub fn slide(&mut self, index: usize, offset: i32, cut_left: bool) -> Result<()> {
        if index > self.chunks.len() {
            return Err(Error::SlideOutOfBounds {
                index,
                len: self.chunks.len(),
            });
        }
        if offset != 0 {
            for chunk in &mut self.chunks[index..] {
                chunk.shift(offset)?;
            }
        }
        if cut_left {
            self.chunks.drain(..index);
        }
        Ok(())
    }

    /// Appends the chunks of `right`. With `max`, appending stops at the first
    /// chunk ending past `max`; that chunk and everything after it are
    /// returned.
    pub fn append(&mut self, right: ChunkBuffer, max: Option<u32>) -> Option<ChunkBuffer> {
        let ChunkBuffer {
            chunks, scopes, ..
        } = right;
        let cut = max.and_then(|max| chunks.iter().position(|chunk| chunk.to() > max));

        let Some(cut) = cut else {
            self.chunks.extend(chunks);
            self.scopes = scopes;
            return None;
        };

        let mut chunks = chunks;
        let rest = chunks.split_off(cut);
        self.chunks.extend(chunks);
        self.scopes = rest[0].scopes().to_vec();

        let mut remainder = self.empty_like();
        remainder.chunks = rest;
        remainder.scopes = scopes;
        Some(remainder)
    }

    /// Asserts the buffer invariants: chunks are ordered and the scope stack
    /// is the fold of every chunk's scope events.
    ///
    /// # Panics
    ///
    /// Panics when an invariant does not hold.
    pub fn check_invariants(&self) {
        let Some(first) = self.chunks.first() else {
            return;
        };

        let mut stack = first.scopes().to_vec();
        let mut end = first.from();
        for chunk in &self.chunks {
            assert!(
                chunk.from() >= end,
                "chunk at {} starts before the previous chunk ends at {end}",
                chunk.from()
            );
            assert_eq!(
                chunk.scopes(),
                stack.as_slice(),
                "scope snapshot of the chunk at {} does not match the fold",
                chunk.from()
            );
            if let Some(open) = chunk.open() {
                stack.extend_from_slice(open);
            }
            if let Some(close) = chunk.close() {
                for kind in close {
                    close_scope(&mut stack, *kind);
                }
            }
            end = chunk.to();
        }
        assert_eq!(self.scopes, stack, "buffer scope stack does not match the fold");
    }
}

impl Default for ChunkBuffer {
    fn default() -> Self {
        Self::new(&SyntaxConfig::default())
    }
}
