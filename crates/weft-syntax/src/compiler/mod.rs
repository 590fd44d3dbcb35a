//! The streaming compiler from chunks to postfix node records.
//!
//! The compiler walks a [`ChunkBuffer`] one chunk per [`Compiler::step`],
//! keeping the nodes opened so far on a stack. A chunk that forms a balanced
//! subtree on its own is emitted as a single reuse record pointing at the
//! chunk's cached tree; every other chunk contributes its opens, its leaves and
//! its closes.

mod records;
mod stack;

pub(crate) use records::{NodeRecords, Record, RECORD};

use std::sync::Arc;

use tracing::{debug, trace};

use crate::chunk::ChunkBuffer;
use crate::config::SyntaxConfig;
use crate::kind::NodeKind;
use crate::tree::Tree;
use stack::CompileStack;

/// The result of a finished compile: the flat record buffer plus the trees
/// its reuse records point at.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    /// Postfix `(kind, from, to, size)` quads.
    pub records: Vec<i32>,
    /// Pre-built subtrees referenced by reuse records.
    pub reused: Vec<Arc<Tree>>,
    /// Length of the document the records cover.
    pub length: u32,
}

impl Compiled {
    /// Builds the tree rooted at a node of `kind`.
    #[must_use]
    pub fn build(&self, kind: NodeKind, config: &SyntaxConfig) -> Arc<Tree> {
        Tree::build(&self.records, &self.reused, kind, self.length, config)
    }
}

/// Chunk-at-a-time compiler.
#[derive(Debug)]
pub struct Compiler {
    buffer: ChunkBuffer,
    config: SyntaxConfig,
    index: usize,
    stack: CompileStack,
    records: NodeRecords,
    reused: Vec<Arc<Tree>>,
    finished: Option<Compiled>,
}

impl Compiler {
    /// Creates a compiler positioned before the first chunk of `buffer`.
    #[must_use]
    pub fn new(buffer: ChunkBuffer, config: &SyntaxConfig) -> Self {
        Self {
            buffer,
            config: *config,
            index: 0,
            stack: CompileStack::default(),
            records: NodeRecords::new(config.growth()),
            reused: Vec::new(),
            finished: None,
        }
    }

    /// Returns `true` once every chunk has been processed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.index >= self.buffer.len()
    }

    /// Number of chunks processed so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.index
    }

    /// Number of nodes currently open.
    #[must_use]
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Processes the next chunk. Returns `false` when there is none.
    pub fn step(&mut self) -> bool {
        let Some(chunk) = self.buffer.chunk_mut(self.index) else {
            return false;
        };
        self.index += 1;

        if let Some(tree) = chunk.tree(&self.config) {
            self.records
                .reused(self.reused.len(), chunk.from(), chunk.to());
            self.reused.push(tree);
            return true;
        }

        let (from, to) = (chunk.from(), chunk.to());
        for kind in chunk.open().unwrap_or_default() {
            self.stack.push(*kind, from, self.records.len());
        }
        for token in chunk.tokens() {
            if !token.kind.is_anonymous() {
                self.records
                    .leaf(token.kind, from + token.from, from + token.to);
            }
        }
        for kind in chunk.close().unwrap_or_default() {
            match self.stack.close(*kind) {
                Some(entry) => {
                    let size = self.records.len() - entry.first_record + RECORD;
                    self.records.node(entry.kind, entry.from, to, size);
                }
                None => trace!("Dropping unmatched close of kind {} at {to}", kind.0),
            }
        }
        true
    }

    /// Processes every remaining chunk.
    pub fn advance_fully(&mut self) {
        while self.step() {}
    }

    /// Processes the remaining chunks and closes every node still open,
    /// giving each an `INCOMPLETE` leaf at the end of the document.
    ///
    /// `length` is raised to the end of the last chunk if it falls short.
    /// Returns `None` for an empty buffer. The stack is empty afterwards; the
    /// finished output is kept, so compiling again yields the same records.
    pub fn compile(&mut self, length: u32) -> Option<Compiled> {
        self.advance_fully();
        if self.buffer.is_empty() {
            return None;
        }

        let length = length.max(self.buffer.to());
        match &self.finished {
            Some(done) if done.length == length => return Some(done.clone()),
            Some(_) => {
                // The open nodes were closed at another length; replay.
                self.restart();
                self.advance_fully();
            }
            None => {}
        }

        let force_closed = self.stack.len();
        while let Some(entry) = self.stack.pop() {
            self.records.leaf(NodeKind::INCOMPLETE, length, length);
            let size = self.records.len() - entry.first_record + RECORD;
            self.records.node(entry.kind, entry.from, length, size);
        }

        debug!(
            "Compiled {} chunks into {} records ({} chunk trees, {force_closed} force-closed)",
            self.buffer.len(),
            self.records.len() / RECORD,
            self.reused.len(),
        );
        let compiled = Compiled {
            records: self.records.as_slice().to_vec(),
            reused: self.reused.clone(),
            length,
        };
        self.finished = Some(compiled.clone());
        Some(compiled)
    }

    fn restart(&mut self) {
        self.index = 0;
        self.stack = CompileStack::default();
        self.records = NodeRecords::new(self.config.growth());
        self.reused.clear();
        self.finished = None;
    }

    /// Gives the chunk buffer back, with any chunk trees built along the way.
    #[must_use]
    pub fn into_buffer(self) -> ChunkBuffer {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::GrammarToken;

    const BLOCK: NodeKind = NodeKind(4);
    const WORD: NodeKind = NodeKind(5);

    fn buffer(tokens: &[GrammarToken]) -> ChunkBuffer {
        let mut buffer = ChunkBuffer::default();
        for token in tokens {
            buffer.add_match(std::slice::from_ref(token), token.to);
        }
        buffer
    }

    fn lbrace(at: u32) -> GrammarToken {
        GrammarToken::new(NodeKind::ANONYMOUS, at, at + 1).opening([BLOCK])
    }

    fn rbrace(at: u32) -> GrammarToken {
        GrammarToken::new(NodeKind::ANONYMOUS, at, at + 1).closing([BLOCK])
    }

    #[test]
    fn empty_buffer_compiles_to_nothing() {
        let mut compiler = Compiler::new(ChunkBuffer::default(), &SyntaxConfig::default());
        assert!(!compiler.step());
        assert!(compiler.compile(0).is_none());
    }

    #[test]
    fn balanced_chunk_is_reused() {
        let mut compiler = Compiler::new(
            buffer(&[lbrace(0), GrammarToken::new(WORD, 1, 2), rbrace(2)]),
            &SyntaxConfig::default(),
        );
        let compiled = compiler.compile(3).unwrap();
        assert_eq!(compiled.records, vec![0, 0, 3, -1]);
        assert_eq!(compiled.reused.len(), 1);
        assert_eq!(compiled.reused[0].kind(), BLOCK);
    }

    #[test]
    fn unclosed_node_is_finished_at_length() {
        let mut compiler = Compiler::new(
            buffer(&[lbrace(0), GrammarToken::new(WORD, 1, 2)]),
            &SyntaxConfig::default(),
        );
        let compiled = compiler.compile(2).unwrap();
        assert_eq!(
            compiled.records,
            vec![5, 1, 2, 4, 3, 2, 2, 4, 4, 0, 2, 12]
        );
        assert_eq!(compiler.stack_depth(), 0);
        assert_eq!(compiler.compile(2).unwrap().records, compiled.records);
    }

    #[test]
    fn recompiling_at_another_length_replays_the_buffer() {
        let mut compiler = Compiler::new(
            buffer(&[lbrace(0), GrammarToken::new(WORD, 1, 2)]),
            &SyntaxConfig::default(),
        );
        compiler.compile(2).unwrap();
        let longer = compiler.compile(6).unwrap();
        assert_eq!(
            longer.records,
            vec![5, 1, 2, 4, 3, 6, 6, 4, 4, 0, 6, 12]
        );
        assert_eq!(longer.length, 6);
        assert_eq!(compiler.stack_depth(), 0);
        assert!(compiler.is_done());
    }

    #[test]
    fn stray_close_emits_nothing() {
        let mut compiler = Compiler::new(
            buffer(&[GrammarToken::new(WORD, 0, 1), rbrace(1)]),
            &SyntaxConfig::default(),
        );
        let compiled = compiler.compile(2).unwrap();
        assert_eq!(compiled.records, vec![5, 0, 1, 4]);
        assert_eq!(compiler.stack_depth(), 0);
    }

    #[test]
    fn nested_close_spans_from_open_chunk() {
        // `{a {b} c}`: the outer block is split across chunks.
        let tokens = [
            lbrace(0),
            GrammarToken::new(WORD, 1, 2),
            lbrace(3),
            GrammarToken::new(WORD, 4, 5),
            rbrace(5),
            GrammarToken::new(WORD, 7, 8),
            rbrace(8),
        ];
        let mut compiler = Compiler::new(buffer(&tokens), &SyntaxConfig::default());
        let compiled = compiler.compile(9).unwrap();
        assert_eq!(
            compiled.records,
            vec![5, 1, 2, 4, 0, 3, 6, -1, 5, 7, 8, 4, 4, 0, 9, 16]
        );
        assert_eq!(compiled.length, 9);
    }
}
