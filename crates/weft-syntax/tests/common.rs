//! Shared helpers for tree and reparse tests.
#![allow(dead_code, unused_imports)]

use std::sync::Arc;

pub use weft_syntax::bracket::{kinds, BracketGrammar};
pub use weft_syntax::{
    parse, print_tree, reparse, ChunkBuffer, Compiler, Edit, Grammar, GrammarToken,
    IncrementalParser, Match, Navigate, NodeKind, NodeSet, ParseOutput, SyntaxConfig, Tree,
};

/// `Block` in [`LetterGrammar`].
pub const BLOCK: NodeKind = NodeKind(4);
/// `Word` in [`LetterGrammar`].
pub const WORD: NodeKind = NodeKind(5);

/// One character per match: `{` and `}` delimit an anonymous-bracketed
/// `Block`, ASCII letters are one-letter `Word`s, spaces produce nothing and
/// everything else is left unmatched.
#[derive(Debug, Clone)]
pub struct LetterGrammar {
    nodes: NodeSet,
}

impl LetterGrammar {
    pub fn new() -> Self {
        let mut nodes = NodeSet::new();
        nodes.define("Block");
        nodes.define("Word");
        Self { nodes }
    }
}

impl Grammar for LetterGrammar {
    fn node_set(&self) -> &NodeSet {
        &self.nodes
    }

    fn match_token(&self, _scopes: &[NodeKind], window: &str, at: usize, offset: u32) -> Option<Match> {
        let c = window.get(at..)?.chars().next()?;
        let from = offset + at as u32;
        let token = match c {
            '{' => GrammarToken::new(NodeKind::ANONYMOUS, from, from + 1).opening([BLOCK]),
            '}' => GrammarToken::new(NodeKind::ANONYMOUS, from, from + 1).closing([BLOCK]),
            ' ' => return Some(Match::new(1, Vec::new())),
            c if c.is_ascii_alphabetic() => GrammarToken::new(WORD, from, from + 1),
            _ => return None,
        };
        Some(Match::new(1, vec![token]))
    }
}

/// One token per chunk and no safety margins.
pub fn letters_config() -> SyntaxConfig {
    SyntaxConfig {
        max_chunk_tokens: 1,
        margin_before: 0,
        margin_after: 0,
        ..SyntaxConfig::default()
    }
}

/// Small limits so that short inputs already split chunks, pack several
/// buffers and rebalance wide nodes.
pub fn tight_config() -> SyntaxConfig {
    SyntaxConfig {
        max_buffer_length: 4,
        branch_factor: 3,
        max_chunk_tokens: 3,
        growth_interval: 2,
        margin_before: 2,
        margin_after: 2,
        window_length: 64,
    }
}

/// Adds each token as its own match.
pub fn buffer_of(tokens: &[GrammarToken], config: &SyntaxConfig) -> ChunkBuffer {
    let mut buffer = ChunkBuffer::new(config);
    for token in tokens {
        buffer.add_match(std::slice::from_ref(token), token.to);
    }
    buffer.check_invariants();
    buffer
}

pub fn lbrace(at: u32) -> GrammarToken {
    GrammarToken::new(NodeKind::ANONYMOUS, at, at + 1).opening([BLOCK])
}

pub fn rbrace(at: u32) -> GrammarToken {
    GrammarToken::new(NodeKind::ANONYMOUS, at, at + 1).closing([BLOCK])
}

pub fn word(at: u32) -> GrammarToken {
    GrammarToken::new(WORD, at, at + 1)
}

/// Compiles a buffer the way a finished parse does.
pub fn compile_buffer(buffer: ChunkBuffer, length: u32, config: &SyntaxConfig) -> Arc<Tree> {
    let mut compiler = Compiler::new(buffer, config);
    match compiler.compile(length) {
        Some(compiled) => compiled.build(NodeKind::DOCUMENT, config),
        None => Tree::empty(NodeKind::DOCUMENT, length),
    }
}

/// Visible nodes as `(kind, from, to)` triples, in document order.
pub fn outline(tree: &Arc<Tree>) -> Vec<(NodeKind, u32, u32)> {
    tree.preorder()
        .into_iter()
        .map(|(kind, range)| (kind, u32::from(range.start()), u32::from(range.end())))
        .collect()
}

/// Dumps the bracket-language tree of `source`.
pub fn snapshot_bracket(source: &str) -> String {
    let grammar = BracketGrammar::new();
    let output = parse(&grammar, source, &SyntaxConfig::default()).unwrap();
    print_tree(&output.tree, source, grammar.node_set())
}

/// Applies a single replacement to `text`, returning the new text and the
/// matching edit.
pub fn apply_edit(text: &str, from: usize, to: usize, inserted: &str) -> (String, Edit) {
    let mut next = String::with_capacity(text.len() + inserted.len());
    next.push_str(&text[..from]);
    next.push_str(inserted);
    next.push_str(&text[to..]);
    let edit = Edit::replace(from as u32, to as u32, inserted.len() as u32);
    (next, edit)
}

/// Checks that `records` is a well-formed postfix sequence: every node's
/// size covers exactly its children, and children sit inside their parent.
pub fn check_postfix(records: &[i32]) {
    assert_eq!(records.len() % 4, 0, "records are not whole quads");
    check_siblings(records, 0, records.len(), None);
}

fn check_siblings(records: &[i32], start: usize, end: usize, parent: Option<(i32, i32)>) {
    let mut end = end;
    while end > start {
        let at = end - 4;
        let (from, to, size) = (records[at + 1], records[at + 2], records[at + 3]);
        assert!(from <= to, "record at {at} ends before it starts");
        if let Some((parent_from, parent_to)) = parent {
            assert!(
                parent_from <= from && to <= parent_to,
                "record at {at} ({from}..{to}) escapes its parent ({parent_from}..{parent_to})"
            );
        }
        let footprint = if size == -1 { 4 } else { size as usize };
        assert!(footprint >= 4 && footprint <= end - start, "bad size {size} at {at}");
        if size != -1 && footprint > 4 {
            check_siblings(records, end - footprint, at, Some((from, to)));
        }
        end -= footprint;
    }
}
