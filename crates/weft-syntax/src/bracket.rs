//! A small bracket language used to exercise the incremental machinery.
//!
//! Words, numbers, strings, comments and operators become leaves;
//! whitespace is consumed without producing a token. `{}` delimit a `Block`,
//! `()` a `Group` and `[]` a `List`. Braces and parentheses stay visible as
//! `Brace` and `Paren` leaves; square brackets are structural only.

use logos::Logos;

use crate::incremental::{Grammar, Match};
use crate::kind::{NodeKind, NodeSet};
use crate::token::GrammarToken;

/// Kinds produced by [`BracketGrammar`].
pub mod kinds {
    use crate::kind::NodeKind;

    /// `{ ... }`
    pub const BLOCK: NodeKind = NodeKind(4);
    /// `( ... )`
    pub const GROUP: NodeKind = NodeKind(5);
    /// `[ ... ]`
    pub const LIST: NodeKind = NodeKind(6);
    /// Identifier-like word.
    pub const WORD: NodeKind = NodeKind(7);
    /// Integer literal.
    pub const NUMBER: NodeKind = NodeKind(8);
    /// Double-quoted string, possibly unterminated.
    pub const STRING: NodeKind = NodeKind(9);
    /// Line or block comment.
    pub const COMMENT: NodeKind = NodeKind(10);
    /// Operator or punctuation.
    pub const OPERATOR: NodeKind = NodeKind(11);
    /// `{` or `}`.
    pub const BRACE: NodeKind = NodeKind(12);
    /// `(` or `)`.
    pub const PAREN: NodeKind = NodeKind(13);

    pub(super) const NAMES: [&str; 10] = [
        "Block", "Group", "List", "Word", "Number", "String", "Comment", "Operator", "Brace",
        "Paren",
    ];
}

fn lex_block_comment(lex: &mut logos::Lexer<BracketToken>) -> bool {
    let bytes = lex.remainder().as_bytes();
    let mut depth = 1usize;
    let mut i = 0usize;

    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'/', b'*') => {
                depth += 1;
                i += 2;
            }
            (b'*', b'/') => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    lex.bump(i);
                    return true;
                }
            }
            _ => i += 1,
        }
    }

    // Unterminated comments run to the end of the text.
    lex.bump(bytes.len());
    true
}

/// Raw lexical tokens of the bracket language.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketToken {
    /// Spaces, tabs and line breaks.
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    /// `// ...` up to the end of the line.
    #[regex(r"//[^\r\n]*", allow_greedy = true)]
    LineComment,

    /// `/* ... */`, nesting, possibly unterminated.
    #[token("/*", lex_block_comment)]
    BlockComment,

    /// Double-quoted string on one line, possibly unterminated.
    #[regex(r#""([^"\\\r\n]|\\[^\r\n])*"?"#)]
    String,

    /// Integer literal with optional `_` separators.
    #[regex(r"[0-9][0-9_]*")]
    Number,

    /// Identifier-like word.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Word,

    /// Single-character operator or punctuation.
    #[regex(r"[-+*/%=<>!&|^~?:;,.@#$]")]
    Operator,

    /// `{`
    #[token("{")]
    LBrace,

    /// `}`
    #[token("}")]
    RBrace,

    /// `(`
    #[token("(")]
    LParen,

    /// `)`
    #[token(")")]
    RParen,

    /// `[`
    #[token("[")]
    LBracket,

    /// `]`
    #[token("]")]
    RBracket,
}

impl BracketToken {
    fn to_grammar(self, from: u32, to: u32) -> Option<GrammarToken> {
        use kinds::*;

        let token = match self {
            BracketToken::Whitespace => return None,
            BracketToken::LineComment | BracketToken::BlockComment => {
                GrammarToken::new(COMMENT, from, to)
            }
            BracketToken::String => GrammarToken::new(STRING, from, to),
            BracketToken::Number => GrammarToken::new(NUMBER, from, to),
            BracketToken::Word => GrammarToken::new(WORD, from, to),
            BracketToken::Operator => GrammarToken::new(OPERATOR, from, to),
            BracketToken::LBrace => GrammarToken::new(BRACE, from, to).opening([BLOCK]),
            BracketToken::RBrace => GrammarToken::new(BRACE, from, to).closing([BLOCK]),
            BracketToken::LParen => GrammarToken::new(PAREN, from, to).opening([GROUP]),
            BracketToken::RParen => GrammarToken::new(PAREN, from, to).closing([GROUP]),
            BracketToken::LBracket => {
                GrammarToken::new(NodeKind::ANONYMOUS, from, to).opening([LIST])
            }
            BracketToken::RBracket => {
                GrammarToken::new(NodeKind::ANONYMOUS, from, to).closing([LIST])
            }
        };
        Some(token)
    }
}

/// Grammar for the bracket language.
#[derive(Debug, Clone)]
pub struct BracketGrammar {
    nodes: NodeSet,
}

impl BracketGrammar {
    /// Creates the grammar.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = NodeSet::new();
        for name in kinds::NAMES {
            nodes.define(name);
        }
        Self { nodes }
    }
}

impl Default for BracketGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar for BracketGrammar {
    fn node_set(&self) -> &NodeSet {
        &self.nodes
    }

    fn match_token(&self, _scopes: &[NodeKind], window: &str, at: usize, offset: u32) -> Option<Match> {
        let text = window.get(at..)?;
        let mut lexer = BracketToken::lexer(text);
        let token = lexer.next()?.ok()?;
        let span = lexer.span();

        let length = u32::try_from(span.end).ok()?;
        let from = offset + u32::try_from(at + span.start).ok()?;
        let to = from + length - u32::try_from(span.start).ok()?;
        let tokens = token.to_grammar(from, to).into_iter().collect();
        Some(Match::new(length, tokens))
    }
}
