//! `weft-syntax` - Incremental token-to-tree compiler for live editors.
//!
//! This crate turns the flat token stream produced by a grammar matcher into a
//! navigable syntax tree, and re-derives that tree after every edit without
//! re-tokenizing the whole document:
//!
//! - **Chunks**: Matched tokens are grouped into [`Chunk`]s inside a
//!   [`ChunkBuffer`], the unit of incremental reuse
//! - **Compiler**: A stack machine turns chunks into a flat postfix record
//!   buffer, reusing whole chunks as pre-built subtrees when possible
//! - **Trees**: An immutable [`Tree`] built bottom-up from the records, with
//!   dense [`TreeBuffer`] leaves and a uniform [`TreeCursor`]/[`SyntaxNode`]
//!   navigation interface
//! - **Incremental driver**: [`ParseSession`] and [`IncrementalParser`] split,
//!   slide and re-stitch buffers around an edit
//!
//! # Design Principles
//!
//! - **Total**: Every input produces a tree spanning the whole document;
//!   garbage becomes `Unrecognized` leaves, unclosed nodes get `Incomplete`
//!   markers
//! - **Shared**: Trees are `Arc`-shared values; a reparse points at the
//!   unchanged subtrees of the previous tree
//! - **Cooperative**: Drivers advance one unit of work at a time so the host
//!   decides when to yield
//!
//! # Example
//!
//! ```
//! use weft_syntax::bracket::BracketGrammar;
//! use weft_syntax::{parse, reparse, Edit, SyntaxConfig};
//!
//! let grammar = BracketGrammar::new();
//! let config = SyntaxConfig::default();
//!
//! let first = parse(&grammar, "{ a } { b }", &config).unwrap();
//! assert_eq!(first.tree.len(), 11);
//!
//! // Replace `b` with `bc`.
//! let edit = Edit::replace(8, 9, 2);
//! let second = reparse(&grammar, "{ a } { bc }", &config, first.cache, &[edit]).unwrap();
//! assert_eq!(second.tree.len(), 12);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod bracket;
pub mod chunk;
pub mod compiler;
pub mod config;
pub mod error;
pub mod incremental;
pub mod kind;
pub mod token;
pub mod tree;

pub use chunk::{Chunk, ChunkBuffer, ChunkToken};
pub use compiler::{Compiled, Compiler};
pub use config::SyntaxConfig;
pub use error::{Error, Result};
pub use incremental::{
    parse, reparse, Edit, Grammar, IncrementalParser, Input, Match, ParseOutput, ParseSession,
    ReuseStats, SyntaxCache,
};
pub use kind::{NodeKind, NodeSet};
pub use token::GrammarToken;
pub use tree::{
    print_tree, Navigate, ResolveCache, Side, SyntaxNode, Tree, TreeBuffer, TreeChild, TreeCursor,
};
