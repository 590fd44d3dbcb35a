//! The work behind each subcommand, kept free of I/O.

use std::fmt::Write;

use anyhow::{bail, Result};
use tracing::debug;
use weft_syntax::bracket::BracketGrammar;
use weft_syntax::{parse, print_tree, reparse, Edit, Grammar, ParseSession, SyntaxConfig};

/// Dumps the tree of `text`, optionally tokenizing only up to `stop`.
pub fn tree(text: &str, config: &SyntaxConfig, stop: Option<u32>) -> Result<String> {
    let grammar = BracketGrammar::new();
    let mut session = ParseSession::new(&grammar, text, config);
    if let Some(stop) = stop {
        session = session.stop_at(stop)?;
    }
    let output = session.finish()?;
    Ok(print_tree(&output.tree, text, grammar.node_set()))
}

/// Replaces `delete` bytes at `at` with `insert`, reparses, and reports the
/// reuse counters. Fails if the reparsed tree differs from a fresh parse of
/// the edited text.
pub fn edit(
    text: &str,
    config: &SyntaxConfig,
    at: u32,
    delete: u32,
    insert: &str,
    show_tree: bool,
) -> Result<String> {
    let from = at as usize;
    let to = from.saturating_add(delete as usize);
    if to > text.len() || !text.is_char_boundary(from) || !text.is_char_boundary(to) {
        bail!("edit {from}..{to} does not fit a {} byte document", text.len());
    }
    let inserted = u32::try_from(insert.len())?;

    let mut next = String::with_capacity(text.len() + insert.len());
    next.push_str(&text[..from]);
    next.push_str(insert);
    next.push_str(&text[to..]);

    let grammar = BracketGrammar::new();
    let first = parse(&grammar, text, config)?;
    let edit = Edit::replace(at, at + delete, inserted);
    debug!("Reparsing after {edit:?}");
    let second = reparse(&grammar, next.as_str(), config, first.cache, &[edit])?;
    let fresh = parse(&grammar, next.as_str(), config)?;
    if second.tree.preorder() != fresh.tree.preorder() {
        bail!("incremental tree differs from a fresh parse");
    }

    let stats = second.stats;
    let mut out = String::new();
    writeln!(out, "edit         {}..{} -> {inserted} bytes", edit.from, edit.to)?;
    writeln!(out, "behind       {} chunks", stats.chunks_behind)?;
    writeln!(out, "ahead        {} chunks", stats.chunks_ahead)?;
    writeln!(out, "matches      {} (fresh {})", stats.matches, fresh.stats.matches)?;
    writeln!(out, "unrecognized {}", stats.unrecognized)?;
    writeln!(out, "chunk trees  {}", stats.chunk_trees)?;
    if show_tree {
        out.push('\n');
        out.push_str(&print_tree(&second.tree, &next, grammar.node_set()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;

    fn narrow() -> SyntaxConfig {
        SyntaxConfig {
            margin_before: 1,
            margin_after: 1,
            ..SyntaxConfig::default()
        }
    }

    #[test]
    fn tree_stops_early() {
        let dump = tree("{a} {b}", &SyntaxConfig::default(), Some(3)).unwrap();
        expect![[r#"
Document [0..3]
  Block [0..3]
    Brace [0..1] "{"
    Word [1..2] "a"
    Brace [2..3] "}"
"#]]
        .assert_eq(&dump);
        assert!(tree("{a}", &SyntaxConfig::default(), Some(9)).is_err());
    }

    #[test]
    fn edit_reports_reuse() {
        let report = edit("{ a } { b }", &narrow(), 8, 1, "bc", true).unwrap();
        expect![[r#"
edit         8..9 -> 2 bytes
behind       1 chunks
ahead        0 chunks
matches      6 (fresh 11)
unrecognized 0
chunk trees  2

Document [0..12]
  Block [0..5]
    Brace [0..1] "{"
    Word [2..3] "a"
    Brace [4..5] "}"
  Block [6..12]
    Brace [6..7] "{"
    Word [8..10] "bc"
    Brace [11..12] "}"
"#]]
        .assert_eq(&report);
    }

    #[test]
    fn edit_outside_the_document_is_rejected() {
        assert!(edit("{a}", &narrow(), 2, 5, "", false).is_err());
        assert!(edit("\u{e9}", &narrow(), 1, 0, "x", false).is_err());
    }
}
