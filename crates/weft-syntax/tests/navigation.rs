mod common;
use common::*;

use std::sync::Arc;

use expect_test::expect;
use weft_syntax::{ResolveCache, Side, SyntaxNode};

const SOURCE: &str = "{a (b c)} [d]";

fn bracket_tree(source: &str, config: &SyntaxConfig) -> Arc<Tree> {
    parse(&BracketGrammar::new(), source, config).unwrap().tree
}

fn span(node: &SyntaxNode) -> (NodeKind, u32, u32) {
    (node.kind(), node.from(), node.to())
}

#[test]
fn nested_brackets_dump() {
    expect![[r#"
Document [0..13]
  Block [0..9]
    Brace [0..1] "{"
    Word [1..2] "a"
    Group [3..8]
      Paren [3..4] "("
      Word [4..5] "b"
      Word [6..7] "c"
      Paren [7..8] ")"
    Brace [8..9] "}"
  List [10..13]
    Word [11..12] "d"
"#]]
    .assert_eq(&snapshot_bracket(SOURCE));
}

#[test]
fn unrecognized_and_unclosed_dump() {
    expect![[r#"
Document [0..6]
  Block [0..6]
    Brace [0..1] "{"
    Word [2..3] "x"
    Unrecognized [4..6] "é"
    Incomplete [6..6] ""
"#]]
    .assert_eq(&snapshot_bracket("{ x é"));
}

#[test]
fn stray_close_stays_a_leaf() {
    expect![[r#"
Document [0..4]
  Word [0..1] "a"
  Paren [1..2] ")"
  Word [3..4] "b"
"#]]
    .assert_eq(&snapshot_bracket("a) b"));
}

#[test]
fn cursor_walks_the_tree() {
    use kinds::*;

    let tree = bracket_tree(SOURCE, &SyntaxConfig::default());
    let mut cursor = tree.cursor();
    assert_eq!(cursor.kind(), NodeKind::DOCUMENT);

    assert!(cursor.first_child());
    assert_eq!((cursor.kind(), cursor.from(), cursor.to()), (BLOCK, 0, 9));
    assert!(cursor.first_child());
    assert_eq!(cursor.kind(), BRACE);
    assert!(cursor.next_sibling());
    assert_eq!(cursor.kind(), WORD);
    assert!(cursor.next_sibling());
    assert_eq!((cursor.kind(), cursor.from()), (GROUP, 3));
    assert!(cursor.last_child());
    assert_eq!((cursor.kind(), cursor.from()), (PAREN, 7));
    assert!(cursor.prev_sibling());
    assert_eq!((cursor.kind(), cursor.from()), (WORD, 6));

    assert!(cursor.parent());
    assert_eq!(cursor.kind(), GROUP);
    assert!(cursor.parent());
    assert_eq!(cursor.kind(), BLOCK);
    assert!(cursor.next_skip_children());
    assert_eq!((cursor.kind(), cursor.from()), (LIST, 10));
    assert!(cursor.parent());
    assert!(!cursor.parent());
    assert_eq!(cursor.kind(), NodeKind::DOCUMENT);
}

#[test]
fn failed_moves_leave_the_cursor_in_place() {
    let tree = bracket_tree(SOURCE, &SyntaxConfig::default());
    let mut cursor = tree.cursor();
    assert!(cursor.last_child());
    assert!(cursor.last_child());
    assert_eq!((cursor.kind(), cursor.from()), (kinds::WORD, 11));

    assert!(!cursor.first_child());
    assert!(!cursor.next_sibling());
    assert!(!cursor.next());
    assert_eq!((cursor.kind(), cursor.from()), (kinds::WORD, 11));
}

#[test]
fn enter_respects_side() {
    use kinds::*;

    let tree = bracket_tree(SOURCE, &SyntaxConfig::default());
    let block = tree.top_node().first_child().unwrap();
    assert_eq!(span(&block.child_after(2).unwrap()), (GROUP, 3, 8));
    assert_eq!(span(&block.child_before(3).unwrap()), (WORD, 1, 2));
    assert_eq!(span(&block.enter(8, Side::AtOrAfter).unwrap()), (BRACE, 8, 9));
    assert!(block.enter(2, Side::Around).is_none());
}

#[test]
fn resolve_finds_innermost_nodes() {
    use kinds::*;

    let tree = bracket_tree(SOURCE, &SyntaxConfig::default());
    assert_eq!(span(&tree.resolve(5, -1)), (WORD, 4, 5));
    assert_eq!(span(&tree.resolve(5, 0)), (GROUP, 3, 8));
    assert_eq!(span(&tree.resolve(5, 1)), (GROUP, 3, 8));
    assert_eq!(span(&tree.resolve(11, 1)), (WORD, 11, 12));
    assert_eq!(span(&tree.resolve(11, -1)), (LIST, 10, 13));
    assert_eq!(span(&tree.resolve(0, 1)), (BRACE, 0, 1));
    assert_eq!(span(&tree.resolve(9, 0)), (NodeKind::DOCUMENT, 0, 13));
}

#[test]
fn resolve_inner_reuses_the_last_node() {
    let tree = bracket_tree(SOURCE, &SyntaxConfig::default());
    let mut cache = ResolveCache::new();

    for (pos, side) in [(5, -1), (6, 1), (4, 1), (11, 1), (1, 0), (12, -1)] {
        let direct = tree.resolve(pos, side);
        let cached = tree.resolve_inner(&mut cache, pos, side);
        assert_eq!(cached, direct, "resolving {pos} with side {side}");
    }

    // A different tree never starts from the memoized node.
    let other = bracket_tree("[x]", &SyntaxConfig::default());
    let node = other.resolve_inner(&mut cache, 1, 1);
    assert_eq!(span(&node), (kinds::WORD, 1, 2));
    cache.clear();
    assert_eq!(tree.resolve_inner(&mut cache, 5, -1), tree.resolve(5, -1));
}

fn collect(node: &SyntaxNode, out: &mut Vec<(NodeKind, u32, u32)>) {
    out.push(span(node));
    for child in node.children() {
        assert_eq!(child.parent().as_ref(), Some(node), "parent of {child:?}");
        if let Some(next) = child.next_sibling() {
            assert_eq!(next.prev_sibling().as_ref(), Some(&child), "back from {next:?}");
        }
        collect(&child, out);
    }
}

#[test]
fn cursor_and_nodes_agree_on_balanced_trees() {
    let source = "{a b c d e f (g h i j k) l m n o [p q r s t u v] w x y z}";
    let tree = bracket_tree(source, &tight_config());

    let mut nodes = Vec::new();
    collect(&tree.top_node(), &mut nodes);
    assert_eq!(
        nodes.iter().map(|(kind, from, to)| (*kind, *from, *to)).collect::<Vec<_>>(),
        outline(&tree)
    );

    // Same outline as a tree built without buffer or branch limits.
    let loose = bracket_tree(source, &SyntaxConfig::default());
    assert_eq!(outline(&loose), outline(&tree));
}

#[test]
fn cursor_next_and_prev_cover_every_node() {
    let source = "{a (b [c] d) e} f";
    let tree = bracket_tree(source, &tight_config());
    let forward = outline(&tree);

    let mut cursor = tree.cursor();
    let mut count = 1;
    while cursor.next() {
        count += 1;
    }
    assert_eq!(count, forward.len());
    assert_eq!((cursor.kind(), cursor.from()), (kinds::WORD, 16));

    // Backwards from the last node reaches everything but the root, ending
    // on the first leaf.
    let mut count = 1;
    while cursor.prev() {
        count += 1;
    }
    assert_eq!(count, forward.len() - 1);
    assert_eq!((cursor.kind(), cursor.from()), (kinds::BRACE, 0));
}
